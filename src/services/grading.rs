use std::collections::HashMap;

use crate::db::models::Question;

/// Scores the objective part of a submission. Only MCQ answers count; a
/// question scores its full marks iff the answer string-equals the stored
/// correct answer, no trimming or case folding.
pub(crate) fn auto_score(questions: &[Question], answers: &HashMap<String, String>) -> i32 {
    questions
        .iter()
        .filter(|question| question.kind.is_objective())
        .filter(|question| {
            match (answers.get(&question.id), question.correct_answer.as_deref()) {
                (Some(answer), Some(correct)) => answer == correct,
                _ => false,
            }
        })
        .map(|question| question.marks)
        .sum()
}

/// Maximum achievable marks, independent of question type.
pub(crate) fn total_marks(questions: &[Question]) -> i32 {
    questions.iter().map(|question| question.marks).sum()
}

/// Minutes a student spent on the test, from the countdown timer. Clamped at
/// zero so clock skew can never produce a negative duration.
pub(crate) fn elapsed_minutes(time_limit_seconds: i64, time_remaining_seconds: i64) -> i32 {
    let elapsed_seconds = (time_limit_seconds - time_remaining_seconds).max(0);
    ((elapsed_seconds as f64) / 60.0).round() as i32
}
