use serde::Serialize;
use time::PrimitiveDateTime;

use crate::db::models::{Question, Submission, Test};
use crate::services::ranking;

/// Structured report for one submission, computed fresh on every request and
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReportData {
    pub(crate) student_name: String,
    pub(crate) class_name: String,
    pub(crate) test_title: String,
    pub(crate) subject: String,
    pub(crate) chapter: Option<String>,
    pub(crate) total_marks: i32,
    pub(crate) marks_obtained: i32,
    pub(crate) percentage: i32,
    pub(crate) grade: &'static str,
    pub(crate) rank: usize,
    pub(crate) total_students: usize,
    pub(crate) question_wise: Vec<QuestionOutcome>,
    pub(crate) time_spent_minutes: i32,
    pub(crate) submitted_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuestionOutcome {
    pub(crate) text: String,
    pub(crate) marks_obtained: i32,
    pub(crate) total_marks: i32,
    pub(crate) correct: bool,
}

/// Letter grade as a step function over the integer percentage. Each band is
/// inclusive on its lower bound.
pub(crate) fn grade_letter(percentage: i32) -> &'static str {
    match percentage {
        p if p >= 90 => "A+",
        p if p >= 80 => "A",
        p if p >= 70 => "B+",
        p if p >= 60 => "B",
        p if p >= 50 => "C+",
        p if p >= 40 => "C",
        _ => "F",
    }
}

/// Integer percentage, standard rounding. Zero total marks yields zero rather
/// than dividing by it.
pub(crate) fn percentage(final_score: i32, total_marks: i32) -> i32 {
    if total_marks == 0 {
        return 0;
    }
    ((final_score as f64 / total_marks as f64) * 100.0).round() as i32
}

/// Per-question marks. Subjective questions earn provisional full marks for
/// any non-blank answer until the teacher overrides the total manually.
pub(crate) fn question_score(question: &Question, answer: &str) -> i32 {
    if question.kind.is_objective() {
        if Some(answer) == question.correct_answer.as_deref() {
            question.marks
        } else {
            0
        }
    } else if answer.trim().is_empty() {
        0
    } else {
        question.marks
    }
}

pub(crate) fn is_answer_correct(question: &Question, answer: &str) -> bool {
    if question.kind.is_objective() {
        Some(answer) == question.correct_answer.as_deref()
    } else {
        !answer.trim().is_empty()
    }
}

/// Assembles the full report record for one submission against the whole
/// submission set of its test.
pub(crate) fn compose_individual(
    test: &Test,
    submission: &Submission,
    all_submissions: &[Submission],
) -> ReportData {
    let final_score = ranking::final_score(submission);
    let percentage = percentage(final_score, submission.total_marks);

    let question_wise = test
        .questions
        .iter()
        .map(|question| {
            let answer = submission.answers.get(&question.id).map(String::as_str).unwrap_or("");
            QuestionOutcome {
                text: question.text.clone(),
                marks_obtained: question_score(question, answer),
                total_marks: question.marks,
                correct: is_answer_correct(question, answer),
            }
        })
        .collect();

    ReportData {
        student_name: submission.student_name.clone(),
        class_name: test.class_name.clone(),
        test_title: test.title.clone(),
        subject: test.subject.clone(),
        chapter: test.chapter.clone(),
        total_marks: submission.total_marks,
        marks_obtained: final_score,
        percentage,
        grade: grade_letter(percentage),
        rank: ranking::rank_of(&submission.id, all_submissions),
        total_students: all_submissions.len(),
        question_wise,
        time_spent_minutes: submission.time_spent_minutes,
        submitted_at: submission.submitted_at,
    }
}
