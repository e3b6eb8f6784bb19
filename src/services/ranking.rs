use crate::db::models::Submission;

/// Score used everywhere downstream: a teacher-entered manual score wins over
/// the automatic one, including an explicit manual zero.
pub(crate) fn final_score(submission: &Submission) -> i32 {
    submission.manual_score.unwrap_or(submission.auto_score)
}

/// Orders submissions by final score, highest first. The sort is stable, so
/// equal scores keep their submission order.
pub(crate) fn rank_submissions(submissions: &[Submission]) -> Vec<Submission> {
    let mut ranked = submissions.to_vec();
    ranked.sort_by_key(|submission| std::cmp::Reverse(final_score(submission)));
    ranked
}

/// 1-based position of a submission within the ranked sequence.
pub(crate) fn rank_of(submission_id: &str, submissions: &[Submission]) -> usize {
    rank_submissions(submissions)
        .iter()
        .position(|ranked| ranked.id == submission_id)
        .map(|index| index + 1)
        .unwrap_or(0)
}
