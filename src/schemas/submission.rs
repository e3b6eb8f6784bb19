use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;
use crate::services::ranking;

/// Student-facing submit payload. Elapsed time is derived server-side from the
/// test's limit and the countdown the client reports.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmitRequest {
    #[serde(alias = "testCode")]
    #[validate(length(min = 1, message = "test_code must not be empty"))]
    pub(crate) test_code: String,
    #[serde(alias = "studentName")]
    #[validate(length(min = 1, message = "student_name must not be empty"))]
    pub(crate) student_name: String,
    #[serde(default)]
    pub(crate) answers: HashMap<String, String>,
    #[serde(alias = "timeRemainingSeconds")]
    #[validate(range(min = 0, message = "time_remaining_seconds must be non-negative"))]
    pub(crate) time_remaining_seconds: i64,
    #[serde(default)]
    #[serde(alias = "tabSwitchCount")]
    #[validate(range(min = 0, message = "tab_switch_count must be non-negative"))]
    pub(crate) tab_switch_count: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeRequest {
    #[validate(range(min = 0, message = "score must be non-negative"))]
    pub(crate) score: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) student_name: String,
    pub(crate) answers: HashMap<String, String>,
    pub(crate) auto_score: i32,
    pub(crate) manual_score: Option<i32>,
    pub(crate) final_score: i32,
    pub(crate) total_marks: i32,
    pub(crate) time_spent_minutes: i32,
    pub(crate) tab_switch_count: i32,
    pub(crate) submitted_at: String,
    pub(crate) graded_at: Option<String>,
    pub(crate) status: SubmissionStatus,
}

impl SubmissionResponse {
    pub(crate) fn from_submission(submission: &Submission) -> Self {
        Self {
            id: submission.id.clone(),
            test_id: submission.test_id.clone(),
            student_name: submission.student_name.clone(),
            answers: submission.answers.0.clone(),
            auto_score: submission.auto_score,
            manual_score: submission.manual_score,
            final_score: ranking::final_score(submission),
            total_marks: submission.total_marks,
            time_spent_minutes: submission.time_spent_minutes,
            tab_switch_count: submission.tab_switch_count,
            submitted_at: format_primitive(submission.submitted_at),
            graded_at: submission.graded_at.map(format_primitive),
            status: submission.status,
        }
    }
}

/// Student's receipt right after submitting: their own objective score only.
#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) submission_id: String,
    pub(crate) auto_score: i32,
    pub(crate) total_marks: i32,
    pub(crate) time_spent_minutes: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct RankedSubmissionResponse {
    pub(crate) rank: usize,
    pub(crate) student_name: String,
    pub(crate) final_score: i32,
    pub(crate) total_marks: i32,
    pub(crate) percentage: i32,
    pub(crate) grade: &'static str,
}
