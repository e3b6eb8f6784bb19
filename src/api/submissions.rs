use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use sqlx::types::Json as DbJson;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::tests::{fetch_owned_test, fetch_submissions};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;
use crate::schemas::submission::{
    GradeRequest, SubmissionResponse, SubmitRequest, SubmitResponse,
};
use crate::services::{grading, report_pdf, reports};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit))
        .route("/:submission_id", get(get_submission))
        .route("/:submission_id/grade", put(grade))
        .route("/:submission_id/report", get(individual_report))
}

/// Public endpoint students hit when the test ends or the timer runs out.
/// Scoring happens here, server-side, against the stored answer key.
async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let test = state
        .repo()
        .find_test_by_code(&payload.test_code)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to look up test code"))?
        .ok_or_else(|| ApiError::NotFound("No active test with this code".to_string()))?;

    let auto_score = grading::auto_score(&test.questions, &payload.answers);
    let total_marks = grading::total_marks(&test.questions);
    let time_spent_minutes = grading::elapsed_minutes(
        i64::from(test.time_limit_minutes) * 60,
        payload.time_remaining_seconds,
    );

    let submission = state
        .repo()
        .create_submission(Submission {
            id: Uuid::new_v4().to_string(),
            test_id: test.id.clone(),
            student_name: payload.student_name,
            answers: DbJson(payload.answers),
            auto_score,
            manual_score: None,
            total_marks,
            time_spent_minutes,
            tab_switch_count: payload.tab_switch_count,
            submitted_at: primitive_now_utc(),
            graded_at: None,
            status: SubmissionStatus::Submitted,
        })
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to store submission"))?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            submission_id: submission.id,
            auto_score: submission.auto_score,
            total_marks: submission.total_marks,
            time_spent_minutes: submission.time_spent_minutes,
        }),
    ))
}

async fn get_submission(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(submission_id): Path<String>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = fetch_submission_for_teacher(&state, &teacher, &submission_id).await?;
    Ok(Json(SubmissionResponse::from_submission(&submission)))
}

async fn grade(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(submission_id): Path<String>,
    Json(payload): Json<GradeRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let submission = fetch_submission_for_teacher(&state, &teacher, &submission_id).await?;
    if payload.score > submission.total_marks {
        return Err(ApiError::BadRequest(format!(
            "score must not exceed the test total of {}",
            submission.total_marks
        )));
    }

    let graded = state
        .repo()
        .update_submission_grade(&submission_id, payload.score, primitive_now_utc())
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to grade submission"))?;

    Ok(Json(SubmissionResponse::from_submission(&graded)))
}

async fn individual_report(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(submission_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let submission = fetch_submission_for_teacher(&state, &teacher, &submission_id).await?;
    let test = fetch_owned_test(&state, &teacher, &submission.test_id).await?;
    let all_submissions = fetch_submissions(&state, &submission.test_id).await?;

    let report = reports::compose_individual(&test, &submission, &all_submissions);
    let pdf = report_pdf::render_individual(&report)
        .map_err(|e| ApiError::internal(e, "Failed to render student report"))?;
    let filename = report_pdf::individual_filename(&submission.student_name, &test.title);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        pdf,
    ))
}

/// Loads a submission and checks the caller owns the test it belongs to.
async fn fetch_submission_for_teacher(
    state: &AppState,
    teacher: &crate::db::models::TeacherAccount,
    submission_id: &str,
) -> Result<Submission, ApiError> {
    let submission = state
        .repo()
        .find_submission_by_id(submission_id)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to load submission"))?
        .ok_or_else(|| ApiError::NotFound("submission not found".to_string()))?;

    fetch_owned_test(state, teacher, &submission.test_id).await?;

    Ok(submission)
}
