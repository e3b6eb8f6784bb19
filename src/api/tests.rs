use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sqlx::types::Json as DbJson;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Submission, TeacherAccount, Test};
use crate::repositories::{RepoError, TestUpdate};
use crate::schemas::submission::{RankedSubmissionResponse, SubmissionResponse};
use crate::schemas::test::{
    check_question_invariants, JoinTestResponse, TestCreate, TestResponse, TestUpdateRequest,
};
use crate::services::{analytics, ranking, report_pdf, reports, test_codes};

/// Attempts at drawing an unused join code before giving up.
const CODE_ALLOC_ATTEMPTS: usize = 5;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_test).get(list_tests))
        .route("/join/:code", get(join_test))
        .route("/:test_id", get(get_test).put(update_test).delete(delete_test))
        .route("/:test_id/submissions", get(list_submissions))
        .route("/:test_id/rankings", get(rankings))
        .route("/:test_id/analytics", get(test_analytics))
        .route("/:test_id/report", get(class_report))
}

async fn create_test(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Json(payload): Json<TestCreate>,
) -> Result<(StatusCode, Json<TestResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    check_question_invariants(&payload.questions).map_err(ApiError::BadRequest)?;

    let questions: Vec<_> = payload
        .questions
        .into_iter()
        .map(|question| question.into_question(&payload.subject))
        .collect();

    // Codes are random; on the rare collision draw again.
    for _ in 0..CODE_ALLOC_ATTEMPTS {
        let test = Test {
            id: Uuid::new_v4().to_string(),
            teacher_id: teacher.id.clone(),
            title: payload.title.clone(),
            subject: payload.subject.clone(),
            class_name: payload.class_name.clone(),
            chapter: payload.chapter.clone(),
            code: test_codes::generate_test_code(),
            time_limit_minutes: payload.time_limit_minutes,
            questions: DbJson(questions.clone()),
            is_active: true,
            created_at: primitive_now_utc(),
        };

        match state.repo().create_test(test).await {
            Ok(created) => {
                return Ok((StatusCode::CREATED, Json(TestResponse::from_test(&created))))
            }
            Err(RepoError::Conflict(_)) => continue,
            Err(err) => return Err(ApiError::from_repo(err, "Failed to create test")),
        }
    }

    Err(ApiError::Internal("Failed to allocate a unique test code".to_string()))
}

async fn list_tests(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
) -> Result<Json<Vec<TestResponse>>, ApiError> {
    let tests = state
        .repo()
        .list_teacher_tests(&teacher.id)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to list tests"))?;

    Ok(Json(tests.iter().map(TestResponse::from_test).collect()))
}

/// Public join endpoint for students. Answer keys are stripped from the
/// response; inactive or unknown codes look identical from the outside.
async fn join_test(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<JoinTestResponse>, ApiError> {
    let test = state
        .repo()
        .find_test_by_code(&code)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to look up test code"))?
        .ok_or_else(|| ApiError::NotFound("No active test with this code".to_string()))?;

    Ok(Json(JoinTestResponse::from_test(&test)))
}

async fn get_test(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(test_id): Path<String>,
) -> Result<Json<TestResponse>, ApiError> {
    let test = fetch_owned_test(&state, &teacher, &test_id).await?;
    Ok(Json(TestResponse::from_test(&test)))
}

async fn update_test(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(test_id): Path<String>,
    Json(payload): Json<TestUpdateRequest>,
) -> Result<Json<TestResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let test = fetch_owned_test(&state, &teacher, &test_id).await?;

    let questions = match payload.questions {
        Some(questions) => {
            check_question_invariants(&questions).map_err(ApiError::BadRequest)?;
            let subject = payload.subject.as_deref().unwrap_or(&test.subject);
            Some(
                questions
                    .into_iter()
                    .map(|question| question.into_question(subject))
                    .collect::<Vec<_>>(),
            )
        }
        None => None,
    };

    let updated = state
        .repo()
        .update_test(
            &test_id,
            TestUpdate {
                title: payload.title,
                subject: payload.subject,
                class_name: payload.class_name,
                chapter: payload.chapter,
                time_limit_minutes: payload.time_limit_minutes,
                questions,
                is_active: payload.is_active,
            },
        )
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to update test"))?;

    Ok(Json(TestResponse::from_test(&updated)))
}

async fn delete_test(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(test_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    fetch_owned_test(&state, &teacher, &test_id).await?;

    state
        .repo()
        .delete_test(&test_id)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to delete test"))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_submissions(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(test_id): Path<String>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    fetch_owned_test(&state, &teacher, &test_id).await?;
    let submissions = fetch_submissions(&state, &test_id).await?;

    Ok(Json(submissions.iter().map(SubmissionResponse::from_submission).collect()))
}

async fn rankings(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(test_id): Path<String>,
) -> Result<Json<Vec<RankedSubmissionResponse>>, ApiError> {
    fetch_owned_test(&state, &teacher, &test_id).await?;
    let submissions = fetch_submissions(&state, &test_id).await?;

    let ranked = ranking::rank_submissions(&submissions)
        .iter()
        .enumerate()
        .map(|(index, submission)| {
            let final_score = ranking::final_score(submission);
            let percentage = reports::percentage(final_score, submission.total_marks);
            RankedSubmissionResponse {
                rank: index + 1,
                student_name: submission.student_name.clone(),
                final_score,
                total_marks: submission.total_marks,
                percentage,
                grade: reports::grade_letter(percentage),
            }
        })
        .collect();

    Ok(Json(ranked))
}

async fn test_analytics(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(test_id): Path<String>,
) -> Result<Json<analytics::TestAnalytics>, ApiError> {
    let test = fetch_owned_test(&state, &teacher, &test_id).await?;
    let submissions = fetch_submissions(&state, &test_id).await?;

    Ok(Json(analytics::summarize(&test, &submissions)))
}

async fn class_report(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(test_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let test = fetch_owned_test(&state, &teacher, &test_id).await?;
    let submissions = fetch_submissions(&state, &test_id).await?;

    let pdf = report_pdf::render_class(&test, &submissions)
        .map_err(|e| ApiError::internal(e, "Failed to render class report"))?;
    let filename = report_pdf::class_filename(&test.title);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        pdf,
    ))
}

pub(crate) async fn fetch_owned_test(
    state: &AppState,
    teacher: &TeacherAccount,
    test_id: &str,
) -> Result<Test, ApiError> {
    let test = state
        .repo()
        .find_test_by_id(test_id)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to load test"))?
        .ok_or_else(|| ApiError::NotFound("test not found".to_string()))?;

    if test.teacher_id != teacher.id {
        return Err(ApiError::Forbidden("Access to this test is not allowed"));
    }

    Ok(test)
}

pub(crate) async fn fetch_submissions(
    state: &AppState,
    test_id: &str,
) -> Result<Vec<Submission>, ApiError> {
    state
        .repo()
        .list_test_submissions(test_id)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to load submissions"))
}

#[cfg(test)]
mod test {
    use axum::http::{header, Method, StatusCode};
    use serde_json::json;
    use sqlx::types::Json as DbJson;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::core::state::AppState;
    use crate::core::time::primitive_now_utc;
    use crate::db::models::Submission;
    use crate::db::types::SubmissionStatus;
    use crate::test_support;

    fn sample_test_payload() -> serde_json::Value {
        json!({
            "title": "Motion & Force",
            "subject": "Science",
            "class": "9A",
            "timeLimitMinutes": 30,
            "questions": [
                {
                    "type": "mcq",
                    "text": "Unit of force?",
                    "options": ["Newton", "Joule", "Watt"],
                    "correctAnswer": "Newton",
                    "marks": 2
                },
                {
                    "type": "essay",
                    "text": "Explain Newton's first law with an example.",
                    "marks": 5
                }
            ]
        })
    }

    async fn seed_submission(state: &AppState, test_id: &str, name: &str, score: i32) {
        state
            .repo()
            .create_submission(Submission {
                id: Uuid::new_v4().to_string(),
                test_id: test_id.to_string(),
                student_name: name.to_string(),
                answers: DbJson(Default::default()),
                auto_score: score,
                manual_score: None,
                total_marks: 7,
                time_spent_minutes: 12,
                tab_switch_count: 0,
                submitted_at: primitive_now_utc(),
                graded_at: None,
                status: SubmissionStatus::Submitted,
            })
            .await
            .expect("seed submission");
    }

    #[tokio::test]
    async fn create_then_join_hides_answer_key() {
        let ctx = test_support::setup_test_context().await;
        let teacher = test_support::insert_teacher(&ctx.state, "t1@school.example", "pw-123456").await;
        let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/tests",
                Some(&token),
                Some(sample_test_payload()),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = test_support::read_json(response).await;

        let code = created["code"].as_str().expect("code");
        assert_eq!(code.len(), 9);
        assert_eq!(created["questions"][0]["correct_answer"], "Newton");

        // Students join with the code in any casing.
        let join_uri = format!("/api/v1/tests/join/{}", code.to_lowercase());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, &join_uri, None, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let joined = test_support::read_json(response).await;

        assert_eq!(joined["total_marks"], 7);
        assert_eq!(joined["questions"][0]["options"][0], "Newton");
        assert!(joined["questions"][0].get("correct_answer").is_none());
    }

    #[tokio::test]
    async fn mcq_with_single_option_is_rejected() {
        let ctx = test_support::setup_test_context().await;
        let teacher = test_support::insert_teacher(&ctx.state, "t2@school.example", "pw-123456").await;
        let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

        let mut payload = sample_test_payload();
        payload["questions"][0]["options"] = json!(["Newton"]);
        payload["questions"][0]["correctAnswer"] = json!("Newton");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/tests",
                Some(&token),
                Some(payload),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn foreign_test_is_forbidden() {
        let ctx = test_support::setup_test_context().await;
        let owner = test_support::insert_teacher(&ctx.state, "owner@school.example", "pw-123456").await;
        let other = test_support::insert_teacher(&ctx.state, "other@school.example", "pw-123456").await;
        let owner_token = test_support::bearer_token(&owner.id, ctx.state.settings());
        let other_token = test_support::bearer_token(&other.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/tests",
                Some(&owner_token),
                Some(sample_test_payload()),
            ))
            .await
            .expect("response");
        let created = test_support::read_json(response).await;
        let test_id = created["id"].as_str().expect("id");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/tests/{test_id}"),
                Some(&other_token),
                None,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn rankings_are_ordered_and_ties_keep_submission_order() {
        let ctx = test_support::setup_test_context().await;
        let teacher = test_support::insert_teacher(&ctx.state, "t3@school.example", "pw-123456").await;
        let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/tests",
                Some(&token),
                Some(sample_test_payload()),
            ))
            .await
            .expect("response");
        let created = test_support::read_json(response).await;
        let test_id = created["id"].as_str().expect("id").to_string();

        seed_submission(&ctx.state, &test_id, "Asha", 5).await;
        seed_submission(&ctx.state, &test_id, "Bilal", 5).await;
        seed_submission(&ctx.state, &test_id, "Chitra", 7).await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/tests/{test_id}/rankings"),
                Some(&token),
                None,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let ranked = test_support::read_json(response).await;

        assert_eq!(ranked[0]["student_name"], "Chitra");
        assert_eq!(ranked[0]["rank"], 1);
        assert_eq!(ranked[0]["percentage"], 100);
        assert_eq!(ranked[0]["grade"], "A+");
        // Asha submitted before Bilal and keeps the better rank on the tie.
        assert_eq!(ranked[1]["student_name"], "Asha");
        assert_eq!(ranked[2]["student_name"], "Bilal");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/tests/{test_id}/analytics"),
                Some(&token),
                None,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let analytics = test_support::read_json(response).await;
        assert_eq!(analytics["total_submissions"], 3);
        assert_eq!(analytics["average_score"], 5.67);
    }

    #[tokio::test]
    async fn class_report_downloads_as_pdf() {
        let ctx = test_support::setup_test_context().await;
        let teacher = test_support::insert_teacher(&ctx.state, "t4@school.example", "pw-123456").await;
        let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/tests",
                Some(&token),
                Some(sample_test_payload()),
            ))
            .await
            .expect("response");
        let created = test_support::read_json(response).await;
        let test_id = created["id"].as_str().expect("id").to_string();
        seed_submission(&ctx.state, &test_id, "Asha", 6).await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/tests/{test_id}/report"),
                Some(&token),
                None,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/pdf")
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert!(body.starts_with(b"%PDF"));
    }
}
