use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::TeacherAccount;
use crate::schemas::auth::{LoginRequest, SignupRequest, TeacherResponse, TokenResponse};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let email = payload.email.trim().to_lowercase();

    let existing = state
        .repo()
        .find_teacher_by_email(&email)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to check existing teacher"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Teacher with this email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let teacher = state
        .repo()
        .create_teacher(TeacherAccount {
            id: Uuid::new_v4().to_string(),
            email,
            hashed_password,
            name: payload.name,
            subject: payload.subject,
            school: payload.school,
            created_at: primitive_now_utc(),
        })
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to create teacher"))?;

    let token = security::create_access_token(&teacher.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse { access_token: token, token_type: "bearer".to_string() }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let email = payload.email.trim().to_lowercase();

    // One generic message for both unknown email and bad password.
    let teacher = state
        .repo()
        .find_teacher_by_email(&email)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to load teacher"))?
        .ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;

    let verified = security::verify_password(&payload.password, &teacher.hashed_password)
        .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS))?;
    if !verified {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    let token = security::create_access_token(&teacher.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(TokenResponse { access_token: token, token_type: "bearer".to_string() }))
}

async fn me(CurrentTeacher(teacher): CurrentTeacher) -> Json<TeacherResponse> {
    Json(TeacherResponse::from_account(&teacher))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn signup_login_me_flow() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/signup",
                None,
                Some(json!({
                    "email": "priya@school.example",
                    "password": "correct-horse",
                    "name": "Priya Nair",
                    "subject": "Mathematics"
                })),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({
                    "email": "priya@school.example",
                    "password": "correct-horse"
                })),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = test_support::read_json(response).await;
        let token = json["access_token"].as_str().expect("token").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/auth/me",
                Some(&token),
                None,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = test_support::read_json(response).await;
        assert_eq!(json["email"], "priya@school.example");
        assert_eq!(json["name"], "Priya Nair");
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_are_indistinguishable() {
        let ctx = test_support::setup_test_context().await;
        test_support::insert_teacher(&ctx.state, "ravi@school.example", "right-password").await;

        let unknown = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "nobody@school.example", "password": "whatever-123"})),
            ))
            .await
            .expect("response");
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        let unknown_body = test_support::read_json(unknown).await;

        let wrong = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "ravi@school.example", "password": "wrong-password"})),
            ))
            .await
            .expect("response");
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        let wrong_body = test_support::read_json(wrong).await;

        assert_eq!(unknown_body["detail"], "Invalid email or password");
        assert_eq!(unknown_body["detail"], wrong_body["detail"]);
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts() {
        let ctx = test_support::setup_test_context().await;
        test_support::insert_teacher(&ctx.state, "priya@school.example", "some-password").await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/signup",
                None,
                Some(json!({
                    "email": "Priya@School.example",
                    "password": "another-pass",
                    "name": "Priya Nair"
                })),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
