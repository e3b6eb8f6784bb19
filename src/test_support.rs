use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::api;
use crate::core::{config::Settings, security, state::AppState, time::primitive_now_utc};
use crate::db::models::TeacherAccount;
use crate::repositories::memory::MemoryRepository;
use crate::repositories::DynRepository;

const TEST_SECRET_KEY: &str = "test-secret";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("TESTHUB_ENV", "test");
    std::env::set_var("TESTHUB_STRICT_CONFIG", "0");
    std::env::set_var("TESTHUB_PERSISTENCE", "memory");
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var("PROMETHEUS_ENABLED", "0");
}

/// Router over a fresh in-memory repository. No external services involved.
pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let settings = Settings::load().expect("settings");
    let repo: DynRepository = Arc::new(MemoryRepository::new());
    let state = AppState::new(settings, repo);
    let app = api::router::router(state.clone());

    TestContext { state, app, _guard: guard }
}

pub(crate) async fn insert_teacher(state: &AppState, email: &str, password: &str) -> TeacherAccount {
    let hashed_password = security::hash_password(password).expect("hash password");

    state
        .repo()
        .create_teacher(TeacherAccount {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            hashed_password,
            name: "Test Teacher".to_string(),
            subject: Some("Science".to_string()),
            school: None,
            created_at: primitive_now_utc(),
        })
        .await
        .expect("insert teacher")
}

pub(crate) fn bearer_token(teacher_id: &str, settings: &Settings) -> String {
    security::create_access_token(teacher_id, settings, None).expect("token")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
