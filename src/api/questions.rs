use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::BankQuestion;
use crate::db::types::QuestionKind;
use crate::repositories::BankQuestionUpdate;
use crate::schemas::question_bank::{
    BankQuestionResponse, ImportResponse, QuestionCreate, QuestionUpdateRequest, TemplateResponse,
};
use crate::services::question_import;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_question).get(list_questions))
        .route("/import", post(import_questions))
        .route("/template", get(template))
        .route("/:question_id", put(update_question).delete(delete_question))
}

async fn add_question(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<BankQuestionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    check_mcq_shape(payload.kind, &payload.options, payload.correct_answer.as_deref())?;

    let question = state
        .repo()
        .add_question(BankQuestion {
            id: Uuid::new_v4().to_string(),
            teacher_id: teacher.id.clone(),
            kind: payload.kind,
            text: payload.text,
            options: sqlx::types::Json(payload.options),
            correct_answer: payload.correct_answer,
            marks: payload.marks,
            subject: payload.subject,
            topic: payload.topic,
            difficulty: payload.difficulty,
            created_at: primitive_now_utc(),
        })
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to add question"))?;

    Ok((StatusCode::CREATED, Json(BankQuestionResponse::from_question(&question))))
}

async fn list_questions(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
) -> Result<Json<Vec<BankQuestionResponse>>, ApiError> {
    let questions = state
        .repo()
        .list_teacher_questions(&teacher.id)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to list questions"))?;

    Ok(Json(questions.iter().map(BankQuestionResponse::from_question).collect()))
}

/// Accepts a multipart form with either a `file` part (PDF bytes) or a `text`
/// part (pre-extracted question text), plus optional `subject` and `topic`.
/// Parsed questions are returned for review, not persisted.
async fn import_questions(
    State(_state): State<AppState>,
    CurrentTeacher(_teacher): CurrentTeacher,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, ApiError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut raw_text: Option<String> = None;
    let mut subject = "General".to_string();
    let mut topic: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart payload: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read file: {e}")))?;
                file_bytes = Some(bytes.to_vec());
            }
            "text" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read text: {e}")))?;
                raw_text = Some(value);
            }
            "subject" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read subject: {e}")))?;
                if !value.trim().is_empty() {
                    subject = value.trim().to_string();
                }
            }
            "topic" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read topic: {e}")))?;
                if !value.trim().is_empty() {
                    topic = Some(value.trim().to_string());
                }
            }
            _ => {}
        }
    }

    let questions = if let Some(bytes) = file_bytes {
        question_import::import_from_pdf(&bytes, &subject, topic.as_deref())
            .map_err(|e| ApiError::BadRequest(format!("{e:#}")))?
    } else if let Some(text) = raw_text {
        let mut questions = question_import::parse_questions(&text, &subject);
        if let Some(topic) = &topic {
            for question in &mut questions {
                question.topic = Some(topic.clone());
            }
        }
        questions
    } else {
        return Err(ApiError::BadRequest(
            "either a `file` or a `text` part is required".to_string(),
        ));
    };

    Ok(Json(ImportResponse { count: questions.len(), questions }))
}

async fn template(CurrentTeacher(_teacher): CurrentTeacher) -> Json<TemplateResponse> {
    Json(TemplateResponse { template: question_import::question_template().to_string() })
}

async fn update_question(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(question_id): Path<String>,
    Json(payload): Json<QuestionUpdateRequest>,
) -> Result<Json<BankQuestionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if let Some(options) = &payload.options {
        if !options.is_empty() && (options.len() < 2 || options.len() > 4) {
            return Err(ApiError::BadRequest(
                "mcq must have between 2 and 4 options".to_string(),
            ));
        }
    }

    require_question_owner(&state, &teacher.id, &question_id).await?;

    let updated = state
        .repo()
        .update_question(
            &question_id,
            BankQuestionUpdate {
                kind: payload.kind,
                text: payload.text,
                options: payload.options,
                correct_answer: payload.correct_answer,
                marks: payload.marks,
                subject: payload.subject,
                topic: payload.topic,
                difficulty: payload.difficulty,
            },
        )
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to update question"))?;

    Ok(Json(BankQuestionResponse::from_question(&updated)))
}

async fn delete_question(
    State(state): State<AppState>,
    CurrentTeacher(teacher): CurrentTeacher,
    Path(question_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_question_owner(&state, &teacher.id, &question_id).await?;

    state
        .repo()
        .delete_question(&question_id)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to delete question"))?;

    Ok(StatusCode::NO_CONTENT)
}

fn check_mcq_shape(
    kind: QuestionKind,
    options: &[String],
    correct_answer: Option<&str>,
) -> Result<(), ApiError> {
    match kind {
        QuestionKind::Mcq => {
            if options.len() < 2 || options.len() > 4 {
                return Err(ApiError::BadRequest(
                    "mcq must have between 2 and 4 options".to_string(),
                ));
            }
            if let Some(answer) = correct_answer {
                if !answer.is_empty() && !options.iter().any(|option| option == answer) {
                    return Err(ApiError::BadRequest(
                        "correct_answer must be one of the options".to_string(),
                    ));
                }
            }
            Ok(())
        }
        _ => {
            if options.is_empty() {
                Ok(())
            } else {
                Err(ApiError::BadRequest("only mcq questions may carry options".to_string()))
            }
        }
    }
}

async fn require_question_owner(
    state: &AppState,
    teacher_id: &str,
    question_id: &str,
) -> Result<(), ApiError> {
    let questions = state
        .repo()
        .list_teacher_questions(teacher_id)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to load questions"))?;

    if questions.iter().any(|question| question.id == question_id) {
        Ok(())
    } else {
        Err(ApiError::NotFound("question not found".to_string()))
    }
}
