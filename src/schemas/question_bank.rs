use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::BankQuestion;
use crate::db::types::{Difficulty, QuestionKind};
use crate::services::question_import::ImportedQuestion;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(rename = "type")]
    pub(crate) kind: QuestionKind,
    #[validate(length(min = 1, message = "question text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) options: Vec<String>,
    #[serde(default)]
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: Option<String>,
    #[validate(range(min = 1, message = "marks must be positive"))]
    pub(crate) marks: i32,
    #[validate(length(min = 1, message = "subject must not be empty"))]
    pub(crate) subject: String,
    #[serde(default)]
    pub(crate) topic: Option<String>,
    pub(crate) difficulty: Difficulty,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdateRequest {
    #[serde(default)]
    #[serde(rename = "type")]
    pub(crate) kind: Option<QuestionKind>,
    #[serde(default)]
    #[validate(length(min = 1, message = "question text must not be empty"))]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) options: Option<Vec<String>>,
    #[serde(default)]
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, message = "marks must be positive"))]
    pub(crate) marks: Option<i32>,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    pub(crate) topic: Option<String>,
    #[serde(default)]
    pub(crate) difficulty: Option<Difficulty>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BankQuestionResponse {
    pub(crate) id: String,
    pub(crate) teacher_id: String,
    #[serde(rename = "type")]
    pub(crate) kind: QuestionKind,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) marks: i32,
    pub(crate) subject: String,
    pub(crate) topic: Option<String>,
    pub(crate) difficulty: Difficulty,
    pub(crate) created_at: String,
}

impl BankQuestionResponse {
    pub(crate) fn from_question(question: &BankQuestion) -> Self {
        Self {
            id: question.id.clone(),
            teacher_id: question.teacher_id.clone(),
            kind: question.kind,
            text: question.text.clone(),
            options: question.options.0.clone(),
            correct_answer: question.correct_answer.clone(),
            marks: question.marks,
            subject: question.subject.clone(),
            topic: question.topic.clone(),
            difficulty: question.difficulty,
            created_at: format_primitive(question.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportResponse {
    pub(crate) count: usize,
    pub(crate) questions: Vec<ImportedQuestion>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TemplateResponse {
    pub(crate) template: String,
}
