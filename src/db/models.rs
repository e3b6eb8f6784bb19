use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{Difficulty, QuestionKind, SubmissionStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TeacherAccount {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) name: String,
    pub(crate) subject: Option<String>,
    pub(crate) school: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

/// One question inside a test or the question bank. For MCQ questions the
/// correct answer is stored as the option text, not the option letter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Question {
    pub(crate) id: String,
    #[serde(rename = "type")]
    pub(crate) kind: QuestionKind,
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) options: Vec<String>,
    #[serde(default)]
    pub(crate) correct_answer: Option<String>,
    pub(crate) marks: i32,
    pub(crate) subject: String,
    #[serde(default)]
    pub(crate) topic: Option<String>,
    pub(crate) difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Test {
    pub(crate) id: String,
    pub(crate) teacher_id: String,
    pub(crate) title: String,
    pub(crate) subject: String,
    pub(crate) class_name: String,
    pub(crate) chapter: Option<String>,
    pub(crate) code: String,
    pub(crate) time_limit_minutes: i32,
    pub(crate) questions: Json<Vec<Question>>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Submission {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) student_name: String,
    pub(crate) answers: Json<HashMap<String, String>>,
    pub(crate) auto_score: i32,
    pub(crate) manual_score: Option<i32>,
    pub(crate) total_marks: i32,
    pub(crate) time_spent_minutes: i32,
    pub(crate) tab_switch_count: i32,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) graded_at: Option<PrimitiveDateTime>,
    pub(crate) status: SubmissionStatus,
}

/// Reusable question owned by a teacher, independent of any test.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct BankQuestion {
    pub(crate) id: String,
    pub(crate) teacher_id: String,
    #[serde(rename = "type")]
    pub(crate) kind: QuestionKind,
    pub(crate) text: String,
    pub(crate) options: Json<Vec<String>>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) marks: i32,
    pub(crate) subject: String,
    pub(crate) topic: Option<String>,
    pub(crate) difficulty: Difficulty,
    pub(crate) created_at: PrimitiveDateTime,
}
