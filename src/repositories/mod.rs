pub(crate) mod memory;
pub(crate) mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::db::models::{BankQuestion, Question, Submission, TeacherAccount, Test};
use crate::db::types::{Difficulty, QuestionKind};

#[derive(Debug, Error)]
pub(crate) enum RepoError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl RepoError {
    pub(crate) fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(anyhow::Error::new(err))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backend {
    Postgres,
    Memory,
}

impl Backend {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Memory => "memory",
        }
    }
}

/// Partial update for a test. `None` fields are left untouched.
#[derive(Debug, Default)]
pub(crate) struct TestUpdate {
    pub(crate) title: Option<String>,
    pub(crate) subject: Option<String>,
    pub(crate) class_name: Option<String>,
    pub(crate) chapter: Option<String>,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) questions: Option<Vec<Question>>,
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Default)]
pub(crate) struct BankQuestionUpdate {
    pub(crate) kind: Option<QuestionKind>,
    pub(crate) text: Option<String>,
    pub(crate) options: Option<Vec<String>>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) marks: Option<i32>,
    pub(crate) subject: Option<String>,
    pub(crate) topic: Option<String>,
    pub(crate) difficulty: Option<Difficulty>,
}

/// Persistence collaborator for the grading pipeline. Two implementations:
/// Postgres-backed and in-memory; the computation core never talks to either
/// directly, only through this trait.
#[async_trait]
pub(crate) trait Repository: Send + Sync {
    fn backend(&self) -> Backend;

    async fn health(&self) -> Result<(), RepoError>;

    async fn create_teacher(&self, teacher: TeacherAccount) -> Result<TeacherAccount, RepoError>;
    async fn find_teacher_by_email(&self, email: &str)
        -> Result<Option<TeacherAccount>, RepoError>;
    async fn find_teacher_by_id(&self, id: &str) -> Result<Option<TeacherAccount>, RepoError>;

    async fn create_test(&self, test: Test) -> Result<Test, RepoError>;
    async fn find_test_by_id(&self, id: &str) -> Result<Option<Test>, RepoError>;
    /// Case-insensitive join-code lookup; only active tests are returned.
    async fn find_test_by_code(&self, code: &str) -> Result<Option<Test>, RepoError>;
    async fn list_teacher_tests(&self, teacher_id: &str) -> Result<Vec<Test>, RepoError>;
    async fn update_test(&self, id: &str, update: TestUpdate) -> Result<Test, RepoError>;
    async fn delete_test(&self, id: &str) -> Result<(), RepoError>;

    async fn create_submission(&self, submission: Submission) -> Result<Submission, RepoError>;
    async fn find_submission_by_id(&self, id: &str) -> Result<Option<Submission>, RepoError>;
    /// Submissions for a test in submission order (oldest first). Ranking
    /// relies on this order for its stable tie-break.
    async fn list_test_submissions(&self, test_id: &str) -> Result<Vec<Submission>, RepoError>;
    async fn update_submission_grade(
        &self,
        id: &str,
        manual_score: i32,
        graded_at: PrimitiveDateTime,
    ) -> Result<Submission, RepoError>;

    async fn add_question(&self, question: BankQuestion) -> Result<BankQuestion, RepoError>;
    async fn list_teacher_questions(&self, teacher_id: &str)
        -> Result<Vec<BankQuestion>, RepoError>;
    async fn update_question(
        &self,
        id: &str,
        update: BankQuestionUpdate,
    ) -> Result<BankQuestion, RepoError>;
    async fn delete_question(&self, id: &str) -> Result<(), RepoError>;
}

pub(crate) type DynRepository = Arc<dyn Repository>;
