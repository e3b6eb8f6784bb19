use async_trait::async_trait;
use sqlx::types::Json;
use time::PrimitiveDateTime;
use tokio::sync::RwLock;

use crate::db::models::{BankQuestion, Submission, TeacherAccount, Test};
use crate::db::types::SubmissionStatus;
use crate::repositories::{
    Backend, BankQuestionUpdate, RepoError, Repository, TestUpdate,
};

/// In-memory stand-in for the Postgres backend. Used as the startup fallback
/// when the database is unreachable and as the test harness backend. Rows are
/// kept in insertion order to match the ordering contract of the trait.
#[derive(Default)]
pub(crate) struct MemoryRepository {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    teachers: Vec<TeacherAccount>,
    tests: Vec<Test>,
    submissions: Vec<Submission>,
    bank_questions: Vec<BankQuestion>,
}

impl MemoryRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn backend(&self) -> Backend {
        Backend::Memory
    }

    async fn health(&self) -> Result<(), RepoError> {
        Ok(())
    }

    async fn create_teacher(&self, teacher: TeacherAccount) -> Result<TeacherAccount, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.teachers.iter().any(|row| row.email == teacher.email) {
            return Err(RepoError::Conflict(format!(
                "teacher with email {} already exists",
                teacher.email
            )));
        }
        tables.teachers.push(teacher.clone());
        Ok(teacher)
    }

    async fn find_teacher_by_email(
        &self,
        email: &str,
    ) -> Result<Option<TeacherAccount>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.teachers.iter().find(|row| row.email == email).cloned())
    }

    async fn find_teacher_by_id(&self, id: &str) -> Result<Option<TeacherAccount>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.teachers.iter().find(|row| row.id == id).cloned())
    }

    async fn create_test(&self, test: Test) -> Result<Test, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.tests.iter().any(|row| row.code.eq_ignore_ascii_case(&test.code)) {
            return Err(RepoError::Conflict(format!("test code {} already exists", test.code)));
        }
        tables.tests.push(test.clone());
        Ok(test)
    }

    async fn find_test_by_id(&self, id: &str) -> Result<Option<Test>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.tests.iter().find(|row| row.id == id).cloned())
    }

    async fn find_test_by_code(&self, code: &str) -> Result<Option<Test>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tests
            .iter()
            .find(|row| row.is_active && row.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn list_teacher_tests(&self, teacher_id: &str) -> Result<Vec<Test>, RepoError> {
        let tables = self.tables.read().await;
        let mut tests: Vec<Test> =
            tables.tests.iter().filter(|row| row.teacher_id == teacher_id).cloned().collect();
        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tests)
    }

    async fn update_test(&self, id: &str, update: TestUpdate) -> Result<Test, RepoError> {
        let mut tables = self.tables.write().await;
        let test = tables
            .tests
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound("test"))?;

        if let Some(title) = update.title {
            test.title = title;
        }
        if let Some(subject) = update.subject {
            test.subject = subject;
        }
        if let Some(class_name) = update.class_name {
            test.class_name = class_name;
        }
        if let Some(chapter) = update.chapter {
            test.chapter = Some(chapter);
        }
        if let Some(time_limit_minutes) = update.time_limit_minutes {
            test.time_limit_minutes = time_limit_minutes;
        }
        if let Some(questions) = update.questions {
            test.questions = Json(questions);
        }
        if let Some(is_active) = update.is_active {
            test.is_active = is_active;
        }

        Ok(test.clone())
    }

    async fn delete_test(&self, id: &str) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.tests.retain(|row| row.id != id);
        tables.submissions.retain(|row| row.test_id != id);
        Ok(())
    }

    async fn create_submission(&self, submission: Submission) -> Result<Submission, RepoError> {
        let mut tables = self.tables.write().await;
        tables.submissions.push(submission.clone());
        Ok(submission)
    }

    async fn find_submission_by_id(&self, id: &str) -> Result<Option<Submission>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.submissions.iter().find(|row| row.id == id).cloned())
    }

    async fn list_test_submissions(&self, test_id: &str) -> Result<Vec<Submission>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.submissions.iter().filter(|row| row.test_id == test_id).cloned().collect())
    }

    async fn update_submission_grade(
        &self,
        id: &str,
        manual_score: i32,
        graded_at: PrimitiveDateTime,
    ) -> Result<Submission, RepoError> {
        let mut tables = self.tables.write().await;
        let submission = tables
            .submissions
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound("submission"))?;

        submission.manual_score = Some(manual_score);
        submission.graded_at = Some(graded_at);
        submission.status = SubmissionStatus::Graded;

        Ok(submission.clone())
    }

    async fn add_question(&self, question: BankQuestion) -> Result<BankQuestion, RepoError> {
        let mut tables = self.tables.write().await;
        tables.bank_questions.push(question.clone());
        Ok(question)
    }

    async fn list_teacher_questions(
        &self,
        teacher_id: &str,
    ) -> Result<Vec<BankQuestion>, RepoError> {
        let tables = self.tables.read().await;
        let mut questions: Vec<BankQuestion> = tables
            .bank_questions
            .iter()
            .filter(|row| row.teacher_id == teacher_id)
            .cloned()
            .collect();
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(questions)
    }

    async fn update_question(
        &self,
        id: &str,
        update: BankQuestionUpdate,
    ) -> Result<BankQuestion, RepoError> {
        let mut tables = self.tables.write().await;
        let question = tables
            .bank_questions
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound("question"))?;

        if let Some(kind) = update.kind {
            question.kind = kind;
        }
        if let Some(text) = update.text {
            question.text = text;
        }
        if let Some(options) = update.options {
            question.options = Json(options);
        }
        if let Some(correct_answer) = update.correct_answer {
            question.correct_answer = Some(correct_answer);
        }
        if let Some(marks) = update.marks {
            question.marks = marks;
        }
        if let Some(subject) = update.subject {
            question.subject = subject;
        }
        if let Some(topic) = update.topic {
            question.topic = Some(topic);
        }
        if let Some(difficulty) = update.difficulty {
            question.difficulty = difficulty;
        }

        Ok(question.clone())
    }

    async fn delete_question(&self, id: &str) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.bank_questions.retain(|row| row.id != id);
        Ok(())
    }
}
