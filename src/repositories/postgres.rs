use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{BankQuestion, Submission, TeacherAccount, Test};
use crate::db::types::SubmissionStatus;
use crate::repositories::{
    Backend, BankQuestionUpdate, RepoError, Repository, TestUpdate,
};

const TEACHER_COLUMNS: &str = "\
    id, email, hashed_password, name, subject, school, created_at";

const TEST_COLUMNS: &str = "\
    id, teacher_id, title, subject, class_name, chapter, code, \
    time_limit_minutes, questions, is_active, created_at";

const SUBMISSION_COLUMNS: &str = "\
    id, test_id, student_name, answers, auto_score, manual_score, total_marks, \
    time_spent_minutes, tab_switch_count, submitted_at, graded_at, status";

const BANK_QUESTION_COLUMNS: &str = "\
    id, teacher_id, kind, text, options, correct_answer, marks, subject, \
    topic, difficulty, created_at";

pub(crate) struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepoError::Conflict(db_err.message().to_string());
        }
    }
    RepoError::backend(err)
}

#[async_trait]
impl Repository for PgRepository {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    async fn health(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn create_teacher(&self, teacher: TeacherAccount) -> Result<TeacherAccount, RepoError> {
        sqlx::query_as::<_, TeacherAccount>(&format!(
            "INSERT INTO teachers (id, email, hashed_password, name, subject, school, created_at)
             VALUES ($1,$2,$3,$4,$5,$6,$7)
             RETURNING {TEACHER_COLUMNS}",
        ))
        .bind(&teacher.id)
        .bind(&teacher.email)
        .bind(&teacher.hashed_password)
        .bind(&teacher.name)
        .bind(&teacher.subject)
        .bind(&teacher.school)
        .bind(teacher.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn find_teacher_by_email(
        &self,
        email: &str,
    ) -> Result<Option<TeacherAccount>, RepoError> {
        sqlx::query_as::<_, TeacherAccount>(&format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn find_teacher_by_id(&self, id: &str) -> Result<Option<TeacherAccount>, RepoError> {
        sqlx::query_as::<_, TeacherAccount>(&format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn create_test(&self, test: Test) -> Result<Test, RepoError> {
        sqlx::query_as::<_, Test>(&format!(
            "INSERT INTO tests (
                id, teacher_id, title, subject, class_name, chapter, code,
                time_limit_minutes, questions, is_active, created_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
            RETURNING {TEST_COLUMNS}",
        ))
        .bind(&test.id)
        .bind(&test.teacher_id)
        .bind(&test.title)
        .bind(&test.subject)
        .bind(&test.class_name)
        .bind(&test.chapter)
        .bind(&test.code)
        .bind(test.time_limit_minutes)
        .bind(&test.questions)
        .bind(test.is_active)
        .bind(test.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn find_test_by_id(&self, id: &str) -> Result<Option<Test>, RepoError> {
        sqlx::query_as::<_, Test>(&format!("SELECT {TEST_COLUMNS} FROM tests WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn find_test_by_code(&self, code: &str) -> Result<Option<Test>, RepoError> {
        sqlx::query_as::<_, Test>(&format!(
            "SELECT {TEST_COLUMNS} FROM tests WHERE UPPER(code) = UPPER($1) AND is_active"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn list_teacher_tests(&self, teacher_id: &str) -> Result<Vec<Test>, RepoError> {
        sqlx::query_as::<_, Test>(&format!(
            "SELECT {TEST_COLUMNS} FROM tests WHERE teacher_id = $1 ORDER BY created_at DESC"
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn update_test(&self, id: &str, update: TestUpdate) -> Result<Test, RepoError> {
        sqlx::query_as::<_, Test>(&format!(
            "UPDATE tests SET
                title = COALESCE($1, title),
                subject = COALESCE($2, subject),
                class_name = COALESCE($3, class_name),
                chapter = COALESCE($4, chapter),
                time_limit_minutes = COALESCE($5, time_limit_minutes),
                questions = COALESCE($6, questions),
                is_active = COALESCE($7, is_active)
             WHERE id = $8
             RETURNING {TEST_COLUMNS}",
        ))
        .bind(update.title)
        .bind(update.subject)
        .bind(update.class_name)
        .bind(update.chapter)
        .bind(update.time_limit_minutes)
        .bind(update.questions.map(Json))
        .bind(update.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or(RepoError::NotFound("test"))
    }

    async fn delete_test(&self, id: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM tests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn create_submission(&self, submission: Submission) -> Result<Submission, RepoError> {
        sqlx::query_as::<_, Submission>(&format!(
            "INSERT INTO submissions (
                id, test_id, student_name, answers, auto_score, manual_score,
                total_marks, time_spent_minutes, tab_switch_count, submitted_at,
                graded_at, status
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            RETURNING {SUBMISSION_COLUMNS}",
        ))
        .bind(&submission.id)
        .bind(&submission.test_id)
        .bind(&submission.student_name)
        .bind(&submission.answers)
        .bind(submission.auto_score)
        .bind(submission.manual_score)
        .bind(submission.total_marks)
        .bind(submission.time_spent_minutes)
        .bind(submission.tab_switch_count)
        .bind(submission.submitted_at)
        .bind(submission.graded_at)
        .bind(submission.status)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn find_submission_by_id(&self, id: &str) -> Result<Option<Submission>, RepoError> {
        sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn list_test_submissions(&self, test_id: &str) -> Result<Vec<Submission>, RepoError> {
        sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions \
             WHERE test_id = $1 ORDER BY submitted_at ASC, id ASC"
        ))
        .bind(test_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn update_submission_grade(
        &self,
        id: &str,
        manual_score: i32,
        graded_at: PrimitiveDateTime,
    ) -> Result<Submission, RepoError> {
        sqlx::query_as::<_, Submission>(&format!(
            "UPDATE submissions SET manual_score = $1, graded_at = $2, status = $3
             WHERE id = $4
             RETURNING {SUBMISSION_COLUMNS}",
        ))
        .bind(manual_score)
        .bind(graded_at)
        .bind(SubmissionStatus::Graded)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or(RepoError::NotFound("submission"))
    }

    async fn add_question(&self, question: BankQuestion) -> Result<BankQuestion, RepoError> {
        sqlx::query_as::<_, BankQuestion>(&format!(
            "INSERT INTO bank_questions (
                id, teacher_id, kind, text, options, correct_answer, marks,
                subject, topic, difficulty, created_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
            RETURNING {BANK_QUESTION_COLUMNS}",
        ))
        .bind(&question.id)
        .bind(&question.teacher_id)
        .bind(question.kind)
        .bind(&question.text)
        .bind(&question.options)
        .bind(&question.correct_answer)
        .bind(question.marks)
        .bind(&question.subject)
        .bind(&question.topic)
        .bind(question.difficulty)
        .bind(question.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn list_teacher_questions(
        &self,
        teacher_id: &str,
    ) -> Result<Vec<BankQuestion>, RepoError> {
        sqlx::query_as::<_, BankQuestion>(&format!(
            "SELECT {BANK_QUESTION_COLUMNS} FROM bank_questions \
             WHERE teacher_id = $1 ORDER BY created_at DESC"
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn update_question(
        &self,
        id: &str,
        update: BankQuestionUpdate,
    ) -> Result<BankQuestion, RepoError> {
        sqlx::query_as::<_, BankQuestion>(&format!(
            "UPDATE bank_questions SET
                kind = COALESCE($1, kind),
                text = COALESCE($2, text),
                options = COALESCE($3, options),
                correct_answer = COALESCE($4, correct_answer),
                marks = COALESCE($5, marks),
                subject = COALESCE($6, subject),
                topic = COALESCE($7, topic),
                difficulty = COALESCE($8, difficulty)
             WHERE id = $9
             RETURNING {BANK_QUESTION_COLUMNS}",
        ))
        .bind(update.kind)
        .bind(update.text)
        .bind(update.options.map(Json))
        .bind(update.correct_answer)
        .bind(update.marks)
        .bind(update.subject)
        .bind(update.topic)
        .bind(update.difficulty)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or(RepoError::NotFound("question"))
    }

    async fn delete_question(&self, id: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM bank_questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}
