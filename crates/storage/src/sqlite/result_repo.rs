use assess_core::model::{ResultDetails, ResultRecord, SessionKind, StudentId};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_exam_result_row, map_progress_row, ser};
use crate::repository::{ResultScope, ResultStore, StorageError};

const SELECT_EXAM_RESULTS: &str = r"
    SELECT user_id, exam_id, score, total_questions, details, created_at
    FROM exam_results
    WHERE (?1 IS NULL OR user_id = ?1)
    ORDER BY id ASC
";

const SELECT_PROGRESS: &str = r"
    SELECT user_id, quiz_type, score, total_questions, incorrect_words, created_at
    FROM progress
    WHERE (?1 IS NULL OR user_id = ?1)
    ORDER BY id ASC
";

impl SqliteRepository {
    async fn fetch_results(
        &self,
        scope: ResultScope,
        student: Option<StudentId>,
    ) -> Result<Vec<ResultRecord>, StorageError> {
        let user = student.map(|s| s.to_string());
        let mut out = Vec::new();

        if scope.includes_exams() {
            let rows = sqlx::query(SELECT_EXAM_RESULTS)
                .bind(user.as_deref())
                .fetch_all(&self.pool)
                .await
                .map_err(conn)?;
            for row in &rows {
                out.push(map_exam_result_row(row)?);
            }
        }

        if scope.includes_drills() {
            let rows = sqlx::query(SELECT_PROGRESS)
                .bind(user.as_deref())
                .fetch_all(&self.pool)
                .await
                .map_err(conn)?;
            for row in &rows {
                out.push(map_progress_row(row)?);
            }
        }

        // Both tables are append-only; interleave them by completion time.
        out.sort_by_key(ResultRecord::completed_at);
        Ok(out)
    }
}

#[async_trait::async_trait]
impl ResultStore for SqliteRepository {
    async fn append_result(&self, record: &ResultRecord) -> Result<i64, StorageError> {
        let user = record.student_id().to_string();
        let score = i64::from(record.score());
        let total = i64::from(record.total());

        let res = match (record.kind(), record.details()) {
            (SessionKind::Exam(exam_id), ResultDetails::Exam(log)) => sqlx::query(
                r"
                INSERT INTO exam_results (user_id, exam_id, score, total_questions, details, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(user)
            .bind(id_i64("exam_id", exam_id.value())?)
            .bind(score)
            .bind(total)
            .bind(serde_json::to_string(log).map_err(ser)?)
            .bind(record.completed_at())
            .execute(&self.pool)
            .await
            .map_err(conn)?,
            (SessionKind::Drill(drill), ResultDetails::Drill(missed)) => sqlx::query(
                r"
                INSERT INTO progress (user_id, quiz_type, score, total_questions, incorrect_words, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(user)
            .bind(drill.label())
            .bind(score)
            .bind(total)
            .bind(serde_json::to_string(missed).map_err(ser)?)
            .bind(record.completed_at())
            .execute(&self.pool)
            .await
            .map_err(conn)?,
            _ => {
                return Err(StorageError::Serialization(
                    "details do not match the session kind".into(),
                ));
            }
        };

        Ok(res.last_insert_rowid())
    }

    async fn list_results(&self, scope: ResultScope) -> Result<Vec<ResultRecord>, StorageError> {
        self.fetch_results(scope, None).await
    }

    async fn results_for_student(
        &self,
        student: StudentId,
        scope: ResultScope,
    ) -> Result<Vec<ResultRecord>, StorageError> {
        self.fetch_results(scope, Some(student)).await
    }
}
