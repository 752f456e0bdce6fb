use assess_core::model::{ExamDescriptor, ExamId, ExamType, Question, VocabularyItem};

use super::SqliteRepository;
use super::mapping::{
    conn, id_i64, kind_label, map_exam_row, map_question_row, map_word_row, ser, write_err,
};
use crate::repository::{ExamCatalog, StorageError, VocabularyCatalog, VocabularyFilter};

impl SqliteRepository {
    /// Insert or replace an exam together with its full question list.
    ///
    /// Question ids are scoped to their exam.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a question id repeats within the
    /// exam, and another `StorageError` if serialization or any write fails.
    /// The exam is left untouched in either case.
    pub async fn upsert_exam(
        &self,
        exam: &ExamDescriptor,
        questions: &[Question],
    ) -> Result<(), StorageError> {
        let exam_id = id_i64("exam_id", exam.id.value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO exams (id, title, exam_type, year)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                exam_type = excluded.exam_type,
                year = excluded.year
            ",
        )
        .bind(exam_id)
        .bind(&exam.title)
        .bind(exam.exam_type.code())
        .bind(i64::from(exam.year))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM exam_questions WHERE exam_id = ?1")
            .bind(exam_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for question in questions {
            let options = if question.kind().is_free_text() {
                None
            } else {
                Some(serde_json::to_string(question.options()).map_err(ser)?)
            };
            sqlx::query(
                r"
                INSERT INTO exam_questions (
                    id, exam_id, question_text, context_text, question_type,
                    options, correct_answer, order_index
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(id_i64("question_id", question.id().value())?)
            .bind(exam_id)
            .bind(question.prompt())
            .bind(question.context())
            .bind(kind_label(question.kind()))
            .bind(options)
            .bind(question.correct_answer())
            .bind(i64::from(question.order_index()))
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    /// Insert or replace a vocabulary entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn upsert_word(&self, word: &VocabularyItem) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO words (id, german, translation, lesson, owner_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                german = excluded.german,
                translation = excluded.translation,
                lesson = excluded.lesson,
                owner_id = excluded.owner_id
            ",
        )
        .bind(id_i64("word_id", word.id.value())?)
        .bind(&word.term)
        .bind(&word.translation)
        .bind(word.lesson.as_deref())
        .bind(word.owner.map(|o| o.to_string()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ExamCatalog for SqliteRepository {
    async fn exams_by_type(&self, exam_type: ExamType) -> Result<Vec<ExamDescriptor>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, exam_type, year
            FROM exams
            WHERE exam_type = ?1
            ORDER BY year DESC, id ASC
            ",
        )
        .bind(exam_type.code())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_exam_row).collect()
    }

    async fn list_exams(&self) -> Result<Vec<ExamDescriptor>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, exam_type, year
            FROM exams
            ORDER BY year DESC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_exam_row).collect()
    }

    async fn exam_questions(&self, exam_id: ExamId) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, question_text, context_text, question_type, options, correct_answer, order_index
            FROM exam_questions
            WHERE exam_id = ?1
            ORDER BY order_index ASC, id ASC
            ",
        )
        .bind(id_i64("exam_id", exam_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }
}

#[async_trait::async_trait]
impl VocabularyCatalog for SqliteRepository {
    async fn words(&self, filter: &VocabularyFilter) -> Result<Vec<VocabularyItem>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, german, translation, lesson, owner_id
            FROM words
            WHERE (owner_id IS NULL OR owner_id = ?1)
              AND (?2 IS NULL OR lesson = ?2)
            ORDER BY id ASC
            ",
        )
        .bind(filter.viewer.map(|v| v.to_string()))
        .bind(filter.lesson.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_word_row).collect()
    }
}
