use std::str::FromStr;

use assess_core::model::{
    DrillKind, ExamDescriptor, ExamId, ExamType, Question, QuestionId, QuestionKind,
    ResultDetails, ResultRecord, Role, SessionKind, Student, StudentId, VocabularyItem, WordId,
};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

/// Label written for questions answered by typing.
pub(crate) const FREE_TEXT_LABEL: &str = "free_text";
/// Label written for questions answered by picking an option.
pub(crate) const MULTIPLE_CHOICE_LABEL: &str = "multiple_choice";

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Like [`conn`], but a unique-key violation becomes `Conflict`.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => conn(e),
    }
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn student_id_from_str(raw: &str) -> Result<StudentId, StorageError> {
    StudentId::from_str(raw).map_err(ser)
}

/// Decode the `options` column.
///
/// Accepts a JSON array of strings, or a JSON string whose content is such an
/// array. `NULL` and empty text decode to no options.
pub(crate) fn parse_options(raw: Option<&str>) -> Result<Vec<String>, StorageError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<serde_json::Value>(raw).map_err(ser)? {
        serde_json::Value::Array(_) => serde_json::from_str(raw).map_err(ser),
        serde_json::Value::String(inner) => parse_options(Some(&inner)),
        serde_json::Value::Null => Ok(Vec::new()),
        other => Err(StorageError::Serialization(format!(
            "options must be a list, got {other}"
        ))),
    }
}

pub(crate) fn kind_label(kind: &QuestionKind) -> &'static str {
    if kind.is_free_text() {
        FREE_TEXT_LABEL
    } else {
        MULTIPLE_CHOICE_LABEL
    }
}

pub(crate) fn map_exam_row(row: &SqliteRow) -> Result<ExamDescriptor, StorageError> {
    let exam_type: String = row.try_get("exam_type").map_err(ser)?;
    Ok(ExamDescriptor::new(
        ExamId::new(u64_from_i64("exam_id", row.try_get("id").map_err(ser)?)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        ExamType::from_str(&exam_type).map_err(ser)?,
        i32::try_from(row.try_get::<i64, _>("year").map_err(ser)?).map_err(ser)?,
    ))
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let label: String = row.try_get("question_type").map_err(ser)?;
    let kind = if QuestionKind::label_is_free_text(&label) {
        QuestionKind::FreeText
    } else {
        let raw: Option<String> = row.try_get("options").map_err(ser)?;
        QuestionKind::MultipleChoice {
            options: parse_options(raw.as_deref())?,
        }
    };

    Question::new(
        QuestionId::new(u64_from_i64("question_id", row.try_get("id").map_err(ser)?)?),
        row.try_get::<String, _>("question_text").map_err(ser)?,
        row.try_get::<Option<String>, _>("context_text").map_err(ser)?,
        kind,
        row.try_get::<String, _>("correct_answer").map_err(ser)?,
        u32_from_i64("order_index", row.try_get("order_index").map_err(ser)?)?,
    )
    .map_err(ser)
}

pub(crate) fn map_word_row(row: &SqliteRow) -> Result<VocabularyItem, StorageError> {
    let mut item = VocabularyItem::shared(
        WordId::new(u64_from_i64("word_id", row.try_get("id").map_err(ser)?)?),
        row.try_get::<String, _>("german").map_err(ser)?,
        row.try_get::<String, _>("translation").map_err(ser)?,
    );
    item.lesson = row.try_get("lesson").map_err(ser)?;
    item.owner = row
        .try_get::<Option<String>, _>("owner_id")
        .map_err(ser)?
        .as_deref()
        .map(student_id_from_str)
        .transpose()?;
    Ok(item)
}

pub(crate) fn map_profile_row(row: &SqliteRow) -> Result<Student, StorageError> {
    let role: String = row.try_get("role").map_err(ser)?;
    Ok(Student {
        id: student_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?,
        first_name: row.try_get("first_name").map_err(ser)?,
        last_name: row.try_get("last_name").map_err(ser)?,
        role: Role::parse(&role)
            .ok_or_else(|| StorageError::Serialization(format!("invalid role: {role}")))?,
    })
}

pub(crate) fn map_exam_result_row(row: &SqliteRow) -> Result<ResultRecord, StorageError> {
    let details: String = row.try_get("details").map_err(ser)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;
    ResultRecord::new(
        student_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        SessionKind::Exam(ExamId::new(u64_from_i64(
            "exam_id",
            row.try_get("exam_id").map_err(ser)?,
        )?)),
        u32_from_i64("score", row.try_get("score").map_err(ser)?)?,
        u32_from_i64("total_questions", row.try_get("total_questions").map_err(ser)?)?,
        ResultDetails::Exam(serde_json::from_str(&details).map_err(ser)?),
        created_at,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ResultRecord, StorageError> {
    let quiz_type: String = row.try_get("quiz_type").map_err(ser)?;
    let drill = DrillKind::from_label(&quiz_type)
        .ok_or_else(|| StorageError::Serialization(format!("unknown quiz type: {quiz_type}")))?;
    let incorrect: String = row.try_get("incorrect_words").map_err(ser)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;
    ResultRecord::new(
        student_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        SessionKind::Drill(drill),
        u32_from_i64("score", row.try_get("score").map_err(ser)?)?,
        u32_from_i64("total_questions", row.try_get("total_questions").map_err(ser)?)?,
        ResultDetails::Drill(serde_json::from_str(&incorrect).map_err(ser)?),
        created_at,
    )
    .map_err(ser)
}
