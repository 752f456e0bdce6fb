//! Shared error types for the services crate.

use thiserror::Error;

use assess_core::model::{QuestionError, ResultRecordError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ChoiceGenerator`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChoiceError {
    #[error("need {required} distractor candidates, found {available}")]
    NotEnoughDistractors { available: usize, required: usize },
}

/// Errors emitted while starting or driving a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("vocabulary pool has {available} distinct answers, need at least {required}")]
    InsufficientPool { available: usize, required: usize },
    #[error(transparent)]
    Choice(#[from] ChoiceError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ExamFlow`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlowError {
    #[error("no exams available for this type")]
    NoExams,
    #[error("exam has no questions")]
    NoQuestions,
    #[error("action not available in the current stage")]
    InvalidStage,
    #[error("exam is not part of the current selection")]
    UnknownExam,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ResultReporter` when building a record.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Record(#[from] ResultRecordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LeaderboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
