use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::Question;

/// Marker recorded in place of an answer when the question timer ran out.
pub const TIMEOUT_MARKER: &str = "No Answer (Timeout)";

/// Shown in review lists for an empty answer.
pub const NO_ANSWER_MARKER: &str = "No Answer";

/// What the learner handed in for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Submission {
    Answered(String),
    TimedOut,
}

impl Submission {
    /// Raw submitted text; empty for a timeout.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Submission::Answered(text) => text,
            Submission::TimedOut => "",
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Submission::TimedOut)
    }

    /// Text for review screens, substituting markers for missing answers.
    #[must_use]
    pub fn display(&self) -> &str {
        match self {
            Submission::TimedOut => TIMEOUT_MARKER,
            Submission::Answered(text) if text.trim().is_empty() => NO_ANSWER_MARKER,
            Submission::Answered(text) => text,
        }
    }
}

/// One graded question within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub order_index: u32,
    pub prompt: String,
    pub correct_answer: String,
    pub submission: Submission,
    pub is_correct: bool,
}

impl AnswerRecord {
    #[must_use]
    pub fn graded(question: &Question, submission: Submission, is_correct: bool) -> Self {
        Self {
            question_id: question.id(),
            order_index: question.order_index(),
            prompt: question.prompt().to_string(),
            correct_answer: question.correct_answer().to_string(),
            submission,
            is_correct,
        }
    }

    /// A timeout is always recorded as incorrect.
    #[must_use]
    pub fn timed_out(question: &Question) -> Self {
        Self::graded(question, Submission::TimedOut, false)
    }
}

/// A missed vocabulary item as persisted with a drill result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncorrectItem {
    pub term: String,
    pub correct: String,
    pub submitted: String,
}

impl IncorrectItem {
    #[must_use]
    pub fn from_record(record: &AnswerRecord) -> Self {
        let submitted = match &record.submission {
            Submission::TimedOut => TIMEOUT_MARKER.to_string(),
            Submission::Answered(text) => text.clone(),
        };
        Self {
            term: record.prompt.clone(),
            correct: record.correct_answer.clone(),
            submitted,
        }
    }
}
