use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("multiple-choice question has no options")]
    NoOptions,

    #[error("correct answer is empty")]
    EmptyAnswer,
}

//
// ─── QUESTION KIND ────────────────────────────────────────────────────────────
//

/// Catalog section label marking written (free-text) exam parts.
const WRITTEN_SECTION_MARKER: &str = "Schriftlicher";

/// How a question is answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Pick one of a fixed, ordered option list.
    MultipleChoice { options: Vec<String> },
    /// Type a written answer.
    FreeText,
}

impl QuestionKind {
    /// Returns true when a catalog question-type label denotes a written answer.
    ///
    /// Catalog labels are section names such as `"Schriftlicher Ausdruck"`;
    /// the literal `free_text` is accepted as well.
    #[must_use]
    pub fn label_is_free_text(label: &str) -> bool {
        let label = label.trim();
        label.eq_ignore_ascii_case("free_text") || label.contains(WRITTEN_SECTION_MARKER)
    }

    #[must_use]
    pub fn is_free_text(&self) -> bool {
        matches!(self, QuestionKind::FreeText)
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        match self {
            QuestionKind::MultipleChoice { options } => options,
            QuestionKind::FreeText => &[],
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// An assessable item, immutable once loaded into a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    context: Option<String>,
    kind: QuestionKind,
    correct_answer: String,
    order_index: u32,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` for a blank prompt and
    /// `QuestionError::NoOptions` for a multiple-choice question without options.
    /// Multiple-choice questions also need a non-blank correct answer.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        context: Option<String>,
        kind: QuestionKind,
        correct_answer: impl Into<String>,
        order_index: u32,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        let correct_answer = correct_answer.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if let QuestionKind::MultipleChoice { options } = &kind {
            if options.is_empty() {
                return Err(QuestionError::NoOptions);
            }
            if correct_answer.trim().is_empty() {
                return Err(QuestionError::EmptyAnswer);
            }
        }
        let context = context.filter(|c| !c.trim().is_empty());

        Ok(Self {
            id,
            prompt,
            context,
            kind,
            correct_answer,
            order_index,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Optional reading passage shown above the prompt.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        self.kind.options()
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    /// Same question at another position.
    #[must_use]
    pub fn at_position(mut self, order_index: u32) -> Self {
        self.order_index = order_index;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mc(options: &[&str]) -> QuestionKind {
        QuestionKind::MultipleChoice {
            options: options.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn written_section_labels_are_free_text() {
        assert!(QuestionKind::label_is_free_text("Schriftlicher Ausdruck"));
        assert!(QuestionKind::label_is_free_text("free_text"));
        assert!(!QuestionKind::label_is_free_text("Leseverstehen"));
    }

    #[test]
    fn rejects_blank_prompt() {
        let err = Question::new(QuestionId::new(1), "  ", None, QuestionKind::FreeText, "", 0)
            .unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn multiple_choice_needs_options() {
        let err = Question::new(QuestionId::new(1), "Q", None, mc(&[]), "a", 0).unwrap_err();
        assert_eq!(err, QuestionError::NoOptions);
    }

    #[test]
    fn free_text_may_have_empty_answer_key() {
        let q = Question::new(QuestionId::new(1), "Write", None, QuestionKind::FreeText, "", 3)
            .unwrap();
        assert!(q.kind().is_free_text());
        assert!(q.options().is_empty());
        assert_eq!(q.order_index(), 3);
    }

    #[test]
    fn blank_context_is_dropped() {
        let q = Question::new(
            QuestionId::new(1),
            "Q",
            Some("   ".into()),
            mc(&["a", "b"]),
            "a",
            0,
        )
        .unwrap();
        assert_eq!(q.context(), None);
    }
}
