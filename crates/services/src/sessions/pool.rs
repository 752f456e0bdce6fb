use std::collections::HashSet;
use std::sync::Arc;

use assess_core::model::{Question, VocabularyItem};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::warn;

use crate::error::SessionError;

//
// ─── EXAM POOL ─────────────────────────────────────────────────────────────────
//

/// Ordered question sequence of one exam.
#[derive(Debug, Clone)]
pub struct QuestionPool {
    questions: Arc<[Question]>,
}

impl QuestionPool {
    /// Sort `questions` by ascending order index.
    ///
    /// Order indices in the pool are unique: if the catalog repeats one, the
    /// questions keep their sorted (then catalog) order and are renumbered
    /// from zero.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when there are no questions.
    pub fn from_exam(mut questions: Vec<Question>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        questions.sort_by_key(Question::order_index);
        let repeated = questions
            .windows(2)
            .any(|pair| pair[0].order_index() == pair[1].order_index());
        if repeated {
            warn!(questions = questions.len(), "repeated order index in exam, renumbering");
            questions = questions
                .into_iter()
                .zip(0_u32..)
                .map(|(question, position)| question.at_position(position))
                .collect();
        }
        Ok(Self {
            questions: questions.into(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn into_shared(self) -> Arc<[Question]> {
        self.questions
    }
}

//
// ─── VOCABULARY POOL ───────────────────────────────────────────────────────────
//

/// Unordered vocabulary candidates for a drill.
#[derive(Debug, Clone)]
pub struct VocabularyPool {
    items: Vec<VocabularyItem>,
    distinct_answers: usize,
}

impl VocabularyPool {
    /// Build a pool, dropping entries with a blank term or translation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientPool` when fewer than
    /// `required_distinct` different answer values remain.
    pub fn new(items: Vec<VocabularyItem>, required_distinct: usize) -> Result<Self, SessionError> {
        let items: Vec<VocabularyItem> = items
            .into_iter()
            .filter(|item| !item.term.trim().is_empty() && !item.answer_value().is_empty())
            .collect();
        let distinct_answers = items
            .iter()
            .map(VocabularyItem::answer_value)
            .collect::<HashSet<_>>()
            .len();

        if distinct_answers < required_distinct {
            return Err(SessionError::InsufficientPool {
                available: distinct_answers,
                required: required_distinct,
            });
        }

        Ok(Self {
            items,
            distinct_answers,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn distinct_answers(&self) -> usize {
        self.distinct_answers
    }

    /// Every answer value in the pool, used as distractor candidates.
    pub fn answer_values(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(VocabularyItem::answer_value)
    }

    /// Draw up to `size` entries without replacement.
    pub fn sample<R>(&self, size: usize, rng: &mut R) -> Vec<&VocabularyItem>
    where
        R: Rng + ?Sized,
    {
        self.items.choose_multiple(rng, size).collect()
    }
}
