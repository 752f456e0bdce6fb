use serde::{Deserialize, Serialize};

use crate::model::ids::{StudentId, WordId};

/// A vocabulary entry: a German term and its translation.
///
/// Entries without an owner are shared with every learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub id: WordId,
    pub term: String,
    pub translation: String,
    pub lesson: Option<String>,
    pub owner: Option<StudentId>,
}

impl VocabularyItem {
    #[must_use]
    pub fn shared(id: WordId, term: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            id,
            term: term.into(),
            translation: translation.into(),
            lesson: None,
            owner: None,
        }
    }

    #[must_use]
    pub fn with_lesson(mut self, lesson: impl Into<String>) -> Self {
        self.lesson = Some(lesson.into());
        self
    }

    #[must_use]
    pub fn owned_by(mut self, owner: StudentId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// The value a learner must pick, compared after trimming.
    #[must_use]
    pub fn answer_value(&self) -> &str {
        self.translation.trim()
    }

    /// Returns true if `viewer` may practise this entry.
    #[must_use]
    pub fn is_visible_to(&self, viewer: Option<StudentId>) -> bool {
        match self.owner {
            None => true,
            Some(owner) => viewer == Some(owner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_words_are_visible_to_everyone() {
        let word = VocabularyItem::shared(WordId::new(1), "Haus", "بيت");
        assert!(word.is_visible_to(None));
        assert!(word.is_visible_to(Some(StudentId::random())));
    }

    #[test]
    fn owned_words_are_private() {
        let owner = StudentId::random();
        let word = VocabularyItem::shared(WordId::new(1), "Haus", "بيت").owned_by(owner);
        assert!(word.is_visible_to(Some(owner)));
        assert!(!word.is_visible_to(Some(StudentId::random())));
        assert!(!word.is_visible_to(None));
    }
}
