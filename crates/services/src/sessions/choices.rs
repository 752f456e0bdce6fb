use std::collections::HashSet;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::error::ChoiceError;

/// Builds the option list for one multiple-choice item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceGenerator {
    distractors: usize,
}

impl Default for ChoiceGenerator {
    fn default() -> Self {
        Self { distractors: 3 }
    }
}

impl ChoiceGenerator {
    #[must_use]
    pub fn new(distractors: usize) -> Self {
        Self { distractors }
    }

    #[must_use]
    pub fn distractors(&self) -> usize {
        self.distractors
    }

    /// Number of options every generated list holds.
    #[must_use]
    pub fn option_count(&self) -> usize {
        self.distractors + 1
    }

    /// Pick distractors from `pool` and shuffle them together with `correct`.
    ///
    /// Pool values are trimmed and de-duplicated; values equal to the trimmed
    /// correct answer never become distractors. The correct answer appears
    /// exactly once in the output.
    ///
    /// # Errors
    ///
    /// Returns `ChoiceError::NotEnoughDistractors` when the pool holds fewer
    /// distinct wrong values than required.
    pub fn generate<'a, R>(
        &self,
        correct: &str,
        pool: impl IntoIterator<Item = &'a str>,
        rng: &mut R,
    ) -> Result<Vec<String>, ChoiceError>
    where
        R: Rng + ?Sized,
    {
        let correct = correct.trim();
        let mut seen = HashSet::new();
        let candidates: Vec<&str> = pool
            .into_iter()
            .map(str::trim)
            .filter(|value| !value.is_empty() && *value != correct)
            .filter(|value| seen.insert(*value))
            .collect();

        if candidates.len() < self.distractors {
            return Err(ChoiceError::NotEnoughDistractors {
                available: candidates.len(),
                required: self.distractors,
            });
        }

        let mut options: Vec<String> = candidates
            .choose_multiple(rng, self.distractors)
            .map(|value| (*value).to_string())
            .collect();
        options.push(correct.to_string());
        options.shuffle(rng);
        Ok(options)
    }
}
