use std::fmt;

/// Position of the learner within one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based number of the question on screen; stays on the last one once
    /// the attempt is finished.
    pub question_number: usize,
    pub total: usize,
    pub answered: usize,
    pub correct: u32,
}

impl SessionProgress {
    #[must_use]
    pub fn remaining(self) -> usize {
        self.total.saturating_sub(self.answered)
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        self.answered >= self.total
    }
}

/// `3/10`, the question counter shown above each prompt.
impl fmt::Display for SessionProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.question_number, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_and_remaining() {
        let progress = SessionProgress {
            question_number: 3,
            total: 10,
            answered: 2,
            correct: 1,
        };
        assert_eq!(progress.to_string(), "3/10");
        assert_eq!(progress.remaining(), 8);
        assert!(!progress.is_complete());
    }
}
