//! Score aggregation over a session's answer log.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerRecord, IncorrectItem};

/// Tally of a finished (or in-progress) session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
}

impl ScoreSummary {
    /// Percentage at which a session counts as passed.
    pub const PASS_MARK: u32 = 50;

    #[must_use]
    pub fn passed(&self) -> bool {
        self.percentage >= Self::PASS_MARK
    }
}

/// `score / total * 100` without rounding; 0 when `total` is 0.
#[must_use]
pub fn ratio_percent(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(score) / f64::from(total) * 100.0
}

/// `round(100 * score / total)` with halves rounded up; 0 when `total` is 0.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score);
    let total = u64::from(total);
    let rounded = (200 * score + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Count records and correct answers.
#[must_use]
pub fn summarize(records: &[AnswerRecord]) -> ScoreSummary {
    let total = count_u32(records.len());
    let score = count_u32(records.iter().filter(|r| r.is_correct).count());
    ScoreSummary {
        score,
        total,
        percentage: percentage(score, total),
    }
}

/// Exam review list: every record with its correctness flag, in answer order.
#[must_use]
pub fn review_list(records: &[AnswerRecord]) -> Vec<AnswerRecord> {
    records.to_vec()
}

/// Vocabulary review list: only the missed items.
#[must_use]
pub fn incorrect_items(records: &[AnswerRecord]) -> Vec<IncorrectItem> {
    records
        .iter()
        .filter(|r| !r.is_correct)
        .map(IncorrectItem::from_record)
        .collect()
}
