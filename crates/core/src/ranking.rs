//! Leaderboard computation over historical results.
//!
//! Everything here is a pure read-then-compute pass: no state is shared
//! between calls, so viewers may rank concurrently.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::model::{ExamId, ExamType, ResultRecord, Role, Student, StudentId};

/// How the rank score is derived from a learner's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingFormula {
    /// Rank by average percentage alone (simple analytics view).
    AverageOnly,
    /// `average + weight * sessions` (leaderboard view).
    ActivityWeighted { weight: u32 },
}

impl Default for RankingFormula {
    fn default() -> Self {
        RankingFormula::ActivityWeighted { weight: 5 }
    }
}

impl RankingFormula {
    #[must_use]
    pub fn rank_score(self, average_percentage: u32, sessions_count: u32) -> u32 {
        match self {
            RankingFormula::AverageOnly => average_percentage,
            RankingFormula::ActivityWeighted { weight } => {
                average_percentage.saturating_add(weight.saturating_mul(sessions_count))
            }
        }
    }
}

/// One ranked learner. Recomputed on every request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub student_id: StudentId,
    pub display_name: String,
    pub sessions_count: u32,
    pub average_percentage: u32,
    pub rank_score: u32,
    pub exam_types: BTreeSet<ExamType>,
}

/// Coarse performance band used by teacher views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Standing {
    Strong,
    Fair,
    NeedsAttention,
}

impl Standing {
    #[must_use]
    pub fn from_average(average_percentage: u32) -> Self {
        match average_percentage {
            80.. => Standing::Strong,
            50..=79 => Standing::Fair,
            _ => Standing::NeedsAttention,
        }
    }
}

/// Per-learner history digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentStats {
    pub sessions_count: u32,
    pub average_percentage: u32,
    pub best_percentage: u32,
    pub last_active: Option<DateTime<Utc>>,
}

impl StudentStats {
    #[must_use]
    pub fn standing(&self) -> Option<Standing> {
        (self.sessions_count > 0).then(|| Standing::from_average(self.average_percentage))
    }
}

fn average_of<'a>(records: impl IntoIterator<Item = &'a ResultRecord>) -> (u32, u32) {
    let mut count = 0u32;
    let mut sum = 0.0;
    for record in records {
        count = count.saturating_add(1);
        sum += record.ratio_percent();
    }
    if count == 0 {
        return (0, 0);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let average = (sum / f64::from(count)).round() as u32;
    (count, average)
}

/// Summarize one learner's results.
#[must_use]
pub fn student_stats(records: &[ResultRecord]) -> StudentStats {
    let (sessions_count, average_percentage) = average_of(records);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let best_percentage = records
        .iter()
        .map(|r| r.ratio_percent().round() as u32)
        .max()
        .unwrap_or(0);
    StudentStats {
        sessions_count,
        average_percentage,
        best_percentage,
        last_active: records.iter().map(ResultRecord::completed_at).max(),
    }
}

/// Ranks learners from a roster and their result history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardRanker {
    formula: RankingFormula,
    limit: usize,
}

impl Default for LeaderboardRanker {
    fn default() -> Self {
        Self {
            formula: RankingFormula::default(),
            limit: 10,
        }
    }
}

impl LeaderboardRanker {
    #[must_use]
    pub fn new(formula: RankingFormula, limit: usize) -> Self {
        Self { formula, limit }
    }

    #[must_use]
    pub fn formula(&self) -> RankingFormula {
        self.formula
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Rank every learner on the roster.
    ///
    /// Non-learner profiles are skipped. Learners are sorted by rank score,
    /// highest first; equal scores keep roster order. The list is cut to the
    /// ranker's limit. `exam_types` resolves exam ids to their category for the
    /// attempted-types set; unknown ids are left out of that set.
    #[must_use]
    pub fn rank(
        &self,
        roster: &[Student],
        results: &[ResultRecord],
        exam_types: &HashMap<ExamId, ExamType>,
    ) -> Vec<LeaderboardEntry> {
        let mut by_student: HashMap<StudentId, Vec<&ResultRecord>> = HashMap::new();
        for record in results {
            by_student.entry(record.student_id()).or_default().push(record);
        }

        let mut entries: Vec<LeaderboardEntry> = roster
            .iter()
            .filter(|s| s.role == Role::Student)
            .map(|student| {
                let history = by_student.get(&student.id).map_or(&[][..], Vec::as_slice);
                let (sessions_count, average_percentage) = average_of(history.iter().copied());
                let exam_types = history
                    .iter()
                    .filter_map(|r| r.exam_id())
                    .filter_map(|id| exam_types.get(&id).copied())
                    .collect();
                LeaderboardEntry {
                    student_id: student.id,
                    display_name: student.display_name(),
                    sessions_count,
                    average_percentage,
                    rank_score: self.formula.rank_score(average_percentage, sessions_count),
                    exam_types,
                }
            })
            .collect();

        // `sort_by` is stable, which keeps roster order for ties.
        entries.sort_by(|a, b| b.rank_score.cmp(&a.rank_score));
        entries.truncate(self.limit);
        entries
    }
}

/// Rounded mean of the entries' averages; 0 for an empty board.
#[must_use]
pub fn class_average(entries: &[LeaderboardEntry]) -> u32 {
    if entries.is_empty() {
        return 0;
    }
    let sum: f64 = entries.iter().map(|e| f64::from(e.average_percentage)).sum();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let average = (sum / entries.len() as f64).round() as u32;
    average
}

/// Entry with the most sessions; the earlier entry wins a tie.
#[must_use]
pub fn most_active(entries: &[LeaderboardEntry]) -> Option<&LeaderboardEntry> {
    entries.iter().fold(None, |best, entry| match best {
        Some(b) if b.sessions_count >= entry.sessions_count => Some(b),
        _ => Some(entry),
    })
}
