//! Engine tunables.

use std::time::Duration;

use assess_core::ranking::{LeaderboardRanker, RankingFormula};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use storage::repository::ResultScope;

/// Knobs for drills, exams and the leaderboard.
///
/// Every field has a default, so a partial config file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Words per vocabulary drill.
    pub drill_size: usize,
    /// Wrong options shown next to the right one.
    pub distractors: usize,
    /// Per-question limit for drills; 0 disables the countdown.
    pub question_time_limit_secs: u64,
    pub tick_interval_ms: u64,
    /// How long a graded drill answer stays on screen.
    pub feedback_pause_ms: u64,
    pub min_free_text_words: usize,
    pub leaderboard_limit: usize,
    /// Points per completed session in the activity-weighted rank score.
    pub activity_weight: u32,
    /// Fixed seed for sampling and shuffling; random when unset.
    pub rng_seed: Option<u64>,
    pub leaderboard_includes_drills: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drill_size: 10,
            distractors: 3,
            question_time_limit_secs: 5,
            tick_interval_ms: 1000,
            feedback_pause_ms: 1500,
            min_free_text_words: 2,
            leaderboard_limit: 10,
            activity_weight: 5,
            rng_seed: None,
            leaderboard_includes_drills: false,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn question_time_limit(&self) -> Option<Duration> {
        (self.question_time_limit_secs > 0)
            .then(|| Duration::from_secs(self.question_time_limit_secs))
    }

    /// Countdown tick; never zero.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    #[must_use]
    pub fn feedback_pause(&self) -> Duration {
        Duration::from_millis(self.feedback_pause_ms)
    }

    /// Distinct answer values a vocabulary pool needs before a drill may start.
    #[must_use]
    pub fn required_distinct_answers(&self) -> usize {
        self.distractors + 1
    }

    #[must_use]
    pub fn weighted_formula(&self) -> RankingFormula {
        RankingFormula::ActivityWeighted {
            weight: self.activity_weight,
        }
    }

    #[must_use]
    pub fn ranker(&self, formula: RankingFormula) -> LeaderboardRanker {
        LeaderboardRanker::new(formula, self.leaderboard_limit)
    }

    #[must_use]
    pub fn result_scope(&self) -> ResultScope {
        if self.leaderboard_includes_drills {
            ResultScope::All
        } else {
            ResultScope::ExamsOnly
        }
    }

    /// RNG for one session: seeded when configured, otherwise from the thread RNG.
    #[must_use]
    pub fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}
