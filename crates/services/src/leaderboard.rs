//! Read-only ranking and analytics over the result history.

use std::collections::HashMap;
use std::sync::Arc;

use assess_core::model::{Role, StudentId};
use assess_core::ranking::{
    self, LeaderboardEntry, LeaderboardRanker, RankingFormula, StudentStats,
};
use serde::Serialize;
use storage::repository::{ExamCatalog, ResultScope, ResultStore, RosterRepository};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::LeaderboardError;

/// Teacher overview of the class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassOverview {
    pub entries: Vec<LeaderboardEntry>,
    pub class_average: u32,
    pub most_active: Option<LeaderboardEntry>,
}

/// Computes leaderboards on demand. Holds no per-request state, so
/// concurrent callers never interfere.
#[derive(Clone)]
pub struct LeaderboardService {
    roster: Arc<dyn RosterRepository>,
    results: Arc<dyn ResultStore>,
    exams: Arc<dyn ExamCatalog>,
    config: EngineConfig,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(
        roster: Arc<dyn RosterRepository>,
        results: Arc<dyn ResultStore>,
        exams: Arc<dyn ExamCatalog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            roster,
            results,
            exams,
            config,
        }
    }

    /// Activity-weighted leaderboard.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if any collaborator fails.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.ranked_by(self.config.weighted_formula()).await
    }

    /// Ranking with an explicit formula.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if any collaborator fails.
    pub async fn ranked_by(
        &self,
        formula: RankingFormula,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let ranker = self.config.ranker(formula);
        self.rank_with(ranker).await
    }

    /// Average-only ranking with class average and the most active learner.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if any collaborator fails.
    pub async fn class_overview(&self) -> Result<ClassOverview, LeaderboardError> {
        let entries = self.ranked_by(RankingFormula::AverageOnly).await?;
        Ok(ClassOverview {
            class_average: ranking::class_average(&entries),
            most_active: ranking::most_active(&entries).cloned(),
            entries,
        })
    }

    /// History digest for one learner across exams and drills.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if the result store fails.
    pub async fn student_stats(&self, student: StudentId) -> Result<StudentStats, LeaderboardError> {
        let records = self
            .results
            .results_for_student(student, ResultScope::All)
            .await?;
        Ok(ranking::student_stats(&records))
    }

    async fn rank_with(
        &self,
        ranker: LeaderboardRanker,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let roster = self.roster.students_with_role(Role::Student).await?;
        let results = self.results.list_results(self.config.result_scope()).await?;
        let exam_types: HashMap<_, _> = self
            .exams
            .list_exams()
            .await?
            .into_iter()
            .map(|exam| (exam.id, exam.exam_type))
            .collect();

        let entries = ranker.rank(&roster, &results, &exam_types);
        debug!(
            learners = roster.len(),
            results = results.len(),
            ranked = entries.len(),
            "leaderboard computed"
        );
        Ok(entries)
    }
}
