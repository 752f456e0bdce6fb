use std::sync::Arc;

use storage::repository::{IdentityProvider, Storage};

use crate::Clock;
use crate::config::EngineConfig;
use crate::error::AppServicesError;
use crate::leaderboard::LeaderboardService;
use crate::reporter::ResultReporter;
use crate::sessions::{DrillService, ExamFlow};

/// Assembles the engine services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    config: EngineConfig,
    storage: Storage,
    identity: Arc<dyn IdentityProvider>,
    reporter: ResultReporter,
    drills: DrillService,
    leaderboard: LeaderboardService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: EngineConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, config, identity))
    }

    #[must_use]
    pub fn from_storage(
        storage: Storage,
        clock: Clock,
        config: EngineConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let reporter = ResultReporter::new(Arc::clone(&storage.results), Arc::clone(&identity));
        let drills = DrillService::new(
            clock,
            config.clone(),
            Arc::clone(&storage.vocabulary),
            Arc::clone(&identity),
            reporter.clone(),
        );
        let leaderboard = LeaderboardService::new(
            Arc::clone(&storage.roster),
            Arc::clone(&storage.results),
            Arc::clone(&storage.exams),
            config.clone(),
        );
        Self {
            clock,
            config,
            storage,
            identity,
            reporter,
            drills,
            leaderboard,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(&self.identity)
    }

    #[must_use]
    pub fn drills(&self) -> &DrillService {
        &self.drills
    }

    #[must_use]
    pub fn leaderboard(&self) -> &LeaderboardService {
        &self.leaderboard
    }

    /// A fresh exam flow at the type-selection stage.
    #[must_use]
    pub fn exam_flow(&self) -> ExamFlow {
        ExamFlow::new(
            self.clock,
            self.config.clone(),
            Arc::clone(&self.storage.exams),
            self.reporter.clone(),
        )
    }
}
