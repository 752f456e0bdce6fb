#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod reporter;
pub mod sessions;

pub use assess_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use config::EngineConfig;
pub use error::{
    AppServicesError, ChoiceError, FlowError, LeaderboardError, ReportError, SessionError,
};
pub use leaderboard::{ClassOverview, LeaderboardService};
pub use reporter::{ReportOutcome, ResultReporter, SessionOutcome};

pub use sessions::{
    ChoiceGenerator, DrillService, ExamFlow, FlowStage, QuestionPool, Session, SessionController,
    SessionEvent, StepOutcome, VocabularyPool,
};
