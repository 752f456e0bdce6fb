mod choices;
mod controller;
mod drill;
mod flow;
mod machine;
mod pool;
mod progress;
mod timer;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use choices::ChoiceGenerator;
pub use controller::{Pacing, SessionController};
pub use drill::DrillService;
pub use flow::{ExamFlow, FlowStage};
pub use machine::{
    RejectReason, Session, SessionEvent, SessionPhase, SessionRules, Step, StepOutcome, grade,
};
pub use pool::{QuestionPool, VocabularyPool};
pub use progress::SessionProgress;
pub use timer::{Countdown, QuestionTimer};
