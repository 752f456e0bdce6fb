use std::time::Duration;

use assess_core::Clock;
use assess_core::model::{Question, SessionKind};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use super::machine::{Session, SessionEvent, StepOutcome};
use super::timer::QuestionTimer;
use crate::reporter::{ReportOutcome, ResultReporter, SessionOutcome};

/// Pacing for a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub tick_interval: Duration,
    pub feedback_pause: Duration,
}

/// Drives one live attempt: owns the session value, its single timer and the
/// report of the finished attempt.
///
/// Dropping the controller cancels the timer.
pub struct SessionController {
    kind: SessionKind,
    session: Session,
    timer: QuestionTimer,
    pacing: Pacing,
    pause_until: Option<Instant>,
    clock: Clock,
    reporter: ResultReporter,
    outcome: Option<SessionOutcome>,
    report: Option<JoinHandle<ReportOutcome>>,
}

impl SessionController {
    /// Take over a freshly started session and arm its timer.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(
        kind: SessionKind,
        session: Session,
        pacing: Pacing,
        clock: Clock,
        reporter: ResultReporter,
    ) -> Self {
        let mut controller = Self {
            kind,
            session,
            timer: QuestionTimer::new(pacing.tick_interval),
            pacing,
            pause_until: None,
            clock,
            reporter,
            outcome: None,
            report: None,
        };
        info!(
            kind = ?controller.kind,
            questions = controller.session.total(),
            "session started"
        );
        controller.sync_timer();
        controller
    }

    #[must_use]
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    #[must_use]
    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Result of the finished attempt, computed locally.
    #[must_use]
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn submit(&mut self, answer: impl Into<String>) -> StepOutcome {
        self.apply(SessionEvent::Submit(answer.into()))
    }

    pub fn timeout(&mut self) -> StepOutcome {
        self.apply(SessionEvent::Timeout)
    }

    pub fn advance(&mut self) -> StepOutcome {
        self.apply(SessionEvent::Advance)
    }

    /// Wait for the next timed event and apply it.
    ///
    /// During a feedback pause this resolves with the advance once the pause
    /// is over; otherwise with the next countdown tick. Returns `None` when
    /// nothing is scheduled (finished, or an untimed question). Cancel-safe,
    /// so it can race user input in `tokio::select!`.
    pub async fn next_event(&mut self) -> Option<StepOutcome> {
        if self.session.is_finished() {
            return None;
        }
        if let Some(deadline) = self.pause_until {
            sleep_until(deadline).await;
            return Some(self.advance());
        }
        let elapsed = self.timer.next_tick().await?;
        Some(self.apply(SessionEvent::Tick(elapsed)))
    }

    /// Replace the attempt with a fresh one over the same questions.
    ///
    /// The report of the previous attempt, if any, keeps running.
    pub fn restart(&mut self) {
        self.timer.cancel();
        self.session = self.session.restart();
        self.pause_until = None;
        self.outcome = None;
        self.report = None;
        info!(kind = ?self.kind, "session restarted");
        self.sync_timer();
    }

    /// Wait for the background report of the finished attempt.
    ///
    /// Returns `None` if the session has not finished or the report was
    /// already awaited.
    pub async fn wait_for_report(&mut self) -> Option<ReportOutcome> {
        let handle = self.report.take()?;
        handle.await.ok()
    }

    fn apply(&mut self, event: SessionEvent) -> StepOutcome {
        let step = self.session.apply(event);
        self.session = step.session;

        match &step.outcome {
            StepOutcome::Rejected(reason) => {
                debug!(?reason, index = self.session.current_index(), "submission rejected");
            }
            StepOutcome::Graded { record, finished } => {
                if record.submission.is_timeout() {
                    info!(question = %record.question_id, "question timed out");
                }
                if *finished {
                    self.finish();
                } else if self.session.is_awaiting_advance() {
                    self.timer.cancel();
                    self.pause_until = Some(Instant::now() + self.pacing.feedback_pause);
                } else {
                    self.sync_timer();
                }
            }
            StepOutcome::Advanced { .. } => {
                self.pause_until = None;
                self.sync_timer();
            }
            StepOutcome::Ignored | StepOutcome::Ticked { .. } => {}
        }

        step.outcome
    }

    /// Start a fresh ticker when the current question is timed, stop it otherwise.
    fn sync_timer(&mut self) {
        if self.session.is_timed() {
            self.timer.start();
        } else {
            self.timer.cancel();
        }
    }

    fn finish(&mut self) {
        self.timer.cancel();
        self.pause_until = None;
        let outcome = SessionOutcome::new(
            self.kind,
            self.session.answers().to_vec(),
            self.clock.now(),
        );
        info!(
            kind = ?self.kind,
            score = outcome.summary.score,
            total = outcome.summary.total,
            percentage = outcome.summary.percentage,
            "session finished"
        );
        self.report = Some(self.reporter.spawn(outcome.clone()));
        self.outcome = Some(outcome);
    }
}
