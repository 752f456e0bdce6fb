use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

//
// ─── COUNTDOWN ─────────────────────────────────────────────────────────────────
//

/// Pure per-question countdown.
///
/// Expires at most once per `start`; after expiry or `cancel` further ticks
/// are no-ops until the next `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    limit: Duration,
    remaining: Duration,
    running: bool,
}

impl Countdown {
    /// A stopped countdown with the full limit remaining.
    #[must_use]
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            remaining: limit,
            running: false,
        }
    }

    #[must_use]
    pub fn started(limit: Duration) -> Self {
        let mut countdown = Self::new(limit);
        countdown.start();
        countdown
    }

    /// Reset to the full limit and run.
    pub fn start(&mut self) {
        self.remaining = self.limit;
        self.running = true;
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    /// Subtract `elapsed`. Returns `true` only on the tick that reaches zero.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if !self.running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.remaining.is_zero() {
            self.running = false;
            return true;
        }
        false
    }

    #[must_use]
    pub fn limit(&self) -> Duration {
        self.limit
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

//
// ─── QUESTION TIMER ────────────────────────────────────────────────────────────
//

struct RunningTicker {
    token: CancellationToken,
    handle: JoinHandle<()>,
    ticks: mpsc::UnboundedReceiver<Duration>,
}

/// Background ticker driving the countdown of the current question.
///
/// At most one ticker runs at a time: `start` replaces the previous one.
/// Cancelling (or dropping the timer) stops the task and closes its channel,
/// so no tick is delivered after teardown.
pub struct QuestionTimer {
    interval: Duration,
    running: Option<RunningTicker>,
}

impl QuestionTimer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: None,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start a fresh ticker. The first tick arrives one interval from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        self.cancel();

        let token = CancellationToken::new();
        let (tx, ticks) = mpsc::unbounded_channel();
        let period = self.interval;
        let child = token.clone();
        let first = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = child.cancelled() => break,
                    _ = ticker.tick() => {
                        if tx.send(period).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        self.running = Some(RunningTicker {
            token,
            handle,
            ticks,
        });
    }

    /// Stop the ticker, dropping any undelivered ticks.
    pub fn cancel(&mut self) {
        if let Some(running) = self.running.take() {
            running.token.cancel();
            running.handle.abort();
        }
    }

    /// Wait for the next tick and return the elapsed interval.
    ///
    /// Returns `None` immediately when no ticker is running. Cancel-safe.
    pub async fn next_tick(&mut self) -> Option<Duration> {
        let running = self.running.as_mut()?;
        running.ticks.recv().await
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
