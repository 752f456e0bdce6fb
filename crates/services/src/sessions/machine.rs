//! Pure session state machine: `(Session, SessionEvent) -> Step`.

use std::sync::Arc;
use std::time::Duration;

use assess_core::model::{AnswerRecord, Question, QuestionKind, Submission};
use assess_core::scoring::{self, ScoreSummary};

use super::progress::SessionProgress;
use super::timer::Countdown;
use crate::error::SessionError;

/// Per-session grading and pacing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRules {
    /// `None` leaves questions untimed.
    pub time_limit: Option<Duration>,
    pub min_free_text_words: usize,
    /// Move to the next question right after grading. When `false` the
    /// session waits on the answered question for `SessionEvent::Advance`.
    pub auto_advance: bool,
}

impl SessionRules {
    /// Untimed, advances immediately.
    #[must_use]
    pub fn exam(min_free_text_words: usize) -> Self {
        Self {
            time_limit: None,
            min_free_text_words,
            auto_advance: true,
        }
    }

    /// Timed, pauses on each graded answer.
    #[must_use]
    pub fn drill(time_limit: Option<Duration>, min_free_text_words: usize) -> Self {
        Self {
            time_limit,
            min_free_text_words,
            auto_advance: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    /// Terminal.
    Finished,
}

/// Input to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Submit(String),
    /// Forced timeout of the current question.
    Timeout,
    /// Time elapsed on the current question's countdown.
    Tick(Duration),
    /// Leave the feedback pause and show the next question.
    Advance,
}

/// Why a submission was refused without changing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoSelection,
    TooFewWords { found: usize, required: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Event did not apply (already answered, nothing to advance, terminal).
    Ignored,
    Rejected(RejectReason),
    Ticked { remaining: Duration },
    Graded { record: AnswerRecord, finished: bool },
    Advanced { index: usize },
}

/// New state plus what happened.
#[derive(Debug, Clone)]
pub struct Step {
    pub session: Session,
    pub outcome: StepOutcome,
}

/// One assessment attempt.
///
/// Holds exactly one answer record per completed question, in question order.
#[derive(Debug, Clone)]
pub struct Session {
    questions: Arc<[Question]>,
    rules: SessionRules,
    current: usize,
    answers: Vec<AnswerRecord>,
    score: u32,
    countdown: Option<Countdown>,
    awaiting_advance: bool,
    phase: SessionPhase,
}

impl Session {
    /// Begin on the first question with its countdown running.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when `questions` is empty.
    pub fn start(questions: Arc<[Question]>, rules: SessionRules) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            countdown: rules.time_limit.map(Countdown::started),
            questions,
            rules,
            current: 0,
            answers: Vec::new(),
            score: 0,
            awaiting_advance: false,
            phase: SessionPhase::Active,
        })
    }

    /// A fresh attempt over the same questions.
    #[must_use]
    pub fn restart(&self) -> Self {
        Self {
            countdown: self.rules.time_limit.map(Countdown::started),
            questions: Arc::clone(&self.questions),
            rules: self.rules,
            current: 0,
            answers: Vec::new(),
            score: 0,
            awaiting_advance: false,
            phase: SessionPhase::Active,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    #[must_use]
    pub fn rules(&self) -> SessionRules {
        self.rules
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question on screen; stays set during the feedback pause.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            SessionPhase::Active => self.questions.get(self.current),
            SessionPhase::Finished => None,
        }
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_awaiting_advance(&self) -> bool {
        self.awaiting_advance
    }

    /// Whether the current question's countdown is running.
    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.countdown.is_some_and(|c| c.is_running())
    }

    #[must_use]
    pub fn remaining_time(&self) -> Option<Duration> {
        self.countdown.map(|c| c.remaining())
    }

    #[must_use]
    pub fn summary(&self) -> ScoreSummary {
        scoring::summarize(&self.answers)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.total();
        SessionProgress {
            question_number: (self.current + 1).min(total),
            total,
            answered: self.answers.len(),
            correct: self.score,
        }
    }

    /// Apply one event.
    #[must_use]
    pub fn apply(&self, event: SessionEvent) -> Step {
        let mut next = self.clone();
        let outcome = next.transition(event);
        Step {
            session: next,
            outcome,
        }
    }

    fn accepts_answer(&self) -> bool {
        self.phase == SessionPhase::Active && !self.awaiting_advance
    }

    fn transition(&mut self, event: SessionEvent) -> StepOutcome {
        match event {
            SessionEvent::Submit(answer) => self.submit(&answer),
            SessionEvent::Timeout => self.time_out(),
            SessionEvent::Tick(elapsed) => self.tick(elapsed),
            SessionEvent::Advance => self.advance(),
        }
    }

    fn submit(&mut self, answer: &str) -> StepOutcome {
        if !self.accepts_answer() {
            return StepOutcome::Ignored;
        }
        let Some(question) = self.questions.get(self.current) else {
            return StepOutcome::Ignored;
        };
        match grade(question, answer, self.rules.min_free_text_words) {
            Ok(is_correct) => {
                let record = AnswerRecord::graded(
                    question,
                    Submission::Answered(answer.to_string()),
                    is_correct,
                );
                self.record(record)
            }
            Err(reason) => StepOutcome::Rejected(reason),
        }
    }

    fn time_out(&mut self) -> StepOutcome {
        if !self.accepts_answer() {
            return StepOutcome::Ignored;
        }
        let Some(question) = self.questions.get(self.current) else {
            return StepOutcome::Ignored;
        };
        let record = AnswerRecord::timed_out(question);
        self.record(record)
    }

    fn tick(&mut self, elapsed: Duration) -> StepOutcome {
        if !self.accepts_answer() {
            return StepOutcome::Ignored;
        }
        let Some(countdown) = self.countdown.as_mut() else {
            return StepOutcome::Ignored;
        };
        if !countdown.is_running() {
            return StepOutcome::Ignored;
        }
        if countdown.tick(elapsed) {
            self.time_out()
        } else {
            StepOutcome::Ticked {
                remaining: countdown.remaining(),
            }
        }
    }

    fn advance(&mut self) -> StepOutcome {
        if self.phase != SessionPhase::Active || !self.awaiting_advance {
            return StepOutcome::Ignored;
        }
        self.awaiting_advance = false;
        self.move_to_next();
        StepOutcome::Advanced {
            index: self.current,
        }
    }

    fn record(&mut self, record: AnswerRecord) -> StepOutcome {
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.cancel();
        }
        if record.is_correct {
            self.score = self.score.saturating_add(1);
        }
        self.answers.push(record.clone());

        let finished = self.answers.len() == self.questions.len();
        if finished {
            self.phase = SessionPhase::Finished;
        } else if self.rules.auto_advance {
            self.move_to_next();
        } else {
            self.awaiting_advance = true;
        }
        StepOutcome::Graded { record, finished }
    }

    fn move_to_next(&mut self) {
        self.current += 1;
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.start();
        }
    }
}

/// Grade one submission.
///
/// Multiple choice compares trimmed values exactly. Free text only checks the
/// word minimum: written answers that meet it are accepted as correct until
/// they are graded by hand.
///
/// # Errors
///
/// Returns the `RejectReason` when the submission must not be recorded.
pub fn grade(question: &Question, answer: &str, min_free_text_words: usize) -> Result<bool, RejectReason> {
    let answer = answer.trim();
    match question.kind() {
        QuestionKind::MultipleChoice { .. } => {
            if answer.is_empty() {
                return Err(RejectReason::NoSelection);
            }
            Ok(answer == question.correct_answer().trim())
        }
        QuestionKind::FreeText => {
            let found = answer.split_whitespace().count();
            if found < min_free_text_words {
                return Err(RejectReason::TooFewWords {
                    found,
                    required: min_free_text_words,
                });
            }
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::{QuestionId, TIMEOUT_MARKER};

    fn choice(id: u64, correct: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            None,
            QuestionKind::MultipleChoice {
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            },
            correct,
            u32::try_from(id).unwrap(),
        )
        .unwrap()
    }

    fn written(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            "Schreiben Sie.",
            None,
            QuestionKind::FreeText,
            "",
            u32::try_from(id).unwrap(),
        )
        .unwrap()
    }

    fn session(questions: Vec<Question>, rules: SessionRules) -> Session {
        Session::start(questions.into(), rules).unwrap()
    }

    fn step(session: &Session, event: SessionEvent) -> (Session, StepOutcome) {
        let Step { session, outcome } = session.apply(event);
        (session, outcome)
    }

    #[test]
    fn empty_question_list_cannot_start() {
        assert!(matches!(
            Session::start(Vec::new().into(), SessionRules::exam(2)),
            Err(SessionError::Empty)
        ));
    }

    #[test]
    fn exam_grades_and_advances_immediately() {
        let s = session(vec![choice(0, "a"), choice(1, "b")], SessionRules::exam(2));
        let (s, outcome) = step(&s, SessionEvent::Submit(" a ".into()));
        assert!(matches!(outcome, StepOutcome::Graded { finished: false, ref record } if record.is_correct));
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.score(), 1);

        let (s, outcome) = step(&s, SessionEvent::Submit("c".into()));
        assert!(matches!(outcome, StepOutcome::Graded { finished: true, ref record } if !record.is_correct));
        assert!(s.is_finished());
        assert_eq!(s.summary().percentage, 50);
        assert!(s.current_question().is_none());
    }

    #[test]
    fn submitted_text_is_recorded_as_typed() {
        let s = session(vec![choice(0, "a"), choice(1, "b")], SessionRules::exam(2));
        let (s, _) = step(&s, SessionEvent::Submit(" a ".into()));
        let (s, _) = step(&s, SessionEvent::Submit("c\n".into()));
        let answers = s.answers();
        assert!(answers[0].is_correct);
        assert_eq!(answers[0].submission, Submission::Answered(" a ".into()));
        assert_eq!(answers[1].submission, Submission::Answered("c\n".into()));
    }

    #[test]
    fn terminal_session_ignores_everything() {
        let s = session(vec![choice(0, "a")], SessionRules::exam(2));
        let (s, _) = step(&s, SessionEvent::Submit("a".into()));
        for event in [
            SessionEvent::Submit("a".into()),
            SessionEvent::Timeout,
            SessionEvent::Tick(Duration::from_secs(1)),
            SessionEvent::Advance,
        ] {
            let (after, outcome) = step(&s, event);
            assert_eq!(outcome, StepOutcome::Ignored);
            assert_eq!(after.answers().len(), 1);
        }
    }

    #[test]
    fn empty_selection_is_rejected_without_state_change() {
        let s = session(vec![choice(0, "a")], SessionRules::exam(2));
        let (after, outcome) = step(&s, SessionEvent::Submit("   ".into()));
        assert_eq!(outcome, StepOutcome::Rejected(RejectReason::NoSelection));
        assert!(after.answers().is_empty());
        assert_eq!(after.current_index(), 0);
    }

    #[test]
    fn free_text_needs_two_words_then_is_always_correct() {
        let s = session(vec![written(0)], SessionRules::exam(2));
        let (s, outcome) = step(&s, SessionEvent::Submit("Hallo".into()));
        assert_eq!(
            outcome,
            StepOutcome::Rejected(RejectReason::TooFewWords {
                found: 1,
                required: 2
            })
        );
        let (s, outcome) = step(&s, SessionEvent::Submit("völlig falsche Antwort".into()));
        assert!(matches!(outcome, StepOutcome::Graded { finished: true, ref record } if record.is_correct));
        assert_eq!(s.summary().percentage, 100);
    }

    #[test]
    fn drill_waits_for_advance_and_ignores_second_submit() {
        let rules = SessionRules::drill(Some(Duration::from_secs(5)), 2);
        let s = session(vec![choice(0, "a"), choice(1, "b")], rules);
        let (s, _) = step(&s, SessionEvent::Submit("a".into()));
        assert!(s.is_awaiting_advance());
        assert_eq!(s.current_index(), 0);
        assert!(!s.is_timed());

        let (s, outcome) = step(&s, SessionEvent::Submit("b".into()));
        assert_eq!(outcome, StepOutcome::Ignored);
        let (s, outcome) = step(&s, SessionEvent::Timeout);
        assert_eq!(outcome, StepOutcome::Ignored);
        assert_eq!(s.answers().len(), 1);

        let (s, outcome) = step(&s, SessionEvent::Advance);
        assert_eq!(outcome, StepOutcome::Advanced { index: 1 });
        assert!(s.is_timed());
        assert_eq!(s.remaining_time(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn countdown_expiry_records_a_timeout() {
        let rules = SessionRules::drill(Some(Duration::from_secs(5)), 2);
        let mut s = session(vec![choice(0, "a")], rules);
        for expected in (1..5).rev() {
            let (next, outcome) = step(&s, SessionEvent::Tick(Duration::from_secs(1)));
            assert_eq!(
                outcome,
                StepOutcome::Ticked {
                    remaining: Duration::from_secs(expected)
                }
            );
            s = next;
        }
        let (s, outcome) = step(&s, SessionEvent::Tick(Duration::from_secs(1)));
        let StepOutcome::Graded { record, finished } = outcome else {
            panic!("expected a graded timeout, got {outcome:?}");
        };
        assert!(finished);
        assert!(!record.is_correct);
        assert_eq!(record.submission, Submission::TimedOut);
        assert_eq!(record.submission.display(), TIMEOUT_MARKER);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn timeout_is_incorrect_even_when_the_answer_is_empty() {
        let q = Question::new(
            QuestionId::new(1),
            "Q",
            None,
            QuestionKind::FreeText,
            "",
            0,
        )
        .unwrap();
        let s = session(vec![q], SessionRules::exam(0));
        let (_, outcome) = step(&s, SessionEvent::Timeout);
        assert!(matches!(outcome, StepOutcome::Graded { ref record, .. } if !record.is_correct));
    }

    #[test]
    fn untimed_session_ignores_ticks() {
        let s = session(vec![choice(0, "a")], SessionRules::exam(2));
        let (_, outcome) = step(&s, SessionEvent::Tick(Duration::from_secs(60)));
        assert_eq!(outcome, StepOutcome::Ignored);
    }

    #[test]
    fn answers_follow_question_order() {
        let questions: Vec<_> = (0..5).map(|i| choice(i, "a")).collect();
        let mut s = session(questions, SessionRules::exam(2));
        for answer in ["a", "b", "a", "a", "c"] {
            s = s.apply(SessionEvent::Submit(answer.into())).session;
        }
        let order: Vec<_> = s.answers().iter().map(|r| r.order_index).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        let summary = s.summary();
        assert_eq!((summary.score, summary.total, summary.percentage), (3, 5, 60));
        assert!(summary.passed());
    }

    #[test]
    fn restart_discards_progress() {
        let s = session(vec![choice(0, "a"), choice(1, "a")], SessionRules::exam(2));
        let s = s.apply(SessionEvent::Submit("a".into())).session;
        let fresh = s.restart();
        assert_eq!(fresh.current_index(), 0);
        assert!(fresh.answers().is_empty());
        assert_eq!(fresh.score(), 0);
        assert_eq!(fresh.phase(), SessionPhase::Active);
    }

    #[test]
    fn progress_follows_the_current_question() {
        let s = session(vec![choice(0, "a"), choice(1, "a")], SessionRules::exam(2));
        assert_eq!(s.progress().to_string(), "1/2");

        let s = s.apply(SessionEvent::Submit("b".into())).session;
        let progress = s.progress();
        assert_eq!(progress.to_string(), "2/2");
        assert_eq!((progress.answered, progress.correct, progress.remaining()), (1, 0, 1));

        let s = s.apply(SessionEvent::Submit("a".into())).session;
        let progress = s.progress();
        assert_eq!(progress.to_string(), "2/2");
        assert!(progress.is_complete());
        assert_eq!(progress.correct, 1);
    }

    #[test]
    fn drill_progress_holds_during_feedback_pause() {
        let s = session(
            vec![choice(0, "a"), choice(1, "a")],
            SessionRules::drill(Some(Duration::from_secs(5)), 2),
        );
        let s = s.apply(SessionEvent::Submit("a".into())).session;
        assert_eq!(s.progress().to_string(), "1/2");
        let s = s.apply(SessionEvent::Advance).session;
        assert_eq!(s.progress().to_string(), "2/2");
    }
}
