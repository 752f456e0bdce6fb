//! Best-effort persistence of finished sessions.

use std::sync::Arc;

use assess_core::model::{
    AnswerRecord, IncorrectItem, ResultDetails, ResultRecord, ResultRecordError, SessionKind,
    StudentId,
};
use assess_core::scoring::{self, ScoreSummary};
use chrono::{DateTime, Utc};
use storage::repository::{IdentityProvider, ResultStore};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::ReportError;

/// Locally computed result of a finished session.
///
/// This is what the terminal view renders, whether or not the write succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub kind: SessionKind,
    pub summary: ScoreSummary,
    pub answers: Vec<AnswerRecord>,
    pub completed_at: DateTime<Utc>,
}

impl SessionOutcome {
    #[must_use]
    pub fn new(kind: SessionKind, answers: Vec<AnswerRecord>, completed_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            summary: scoring::summarize(&answers),
            answers,
            completed_at,
        }
    }

    /// Every answer with its correctness flag.
    #[must_use]
    pub fn review(&self) -> Vec<AnswerRecord> {
        scoring::review_list(&self.answers)
    }

    /// Missed items only, with the timeout marker for unanswered ones.
    #[must_use]
    pub fn incorrect(&self) -> Vec<IncorrectItem> {
        scoring::incorrect_items(&self.answers)
    }

    /// Package the outcome for the result store.
    ///
    /// Exams keep the full review log; drills keep only the missed items.
    ///
    /// # Errors
    ///
    /// Returns `ResultRecordError` if the tally is inconsistent.
    pub fn to_record(&self, student: StudentId) -> Result<ResultRecord, ResultRecordError> {
        let details = match self.kind {
            SessionKind::Exam(_) => ResultDetails::Exam(self.review()),
            SessionKind::Drill(_) => ResultDetails::Drill(self.incorrect()),
        };
        ResultRecord::new(
            student,
            self.kind,
            self.summary.score,
            self.summary.total,
            details,
            self.completed_at,
        )
    }
}

/// What happened to one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Written { id: i64 },
    /// Nobody signed in; nothing was written.
    SkippedNoIdentity,
    /// Logged and dropped. There is no retry.
    Failed,
}

/// Writes one result per finished session to the result store.
#[derive(Clone)]
pub struct ResultReporter {
    store: Arc<dyn ResultStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl ResultReporter {
    #[must_use]
    pub fn new(store: Arc<dyn ResultStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Resolve the learner and append the result once.
    ///
    /// Failures are logged, never returned.
    pub async fn report(&self, outcome: &SessionOutcome) -> ReportOutcome {
        let student = match self.identity.current_student().await {
            Ok(Some(student)) => student,
            Ok(None) => {
                warn!(kind = ?outcome.kind, "no signed-in learner, result not saved");
                return ReportOutcome::SkippedNoIdentity;
            }
            Err(err) => {
                error!(error = %err, "identity lookup failed, result not saved");
                return ReportOutcome::Failed;
            }
        };

        match self.write(student, outcome).await {
            Ok(id) => {
                debug!(student = %student, id, score = outcome.summary.score, "result saved");
                ReportOutcome::Written { id }
            }
            Err(err) => {
                error!(student = %student, error = %err, "failed to save result");
                ReportOutcome::Failed
            }
        }
    }

    /// Report in the background; the caller never waits on the write.
    pub fn spawn(&self, outcome: SessionOutcome) -> JoinHandle<ReportOutcome> {
        let reporter = self.clone();
        tokio::spawn(async move { reporter.report(&outcome).await })
    }

    async fn write(&self, student: StudentId, outcome: &SessionOutcome) -> Result<i64, ReportError> {
        let record = outcome.to_record(student)?;
        Ok(self.store.append_result(&record).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::{
        DrillKind, ExamId, Question, QuestionId, QuestionKind, Submission, TIMEOUT_MARKER,
    };
    use assess_core::time::fixed_now;
    use async_trait::async_trait;
    use storage::repository::{
        InMemoryRepository, ResultScope, StaticIdentity, StorageError,
    };

    struct FailingStore;

    #[async_trait]
    impl ResultStore for FailingStore {
        async fn append_result(&self, _record: &ResultRecord) -> Result<i64, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn list_results(&self, _scope: ResultScope) -> Result<Vec<ResultRecord>, StorageError> {
            Ok(Vec::new())
        }

        async fn results_for_student(
            &self,
            _student: StudentId,
            _scope: ResultScope,
        ) -> Result<Vec<ResultRecord>, StorageError> {
            Ok(Vec::new())
        }
    }

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Wort {id}"),
            None,
            QuestionKind::MultipleChoice {
                options: vec!["a".into(), "b".into()],
            },
            "a",
            u32::try_from(id).unwrap(),
        )
        .unwrap()
    }

    fn answers() -> Vec<AnswerRecord> {
        vec![
            AnswerRecord::graded(&question(0), Submission::Answered("a".into()), true),
            AnswerRecord::graded(&question(1), Submission::Answered("b".into()), false),
            AnswerRecord::timed_out(&question(2)),
        ]
    }

    #[test]
    fn drill_record_keeps_only_missed_items() {
        let outcome = SessionOutcome::new(
            SessionKind::Drill(DrillKind::TimedVocabulary),
            answers(),
            fixed_now(),
        );
        let record = outcome.to_record(StudentId::random()).unwrap();
        assert_eq!((record.score(), record.total()), (1, 3));
        let ResultDetails::Drill(missed) = record.details() else {
            panic!("expected drill details");
        };
        assert_eq!(missed.len(), 2);
        assert_eq!(missed[1].submitted, TIMEOUT_MARKER);
    }

    #[test]
    fn exam_record_keeps_full_review() {
        let outcome = SessionOutcome::new(SessionKind::Exam(ExamId::new(3)), answers(), fixed_now());
        let record = outcome.to_record(StudentId::random()).unwrap();
        let ResultDetails::Exam(log) = record.details() else {
            panic!("expected exam details");
        };
        assert_eq!(log.len(), 3);
        assert_eq!(record.percentage(), 33);
        assert!(!outcome.summary.passed());
    }

    #[tokio::test]
    async fn writes_once_for_signed_in_learner() {
        let repo = InMemoryRepository::new();
        let student = StudentId::random();
        let reporter = ResultReporter::new(Arc::new(repo.clone()), Arc::new(StaticIdentity(Some(student))));
        let outcome = SessionOutcome::new(SessionKind::Exam(ExamId::new(1)), answers(), fixed_now());

        let result = reporter.spawn(outcome).await.unwrap();
        assert!(matches!(result, ReportOutcome::Written { .. }));
        let stored = repo.list_results(ResultScope::All).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].student_id(), student);
    }

    #[tokio::test]
    async fn missing_identity_skips_the_write() {
        let repo = InMemoryRepository::new();
        let reporter = ResultReporter::new(Arc::new(repo.clone()), Arc::new(StaticIdentity(None)));
        let outcome = SessionOutcome::new(SessionKind::Exam(ExamId::new(1)), answers(), fixed_now());
        assert_eq!(reporter.report(&outcome).await, ReportOutcome::SkippedNoIdentity);
        assert_eq!(repo.result_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let reporter = ResultReporter::new(
            Arc::new(FailingStore),
            Arc::new(StaticIdentity(Some(StudentId::random()))),
        );
        let outcome = SessionOutcome::new(SessionKind::Exam(ExamId::new(1)), answers(), fixed_now());
        assert_eq!(reporter.report(&outcome).await, ReportOutcome::Failed);
    }
}
