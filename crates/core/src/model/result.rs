use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::{AnswerRecord, IncorrectItem};
use crate::model::ids::{ExamId, StudentId};
use crate::scoring;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultRecordError {
    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("exam detail log has {len} entries for {total} questions")]
    DetailCountMismatch { len: usize, total: u32 },

    #[error("details do not match the session kind")]
    KindMismatch,
}

/// Flavour of a vocabulary drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrillKind {
    #[serde(rename = "Timed Vocabulary")]
    TimedVocabulary,
}

impl DrillKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DrillKind::TimedVocabulary => "Timed Vocabulary",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Timed Vocabulary" => Some(DrillKind::TimedVocabulary),
            _ => None,
        }
    }
}

/// Discriminates the two kinds of persisted attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Exam(ExamId),
    Drill(DrillKind),
}

/// Detail log stored with a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultDetails {
    /// Every answered question, in order.
    Exam(Vec<AnswerRecord>),
    /// Only the missed items.
    Drill(Vec<IncorrectItem>),
}

/// Outcome of one finished session. Append-only once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    student_id: StudentId,
    kind: SessionKind,
    score: u32,
    total: u32,
    details: ResultDetails,
    completed_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Build (or rehydrate) a result record.
    ///
    /// # Errors
    ///
    /// Returns `ResultRecordError::ScoreExceedsTotal` when `score > total`,
    /// `ResultRecordError::KindMismatch` when the detail variant does not fit
    /// `kind`, and `ResultRecordError::DetailCountMismatch` when an exam log does
    /// not hold exactly one entry per question.
    pub fn new(
        student_id: StudentId,
        kind: SessionKind,
        score: u32,
        total: u32,
        details: ResultDetails,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ResultRecordError> {
        if score > total {
            return Err(ResultRecordError::ScoreExceedsTotal { score, total });
        }
        match (&kind, &details) {
            (SessionKind::Exam(_), ResultDetails::Exam(log)) => {
                if usize::try_from(total).map_or(true, |t| t != log.len()) {
                    return Err(ResultRecordError::DetailCountMismatch {
                        len: log.len(),
                        total,
                    });
                }
            }
            (SessionKind::Drill(_), ResultDetails::Drill(_)) => {}
            _ => return Err(ResultRecordError::KindMismatch),
        }

        Ok(Self {
            student_id,
            kind,
            score,
            total,
            details,
            completed_at,
        })
    }

    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    #[must_use]
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    #[must_use]
    pub fn exam_id(&self) -> Option<ExamId> {
        match self.kind {
            SessionKind::Exam(id) => Some(id),
            SessionKind::Drill(_) => None,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn details(&self) -> &ResultDetails {
        &self.details
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Unrounded percentage, 0 for an empty session.
    #[must_use]
    pub fn ratio_percent(&self) -> f64 {
        scoring::ratio_percent(self.score, self.total)
    }

    /// Rounded percentage.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        scoring::percentage(self.score, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn drill(score: u32, total: u32) -> Result<ResultRecord, ResultRecordError> {
        ResultRecord::new(
            StudentId::random(),
            SessionKind::Drill(DrillKind::TimedVocabulary),
            score,
            total,
            ResultDetails::Drill(Vec::new()),
            fixed_now(),
        )
    }

    #[test]
    fn rejects_score_above_total() {
        assert_eq!(
            drill(4, 3).unwrap_err(),
            ResultRecordError::ScoreExceedsTotal { score: 4, total: 3 }
        );
    }

    #[test]
    fn exam_log_must_cover_every_question() {
        let err = ResultRecord::new(
            StudentId::random(),
            SessionKind::Exam(ExamId::new(1)),
            0,
            2,
            ResultDetails::Exam(Vec::new()),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ResultRecordError::DetailCountMismatch { len: 0, total: 2 });
    }

    #[test]
    fn rejects_mismatched_details() {
        let err = ResultRecord::new(
            StudentId::random(),
            SessionKind::Exam(ExamId::new(1)),
            0,
            0,
            ResultDetails::Drill(Vec::new()),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ResultRecordError::KindMismatch);
    }

    #[test]
    fn percentage_rounds_half_up() {
        let record = drill(1, 8).unwrap();
        assert_eq!(record.percentage(), 13);
        assert!((record.ratio_percent() - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn drill_kind_label_round_trips() {
        let label = DrillKind::TimedVocabulary.label();
        assert_eq!(DrillKind::from_label(label), Some(DrillKind::TimedVocabulary));
    }
}
