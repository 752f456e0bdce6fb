use std::sync::Arc;

use assess_core::Clock;
use assess_core::model::{ExamDescriptor, ExamId, ExamType, SessionKind};
use storage::repository::ExamCatalog;
use tracing::{info, warn};

use super::controller::{Pacing, SessionController};
use super::machine::{Session, SessionRules, StepOutcome};
use super::pool::QuestionPool;
use crate::config::EngineConfig;
use crate::error::{FlowError, SessionError};
use crate::reporter::{ReportOutcome, ResultReporter, SessionOutcome};

/// Where the learner is in the exam flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStage {
    TypeSelection,
    ExamSelection {
        exam_type: ExamType,
        exams: Vec<ExamDescriptor>,
    },
    Active {
        exam: ExamDescriptor,
    },
    /// Terminal for the attempt; `back` or `restart` leave it.
    Result {
        exam: ExamDescriptor,
    },
}

/// Exam type → exam instance → session → result.
///
/// Failed selections leave the stage unchanged, so the learner stays on the
/// list they picked from.
pub struct ExamFlow {
    clock: Clock,
    config: EngineConfig,
    catalog: Arc<dyn ExamCatalog>,
    reporter: ResultReporter,
    stage: FlowStage,
    controller: Option<SessionController>,
}

impl ExamFlow {
    #[must_use]
    pub fn new(
        clock: Clock,
        config: EngineConfig,
        catalog: Arc<dyn ExamCatalog>,
        reporter: ResultReporter,
    ) -> Self {
        Self {
            clock,
            config,
            catalog,
            reporter,
            stage: FlowStage::TypeSelection,
            controller: None,
        }
    }

    #[must_use]
    pub fn stage(&self) -> &FlowStage {
        &self.stage
    }

    #[must_use]
    pub fn controller(&self) -> Option<&SessionController> {
        self.controller.as_ref()
    }

    /// Local result of the finished exam, available in the result stage.
    #[must_use]
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        match self.stage {
            FlowStage::Result { .. } => self.controller.as_ref()?.outcome(),
            _ => None,
        }
    }

    /// List exams of `exam_type`, newest first.
    ///
    /// Allowed from type selection and from exam selection (to switch type).
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidStage` during or after an attempt,
    /// `FlowError::Storage` if the catalog fails and `FlowError::NoExams` if it
    /// has nothing for this type. The stage is unchanged on error.
    pub async fn select_type(&mut self, exam_type: ExamType) -> Result<&[ExamDescriptor], FlowError> {
        if !matches!(
            self.stage,
            FlowStage::TypeSelection | FlowStage::ExamSelection { .. }
        ) {
            return Err(FlowError::InvalidStage);
        }

        let exams = self
            .catalog
            .exams_by_type(exam_type)
            .await
            .inspect_err(|err| warn!(error = %err, %exam_type, "failed to load exams"))?;
        if exams.is_empty() {
            warn!(%exam_type, "no exams for type");
            return Err(FlowError::NoExams);
        }

        self.stage = FlowStage::ExamSelection { exam_type, exams };
        match &self.stage {
            FlowStage::ExamSelection { exams, .. } => Ok(exams.as_slice()),
            _ => Err(FlowError::InvalidStage),
        }
    }

    /// Load the chosen exam and start its session.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidStage` outside exam selection,
    /// `FlowError::UnknownExam` if `exam_id` is not in the listed exams,
    /// `FlowError::Storage` if loading fails and `FlowError::NoQuestions` if the
    /// exam is empty. The stage is unchanged on error.
    pub async fn select_exam(&mut self, exam_id: ExamId) -> Result<(), FlowError> {
        let FlowStage::ExamSelection { exams, .. } = &self.stage else {
            return Err(FlowError::InvalidStage);
        };
        let exam = exams
            .iter()
            .find(|e| e.id == exam_id)
            .cloned()
            .ok_or(FlowError::UnknownExam)?;

        let questions = self
            .catalog
            .exam_questions(exam.id)
            .await
            .inspect_err(|err| warn!(error = %err, exam = %exam.id, "failed to load questions"))?;
        let pool = match QuestionPool::from_exam(questions) {
            Ok(pool) => pool,
            Err(SessionError::Empty) => {
                warn!(exam = %exam.id, "exam has no questions");
                return Err(FlowError::NoQuestions);
            }
            Err(err) => return Err(err.into()),
        };

        let session = Session::start(
            pool.into_shared(),
            SessionRules::exam(self.config.min_free_text_words),
        )?;
        info!(exam = %exam.id, title = %exam.title, "exam selected");
        self.controller = Some(SessionController::new(
            SessionKind::Exam(exam.id),
            session,
            Pacing {
                tick_interval: self.config.tick_interval(),
                feedback_pause: self.config.feedback_pause(),
            },
            self.clock,
            self.reporter.clone(),
        ));
        self.stage = FlowStage::Active { exam };
        Ok(())
    }

    /// Submit an answer to the running exam.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidStage` when no exam is running.
    pub fn submit(&mut self, answer: impl Into<String>) -> Result<StepOutcome, FlowError> {
        let FlowStage::Active { exam } = &self.stage else {
            return Err(FlowError::InvalidStage);
        };
        let controller = self.controller.as_mut().ok_or(FlowError::InvalidStage)?;
        let outcome = controller.submit(answer);
        if controller.is_finished() {
            self.stage = FlowStage::Result { exam: exam.clone() };
        }
        Ok(outcome)
    }

    /// Take the same exam again from the result stage.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidStage` outside the result stage.
    pub fn restart(&mut self) -> Result<(), FlowError> {
        let FlowStage::Result { exam } = &self.stage else {
            return Err(FlowError::InvalidStage);
        };
        let controller = self.controller.as_mut().ok_or(FlowError::InvalidStage)?;
        controller.restart();
        self.stage = FlowStage::Active { exam: exam.clone() };
        Ok(())
    }

    /// Step back one stage. Leaving a running or finished exam discards it.
    pub fn back(&mut self) {
        if matches!(self.stage, FlowStage::Active { .. } | FlowStage::Result { .. }) {
            self.controller = None;
        }
        self.stage = FlowStage::TypeSelection;
    }

    /// Wait for the background report of the finished exam.
    pub async fn wait_for_report(&mut self) -> Option<ReportOutcome> {
        self.controller.as_mut()?.wait_for_report().await
    }
}
