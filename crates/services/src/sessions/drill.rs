use std::sync::Arc;

use assess_core::Clock;
use assess_core::model::{DrillKind, Question, QuestionId, QuestionKind, SessionKind};
use rand::Rng;
use storage::repository::{IdentityProvider, VocabularyCatalog, VocabularyFilter};
use tracing::{debug, warn};

use super::choices::ChoiceGenerator;
use super::controller::{Pacing, SessionController};
use super::machine::{Session, SessionRules};
use super::pool::VocabularyPool;
use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::reporter::ResultReporter;

/// Starts timed vocabulary drills.
#[derive(Clone)]
pub struct DrillService {
    clock: Clock,
    config: EngineConfig,
    vocabulary: Arc<dyn VocabularyCatalog>,
    identity: Arc<dyn IdentityProvider>,
    reporter: ResultReporter,
}

impl DrillService {
    #[must_use]
    pub fn new(
        clock: Clock,
        config: EngineConfig,
        vocabulary: Arc<dyn VocabularyCatalog>,
        identity: Arc<dyn IdentityProvider>,
        reporter: ResultReporter,
    ) -> Self {
        Self {
            clock,
            config,
            vocabulary,
            identity,
            reporter,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a drill using the configured RNG.
    ///
    /// # Errors
    ///
    /// See [`DrillService::start_with_rng`].
    pub async fn start(&self, lesson: Option<&str>) -> Result<SessionController, SessionError> {
        let mut rng = self.config.rng();
        self.start_with_rng(lesson, &mut rng).await
    }

    /// Load the learner's visible words, sample the working set and build a
    /// multiple-choice question per word.
    ///
    /// Options are generated independently for every question. No session or
    /// timer exists unless this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the catalog cannot be read,
    /// `SessionError::InsufficientPool` when the pool has too few distinct
    /// translations, and `SessionError::Empty` when nothing was sampled.
    pub async fn start_with_rng<R>(
        &self,
        lesson: Option<&str>,
        rng: &mut R,
    ) -> Result<SessionController, SessionError>
    where
        R: Rng + ?Sized + Send,
    {
        let viewer = self.identity.current_student().await?;
        let mut filter = VocabularyFilter::for_viewer(viewer);
        if let Some(lesson) = lesson {
            filter = filter.with_lesson(lesson);
        }
        let words = self.vocabulary.words(&filter).await?;
        let pool = VocabularyPool::new(words, self.config.required_distinct_answers())
            .inspect_err(|err| warn!(error = %err, ?lesson, "drill not started"))?;

        let generator = ChoiceGenerator::new(self.config.distractors);
        let mut questions = Vec::with_capacity(self.config.drill_size);
        for (index, word) in pool.sample(self.config.drill_size, rng).into_iter().enumerate() {
            let options = generator.generate(word.answer_value(), pool.answer_values(), rng)?;
            questions.push(Question::new(
                QuestionId::new(word.id.value()),
                word.term.trim(),
                None,
                QuestionKind::MultipleChoice { options },
                word.answer_value(),
                u32::try_from(index).unwrap_or(u32::MAX),
            )?);
        }
        debug!(pool = pool.len(), sampled = questions.len(), "drill questions built");

        let rules = SessionRules::drill(
            self.config.question_time_limit(),
            self.config.min_free_text_words,
        );
        let session = Session::start(questions.into(), rules)?;
        Ok(SessionController::new(
            SessionKind::Drill(DrillKind::TimedVocabulary),
            session,
            Pacing {
                tick_interval: self.config.tick_interval(),
                feedback_pause: self.config.feedback_pause(),
            },
            self.clock,
            self.reporter.clone(),
        ))
    }
}
