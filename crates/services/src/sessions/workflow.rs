use chrono::{DateTime, Utc};
use quiz_core::Clock;
use quiz_core::bank::QuestionBank;
use quiz_core::config::QuizConfig;
use storage::{ProgressRecord, QuizStore, StorageError};

use super::commands::{CommandOutcome, SessionCommand};
use super::service::QuizSession;
use crate::error::{PersistenceError, QuizServiceError};
use crate::loader::QuestionLoader;

/// A session ready to use, and whether it came from saved progress.
#[derive(Debug, Clone)]
pub struct SessionStart {
    pub session: QuizSession,
    pub resumed: bool,
}

/// Orchestrates configuration, session start/resume and persisted commands.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    loader: QuestionLoader,
    store: QuizStore,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, loader: QuestionLoader, store: QuizStore) -> Self {
        Self {
            clock,
            loader,
            store,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Save a new configuration. Any attempt in progress is discarded.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if a write fails.
    pub async fn configure(&self, config: &QuizConfig) -> Result<(), QuizServiceError> {
        self.store.save_config(config).await?;
        self.store.clear_progress().await?;
        self.store.clear_timer_state().await?;
        tracing::info!(
            question_count = config.question_count,
            data_file = %config.data_file,
            "saved quiz configuration"
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::MissingConfig` if no usable configuration is
    /// stored, or `QuizServiceError::Storage` if the store is unreachable.
    pub async fn load_config(&self) -> Result<QuizConfig, QuizServiceError> {
        match self.store.load_config().await {
            Ok(Some(config)) => Ok(config),
            Ok(None) => Err(QuizServiceError::MissingConfig),
            Err(StorageError::Serialization(msg)) => {
                tracing::warn!(error = %msg, "stored quiz configuration is unreadable");
                Err(QuizServiceError::MissingConfig)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Saved progress, if an unreadable record is treated as none.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the store is unreachable.
    pub async fn saved_progress(&self) -> Result<Option<ProgressRecord>, QuizServiceError> {
        match self.store.load_progress().await {
            Ok(progress) => Ok(progress),
            Err(StorageError::Serialization(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the configured dataset and resume saved progress, or sample a
    /// fresh set when there is none (or it cannot be used).
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::MissingConfig` without a configuration,
    /// `QuizServiceError::Load` if the dataset cannot be loaded, and
    /// `QuizServiceError::Usage` for a non-positive question count.
    pub async fn initialize(&self) -> Result<SessionStart, QuizServiceError> {
        let config = self.load_config().await?;
        let bank = self.loader.load(&config.data_file).await?;
        let now = self.clock.now();

        match self.try_resume(&bank, now).await {
            Ok(Some(session)) => {
                tracing::info!(
                    position = session.current_position(),
                    answered = session.answers().len(),
                    "resumed saved progress"
                );
                self.persist(&session).await?;
                return Ok(SessionStart {
                    session,
                    resumed: true,
                });
            }
            Ok(None) => {}
            Err(PersistenceError::Storage(StorageError::Connection(msg))) => {
                return Err(StorageError::Connection(msg).into());
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding saved progress");
                self.store.clear_progress().await?;
                self.store.clear_timer_state().await?;
            }
        }

        let session = self.start_fresh(&bank, &config, now)?;
        self.persist(&session).await?;
        Ok(SessionStart {
            session,
            resumed: false,
        })
    }

    async fn try_resume(
        &self,
        bank: &QuestionBank,
        now: DateTime<Utc>,
    ) -> Result<Option<QuizSession>, PersistenceError> {
        let Some(progress) = self.store.load_progress().await? else {
            return Ok(None);
        };
        if progress.question_ids.is_empty() {
            return Err(PersistenceError::MissingQuestionIds);
        }
        let questions = bank
            .set_from_ids(&progress.question_ids)
            .ok_or(PersistenceError::UnknownQuestions)?;
        let timer = self.store.load_timer_state().await?;
        QuizSession::restore(questions, &progress, timer.as_ref(), now).map(Some)
    }

    fn start_fresh(
        &self,
        bank: &QuestionBank,
        config: &QuizConfig,
        now: DateTime<Utc>,
    ) -> Result<QuizSession, QuizServiceError> {
        let questions = {
            let mut rng = rand::rng();
            bank.select_configured(config.question_count, &mut rng)?
        };
        if questions.is_truncated() {
            tracing::info!(
                requested = questions.requested(),
                available = questions.len(),
                "dataset has fewer questions than requested"
            );
        }
        tracing::info!(questions = questions.len(), "starting new attempt");
        Ok(QuizSession::initialize(questions, now)?)
    }

    /// Apply a command and persist what it changed.
    ///
    /// Progress and timer state are saved after every change. The first
    /// completion saves the results and clears progress and timer state.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Session` for commands on a completed session
    /// and `QuizServiceError::Storage` if a write fails.
    pub async fn apply(
        &self,
        session: &mut QuizSession,
        command: SessionCommand,
    ) -> Result<CommandOutcome, QuizServiceError> {
        let now = self.clock.now();
        let was_complete = session.is_complete();
        let outcome = session.apply(command, now)?;

        match &outcome {
            CommandOutcome::Completed(snapshot) if !was_complete => {
                self.store.save_results(snapshot).await?;
                self.store.clear_progress().await?;
                self.store.clear_timer_state().await?;
                tracing::info!(
                    questions = snapshot.total_questions(),
                    total_time_ms = snapshot.total_time,
                    "quiz completed"
                );
            }
            CommandOutcome::Ignored(reason) => {
                tracing::debug!(%reason, "ignored session command");
            }
            other if other.changes_progress() => self.persist(session).await?,
            _ => {}
        }
        Ok(outcome)
    }

    async fn persist(&self, session: &QuizSession) -> Result<(), QuizServiceError> {
        let now = self.clock.now();
        self.store.save_progress(&session.progress_record(now)).await?;
        self.store
            .save_timer_state(&session.timing().snapshot())
            .await?;
        tracing::trace!(position = session.current_position(), "saved progress");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{QuestionKind, Selection};
    use quiz_core::time::fixed_now;
    use std::sync::Arc;
    use storage::{KeyValueStore, Storage};

    use crate::loader::StaticDatasetSource;

    const DATASET: &str = r#"{"questions": [
        {"id": 1, "type": "single", "question": "Q1",
          "options": ["a", "b"], "correct": [0], "explanation": "E1"},
        {"id": 2, "type": "single", "question": "Q2",
          "options": ["a", "b"], "correct": [1], "explanation": "E2"},
        {"id": 3, "type": "multiple", "question": "Q3",
          "options": ["a", "b", "c"], "correct": [0, 2], "explanation": "E3"}
    ]}"#;

    fn service(storage: &Storage) -> QuizLoopService {
        let source = StaticDatasetSource::new().with_file("questions.json", DATASET);
        QuizLoopService::new(
            Clock::fixed(fixed_now()),
            QuestionLoader::new(Arc::new(source)),
            storage.quiz_store(),
        )
    }

    #[tokio::test]
    async fn initialize_without_config_fails() {
        let storage = Storage::in_memory();
        let err = service(&storage).initialize().await.unwrap_err();
        assert!(matches!(err, QuizServiceError::MissingConfig));
    }

    #[tokio::test]
    async fn initialize_rejects_non_positive_count() {
        let storage = Storage::in_memory();
        let service = service(&storage);
        service
            .configure(&QuizConfig::new(-2, "questions.json", fixed_now()))
            .await
            .unwrap();
        let err = service.initialize().await.unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::Usage(quiz_core::UsageError::InvalidCount { requested: -2 })
        ));
    }

    #[tokio::test]
    async fn commands_persist_progress_and_resume() {
        let storage = Storage::in_memory();
        let service = service(&storage);
        service
            .configure(&QuizConfig::new(3, "questions.json", fixed_now()))
            .await
            .unwrap();

        let start = service.initialize().await.unwrap();
        assert!(!start.resumed);
        let mut session = start.session;
        let first = session.current_question().id();

        let later = service
            .clone()
            .with_clock(Clock::fixed(fixed_now() + Duration::seconds(5)));
        let answer = if session.current_question().kind() == QuestionKind::Single {
            Selection::single(0)
        } else {
            Selection::multiple([0])
        };
        later
            .apply(
                &mut session,
                SessionCommand::Answer {
                    position: 0,
                    selection: answer.clone(),
                },
            )
            .await
            .unwrap();
        later.apply(&mut session, SessionCommand::Next).await.unwrap();

        let saved = service.saved_progress().await.unwrap().unwrap();
        assert_eq!(saved.current_question, 1);
        assert_eq!(saved.question_ids.len(), 3);

        let resumed = service.initialize().await.unwrap();
        assert!(resumed.resumed);
        assert_eq!(resumed.session.current_position(), 1);
        assert_eq!(resumed.session.questions()[0].id(), first);
        assert_eq!(resumed.session.answer(0), Some(&answer));
        assert_eq!(resumed.session.timing().question_elapsed(0), Some(5_000));
    }

    #[tokio::test]
    async fn unusable_progress_starts_fresh() {
        let storage = Storage::in_memory();
        let service = service(&storage);
        service
            .configure(&QuizConfig::new(2, "questions.json", fixed_now()))
            .await
            .unwrap();
        storage
            .entries
            .put("quizProgress", r#"{"currentQuestion": 0, "totalQuestions": 2, "timestamp": 0}"#)
            .await
            .unwrap();

        let start = service.initialize().await.unwrap();
        assert!(!start.resumed);
        assert_eq!(start.session.total_questions(), 2);
        let saved = service.saved_progress().await.unwrap().unwrap();
        assert_eq!(saved.question_ids, start.session.questions().ids());
    }

    #[tokio::test]
    async fn completion_saves_results_once_and_clears_progress() {
        let storage = Storage::in_memory();
        let service = service(&storage);
        service
            .configure(&QuizConfig::new(2, "questions.json", fixed_now()))
            .await
            .unwrap();
        let mut session = service.initialize().await.unwrap().session;

        let done = service
            .clone()
            .with_clock(Clock::fixed(fixed_now() + Duration::seconds(42)));
        let CommandOutcome::Completed(first) =
            done.apply(&mut session, SessionCommand::Complete).await.unwrap()
        else {
            panic!("expected completion");
        };
        assert_eq!(first.total_time, 42_000);

        let store = storage.quiz_store();
        assert!(store.load_progress().await.unwrap().is_none());
        assert!(store.load_timer_state().await.unwrap().is_none());
        assert_eq!(store.load_results().await.unwrap(), Some(first.clone()));

        let CommandOutcome::Completed(second) =
            service.apply(&mut session, SessionCommand::Complete).await.unwrap()
        else {
            panic!("expected completion");
        };
        assert_eq!(second, first);

        let err = service
            .apply(&mut session, SessionCommand::Next)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::Session(crate::error::SessionError::Completed)
        ));
    }
}
