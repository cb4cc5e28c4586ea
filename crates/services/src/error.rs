//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::{LoadError, UsageError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the session state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("session already completed")]
    Completed,
}

/// Saved progress that cannot be resumed. Never surfaces past initialization;
/// the caller starts a fresh attempt instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("saved progress does not list its questions")]
    MissingQuestionIds,
    #[error("saved questions are no longer in the dataset")]
    UnknownQuestions,
    #[error("saved progress is for {saved} questions, found {actual}")]
    LengthMismatch { saved: usize, actual: usize },
    #[error("saved position {position} is out of range for {len} questions")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("saved answer at position {position} is invalid: {source}")]
    InvalidAnswer {
        position: usize,
        #[source]
        source: UsageError,
    },
}

/// Errors emitted by `QuizLoopService` and `ResultsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("no quiz configuration found")]
    MissingConfig,
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
