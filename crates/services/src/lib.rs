#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod loader;
pub mod results_service;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use error::{PersistenceError, QuizServiceError, SessionError};
pub use loader::{
    DatasetSource, FileDatasetSource, HttpDatasetSource, QuestionLoader, StaticDatasetSource,
};
pub use results_service::{ResultsService, ScoredResults};

pub use sessions::{
    CommandOutcome, QuizLoopService, QuizSession, RevealedAnswer, SessionCommand, SessionPhase,
    SessionProgress, SessionStart,
};
