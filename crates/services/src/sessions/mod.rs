mod commands;
mod progress;
mod queries;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{PersistenceError, SessionError};
pub use commands::{CommandOutcome, RevealedAnswer, SessionCommand};
pub use progress::SessionProgress;
pub use service::{QuizSession, SessionPhase};
pub use workflow::{QuizLoopService, SessionStart};
