use thiserror::Error;

/// Failures while fetching or parsing a question dataset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoadError {
    #[error("question dataset unreachable: {0}")]
    Unreachable(String),

    #[error("question dataset is malformed: {0}")]
    Malformed(String),

    #[error("no valid questions found")]
    Empty,

    #[error("timed out waiting for the question dataset")]
    Timeout,
}

/// A request the caller should not have made.
///
/// Usage errors never abort a session; the request is ignored.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UsageError {
    #[error("question count must be a positive integer (got {requested})")]
    InvalidCount { requested: i64 },

    #[error("position {position} is out of range for {len} questions")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("option {index} is out of range for {options} options")]
    SelectionOutOfRange { index: usize, options: usize },

    #[error("selection does not match the question type")]
    SelectionKindMismatch,
}

