#![forbid(unsafe_code)]

pub mod records;
pub mod repository;
pub mod sqlite;

pub use records::{ProgressRecord, StorageKey};
pub use repository::{InMemoryRepository, KeyValueStore, QuizStore, Storage, StorageError};
