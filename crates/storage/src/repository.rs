use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::config::QuizConfig;
use quiz_core::model::ResultsSnapshot;
use quiz_core::timing::TimerSnapshot;

use crate::records::{ProgressRecord, StorageKey};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable string storage keyed by name, like browser local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Typed access to the quiz records, JSON-encoded over any `KeyValueStore`.
#[derive(Clone)]
pub struct QuizStore {
    entries: Arc<dyn KeyValueStore>,
}

impl QuizStore {
    #[must_use]
    pub fn new(entries: Arc<dyn KeyValueStore>) -> Self {
        Self { entries }
    }

    async fn read<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.entries.get(key.as_str()).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Serialization(format!("{}: {e}", key.as_str())))
    }

    async fn write<T: Serialize + Sync>(
        &self,
        key: StorageKey,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::Serialization(format!("{}: {e}", key.as_str())))?;
        self.entries.put(key.as_str(), &raw).await
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored config is corrupt.
    pub async fn load_config(&self) -> Result<Option<QuizConfig>, StorageError> {
        self.read(StorageKey::QuizConfig).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the config cannot be written.
    pub async fn save_config(&self, config: &QuizConfig) -> Result<(), StorageError> {
        self.write(StorageKey::QuizConfig, config).await
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored progress is corrupt.
    pub async fn load_progress(&self) -> Result<Option<ProgressRecord>, StorageError> {
        self.read(StorageKey::QuizProgress).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the progress cannot be written.
    pub async fn save_progress(&self, progress: &ProgressRecord) -> Result<(), StorageError> {
        self.write(StorageKey::QuizProgress, progress).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the progress cannot be removed.
    pub async fn clear_progress(&self) -> Result<(), StorageError> {
        self.entries.remove(StorageKey::QuizProgress.as_str()).await
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored timer state is corrupt.
    pub async fn load_timer_state(&self) -> Result<Option<TimerSnapshot>, StorageError> {
        self.read(StorageKey::TimerState).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the timer state cannot be written.
    pub async fn save_timer_state(&self, timers: &TimerSnapshot) -> Result<(), StorageError> {
        self.write(StorageKey::TimerState, timers).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the timer state cannot be removed.
    pub async fn clear_timer_state(&self) -> Result<(), StorageError> {
        self.entries.remove(StorageKey::TimerState.as_str()).await
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored results are corrupt.
    pub async fn load_results(&self) -> Result<Option<ResultsSnapshot>, StorageError> {
        self.read(StorageKey::QuizResults).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the results cannot be written.
    pub async fn save_results(&self, results: &ResultsSnapshot) -> Result<(), StorageError> {
        self.write(StorageKey::QuizResults, results).await
    }
}

/// Wraps the key/value backend behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub entries: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let entries: Arc<dyn KeyValueStore> = Arc::new(InMemoryRepository::new());
        Self { entries }
    }

    #[must_use]
    pub fn quiz_store(&self) -> QuizStore {
        QuizStore::new(Arc::clone(&self.entries))
    }
}
