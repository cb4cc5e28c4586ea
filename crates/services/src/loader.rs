//! Fetching question datasets, bounded by a timeout.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use quiz_core::LoadError;
use quiz_core::bank::QuestionBank;
use quiz_core::config::{DATA_DIR, DATASET_TIMEOUT_SECS};

/// Somewhere dataset bodies can be fetched from by file name.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch the raw body of `data_file`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Unreachable` if the dataset cannot be fetched.
    async fn fetch(&self, data_file: &str) -> Result<String, LoadError>;
}

fn check_file_name(data_file: &str) -> Result<(), LoadError> {
    let path = Path::new(data_file);
    let plain = !data_file.trim().is_empty()
        && path
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
    if plain {
        Ok(())
    } else {
        Err(LoadError::Unreachable(format!(
            "invalid data file name: {data_file:?}"
        )))
    }
}

/// Fetches `<base>/data/<file>` over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpDatasetSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDatasetSource {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn url_for(&self, data_file: &str) -> String {
        format!(
            "{}/{DATA_DIR}/{data_file}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    async fn fetch(&self, data_file: &str) -> Result<String, LoadError> {
        check_file_name(data_file)?;
        let url = self.url_for(data_file);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LoadError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Unreachable(format!("HTTP {status} for {url}")));
        }

        response
            .text()
            .await
            .map_err(|e| LoadError::Unreachable(e.to_string()))
    }
}

/// Reads `<root>/data/<file>` from disk.
#[derive(Debug, Clone)]
pub struct FileDatasetSource {
    root: PathBuf,
}

impl FileDatasetSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn path_for(&self, data_file: &str) -> PathBuf {
        self.root.join(DATA_DIR).join(data_file)
    }
}

#[async_trait]
impl DatasetSource for FileDatasetSource {
    async fn fetch(&self, data_file: &str) -> Result<String, LoadError> {
        check_file_name(data_file)?;
        let path = self.path_for(data_file);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LoadError::Unreachable(format!("{}: {e}", path.display())))
    }
}

/// Datasets held in memory, keyed by file name. Useful for tests and
/// embedded question packs.
#[derive(Debug, Clone, Default)]
pub struct StaticDatasetSource {
    files: HashMap<String, String>,
}

impl StaticDatasetSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, data_file: impl Into<String>, body: impl Into<String>) -> Self {
        self.files.insert(data_file.into(), body.into());
        self
    }
}

#[async_trait]
impl DatasetSource for StaticDatasetSource {
    async fn fetch(&self, data_file: &str) -> Result<String, LoadError> {
        self.files
            .get(data_file)
            .cloned()
            .ok_or_else(|| LoadError::Unreachable(format!("no dataset named {data_file}")))
    }
}

/// Loads and validates a dataset into a `QuestionBank`.
#[derive(Clone)]
pub struct QuestionLoader {
    source: Arc<dyn DatasetSource>,
    timeout: Duration,
}

impl QuestionLoader {
    #[must_use]
    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        Self {
            source,
            timeout: Duration::from_secs(DATASET_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch and parse `data_file`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Timeout` if the source does not answer in time, and
    /// the source's or parser's `LoadError` otherwise.
    pub async fn load(&self, data_file: &str) -> Result<QuestionBank, LoadError> {
        let body = tokio::time::timeout(self.timeout, self.source.fetch(data_file))
            .await
            .map_err(|_| LoadError::Timeout)??;

        let bank = QuestionBank::from_json(&body)?;
        if bank.dropped() > 0 {
            tracing::warn!(data_file, dropped = bank.dropped(), "skipped invalid question records");
        }
        tracing::info!(data_file, questions = bank.len(), "loaded question dataset");
        Ok(bank)
    }
}
