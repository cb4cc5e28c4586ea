use quiz_core::model::ResultsSnapshot;
use quiz_core::scoring::{ScoreReport, score};
use storage::QuizStore;

use crate::error::QuizServiceError;

/// A stored results snapshot together with its computed score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResults {
    pub snapshot: ResultsSnapshot,
    pub report: ScoreReport,
}

/// Reads back the latest completed attempt.
#[derive(Clone)]
pub struct ResultsService {
    store: QuizStore,
}

impl ResultsService {
    #[must_use]
    pub fn new(store: QuizStore) -> Self {
        Self { store }
    }

    /// Latest results, scored. `None` when nothing has been completed yet.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the store is unreachable or the
    /// stored snapshot is unreadable.
    pub async fn latest(&self) -> Result<Option<ScoredResults>, QuizServiceError> {
        let snapshot = self.store.load_results().await.inspect_err(|e| {
            tracing::warn!(error = %e, "could not read stored results");
        })?;
        Ok(snapshot.map(|snapshot| {
            let report = score(&snapshot);
            ScoredResults { snapshot, report }
        }))
    }
}
