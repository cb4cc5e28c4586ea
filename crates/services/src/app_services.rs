use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::loader::{DatasetSource, QuestionLoader};
use crate::results_service::ResultsService;
use crate::sessions::QuizLoopService;

/// Assembles app-facing services over one storage backend and dataset source.
#[derive(Clone)]
pub struct AppServices {
    quiz_loop: Arc<QuizLoopService>,
    results: Arc<ResultsService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, source: Arc<dyn DatasetSource>, clock: Clock) -> Self {
        let store = storage.quiz_store();
        let quiz_loop = Arc::new(QuizLoopService::new(
            clock,
            QuestionLoader::new(source),
            store.clone(),
        ));
        let results = Arc::new(ResultsService::new(store));
        Self { quiz_loop, results }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        source: Arc<dyn DatasetSource>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, source, clock))
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }
}
