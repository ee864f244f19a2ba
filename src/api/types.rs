use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::db::sqlite::open_database;
use crate::pipeline::backend::{GenerationBackend, GenerationParams};

/// Shared state for all API handlers.
///
/// The generation backend is injected at construction so tests can swap in
/// a mock; handlers open a fresh SQLite connection per request.
#[derive(Clone)]
pub struct ApiContext {
    db_path: Arc<PathBuf>,
    pub backend: Arc<dyn GenerationBackend>,
    pub model: Arc<str>,
    pub params: GenerationParams,
}

impl ApiContext {
    pub fn new(
        db_path: PathBuf,
        backend: Arc<dyn GenerationBackend>,
        model: String,
        params: GenerationParams,
    ) -> Self {
        Self {
            db_path: Arc::new(db_path),
            backend,
            model: model.into(),
            params,
        }
    }

    /// Open a connection for the current request.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        open_database(&self.db_path).map_err(|e| ApiError::Internal(format!("Database: {e}")))
    }
}
