use std::sync::Arc;

use gradeshare_events::Publisher;
use gradeshare_pipeline::GradeService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is an `Arc` or a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: gradeshare_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Consent and grade operations.
    pub service: GradeService,
    /// Publishes share requests for the worker.
    pub publisher: Publisher,
}
