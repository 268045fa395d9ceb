use std::sync::Arc;

use crate::config::ServerConfig;
use crate::storage::SampleStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: predictcr_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// On-disk storage for sample inputs and result archives.
    pub storage: Arc<SampleStorage>,
}
