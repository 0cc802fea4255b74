//! chartsync-server library
//!
//! Exposes the pipeline engines, collaborator clients and HTTP surface
//! so integration tests can drive them against in-memory state.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod services;
pub mod types;

pub use error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::pipeline::resolver::ResolverLimits;
use crate::services::chart_client::ChartClient;
use crate::types::{AuthVerifier, Catalog};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Catalog search and playlist mutation
    pub catalog: Arc<dyn Catalog>,
    /// Chart source client
    pub charts: Arc<ChartClient>,
    /// Credential verification
    pub auth: Arc<dyn AuthVerifier>,
    /// Resolution fan-out limits
    pub limits: ResolverLimits,
    /// Playlist used when a publish request does not name one
    pub default_playlist_id: Option<String>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        catalog: Arc<dyn Catalog>,
        charts: Arc<ChartClient>,
        auth: Arc<dyn AuthVerifier>,
        limits: ResolverLimits,
        default_playlist_id: Option<String>,
    ) -> Self {
        Self {
            db,
            catalog,
            charts,
            auth,
            limits,
            default_playlist_id,
            startup_time: Utc::now(),
        }
    }
}

/// Build the service router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health::health_routes())
        .merge(api::chart_routes())
        .with_state(state)
}
