//! lucid-portal library interface
//!
//! Exposes the application state, router and service modules for
//! integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use lucid_common::events::EventBus;

use crate::config::PortalConfig;
use crate::services::generator::AnalysisGenerator;
use crate::services::market::MarketClient;
use crate::services::sync::SyncOrchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Monthly sync orchestrator (serializes its own runs)
    pub sync: Arc<SyncOrchestrator>,
    /// Report generator, also used for partner drafts
    pub generator: Arc<dyn AnalysisGenerator>,
    /// Market snapshot client
    pub market: Arc<MarketClient>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        generator: Arc<dyn AnalysisGenerator>,
        market: Arc<MarketClient>,
        config: &PortalConfig,
    ) -> Self {
        let sync = Arc::new(SyncOrchestrator::new(
            db.clone(),
            event_bus.clone(),
            generator.clone(),
            config.sync_day,
            config.monthly_target_count,
            std::time::Duration::from_millis(config.generation_delay_ms),
        ));

        Self {
            db,
            event_bus,
            sync,
            generator,
            market,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;
    use tower_http::{cors::CorsLayer, trace::TraceLayer};

    Router::new()
        .merge(api::health_routes())
        .merge(api::sync_routes())
        .merge(api::analysis_routes())
        .merge(api::partner_routes())
        .merge(api::auth_routes())
        .merge(api::webhook_routes())
        .route("/api/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        // Browser clients hit the API from the portal frontend origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
