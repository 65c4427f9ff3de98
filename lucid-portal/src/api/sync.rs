//! Sync trigger and status endpoints
//!
//! The monthly sync runs in the background; this surface starts a run,
//! reports whether one is in flight, and shows how far the current month has
//! come. Progress detail streams over `/api/events`.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use lucid_common::{Error, ReportingMonth};

use crate::api::auth::require_admin;
use crate::db::{analyses, settings};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
struct RunRequest {
    /// Bypass the day-of-month gate
    #[serde(default)]
    force: bool,
}

/// POST /api/sync/run (admin)
///
/// Starts a sync run in the background and returns immediately. A run
/// already in flight is a 409.
async fn run_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RunRequest>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require_admin(&state, &headers).await?;

    if state.sync.is_running() {
        return Err(ApiError::Conflict("sync already in progress".to_string()));
    }

    let force = body.map(|Json(req)| req.force).unwrap_or(false);
    let month = ReportingMonth::current().label();
    info!(month = %month, force = force, "sync run requested");

    let sync = state.sync.clone();
    let last_error = state.last_error.clone();
    tokio::spawn(async move {
        match sync.run_monthly_sync(force).await {
            Ok(synced) => {
                info!(synced = synced, "background sync run finished");
            }
            Err(err @ Error::Quota(_)) => {
                error!("background sync stopped on quota: {}", err);
                *last_error.write().await = Some(err.to_string());
            }
            Err(err) => {
                error!("background sync failed: {}", err);
                *last_error.write().await = Some(err.to_string());
            }
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "started": true, "month": month, "force": force })),
    ))
}

/// GET /api/sync/status
async fn sync_status(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let month = ReportingMonth::current().label();
    let count = analyses::count_for_month(&state.db, &month).await?;
    let last_sync = settings::get_last_sync(&state.db).await?;

    Ok(Json(json!({
        "running": state.sync.is_running(),
        "month": month,
        "analysesThisMonth": count,
        "lastSync": last_sync,
    })))
}

/// Build sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sync/run", post(run_sync))
        .route("/api/sync/status", get(sync_status))
}
