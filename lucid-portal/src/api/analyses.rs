//! Analysis listing, curation and market snapshot endpoints
//!
//! Members get the tier-filtered view; admins get the raw collection plus
//! manual save and delete for curation.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use chrono::Datelike;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;

use lucid_common::types::{MarketPricePoint, StockAnalysis};
use lucid_common::visibility::is_visible;
use lucid_common::ReportingMonth;

use crate::api::auth::{require_admin, require_session};
use crate::db::analyses;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    /// Restrict to one reporting-month label
    month: Option<String>,
}

/// GET /api/analyses
///
/// The member-facing view: only analyses the member's tier may see, and only
/// months from their signup month onward. Older archives stay hidden from
/// accounts created later. `?month=` narrows to one reporting month.
async fn list_visible(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<StockAnalysis>>> {
    let user = require_session(&state, &headers).await?;

    let signup_month = ReportingMonth {
        year: user.signup_date.year(),
        month: user.signup_date.month(),
    };
    let signup_cutoff = signup_month.first_day();

    let all = match &query.month {
        Some(month) => analyses::list_for_month(&state.db, month).await?,
        None => analyses::list_all(&state.db).await?,
    };
    let visible = all
        .into_iter()
        .filter(|analysis| is_visible(&user, analysis))
        .filter(|analysis| {
            match (ReportingMonth::parse(&analysis.last_update), signup_cutoff) {
                (Some(month), Some(cutoff)) => {
                    month.first_day().is_some_and(|day| day >= cutoff)
                }
                // Unparseable month labels stay out of the member view
                _ => false,
            }
        })
        .collect();

    Ok(Json(visible))
}

/// GET /api/analyses/all - unfiltered collection (admin)
async fn list_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<StockAnalysis>>> {
    require_admin(&state, &headers).await?;
    Ok(Json(analyses::list_all(&state.db).await?))
}

/// POST /api/analyses - save one analysis (admin)
///
/// Upserts by (ticker, month). An already-set entry price survives the
/// update.
async fn save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(analysis): Json<StockAnalysis>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require_admin(&state, &headers).await?;

    if analysis.ticker.trim().is_empty() {
        return Err(ApiError::BadRequest("ticker is required".to_string()));
    }
    if ReportingMonth::parse(&analysis.last_update).is_none() {
        return Err(ApiError::BadRequest(format!(
            "invalid month label: {}",
            analysis.last_update
        )));
    }

    analyses::save_analysis(&state.db, &analysis).await?;
    info!(ticker = %analysis.ticker, month = %analysis.last_update, "analysis saved via API");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "ticker": analysis.ticker, "month": analysis.last_update })),
    ))
}

/// DELETE /api/analyses/:ticker/:month (admin)
async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((ticker, month)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    require_admin(&state, &headers).await?;

    if analyses::delete_analysis(&state.db, &ticker, &month).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("{} / {}", ticker, month)))
    }
}

#[derive(Debug, Deserialize)]
struct PricesQuery {
    /// Comma-separated ticker list
    tickers: String,
}

/// GET /api/market/prices?tickers=NVDA,BTC
///
/// Every requested ticker gets a price point; tickers without a live quote
/// fall back to static values.
async fn market_prices(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PricesQuery>,
) -> ApiResult<Json<HashMap<String, MarketPricePoint>>> {
    require_session(&state, &headers).await?;

    let tickers: Vec<String> = query
        .tickers
        .split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect();

    Ok(Json(state.market.fetch_prices(&tickers).await))
}

/// Build analysis and market routes
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analyses", get(list_visible).post(save))
        .route("/api/analyses/all", get(list_all))
        .route("/api/analyses/:ticker/:month", delete(remove))
        .route("/api/market/prices", get(market_prices))
}
