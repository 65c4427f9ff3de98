//! Partner listing management
//!
//! Partner cards (brokers the portal recommends) are public to read; writes
//! are admin-only. The draft endpoint asks the generator for marketing copy
//! for a new card.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use lucid_common::types::Partner;

use crate::api::auth::require_admin;
use crate::db::partners;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/partners - public listing
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Partner>>> {
    Ok(Json(partners::list_partners(&state.db).await?))
}

/// POST /api/partners - create or update a card (admin)
///
/// A missing id means a new card; a matching id replaces the existing one.
async fn save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut partner): Json<Partner>,
) -> ApiResult<(StatusCode, Json<Partner>)> {
    require_admin(&state, &headers).await?;

    if partner.name.trim().is_empty() {
        return Err(ApiError::BadRequest("partner name is required".to_string()));
    }
    if partner.id.trim().is_empty() {
        partner.id = Uuid::new_v4().to_string();
    }

    partners::save_partner(&state.db, &partner).await?;
    info!(id = %partner.id, name = %partner.name, "partner saved");
    Ok((StatusCode::CREATED, Json(partner)))
}

/// DELETE /api/partners/:id (admin)
async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    require_admin(&state, &headers).await?;

    if partners::delete_partner(&state.db, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("partner {}", id)))
    }
}

#[derive(Debug, Deserialize)]
struct DraftRequest {
    name: String,
}

/// POST /api/partners/draft - generate card copy for a partner name (admin)
async fn draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DraftRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &headers).await?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("partner name is required".to_string()));
    }

    let draft = state
        .generator
        .draft_partner(name)
        .await
        .map_err(|e| match e {
            crate::services::generator::GeneratorError::Quota(msg) => {
                ApiError::Common(lucid_common::Error::Quota(msg))
            }
            other => ApiError::Internal(format!("partner draft failed: {}", other)),
        })?
        .ok_or_else(|| {
            ApiError::Internal("generator produced no partner draft".to_string())
        })?;

    Ok(Json(json!({ "name": name, "draft": draft })))
}

/// Build partner routes
pub fn partner_routes() -> Router<AppState> {
    Router::new()
        .route("/api/partners", get(list).post(save))
        .route("/api/partners/:id", delete(remove))
        .route("/api/partners/draft", post(draft))
}
