//! Payment provider webhook
//!
//! Receives Stripe-style events and applies subscription changes to member
//! accounts out-of-band. Unhandled event types are acknowledged so the
//! provider stops retrying them.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use lucid_common::events::LucidEvent;
use lucid_common::types::{SubscriptionStatus, UserTier};

use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /webhook/stripe
async fn stripe_webhook(
    State(state): State<AppState>,
    Json(event): Json<Value>,
) -> ApiResult<Json<Value>> {
    let event_type = event
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("missing event type".to_string()))?;

    let object = event
        .pointer("/data/object")
        .ok_or_else(|| ApiError::BadRequest("missing event payload".to_string()))?;

    match event_type {
        "checkout.session.completed" => checkout_completed(&state, object).await?,
        "customer.subscription.deleted" => subscription_deleted(&state, object).await?,
        other => {
            info!(event_type = other, "ignoring unhandled webhook event");
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// A completed checkout upgrades the member to the purchased plan.
async fn checkout_completed(state: &AppState, object: &Value) -> ApiResult<()> {
    let email = object
        .pointer("/customer_details/email")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("checkout session without email".to_string()))?
        .to_lowercase();

    let plan = object
        .pointer("/metadata/planType")
        .and_then(Value::as_str)
        .unwrap_or("");
    let tier = UserTier::from_plan_label(plan);
    if tier == UserTier::Unknown {
        warn!(email = %email, plan = plan, "checkout with unknown plan type");
    }

    let has_crypto = object
        .pointer("/metadata/hasCrypto")
        .and_then(Value::as_str)
        .map(|v| v == "true")
        .unwrap_or(false);

    let subscription_id = object.get("subscription").and_then(Value::as_str);

    let updated = users::update_subscription(
        &state.db,
        &email,
        tier,
        has_crypto,
        SubscriptionStatus::Active,
        subscription_id,
    )
    .await?;

    if !updated {
        warn!(email = %email, "checkout completed for unknown account");
        return Ok(());
    }

    info!(email = %email, tier = tier.as_str(), "subscription activated");
    state.event_bus.emit_lossy(LucidEvent::SubscriptionChanged {
        email,
        tier: tier.as_str().to_string(),
        status: "ACTIVE".to_string(),
        timestamp: Utc::now(),
    });
    Ok(())
}

/// A deleted subscription drops the member to canceled status.
async fn subscription_deleted(state: &AppState, object: &Value) -> ApiResult<()> {
    let subscription_id = object
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("subscription event without id".to_string()))?;

    match users::cancel_by_subscription_id(&state.db, subscription_id).await? {
        Some(email) => {
            info!(email = %email, "subscription canceled");
            state.event_bus.emit_lossy(LucidEvent::SubscriptionChanged {
                email,
                tier: String::new(),
                status: "CANCELED".to_string(),
                timestamp: Utc::now(),
            });
        }
        None => {
            warn!(
                subscription_id = subscription_id,
                "cancellation for unknown subscription"
            );
        }
    }
    Ok(())
}

/// Build webhook routes
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhook/stripe", post(stripe_webhook))
}
