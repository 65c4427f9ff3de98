//! Session database operations
//!
//! Sessions map opaque uuid tokens to a denormalized user snapshot. The
//! snapshot is a fast-read copy; it may drift from the authoritative user
//! row when the payment webhook changes a subscription mid-session, so
//! lookups re-read the user row and fall back to the snapshot only when
//! the account has vanished.

use lucid_common::types::User;
use lucid_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Create a session for a user, returning the opaque token
pub async fn create_session(pool: &SqlitePool, user: &User) -> Result<String> {
    let token = Uuid::new_v4().to_string();
    let snapshot = serde_json::to_string(user)
        .map_err(|e| lucid_common::Error::Internal(format!("Serialize session failed: {}", e)))?;

    sqlx::query("INSERT INTO sessions (token, user_snapshot, created_at) VALUES (?, ?, CURRENT_TIMESTAMP)")
        .bind(&token)
        .bind(&snapshot)
        .execute(pool)
        .await?;

    Ok(token)
}

/// Resolve a session token to the current user
pub async fn get_session_user(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT user_snapshot FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?;

    let Some((snapshot,)) = row else {
        return Ok(None);
    };

    let snapshot_user = match serde_json::from_str::<User>(&snapshot) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping session with malformed snapshot");
            delete_session(pool, token).await?;
            return Ok(None);
        }
    };

    // Authoritative read; webhook updates may have changed tier or status
    match crate::db::users::load_user(pool, &snapshot_user.email).await? {
        Some(user) => Ok(Some(user)),
        None => Ok(Some(snapshot_user)),
    }
}

/// Remove a session (logout)
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}
