//! User database operations
//!
//! Accounts are never hard-deleted; subscription lifecycle changes are
//! status transitions, possibly arriving out-of-band via the payment
//! webhook while a session snapshot is still live.

use chrono::{DateTime, Utc};
use lucid_common::types::{SubscriptionStatus, User, UserRole, UserTier};
use lucid_common::Result;
use sqlx::{Row, SqlitePool};

/// Insert or update a user, keyed by email (case-insensitive)
pub async fn save_user(pool: &SqlitePool, user: &User, password_digest: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (
            id, email, password_digest, tier, role, status, has_crypto_option,
            signup_date, stripe_customer_id, subscription_id, current_period_end,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(email) DO UPDATE SET
            password_digest = excluded.password_digest,
            tier = excluded.tier,
            role = excluded.role,
            status = excluded.status,
            has_crypto_option = excluded.has_crypto_option,
            stripe_customer_id = excluded.stripe_customer_id,
            subscription_id = excluded.subscription_id,
            current_period_end = excluded.current_period_end,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(password_digest)
    .bind(user.tier.as_str())
    .bind(user.role.as_str())
    .bind(user.status.as_str())
    .bind(user.has_crypto_option as i64)
    .bind(user.signup_date.to_rfc3339())
    .bind(&user.stripe_customer_id)
    .bind(&user.subscription_id)
    .bind(user.current_period_end.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a user by email, with the stored password digest for login checks
pub async fn load_user_with_digest(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<(User, String)>> {
    let row = sqlx::query("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let digest: String = row.get("password_digest");
            Ok(Some((user_from_row(&row), digest)))
        }
        None => Ok(None),
    }
}

/// Load a user by email
pub async fn load_user(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    Ok(load_user_with_digest(pool, email).await?.map(|(user, _)| user))
}

/// All registered users (admin listing)
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT * FROM users ORDER BY signup_date")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(user_from_row).collect())
}

/// Apply a subscription change arriving from the payment webhook
///
/// Returns false when no user matches the email.
pub async fn update_subscription(
    pool: &SqlitePool,
    email: &str,
    tier: UserTier,
    has_crypto_option: bool,
    status: SubscriptionStatus,
    subscription_id: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            tier = ?,
            has_crypto_option = ?,
            status = ?,
            subscription_id = COALESCE(?, subscription_id),
            updated_at = CURRENT_TIMESTAMP
        WHERE email = ? COLLATE NOCASE
        "#,
    )
    .bind(tier.as_str())
    .bind(has_crypto_option as i64)
    .bind(status.as_str())
    .bind(subscription_id)
    .bind(email)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Transition the user holding a subscription id to Canceled
///
/// Returns the affected email, if any.
pub async fn cancel_by_subscription_id(
    pool: &SqlitePool,
    subscription_id: &str,
) -> Result<Option<String>> {
    let row = sqlx::query(
        r#"
        UPDATE users SET status = 'CANCELED', updated_at = CURRENT_TIMESTAMP
        WHERE subscription_id = ?
        RETURNING email
        "#,
    )
    .bind(subscription_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.get("email")))
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let id_str: String = row.get("id");
    let tier_str: String = row.get("tier");
    let role_str: String = row.get("role");
    let status_str: String = row.get("status");
    let signup_str: String = row.get("signup_date");
    let period_end: Option<String> = row.get("current_period_end");
    let has_crypto: i64 = row.get("has_crypto_option");

    User {
        id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
        email: row.get("email"),
        tier: UserTier::from_plan_label(&tier_str),
        role: UserRole::from_label(&role_str),
        status: SubscriptionStatus::from_label(&status_str),
        has_crypto_option: has_crypto != 0,
        signup_date: parse_timestamp(&signup_str),
        stripe_customer_id: row.get("stripe_customer_id"),
        subscription_id: row.get("subscription_id"),
        current_period_end: period_end.as_deref().map(parse_timestamp),
    }
}

/// Parse a stored RFC3339 timestamp, degrading to now on corruption
fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn save_and_load_user() {
        let pool = test_pool().await;
        let user = User::new("alice@lucidinvest.fr".to_string());

        save_user(&pool, &user, "digest-1").await.unwrap();

        let (loaded, digest) = load_user_with_digest(&pool, "alice@lucidinvest.fr")
            .await
            .unwrap()
            .expect("user not found");

        assert_eq!(loaded.email, "alice@lucidinvest.fr");
        assert_eq!(loaded.tier, UserTier::MiniBeta);
        assert_eq!(loaded.status, SubscriptionStatus::Active);
        assert_eq!(digest, "digest-1");
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let pool = test_pool().await;
        save_user(&pool, &User::new("Bob@Lucid.fr".to_string()), "d")
            .await
            .unwrap();

        assert!(load_user(&pool, "bob@lucid.fr").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn webhook_subscription_update_changes_tier_and_status() {
        let pool = test_pool().await;
        save_user(&pool, &User::new("carol@lucid.fr".to_string()), "d")
            .await
            .unwrap();

        let updated = update_subscription(
            &pool,
            "carol@lucid.fr",
            UserTier::Alpha,
            true,
            SubscriptionStatus::Active,
            Some("sub_123"),
        )
        .await
        .unwrap();
        assert!(updated);

        let user = load_user(&pool, "carol@lucid.fr").await.unwrap().unwrap();
        assert_eq!(user.tier, UserTier::Alpha);
        assert!(user.has_crypto_option);
        assert_eq!(user.subscription_id.as_deref(), Some("sub_123"));
    }

    #[tokio::test]
    async fn cancel_by_subscription_id_transitions_status() {
        let pool = test_pool().await;
        let mut user = User::new("dave@lucid.fr".to_string());
        user.subscription_id = Some("sub_999".to_string());
        save_user(&pool, &user, "d").await.unwrap();

        let email = cancel_by_subscription_id(&pool, "sub_999").await.unwrap();
        assert_eq!(email.as_deref(), Some("dave@lucid.fr"));

        let user = load_user(&pool, "dave@lucid.fr").await.unwrap().unwrap();
        assert_eq!(user.status, SubscriptionStatus::Canceled);

        // Unknown subscription ids are tolerated
        assert!(cancel_by_subscription_id(&pool, "sub_000")
            .await
            .unwrap()
            .is_none());
    }
}
