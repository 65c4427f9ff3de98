//! Settings database operations
//!
//! Key-value settings table holding the last-sync timestamp and the Gemini
//! API key (the authoritative tier of the key resolution).

use chrono::Utc;
use lucid_common::{Error, Result};
use sqlx::{Pool, Sqlite};

const KEY_GEMINI_API_KEY: &str = "gemini_api_key";
const KEY_LAST_SYNC: &str = "last_sync";

/// Get the Gemini API key from the database tier
pub async fn get_gemini_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, KEY_GEMINI_API_KEY).await
}

/// Set the Gemini API key in the database tier
pub async fn set_gemini_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, KEY_GEMINI_API_KEY, key).await
}

/// Last successful sync touch, as an RFC3339 timestamp
pub async fn get_last_sync(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, KEY_LAST_SYNC).await
}

/// Record the sync timestamp as now
pub async fn set_last_sync(db: &Pool<Sqlite>) -> Result<()> {
    set_setting(db, KEY_LAST_SYNC, Utc::now().to_rfc3339()).await
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
