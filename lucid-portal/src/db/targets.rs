//! Monthly target-set cache
//!
//! Maps a reporting-month label to the ticker list selected for that month.
//! Selection happens at most once per month: the orchestrator reads this
//! cache before asking the generator to pick tickers. Rows upsert per month
//! key, so caching one month never drops another month's selection.

use lucid_common::Result;
use sqlx::SqlitePool;

/// Cached ticker list for a month, if selection already ran
pub async fn get_target_tickers(pool: &SqlitePool, month: &str) -> Result<Option<Vec<String>>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT tickers FROM monthly_targets WHERE month = ?")
            .bind(month)
            .fetch_optional(pool)
            .await?;

    match row {
        Some((json,)) => match serde_json::from_str::<Vec<String>>(&json) {
            Ok(tickers) => Ok(Some(tickers)),
            Err(e) => {
                // Corrupt cache falls back to reselection rather than crashing
                tracing::warn!(month = %month, error = %e, "Malformed target cache; ignoring");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Cache the selected ticker list for a month
pub async fn save_target_tickers(pool: &SqlitePool, month: &str, tickers: &[String]) -> Result<()> {
    let json = serde_json::to_string(tickers)
        .map_err(|e| lucid_common::Error::Internal(format!("Serialize targets failed: {}", e)))?;

    sqlx::query(
        "INSERT INTO monthly_targets (month, tickers, created_at)
         VALUES (?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT(month) DO UPDATE SET tickers = excluded.tickers",
    )
    .bind(month)
    .bind(&json)
    .execute(pool)
    .await?;

    Ok(())
}
