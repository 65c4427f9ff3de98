//! Analysis database operations
//!
//! Analyses are keyed by (ticker, month). Saving an existing key overwrites
//! every field except the entry price: once a non-zero entry price is
//! recorded it survives later regenerations.

use lucid_common::types::StockAnalysis;
use lucid_common::Result;
use sqlx::{Row, SqlitePool};

/// Save an analysis, upserting on the (ticker, month) composite key
pub async fn save_analysis(pool: &SqlitePool, analysis: &StockAnalysis) -> Result<()> {
    let document = serde_json::to_string(analysis)
        .map_err(|e| lucid_common::Error::Internal(format!("Serialize analysis failed: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO analyses (
            ticker, month, importance_rank, sector, entry_price, document,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(ticker, month) DO UPDATE SET
            importance_rank = excluded.importance_rank,
            sector = excluded.sector,
            entry_price = CASE
                WHEN analyses.entry_price IS NOT NULL AND analyses.entry_price != 0
                THEN analyses.entry_price
                ELSE excluded.entry_price
            END,
            document = excluded.document,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&analysis.ticker)
    .bind(&analysis.last_update)
    .bind(analysis.importance_rank)
    .bind(&analysis.sector)
    .bind(analysis.entry_price)
    .bind(&document)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one analysis by composite key
pub async fn load_analysis(
    pool: &SqlitePool,
    ticker: &str,
    month: &str,
) -> Result<Option<StockAnalysis>> {
    let row = sqlx::query(
        "SELECT ticker, month, entry_price, document FROM analyses WHERE ticker = ? AND month = ?",
    )
    .bind(ticker)
    .bind(month)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|row| analysis_from_row(&row)))
}

/// Whether an analysis exists for (ticker, month)
pub async fn exists(pool: &SqlitePool, ticker: &str, month: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM analyses WHERE ticker = ? AND month = ?")
            .bind(ticker)
            .bind(month)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Number of analyses recorded for a reporting month
pub async fn count_for_month(pool: &SqlitePool, month: &str) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analyses WHERE month = ?")
        .bind(month)
        .fetch_one(pool)
        .await?;

    Ok(count as usize)
}

/// All analyses for a reporting month, ordered by importance rank
pub async fn list_for_month(pool: &SqlitePool, month: &str) -> Result<Vec<StockAnalysis>> {
    let rows = sqlx::query(
        "SELECT ticker, month, entry_price, document FROM analyses
         WHERE month = ? ORDER BY importance_rank, ticker",
    )
    .bind(month)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().filter_map(analysis_from_row).collect())
}

/// Every analysis in the archive, newest month keys last
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<StockAnalysis>> {
    let rows = sqlx::query(
        "SELECT ticker, month, entry_price, document FROM analyses
         ORDER BY month, importance_rank, ticker",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().filter_map(analysis_from_row).collect())
}

/// Delete one analysis; returns whether a row was removed
pub async fn delete_analysis(pool: &SqlitePool, ticker: &str, month: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM analyses WHERE ticker = ? AND month = ?")
        .bind(ticker)
        .bind(month)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Decode one row, treating a corrupt document as an absent record
///
/// The key columns are authoritative: ticker, month and the preserved entry
/// price override whatever the stored document claims.
fn analysis_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<StockAnalysis> {
    let ticker: String = row.get("ticker");
    let month: String = row.get("month");
    let entry_price: Option<f64> = row.get("entry_price");
    let document: String = row.get("document");

    match serde_json::from_str::<StockAnalysis>(&document) {
        Ok(mut analysis) => {
            analysis.ticker = ticker;
            analysis.last_update = month;
            if let Some(price) = entry_price {
                analysis.entry_price = price;
            }
            Some(analysis)
        }
        Err(e) => {
            tracing::warn!(
                ticker = %ticker,
                month = %month,
                error = %e,
                "Skipping analysis with malformed document"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use lucid_common::types::{LucidityScore, Scenario, Swot};

    fn analysis(ticker: &str, month: &str, rank: i64, entry_price: f64) -> StockAnalysis {
        StockAnalysis {
            ticker: ticker.to_string(),
            importance_rank: rank,
            isin: None,
            name: format!("{} Inc", ticker),
            sector: "Tech".to_string(),
            entry_price,
            last_update: month.to_string(),
            marketing_hook: None,
            swot: Swot::default(),
            main_scenario: Scenario {
                probability: 0.6,
                description: "Base case".to_string(),
                ..Scenario::default()
            },
            negative_scenario: Scenario::default(),
            neutral_scenario: Scenario::default(),
            lucidity_score: LucidityScore::default(),
            market_anticipations: vec![],
            real_risks: vec![],
            invalidation_points: vec![],
            recommendation_note: None,
            sources: None,
        }
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let pool = test_pool().await;
        save_analysis(&pool, &analysis("NVDA", "March 2026", 1, 121.4))
            .await
            .unwrap();

        let loaded = load_analysis(&pool, "NVDA", "March 2026")
            .await
            .unwrap()
            .expect("analysis not found");

        assert_eq!(loaded.ticker, "NVDA");
        assert_eq!(loaded.entry_price, 121.4);
        assert_eq!(loaded.main_scenario.description, "Base case");
    }

    #[tokio::test]
    async fn resave_same_key_is_an_update_not_a_duplicate() {
        let pool = test_pool().await;
        save_analysis(&pool, &analysis("NVDA", "March 2026", 1, 121.4))
            .await
            .unwrap();
        save_analysis(&pool, &analysis("NVDA", "March 2026", 5, 130.0))
            .await
            .unwrap();

        assert_eq!(count_for_month(&pool, "March 2026").await.unwrap(), 1);

        let loaded = load_analysis(&pool, "NVDA", "March 2026")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.importance_rank, 5);
    }

    #[tokio::test]
    async fn regeneration_preserves_original_entry_price() {
        let pool = test_pool().await;
        save_analysis(&pool, &analysis("NVDA", "March 2026", 1, 121.4))
            .await
            .unwrap();
        save_analysis(&pool, &analysis("NVDA", "March 2026", 1, 999.0))
            .await
            .unwrap();

        let loaded = load_analysis(&pool, "NVDA", "March 2026")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.entry_price, 121.4);
    }

    #[tokio::test]
    async fn zero_entry_price_is_replaceable() {
        let pool = test_pool().await;
        save_analysis(&pool, &analysis("NVDA", "March 2026", 1, 0.0))
            .await
            .unwrap();
        save_analysis(&pool, &analysis("NVDA", "March 2026", 1, 121.4))
            .await
            .unwrap();

        let loaded = load_analysis(&pool, "NVDA", "March 2026")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.entry_price, 121.4);
    }

    #[tokio::test]
    async fn same_ticker_different_months_are_distinct_records() {
        let pool = test_pool().await;
        save_analysis(&pool, &analysis("NVDA", "March 2026", 1, 121.4))
            .await
            .unwrap();
        save_analysis(&pool, &analysis("NVDA", "April 2026", 2, 140.0))
            .await
            .unwrap();

        assert_eq!(count_for_month(&pool, "March 2026").await.unwrap(), 1);
        assert_eq!(count_for_month(&pool, "April 2026").await.unwrap(), 1);

        let april = load_analysis(&pool, "NVDA", "April 2026")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(april.entry_price, 140.0);
    }

    #[tokio::test]
    async fn malformed_document_is_skipped_not_fatal() {
        let pool = test_pool().await;
        save_analysis(&pool, &analysis("MSFT", "March 2026", 2, 376.2))
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO analyses (ticker, month, importance_rank, sector, entry_price, document)
             VALUES ('BAD', 'March 2026', 1, 'Tech', 1.0, 'not json at all')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let listed = list_for_month(&pool, "March 2026").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].ticker, "MSFT");

        assert!(load_analysis(&pool, "BAD", "March 2026")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn delete_removes_only_the_keyed_row() {
        let pool = test_pool().await;
        save_analysis(&pool, &analysis("NVDA", "March 2026", 1, 121.4))
            .await
            .unwrap();
        save_analysis(&pool, &analysis("NVDA", "April 2026", 1, 140.0))
            .await
            .unwrap();

        assert!(delete_analysis(&pool, "NVDA", "March 2026").await.unwrap());
        assert!(!delete_analysis(&pool, "NVDA", "March 2026").await.unwrap());
        assert!(exists(&pool, "NVDA", "April 2026").await.unwrap());
    }
}
