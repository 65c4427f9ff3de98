//! Monthly analysis sync orchestration.
//!
//! Once per month, on a configurable day of the month, the portal asks the
//! generator for a target list of tickers and then produces one analysis per
//! ticker, sequentially, with a pause between calls to stay inside the
//! upstream quota. The run is resumable: already-persisted analyses for the
//! month are skipped, and a recoverable generation failure stops the run so
//! the next trigger picks up where this one left off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use lucid_common::events::{EventBus, LucidEvent};
use lucid_common::{Error, ReportingMonth, Result};

use crate::db::{analyses, settings, targets};
use crate::services::generator::{AnalysisGenerator, GeneratorError};

pub struct SyncOrchestrator {
    db: SqlitePool,
    event_bus: EventBus,
    generator: Arc<dyn AnalysisGenerator>,
    /// Day of month on which the scheduled sync runs.
    sync_day: u32,
    /// Number of analyses that makes a month complete.
    target_count: usize,
    /// Pause between consecutive generator calls.
    call_delay: Duration,
    running: AtomicBool,
}

impl SyncOrchestrator {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        generator: Arc<dyn AnalysisGenerator>,
        sync_day: u32,
        target_count: usize,
        call_delay: Duration,
    ) -> Self {
        Self {
            db,
            event_bus,
            generator,
            sync_day,
            target_count,
            call_delay,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the monthly sync. Returns `Ok(true)` when at least one new
    /// analysis was persisted. Quota exhaustion propagates as
    /// [`Error::Quota`]; other generation trouble ends the run quietly so a
    /// later trigger can retry.
    ///
    /// `force` bypasses the day-of-month gate, not the completeness check.
    pub async fn run_monthly_sync(&self, force: bool) -> Result<bool> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.emit_progress("Sync already in progress.");
            return Ok(false);
        }

        let outcome = self.run_inner(force).await;
        self.running.store(false, Ordering::SeqCst);

        match outcome {
            Ok(synced) => Ok(synced),
            Err(err @ Error::Quota(_)) => {
                warn!("monthly sync stopped: {}", err);
                self.event_bus.emit_lossy(LucidEvent::SyncFailed {
                    message: err.to_string(),
                    timestamp: Utc::now(),
                });
                Err(err)
            }
            Err(err) => {
                warn!("monthly sync failed: {}", err);
                self.emit_progress("Sync interrupted by a technical error.");
                Ok(false)
            }
        }
    }

    async fn run_inner(&self, force: bool) -> Result<bool> {
        let month = ReportingMonth::current();
        // Same local clock as the reporting-month key, so the gate day and
        // the month label never disagree across a month boundary.
        let today = Local::now().day();

        if !force && today != self.sync_day {
            info!(
                day = today,
                sync_day = self.sync_day,
                "not the sync day, skipping monthly sync"
            );
            self.emit_progress(&format!(
                "Waiting for day {} to sync {}.",
                self.sync_day,
                month.label()
            ));
            return Ok(false);
        }

        let existing = analyses::count_for_month(&self.db, &month.label()).await?;
        if existing >= self.target_count {
            info!(month = %month, count = existing, "month already complete");
            self.emit_progress("Analyses for this month are already up to date.");
            settings::set_last_sync(&self.db).await?;
            return Ok(false);
        }

        self.event_bus.emit_lossy(LucidEvent::SyncStarted {
            month: month.label(),
            forced: force,
            timestamp: Utc::now(),
        });

        let tickers = self.resolve_targets(&month).await?;
        if tickers.is_empty() {
            warn!(month = %month, "ticker selection produced no targets");
            self.event_bus.emit_lossy(LucidEvent::SyncFailed {
                message: format!("Ticker selection produced no targets for {}.", month),
                timestamp: Utc::now(),
            });
            return Ok(false);
        }

        let mut synced_any = false;
        let mut new_analyses = 0usize;
        let total = tickers.len();

        for (index, ticker) in tickers.iter().enumerate() {
            if analyses::exists(&self.db, ticker, &month.label()).await? {
                continue;
            }

            self.emit_progress(&format!(
                "[{}/{}] Generating analysis for {}...",
                index + 1,
                total,
                ticker
            ));
            tokio::time::sleep(self.call_delay).await;

            let rank = Some((index + 1) as i64);
            match self.generator.generate(ticker, &month.label(), rank).await {
                Ok(Some(mut analysis)) => {
                    analysis.last_update = month.label();
                    analyses::save_analysis(&self.db, &analysis).await?;
                    settings::set_last_sync(&self.db).await?;
                    self.event_bus.emit_lossy(LucidEvent::AnalysisSaved {
                        ticker: ticker.clone(),
                        month: month.label(),
                        timestamp: Utc::now(),
                    });
                    synced_any = true;
                    new_analyses += 1;
                }
                Ok(None) => {
                    warn!(ticker = %ticker, "generation returned nothing, stopping run");
                    self.emit_progress(&format!(
                        "Generation stopped at {}, will resume on the next sync.",
                        ticker
                    ));
                    break;
                }
                Err(GeneratorError::Quota(msg)) => {
                    return Err(Error::Quota(format!(
                        "generation quota exhausted at {}: {}",
                        ticker, msg
                    )));
                }
                Err(err) => {
                    return Err(Error::Internal(format!(
                        "generation failed for {}: {}",
                        ticker, err
                    )));
                }
            }
        }

        self.event_bus.emit_lossy(LucidEvent::SyncCompleted {
            month: month.label(),
            new_analyses,
            timestamp: Utc::now(),
        });
        Ok(synced_any)
    }

    /// The ticker list for a month is selected once and cached; reruns within
    /// the month reuse the cache so resumed syncs target the same list.
    async fn resolve_targets(&self, month: &ReportingMonth) -> Result<Vec<String>> {
        if let Some(cached) = targets::get_target_tickers(&self.db, &month.label()).await? {
            if !cached.is_empty() {
                return Ok(cached);
            }
        }

        self.emit_progress("Selecting the tickers to cover this month...");
        let raw = match self.generator.select_tickers(month).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(Vec::new()),
            Err(GeneratorError::Quota(msg)) => {
                return Err(Error::Quota(format!("ticker selection: {}", msg)))
            }
            Err(err) => {
                warn!("ticker selection failed: {}", err);
                return Ok(Vec::new());
            }
        };

        let tickers = normalize_tickers(&raw, self.target_count);
        if !tickers.is_empty() {
            targets::save_target_tickers(&self.db, &month.label(), &tickers).await?;
        }
        Ok(tickers)
    }

    fn emit_progress(&self, message: &str) {
        info!("{}", message);
        self.event_bus.emit_lossy(LucidEvent::progress(message));
    }
}

/// Turn the generator's comma-separated text into a clean ticker list:
/// uppercase, symbol characters only, de-duplicated in order, capped at
/// `limit` entries.
pub fn normalize_tickers(raw: &str, limit: usize) -> Vec<String> {
    let mut seen = Vec::new();
    for part in raw.split(',') {
        let ticker: String = part
            .trim()
            .to_uppercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
            .collect();
        if !ticker.is_empty() && !seen.contains(&ticker) {
            seen.push(ticker);
        }
        if seen.len() == limit {
            break;
        }
    }
    seen
}
