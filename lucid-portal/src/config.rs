//! Configuration resolution for lucid-portal
//!
//! Startup settings come from the TOML config with environment overrides.
//! The Gemini API key resolves with Database → ENV → TOML priority so a key
//! entered through the admin backoffice wins over deployment configuration.

use lucid_common::config::TomlConfig;
use lucid_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

/// Environment variable holding the Gemini API key
pub const GEMINI_KEY_ENV: &str = "LUCID_GEMINI_API_KEY";

const DEFAULT_PORT: u16 = 5810;
const DEFAULT_DB_PATH: &str = "lucid.db";
const DEFAULT_MARKET_BASE_URL: &str = "https://api.twelvedata.com";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_SELECTION_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-pro-preview";

/// Resolved portal settings
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub port: u16,
    pub database_path: String,
    pub market_base_url: String,
    /// Market data API key; the "demo" tier works without registration
    pub market_api_key: String,
    pub gemini_base_url: String,
    pub selection_model: String,
    pub analysis_model: String,
    /// Day of month on which the scheduled sync fires
    pub sync_day: u32,
    /// Analyses per reporting month (12 equities + 2 crypto)
    pub monthly_target_count: usize,
    /// Delay before each generation call, respecting API quotas
    pub generation_delay_ms: u64,
}

impl PortalConfig {
    /// Build the portal config from TOML values plus compiled defaults
    pub fn from_toml(toml: &TomlConfig) -> Self {
        Self {
            port: toml.port.unwrap_or(DEFAULT_PORT),
            database_path: toml
                .database_path
                .clone()
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            market_base_url: toml
                .market_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_MARKET_BASE_URL.to_string()),
            market_api_key: toml
                .market_api_key
                .clone()
                .unwrap_or_else(|| "demo".to_string()),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            selection_model: toml
                .selection_model
                .clone()
                .unwrap_or_else(|| DEFAULT_SELECTION_MODEL.to_string()),
            analysis_model: toml
                .analysis_model
                .clone()
                .unwrap_or_else(|| DEFAULT_ANALYSIS_MODEL.to_string()),
            sync_day: toml.sync_day.unwrap_or(2),
            monthly_target_count: toml.monthly_target_count.unwrap_or(14),
            generation_delay_ms: toml.generation_delay_ms.unwrap_or(15_000),
        }
    }
}

/// Resolve the Gemini API key from 3-tier configuration
///
/// **Priority:** Database → ENV → TOML
pub async fn resolve_gemini_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<String> {
    let mut sources = Vec::new();

    // Tier 1: Database (authoritative, set via admin backoffice)
    let db_key = crate::db::settings::get_gemini_api_key(db).await?;
    if db_key.as_deref().is_some_and(is_valid_key) {
        sources.push("database");
    }

    // Tier 2: Environment variable
    let env_key = std::env::var(GEMINI_KEY_ENV).ok();
    if env_key.as_deref().is_some_and(is_valid_key) {
        sources.push("environment");
    }

    // Tier 3: TOML config
    let toml_key = toml_config.gemini_api_key.clone();
    if toml_key.as_deref().is_some_and(is_valid_key) {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "Gemini API key found in multiple sources: {}. Using database (highest priority).",
            sources.join(", ")
        );
    }

    if let Some(key) = db_key.filter(|k| is_valid_key(k)) {
        info!("Gemini API key loaded from database");
        return Ok(key);
    }

    if let Some(key) = env_key.filter(|k| is_valid_key(k)) {
        info!("Gemini API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key.filter(|k| is_valid_key(k)) {
        info!("Gemini API key loaded from TOML config");
        return Ok(key);
    }

    Err(Error::Config(format!(
        "Gemini API key not configured. Please configure using one of:\n\
         1. Admin backoffice settings\n\
         2. Environment: {}=your-key-here\n\
         3. TOML config: ~/.config/lucidinvest/lucid-portal.toml (gemini_api_key = \"your-key\")",
        GEMINI_KEY_ENV
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
