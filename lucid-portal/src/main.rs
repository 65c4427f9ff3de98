//! lucid-portal - LucidInvest member portal service
//!
//! Serves the subscription-gated analysis API, the admin backoffice
//! endpoints, the monthly sync orchestrator and the Stripe webhook.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lucid_common::events::EventBus;
use lucid_portal::config::PortalConfig;
use lucid_portal::services::generator::GeminiClient;
use lucid_portal::services::market::MarketClient;
use lucid_portal::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load TOML config first so the logging level can come from it
    let config_path = lucid_common::config::default_config_path();
    let toml_config = lucid_common::config::load_toml_config(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(toml_config.logging.level.clone())),
        )
        .init();

    info!("Starting lucid-portal (LucidInvest member portal)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = PortalConfig::from_toml(&toml_config);
    info!("Database: {}", config.database_path);

    // Initialize database connection pool and run table migrations
    let db_pool = lucid_portal::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    // Seed default partner listings when the collection is empty
    lucid_portal::db::partners::seed_default_partners(&db_pool).await?;

    // Event bus for SSE broadcasting of sync progress
    let event_bus = EventBus::new(100);
    info!("Event bus initialized");

    // Gemini report generator: Database → ENV → TOML key resolution.
    // The portal still serves members without a key; sync runs will report
    // a technical error until one is configured.
    let gemini_key = match lucid_portal::config::resolve_gemini_api_key(&db_pool, &toml_config).await
    {
        Ok(key) => key,
        Err(e) => {
            warn!("{}", e);
            String::new()
        }
    };
    let generator = Arc::new(GeminiClient::new(
        config.gemini_base_url.clone(),
        gemini_key,
        config.selection_model.clone(),
        config.analysis_model.clone(),
    )?);

    let market = Arc::new(MarketClient::new(
        config.market_base_url.clone(),
        config.market_api_key.clone(),
    )?);

    let state = AppState::new(db_pool, event_bus, generator, market, &config);
    let app = lucid_portal::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!("Listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
