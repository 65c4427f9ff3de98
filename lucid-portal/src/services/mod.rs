//! Service layer for lucid-portal

pub mod generator;
pub mod market;
pub mod sync;

pub use generator::{AnalysisGenerator, GeminiClient, GeneratorError, PartnerDraft};
pub use market::MarketClient;
pub use sync::SyncOrchestrator;
