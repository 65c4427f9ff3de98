//! HTTP API endpoints

pub mod analyses;
pub mod auth;
pub mod events;
pub mod health;
pub mod partners;
pub mod sync;
pub mod webhook;

pub use analyses::analysis_routes;
pub use auth::auth_routes;
pub use events::event_stream;
pub use health::health_routes;
pub use partners::partner_routes;
pub use sync::sync_routes;
pub use webhook::webhook_routes;
