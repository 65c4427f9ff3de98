//! # LucidInvest Common Library
//!
//! Shared code for the LucidInvest portal including:
//! - Domain types (users, analyses, partners, market prices)
//! - Event types (LucidEvent enum) and EventBus
//! - Reporting-month calendar helpers
//! - Tier visibility rules
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod month;
pub mod types;
pub mod visibility;

pub use error::{Error, Result};
pub use month::ReportingMonth;
