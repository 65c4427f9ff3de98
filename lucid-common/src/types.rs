//! Domain types shared across LucidInvest crates
//!
//! Wire format is camelCase JSON, matching both the stored document columns
//! and the report generator's structured-output schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier governing how many monthly analyses a member sees
///
/// Unrecognized tier strings deserialize to `Unknown`, which is treated as
/// the most restrictive tier by the visibility rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserTier {
    MiniBeta,
    AlphaJunior,
    Alpha,
    #[serde(other)]
    Unknown,
}

impl UserTier {
    /// Parse the tier label used by Stripe checkout metadata
    pub fn from_plan_label(label: &str) -> Self {
        match label {
            "MINI_BETA" => UserTier::MiniBeta,
            "ALPHA_JUNIOR" => UserTier::AlphaJunior,
            "ALPHA" => UserTier::Alpha,
            _ => UserTier::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserTier::MiniBeta => "MINI_BETA",
            UserTier::AlphaJunior => "ALPHA_JUNIOR",
            UserTier::Alpha => "ALPHA",
            UserTier::Unknown => "UNKNOWN",
        }
    }
}

/// Member account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
        }
    }

    /// Parse a stored role label, defaulting to the least privileged role
    pub fn from_label(label: &str) -> Self {
        match label {
            "ADMIN" => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

/// Subscription lifecycle status
///
/// Accounts are never hard-deleted; cancellation is a transition to
/// `Canceled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
    Unpaid,
}

impl SubscriptionStatus {
    /// Parse a stored status label; malformed data degrades to Active
    /// rather than crashing a read path
    pub fn from_label(label: &str) -> Self {
        match label {
            "ACTIVE" => SubscriptionStatus::Active,
            "CANCELED" => SubscriptionStatus::Canceled,
            "PAST_DUE" => SubscriptionStatus::PastDue,
            "UNPAID" => SubscriptionStatus::Unpaid,
            _ => SubscriptionStatus::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Canceled => "CANCELED",
            SubscriptionStatus::PastDue => "PAST_DUE",
            SubscriptionStatus::Unpaid => "UNPAID",
        }
    }
}

/// Member account
///
/// Password digests live only in the `users` table, never on this type, so
/// session snapshots can be serialized to clients as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub tier: UserTier,
    pub role: UserRole,
    pub status: SubscriptionStatus,
    pub has_crypto_option: bool,
    pub signup_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<DateTime<Utc>>,
}

impl User {
    /// Create a fresh member account with the default (entry) tier
    pub fn new(email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            tier: UserTier::MiniBeta,
            role: UserRole::User,
            status: SubscriptionStatus::Active,
            has_crypto_option: false,
            signup_date: Utc::now(),
            stripe_customer_id: None,
            subscription_id: None,
            current_period_end: None,
        }
    }
}

/// SWOT lists attached to an analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swot {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

/// One thesis scenario (main, negative or neutral)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub probability: f64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_phrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supporting_factors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon: Option<String>,
}

/// Composite 0-100 display metric with four sub-scores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LucidityScore {
    pub total: f64,
    pub readability: f64,
    pub financial_stability: f64,
    pub external_dependency: f64,
    pub narrative_volatility: f64,
}

/// Categorized risk entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub category: String,
    pub description: String,
}

/// Observable signal that would invalidate the main thesis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationPoint {
    pub event: String,
    pub observable_signal: String,
}

/// Grounding citation attached by the generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub title: String,
    pub uri: String,
}

/// Monthly thesis record
///
/// Keyed by (ticker, last_update): at most one analysis exists per ticker
/// per reporting month. `entry_price`, once recorded non-zero, survives
/// later regenerations of the same key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAnalysis {
    pub ticker: String,
    /// 1-2: MiniBeta, 3-6: AlphaJunior, 7-12: Alpha
    pub importance_rank: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,
    pub name: String,
    /// Asset-class tag; "CRYPTO" gates visibility on the crypto add-on
    pub sector: String,
    /// Price captured when the analysis was first recorded
    pub entry_price: f64,
    /// Reporting-month label, second half of the composite key
    pub last_update: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_hook: Option<String>,
    pub swot: Swot,
    pub main_scenario: Scenario,
    pub negative_scenario: Scenario,
    pub neutral_scenario: Scenario,
    pub lucidity_score: LucidityScore,
    #[serde(default)]
    pub market_anticipations: Vec<String>,
    #[serde(default)]
    pub real_risks: Vec<Risk>,
    #[serde(default)]
    pub invalidation_points: Vec<InvalidationPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceRef>>,
}

/// Affiliate partner listing, fully admin-managed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(rename = "type")]
    pub category: String,
    pub strength: String,
    pub description: String,
    pub cta: String,
    pub link: String,
}

/// Display-only current/entry price pair for one ticker
///
/// The entry price is a simulated baseline (94% of the converted live
/// price), not a real historical quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPricePoint {
    pub ticker: String,
    pub entry_price: f64,
    pub current_price: f64,
    pub currency: String,
    pub is_live: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_round_trips_screaming_snake_case() {
        let json = serde_json::to_string(&UserTier::AlphaJunior).unwrap();
        assert_eq!(json, "\"ALPHA_JUNIOR\"");

        let tier: UserTier = serde_json::from_str("\"MINI_BETA\"").unwrap();
        assert_eq!(tier, UserTier::MiniBeta);
    }

    #[test]
    fn unknown_tier_deserializes_to_catch_all() {
        let tier: UserTier = serde_json::from_str("\"PLATINUM\"").unwrap();
        assert_eq!(tier, UserTier::Unknown);
    }

    #[test]
    fn analysis_wire_format_is_camel_case() {
        let analysis = StockAnalysis {
            ticker: "NVDA".to_string(),
            importance_rank: 1,
            isin: None,
            name: "NVIDIA".to_string(),
            sector: "Semiconductors".to_string(),
            entry_price: 121.4,
            last_update: "March 2026".to_string(),
            marketing_hook: None,
            swot: Swot::default(),
            main_scenario: Scenario::default(),
            negative_scenario: Scenario::default(),
            neutral_scenario: Scenario::default(),
            lucidity_score: LucidityScore::default(),
            market_anticipations: vec![],
            real_risks: vec![],
            invalidation_points: vec![],
            recommendation_note: None,
            sources: None,
        };

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["importanceRank"], 1);
        assert_eq!(json["entryPrice"], 121.4);
        assert_eq!(json["lastUpdate"], "March 2026");
    }

    #[test]
    fn partner_category_serializes_as_type() {
        let partner = Partner {
            id: "1".to_string(),
            name: "Boursorama Bank".to_string(),
            color: "#E6192E".to_string(),
            category: "French bank".to_string(),
            strength: "PEA leader".to_string(),
            description: "Reference broker".to_string(),
            cta: "Open an account".to_string(),
            link: "https://www.boursorama.com".to_string(),
        };

        let json = serde_json::to_value(&partner).unwrap();
        assert_eq!(json["type"], "French bank");
    }
}
