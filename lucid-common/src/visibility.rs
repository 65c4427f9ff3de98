//! Tier visibility rules
//!
//! Pure, total functions mapping (tier, crypto add-on, rank, sector) to a
//! visibility decision. These never error: unknown tiers get the most
//! restrictive limit instead of failing.

use crate::types::{StockAnalysis, User, UserTier};

/// Sector tag that additionally requires the crypto add-on
pub const CRYPTO_SECTOR: &str = "CRYPTO";

/// Highest importance rank visible to a tier
///
/// MiniBeta sees ranks 1-2, AlphaJunior 1-6, Alpha 1-12.
pub fn rank_limit(tier: UserTier) -> i64 {
    match tier {
        UserTier::MiniBeta => 2,
        UserTier::AlphaJunior => 6,
        UserTier::Alpha => 12,
        UserTier::Unknown => 2,
    }
}

/// Whether `user` may see `analysis`
///
/// Rank must fall within the tier's limit; CRYPTO-sector analyses further
/// require the crypto add-on regardless of tier.
pub fn is_visible(user: &User, analysis: &StockAnalysis) -> bool {
    if analysis.importance_rank > rank_limit(user.tier) {
        return false;
    }

    if analysis.sector == CRYPTO_SECTOR && !user.has_crypto_option {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LucidityScore, Scenario, Swot};

    fn member(tier: UserTier, has_crypto_option: bool) -> User {
        let mut user = User::new("member@lucidinvest.fr".to_string());
        user.tier = tier;
        user.has_crypto_option = has_crypto_option;
        user
    }

    fn analysis(rank: i64, sector: &str) -> StockAnalysis {
        StockAnalysis {
            ticker: "TEST".to_string(),
            importance_rank: rank,
            isin: None,
            name: "Test Asset".to_string(),
            sector: sector.to_string(),
            entry_price: 100.0,
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
        }
    }

    #[test]
    fn rank_limits_are_fixed_per_tier() {
        assert_eq!(rank_limit(UserTier::MiniBeta), 2);
        assert_eq!(rank_limit(UserTier::AlphaJunior), 6);
        assert_eq!(rank_limit(UserTier::Alpha), 12);
    }

    #[test]
    fn unknown_tier_gets_most_restrictive_limit() {
        assert_eq!(rank_limit(UserTier::Unknown), 2);
        assert!(!is_visible(
            &member(UserTier::Unknown, true),
            &analysis(3, "Tech")
        ));
    }

    #[test]
    fn entry_tier_cannot_see_rank_three() {
        assert!(!is_visible(
            &member(UserTier::MiniBeta, false),
            &analysis(3, "Tech")
        ));
    }

    #[test]
    fn top_tier_sees_rank_three() {
        assert!(is_visible(
            &member(UserTier::Alpha, false),
            &analysis(3, "Tech")
        ));
    }

    #[test]
    fn crypto_requires_addon_regardless_of_tier() {
        // Rank 1 is within every tier's limit, but the sector gate still applies
        assert!(!is_visible(
            &member(UserTier::Alpha, false),
            &analysis(1, CRYPTO_SECTOR)
        ));
        assert!(!is_visible(
            &member(UserTier::MiniBeta, false),
            &analysis(1, CRYPTO_SECTOR)
        ));
    }

    #[test]
    fn crypto_visible_with_addon_within_rank_limit() {
        assert!(is_visible(
            &member(UserTier::MiniBeta, true),
            &analysis(2, CRYPTO_SECTOR)
        ));
        assert!(!is_visible(
            &member(UserTier::MiniBeta, true),
            &analysis(7, CRYPTO_SECTOR)
        ));
    }
}
