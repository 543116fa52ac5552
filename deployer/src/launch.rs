//! Token launch configuration as collected by the launch wizard.
//!
//! Addresses stay base58 strings here; [`crate::validate`] parses them and
//! reports every incomplete section at once.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenLaunchConfig {
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub socials: Socials,
    pub fees: FeeSettings,
    #[serde(default)]
    pub allocation: Vec<AllocationEntry>,
    pub curve: CurveSettings,
    #[serde(default)]
    pub sale_setup: Option<SaleSetup>,
    #[serde(default)]
    pub admin_setup: AdminSetup,
}

impl TokenLaunchConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub description: Option<String>,
    pub decimals: u8,
    /// Whole tokens.
    pub supply: u64,
    pub metadata_uri: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Socials {
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
    pub farcaster: Option<String>,
}

impl Socials {
    pub fn has_channel(&self) -> bool {
        [
            &self.website,
            &self.twitter,
            &self.telegram,
            &self.discord,
            &self.farcaster,
        ]
        .iter()
        .any(|c| c.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeSettings {
    /// Trading fee in basis points.
    pub fee_percentage: u16,
    #[serde(default)]
    pub recipients: Vec<FeeRecipientEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecipientEntry {
    pub address: String,
    pub share_bps: u16,
    #[serde(default)]
    pub lock_period: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationEntry {
    #[serde(default)]
    pub description: Option<String>,
    pub wallet_address: String,
    /// Whole percent of total supply.
    pub percentage: u8,
    #[serde(default)]
    pub vesting: Option<VestingEntry>,
}

/// Relative vesting plan; made absolute at validation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VestingEntry {
    pub cliff: i64,
    pub duration: i64,
    pub interval: i64,
    #[serde(default)]
    pub start_delay: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    #[default]
    Linear,
    Quadratic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurveSettings {
    #[serde(default)]
    pub curve_type: CurveKind,
    /// Lamports per whole token at launch.
    pub initial_price: u64,
    /// Basis points, (0, 10_000].
    pub reserve_ratio: u16,
    pub target_liquidity: u64,
    #[serde(default)]
    pub initial_quorum: u64,
    #[serde(default)]
    pub dao_quorum: u16,
    #[serde(default)]
    pub governance: Option<String>,
    #[serde(default = "default_lock_period")]
    pub liquidity_lock_period: i64,
    #[serde(default = "default_pool_percentage")]
    pub liquidity_pool_percentage: u16,
}

fn default_lock_period() -> i64 {
    60
}

fn default_pool_percentage() -> u16 {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaleSetup {
    #[serde(default = "default_soft_cap")]
    pub soft_cap: u64,
    #[serde(default = "default_hard_cap")]
    pub hard_cap: u64,
    #[serde(default = "default_min_contribution")]
    pub min_contribution: u64,
    #[serde(default = "default_max_contribution")]
    pub max_contribution: u64,
    #[serde(default = "default_max_tokens_per_wallet")]
    pub max_tokens_per_wallet: u64,
    /// Seconds from deployment until the sale opens.
    #[serde(default = "default_start_delay")]
    pub start_delay: i64,
    /// Seconds the sale stays open.
    #[serde(default = "default_sale_duration")]
    pub duration: i64,
    #[serde(default = "default_distribution_delay")]
    pub distribution_delay: i64,
}

impl Default for SaleSetup {
    fn default() -> Self {
        Self {
            soft_cap: default_soft_cap(),
            hard_cap: default_hard_cap(),
            min_contribution: default_min_contribution(),
            max_contribution: default_max_contribution(),
            max_tokens_per_wallet: default_max_tokens_per_wallet(),
            start_delay: default_start_delay(),
            duration: default_sale_duration(),
            distribution_delay: default_distribution_delay(),
        }
    }
}

fn default_soft_cap() -> u64 {
    1_000_000_000
}

fn default_hard_cap() -> u64 {
    10_000_000_000
}

fn default_min_contribution() -> u64 {
    100_000_000
}

fn default_max_contribution() -> u64 {
    2_000_000_000
}

fn default_max_tokens_per_wallet() -> u64 {
    1_000
}

fn default_start_delay() -> i64 {
    60
}

fn default_sale_duration() -> i64 {
    3_540
}

fn default_distribution_delay() -> i64 {
    3_600
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminSetup {
    #[serde(default)]
    pub revoke_mint_authority: Revocation,
    #[serde(default)]
    pub revoke_freeze_authority: Revocation,
}

/// Hand an authority to `destination` after the initial mint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Revocation {
    pub enabled: bool,
    #[serde(default)]
    pub destination: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json_fills_defaults() {
        let config = TokenLaunchConfig::from_json(
            r#"{
                "basicInfo": {
                    "name": "Pot", "symbol": "POT", "decimals": 6,
                    "supply": 1000000, "metadataUri": "https://example.invalid/pot.json"
                },
                "fees": { "feePercentage": 100 },
                "curve": { "initialPrice": 1000, "reserveRatio": 5000, "targetLiquidity": 1 },
                "saleSetup": {}
            }"#,
        )
        .unwrap();

        assert_eq!(config.curve.curve_type, CurveKind::Linear);
        assert_eq!(config.curve.liquidity_pool_percentage, 50);
        assert_eq!(config.sale_setup, Some(SaleSetup::default()));
        assert!(!config.admin_setup.revoke_mint_authority.enabled);
        assert!(config.allocation.is_empty());
        assert!(!config.socials.has_channel());
    }

    #[test]
    fn test_blank_social_does_not_count() {
        let socials = Socials {
            twitter: Some("  ".to_string()),
            ..Socials::default()
        };
        assert!(!socials.has_channel());

        let socials = Socials {
            telegram: Some("t.me/pot".to_string()),
            ..Socials::default()
        };
        assert!(socials.has_channel());
    }
}
