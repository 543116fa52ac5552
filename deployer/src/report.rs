//! Outcome of a successful deployment, and the token document handed to the
//! indexing backend afterwards.

use potlaunch_sdk::pda::LaunchAddresses;
use potlaunch_sdk::SdkResult;
use serde::Serialize;
use solana_sdk::{pubkey::Pubkey, signature::Signature};

use crate::launch::{AllocationEntry, BasicInfo, Socials, TokenLaunchConfig};
use crate::plan::{DeploymentPlan, GroupKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedTransaction {
    pub groups: Vec<GroupKind>,
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationAddress {
    pub wallet: Pubkey,
    pub allocation: Pubkey,
    pub vault: Pubkey,
}

/// Record and vault address of each allocation wallet.
pub fn allocation_addresses<'a>(
    addresses: &LaunchAddresses,
    wallets: impl IntoIterator<Item = &'a Pubkey>,
) -> SdkResult<Vec<AllocationAddress>> {
    wallets
        .into_iter()
        .map(|wallet| {
            addresses
                .allocation(wallet)
                .map(|(allocation, vault)| AllocationAddress {
                    wallet: *wallet,
                    allocation,
                    vault,
                })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    pub addresses: LaunchAddresses,
    pub transactions: Vec<ConfirmedTransaction>,
    pub allocations: Vec<AllocationAddress>,
    pub initial_reserve: u128,
}

impl DeploymentReport {
    /// Report over the confirmed transactions of `plan`. Allocation
    /// addresses come from [`allocation_addresses`], derived before anything
    /// was submitted, so assembling the report cannot fail.
    pub fn from_plan(
        plan: &DeploymentPlan,
        allocations: Vec<AllocationAddress>,
        initial_reserve: u128,
    ) -> Self {
        Self {
            addresses: plan.addresses.clone(),
            transactions: plan
                .transactions
                .iter()
                .filter(|t| t.progress.confirmed)
                .filter_map(|t| {
                    t.signature.map(|signature| ConfirmedTransaction {
                        groups: t.groups.clone(),
                        signature,
                    })
                })
                .collect(),
            allocations,
            initial_reserve,
        }
    }

    pub fn mint(&self) -> Pubkey {
        self.addresses.mint
    }

    pub fn token_document(&self, config: &TokenLaunchConfig) -> TokenDocument {
        TokenDocument {
            basic_info: config.basic_info.clone(),
            socials: config.socials.clone(),
            allocation: config.allocation.clone(),
            mint_address: self.addresses.mint.to_string(),
            owner: self.addresses.creator.to_string(),
            curve_configuration: self.addresses.curve_configuration.to_string(),
            bonding_curve: self.addresses.bonding_curve.to_string(),
            signatures: self
                .transactions
                .iter()
                .map(|t| t.signature.to_string())
                .collect(),
        }
    }
}

/// Body accepted by the backend's token create endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDocument {
    pub basic_info: BasicInfo,
    pub socials: Socials,
    pub allocation: Vec<AllocationEntry>,
    pub mint_address: String,
    pub owner: String,
    pub curve_configuration: String,
    pub bonding_curve: String,
    pub signatures: Vec<String>,
}

impl TokenDocument {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
