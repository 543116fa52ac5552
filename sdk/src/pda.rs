//! Program-derived addresses for every account a token launch touches.
//!
//! Seed order is fixed by the deployed program. Swapping two seed parts
//! targets a different account without any error, so every account kind has
//! a named helper and callers never assemble seeds by hand.

use solana_program::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;

use crate::constants::*;
use crate::error::{SdkError, SdkResult};

/// Derive the canonical address for `[tag, parts..., bump]` under `program_id`.
///
/// Bumps are tried from 255 downward and the first off-curve address wins.
pub fn derive(program_id: &Pubkey, tag: &[u8], parts: &[&[u8]]) -> SdkResult<(Pubkey, u8)> {
    let mut seeds: Vec<&[u8]> = Vec::with_capacity(parts.len() + 1);
    seeds.push(tag);
    seeds.extend_from_slice(parts);

    Pubkey::try_find_program_address(&seeds, program_id).ok_or_else(|| {
        SdkError::DerivationExhausted {
            tag: String::from_utf8_lossy(tag).into_owned(),
        }
    })
}

// ── PDA Helpers ─────────────────────────────────────────────────────────────

pub fn find_curve_configuration(program_id: &Pubkey, mint: &Pubkey) -> SdkResult<(Pubkey, u8)> {
    derive(program_id, CURVE_CONFIGURATION_SEED, &[mint.as_ref()])
}

pub fn find_bonding_curve(program_id: &Pubkey, mint: &Pubkey) -> SdkResult<(Pubkey, u8)> {
    derive(program_id, BONDING_CURVE_SEED, &[mint.as_ref()])
}

pub fn find_sol_vault(program_id: &Pubkey, mint: &Pubkey) -> SdkResult<(Pubkey, u8)> {
    derive(program_id, SOL_VAULT_SEED, &[mint.as_ref()])
}

/// Wallet comes before mint.
pub fn find_allocation(
    program_id: &Pubkey,
    wallet: &Pubkey,
    mint: &Pubkey,
) -> SdkResult<(Pubkey, u8)> {
    derive(program_id, ALLOCATION_SEED, &[wallet.as_ref(), mint.as_ref()])
}

pub fn find_launchpad(program_id: &Pubkey, authority: &Pubkey) -> SdkResult<(Pubkey, u8)> {
    derive(program_id, LAUNCHPAD_SEED, &[authority.as_ref()])
}

pub fn find_fair_launch_data(program_id: &Pubkey, mint: &Pubkey) -> SdkResult<(Pubkey, u8)> {
    derive(program_id, FAIR_LAUNCH_DATA_SEED, &[mint.as_ref()])
}

/// Seeded by the fair-launch data address, not the mint.
pub fn find_fair_launch_vault(
    program_id: &Pubkey,
    fair_launch_data: &Pubkey,
) -> SdkResult<(Pubkey, u8)> {
    derive(program_id, FAIR_LAUNCH_VAULT_SEED, &[fair_launch_data.as_ref()])
}

pub fn find_fee_pool(program_id: &Pubkey, mint: &Pubkey) -> SdkResult<(Pubkey, u8)> {
    derive(program_id, FEE_POOL_SEED, &[mint.as_ref()])
}

pub fn find_fee_pool_vault(program_id: &Pubkey, mint: &Pubkey) -> SdkResult<(Pubkey, u8)> {
    derive(program_id, FEE_POOL_VAULT_SEED, &[mint.as_ref()])
}

/// Metaplex metadata account for `mint`.
pub fn find_metadata(mint: &Pubkey) -> (Pubkey, u8) {
    mpl_token_metadata::accounts::Metadata::find_pda(mint)
}

// ── Launch Address Set ──────────────────────────────────────────────────────

/// Every address a single token launch needs, derived once from the mint and
/// the creator wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchAddresses {
    pub program_id: Pubkey,
    pub mint: Pubkey,
    pub creator: Pubkey,
    pub curve_configuration: Pubkey,
    pub bonding_curve: Pubkey,
    pub bonding_curve_bump: u8,
    pub sol_vault: Pubkey,
    pub sol_vault_bump: u8,
    pub pool_token_account: Pubkey,
    pub creator_token_account: Pubkey,
    pub fee_pool: Pubkey,
    pub fee_pool_vault: Pubkey,
    pub fee_pool_vault_bump: u8,
    pub metadata: Pubkey,
    pub launchpad: Pubkey,
    pub fair_launch_data: Pubkey,
    pub fair_launch_vault: Pubkey,
    pub launchpad_token_account: Pubkey,
}

impl LaunchAddresses {
    pub fn derive(program_id: &Pubkey, mint: &Pubkey, creator: &Pubkey) -> SdkResult<Self> {
        let (curve_configuration, _) = find_curve_configuration(program_id, mint)?;
        let (bonding_curve, bonding_curve_bump) = find_bonding_curve(program_id, mint)?;
        let (sol_vault, sol_vault_bump) = find_sol_vault(program_id, mint)?;
        let (fee_pool, _) = find_fee_pool(program_id, mint)?;
        let (fee_pool_vault, fee_pool_vault_bump) = find_fee_pool_vault(program_id, mint)?;
        let (launchpad, _) = find_launchpad(program_id, creator)?;
        let (fair_launch_data, _) = find_fair_launch_data(program_id, mint)?;
        let (fair_launch_vault, _) = find_fair_launch_vault(program_id, &fair_launch_data)?;
        let (metadata, _) = find_metadata(mint);

        Ok(Self {
            program_id: *program_id,
            mint: *mint,
            creator: *creator,
            curve_configuration,
            bonding_curve,
            bonding_curve_bump,
            sol_vault,
            sol_vault_bump,
            pool_token_account: get_associated_token_address(&bonding_curve, mint),
            creator_token_account: get_associated_token_address(creator, mint),
            fee_pool,
            fee_pool_vault,
            fee_pool_vault_bump,
            metadata,
            launchpad,
            fair_launch_data,
            fair_launch_vault,
            launchpad_token_account: get_associated_token_address(&launchpad, mint),
        })
    }

    /// Allocation PDA and its token vault for one recipient wallet.
    pub fn allocation(&self, wallet: &Pubkey) -> SdkResult<(Pubkey, Pubkey)> {
        let (allocation, _) = find_allocation(&self.program_id, wallet, &self.mint)?;
        let vault = get_associated_token_address(&allocation, &self.mint);
        Ok((allocation, vault))
    }
}
