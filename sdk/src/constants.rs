//! Bonding curve program ID, PDA seeds, discriminators, and account layout sizes.
//!
//! Everything the deployed program dictates lives here: a layout or seed change
//! on the program side is a single edit to this module.

use sha2::{Digest, Sha256};
use solana_program::{program_pack::Pack, pubkey::Pubkey};

// ── Program IDs ─────────────────────────────────────────────────────────────

/// Bonding curve program: curve configuration, pools, allocations, fair launches.
pub const BONDING_CURVE_PROGRAM_ID: Pubkey =
    solana_program::pubkey!("FMxcVNYZxCv1Go7R6KeFYWFmGP9LeLzAz3ywecjM1yqA");

// ── PDA Seeds ───────────────────────────────────────────────────────────────

// Curve
pub const CURVE_CONFIGURATION_SEED: &[u8] = b"curve_configuration";
pub const BONDING_CURVE_SEED: &[u8] = b"bonding_curve";
pub const SOL_VAULT_SEED: &[u8] = b"liquidity_sol_vault";

// Fees
pub const FEE_POOL_SEED: &[u8] = b"fee_pool";
pub const FEE_POOL_VAULT_SEED: &[u8] = b"fee_pool_vault";

// Allocations
pub const ALLOCATION_SEED: &[u8] = b"allocation";

// Fair launch
pub const LAUNCHPAD_SEED: &[u8] = b"launchpad";
pub const FAIR_LAUNCH_DATA_SEED: &[u8] = b"fair_launch_data";
pub const FAIR_LAUNCH_VAULT_SEED: &[u8] = b"fair_launch_vault";

// ── Account Names ───────────────────────────────────────────────────────────
// Anchor account discriminator = sha256("account:<Name>")[..8].

pub const CURVE_CONFIGURATION_ACCOUNT: &str = "CurveConfiguration";
pub const BONDING_CURVE_ACCOUNT: &str = "BondingCurve";
pub const ALLOCATION_ACCOUNT: &str = "Allocation";

// ── Layout Sizes ────────────────────────────────────────────────────────────

pub const DISCRIMINATOR_LEN: usize = 8;
pub const PUBKEY_LEN: usize = 32;

/// Recipient entry: address + share + amount + locking_period.
pub const RECIPIENT_LEN: usize = PUBKEY_LEN + 2 + 8 + 8;

/// CurveConfiguration with an empty fee recipient list, discriminator included.
pub const CURVE_CONFIGURATION_MIN_LEN: usize = DISCRIMINATOR_LEN
    + PUBKEY_LEN // admin
    + PUBKEY_LEN // fee_admin
    + 8 // initial_quorum
    + 1 // use_dao
    + PUBKEY_LEN // governance
    + 2 // dao_quorum
    + 1 // locked_liquidity
    + 8 // target_liquidity
    + 2 // fee_percentage
    + 1 // fees_enabled
    + 1 // curve_shape
    + 8 // max_token_supply
    + 8 // liquidity_lock_period
    + 2 // liquidity_pool_percentage
    + 8 // initial_price
    + 8 // initial_supply
    + 4 // fee_recipients length
    + 8 // total_fees_collected
    + 2; // reserve_ratio

/// BondingCurve state, discriminator included.
pub const BONDING_CURVE_LEN: usize = DISCRIMINATOR_LEN + PUBKEY_LEN + 8 + 8 + 8 + PUBKEY_LEN + 1;

/// Vesting schedule body: cliff, start, duration, interval, released.
pub const VESTING_SCHEDULE_LEN: usize = 8 * 5;

/// Allocation without a vesting schedule, discriminator included.
pub const ALLOCATION_MIN_LEN: usize = DISCRIMINATOR_LEN + PUBKEY_LEN + 1 + 8 + 8 + 1 + 1;

// ── Curve Parameters ────────────────────────────────────────────────────────

/// Basis point denominator (100%).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Upper bound (inclusive) for the reserve ratio, in basis points.
pub const MAX_RESERVE_RATIO: u16 = 10_000;

/// Allocation percentages are whole percents.
pub const MAX_ALLOCATION_PERCENT: u8 = 100;

/// Name recorded for an allocation without a description.
pub const DEFAULT_ALLOCATION_NAME: &str = "Allocation";

/// Longest allocation name, in bytes, sent to `create_allocation`.
pub const MAX_ALLOCATION_NAME_LEN: usize = 32;

// ── Mint Setup ──────────────────────────────────────────────────────────────

/// Rent-exempt size of an SPL mint account.
pub const MINT_ACCOUNT_LEN: usize = spl_token::state::Mint::LEN;

/// Largest serialized transaction the cluster accepts (one packet).
pub const PACKET_DATA_SIZE: usize = 1232;

// ── Discriminators ──────────────────────────────────────────────────────────

fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Leading 8 bytes of every instruction: sha256("global:<name>")[..8].
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    sighash("global", name)
}

/// Leading 8 bytes of every program-owned account: sha256("account:<Name>")[..8].
pub fn account_discriminator(name: &str) -> [u8; 8] {
    sighash("account", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(CURVE_CONFIGURATION_MIN_LEN, 176);
        assert_eq!(BONDING_CURVE_LEN, 97);
        assert_eq!(ALLOCATION_MIN_LEN, 59);
        assert_eq!(RECIPIENT_LEN, 50);
        assert_eq!(MINT_ACCOUNT_LEN, 82);
    }

    #[test]
    fn test_discriminators_differ_by_namespace() {
        assert_ne!(
            instruction_discriminator("initialize"),
            account_discriminator("initialize")
        );
        assert_eq!(
            instruction_discriminator("buy"),
            instruction_discriminator("buy")
        );
    }

    #[test]
    fn test_global_initialize_discriminator() {
        // Well-known Anchor sighash for `initialize`.
        assert_eq!(
            instruction_discriminator("initialize"),
            [175, 175, 109, 31, 13, 152, 155, 237]
        );
    }
}
