//! Typed views of the bonding curve program's accounts.
//!
//! Layouts (after the 8-byte discriminator, little-endian, no padding):
//!
//! CurveConfiguration:
//!   admin, fee_admin, initial_quorum u64, use_dao bool, governance,
//!   dao_quorum u16, locked_liquidity bool, target_liquidity u64,
//!   fee_percentage u16, fees_enabled bool, curve_shape u8,
//!   max_token_supply u64, liquidity_lock_period i64,
//!   liquidity_pool_percentage u16, initial_price u64, initial_supply u64,
//!   fee_recipients Vec<Recipient>, total_fees_collected u64, reserve_ratio u16
//!
//! BondingCurve:
//!   creator, total_supply u64, reserve_balance u64, reserve_token u64,
//!   token, bump u8
//!
//! Allocation:
//!   wallet, percentage u8, total_tokens u64, claimed_tokens u64,
//!   vesting Option<VestingSchedule>, bump u8
//!
//! The decoders skip the discriminator without checking it; use
//! [`check_discriminator`] when the buffer's origin is not already known.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::codec::ByteReader;
use crate::constants::*;
use crate::error::{SdkError, SdkResult};

// ── Records ─────────────────────────────────────────────────────────────────

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveShape {
    Linear,
    Quadratic,
}

impl TryFrom<u8> for CurveShape {
    type Error = SdkError;

    fn try_from(value: u8) -> SdkResult<Self> {
        match value {
            0 => Ok(Self::Linear),
            1 => Ok(Self::Quadratic),
            value => Err(SdkError::UnknownVariant {
                field: "curve_shape",
                value,
            }),
        }
    }
}

impl From<CurveShape> for u8 {
    fn from(shape: CurveShape) -> u8 {
        match shape {
            CurveShape::Linear => 0,
            CurveShape::Quadratic => 1,
        }
    }
}

/// Fee recipient. `share` is in basis points, `amount` is accrued fees.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub address: Pubkey,
    pub share: u16,
    pub amount: u64,
    pub locking_period: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CurveConfiguration {
    pub admin: Pubkey,
    pub fee_admin: Pubkey,
    pub initial_quorum: u64,
    pub use_dao: bool,
    pub governance: Pubkey,
    pub dao_quorum: u16,
    pub locked_liquidity: bool,
    pub target_liquidity: u64,
    pub fee_percentage: u16,
    pub fees_enabled: bool,
    pub curve_shape: CurveShape,
    pub max_token_supply: u64,
    pub liquidity_lock_period: i64,
    pub liquidity_pool_percentage: u16,
    pub initial_price: u64,
    pub initial_supply: u64,
    pub fee_recipients: Vec<Recipient>,
    pub total_fees_collected: u64,
    pub reserve_ratio: u16,
}

impl CurveConfiguration {
    /// Sum of recipient shares in basis points, widened so it cannot wrap.
    pub fn total_recipient_share(&self) -> u32 {
        self.fee_recipients.iter().map(|r| r.share as u32).sum()
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct BondingCurveState {
    pub creator: Pubkey,
    pub total_supply: u64,
    pub reserve_balance: u64,
    pub reserve_token: u64,
    pub token: Pubkey,
    pub bump: u8,
}

/// Release plan for an allocation. Times are unix seconds, periods are seconds.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VestingSchedule {
    pub cliff_period: i64,
    pub start_time: i64,
    pub duration: i64,
    pub interval: i64,
    pub released: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct AllocationRecord {
    pub wallet: Pubkey,
    pub percentage: u8,
    pub total_tokens: u64,
    pub claimed_tokens: u64,
    pub vesting: Option<VestingSchedule>,
    pub bump: u8,
}

impl AllocationRecord {
    pub fn has_vesting(&self) -> bool {
        self.vesting.is_some()
    }

    pub fn unclaimed(&self) -> u64 {
        self.total_tokens.saturating_sub(self.claimed_tokens)
    }

    pub fn is_fully_claimed(&self) -> bool {
        self.claimed_tokens >= self.total_tokens
    }

    /// Claimed share of the entitlement, 0.0 to 100.0. Display only: the
    /// conversion to `f64` loses precision above 2^53.
    pub fn claim_progress_percent(&self) -> f64 {
        if self.total_tokens == 0 {
            return 0.0;
        }
        self.claimed_tokens as f64 / self.total_tokens as f64 * 100.0
    }

    /// claimed <= total, and cliff <= duration when vesting is present.
    pub fn is_consistent(&self) -> bool {
        let vesting_ok = self
            .vesting
            .map_or(true, |v| v.cliff_period <= v.duration);
        self.claimed_tokens <= self.total_tokens
            && self.percentage <= MAX_ALLOCATION_PERCENT
            && vesting_ok
    }
}

// ── Decoders ────────────────────────────────────────────────────────────────

fn read_recipient(r: &mut ByteReader<'_>) -> SdkResult<Recipient> {
    Ok(Recipient {
        address: r.read_pubkey("recipient.address")?,
        share: r.read_u16("recipient.share")?,
        amount: r.read_u64("recipient.amount")?,
        locking_period: r.read_i64("recipient.locking_period")?,
    })
}

pub fn decode_curve_configuration(data: &[u8]) -> SdkResult<CurveConfiguration> {
    let mut r = ByteReader::after_discriminator(data)?;
    Ok(CurveConfiguration {
        admin: r.read_pubkey("admin")?,
        fee_admin: r.read_pubkey("fee_admin")?,
        initial_quorum: r.read_u64("initial_quorum")?,
        use_dao: r.read_bool("use_dao")?,
        governance: r.read_pubkey("governance")?,
        dao_quorum: r.read_u16("dao_quorum")?,
        locked_liquidity: r.read_bool("locked_liquidity")?,
        target_liquidity: r.read_u64("target_liquidity")?,
        fee_percentage: r.read_u16("fee_percentage")?,
        fees_enabled: r.read_bool("fees_enabled")?,
        curve_shape: CurveShape::try_from(r.read_u8("curve_shape")?)?,
        max_token_supply: r.read_u64("max_token_supply")?,
        liquidity_lock_period: r.read_i64("liquidity_lock_period")?,
        liquidity_pool_percentage: r.read_u16("liquidity_pool_percentage")?,
        initial_price: r.read_u64("initial_price")?,
        initial_supply: r.read_u64("initial_supply")?,
        fee_recipients: r.read_vec("fee_recipients", RECIPIENT_LEN, read_recipient)?,
        total_fees_collected: r.read_u64("total_fees_collected")?,
        reserve_ratio: r.read_u16("reserve_ratio")?,
    })
}

pub fn decode_bonding_curve(data: &[u8]) -> SdkResult<BondingCurveState> {
    let mut r = ByteReader::after_discriminator(data)?;
    Ok(BondingCurveState {
        creator: r.read_pubkey("creator")?,
        total_supply: r.read_u64("total_supply")?,
        reserve_balance: r.read_u64("reserve_balance")?,
        reserve_token: r.read_u64("reserve_token")?,
        token: r.read_pubkey("token")?,
        bump: r.read_u8("bump")?,
    })
}

pub fn decode_allocation(data: &[u8]) -> SdkResult<AllocationRecord> {
    let mut r = ByteReader::after_discriminator(data)?;
    Ok(AllocationRecord {
        wallet: r.read_pubkey("wallet")?,
        percentage: r.read_u8("percentage")?,
        total_tokens: r.read_u64("total_tokens")?,
        claimed_tokens: r.read_u64("claimed_tokens")?,
        vesting: r.read_option("vesting", |r| {
            Ok(VestingSchedule {
                cliff_period: r.read_i64("vesting.cliff_period")?,
                start_time: r.read_i64("vesting.start_time")?,
                duration: r.read_i64("vesting.duration")?,
                interval: r.read_i64("vesting.interval")?,
                released: r.read_u64("vesting.released")?,
            })
        })?,
        bump: r.read_u8("bump")?,
    })
}

// ── Discriminators ──────────────────────────────────────────────────────────

/// Verify the leading 8 bytes match `sha256("account:<account>")`.
pub fn check_discriminator(data: &[u8], account: &'static str) -> SdkResult<()> {
    let found: [u8; 8] = match data.get(..DISCRIMINATOR_LEN) {
        Some(bytes) => {
            let mut out = [0u8; 8];
            out.copy_from_slice(bytes);
            out
        }
        None => {
            return Err(SdkError::BufferTooShort {
                field: "discriminator",
                offset: 0,
                needed: DISCRIMINATOR_LEN,
                available: data.len(),
            })
        }
    };
    let expected = account_discriminator(account);
    if found != expected {
        return Err(SdkError::DiscriminatorMismatch {
            account,
            expected,
            found,
        });
    }
    Ok(())
}

/// Discriminator followed by the Borsh body, as the program stores it.
pub fn encode_account<T: BorshSerialize>(account: &str, value: &T) -> SdkResult<Vec<u8>> {
    let mut data = account_discriminator(account).to_vec();
    value
        .serialize(&mut data)
        .map_err(|e| SdkError::InstructionBuild {
            instruction: "encode_account",
            reason: e.to_string(),
        })?;
    Ok(data)
}
