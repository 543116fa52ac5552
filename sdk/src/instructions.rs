//! Bonding curve program instruction builders.
//!
//! Anchor wire format: 8-byte `sha256("global:<name>")` prefix, then the
//! Borsh-encoded arguments in declaration order.
//!
//! Instructions:
//!   initialize          curve configuration for one mint
//!   create_pool         bonding curve pool, token vault and SOL vault
//!   buy / sell          trade against the curve
//!   add_liquidity       creator deposits tokens into the pool
//!   remove_liquidity    creator withdraws after the lock period
//!   create_allocation   per-recipient allocation with optional vesting
//!   create_fair_launch  fair-launch sale window and caps
//!   claim_fee           fee recipient withdraws accrued fees

use borsh::BorshSerialize;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program, sysvar,
};
use spl_associated_token_account::get_associated_token_address;

use crate::accounts::{Recipient, VestingSchedule};
use crate::constants::instruction_discriminator;
use crate::error::{SdkError, SdkResult};
use crate::pda::*;

// ── Instruction Names ───────────────────────────────────────────────────────

pub const IX_INITIALIZE: &str = "initialize";
pub const IX_CREATE_POOL: &str = "create_pool";
pub const IX_BUY: &str = "buy";
pub const IX_SELL: &str = "sell";
pub const IX_ADD_LIQUIDITY: &str = "add_liquidity";
pub const IX_REMOVE_LIQUIDITY: &str = "remove_liquidity";
pub const IX_CREATE_ALLOCATION: &str = "create_allocation";
pub const IX_CREATE_FAIR_LAUNCH: &str = "create_fair_launch";
pub const IX_CLAIM_FEE: &str = "claim_fee";

// ── Param Structs (exact Borsh match to program) ────────────────────────────

#[derive(BorshSerialize, Debug, Clone, PartialEq, Eq)]
pub struct InitializeArgs {
    pub admin: Pubkey,
    pub fee_percentage: u16,
    pub initial_quorum: u64,
    pub target_liquidity: u64,
    pub governance: Pubkey,
    pub dao_quorum: u16,
    pub bonding_curve_type: u8,
    pub max_token_supply: u64,
    pub liquidity_lock_period: i64,
    pub liquidity_pool_percentage: u16,
    pub initial_price: u64,
    pub initial_supply: u64,
    pub recipients: Vec<Recipient>,
    pub reserve_ratio: u16,
}

#[derive(BorshSerialize)]
struct AmountArgs {
    amount: u64,
}

#[derive(BorshSerialize)]
struct SellArgs {
    amount: u64,
    bump: u8,
}

#[derive(BorshSerialize)]
struct BumpArgs {
    bump: u8,
}

#[derive(BorshSerialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateAllocationArgs {
    pub name: String,
    pub percentage: u8,
    pub total_tokens: u64,
    pub vesting: Option<VestingSchedule>,
}

#[derive(BorshSerialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateFairLaunchArgs {
    pub soft_cap: u64,
    pub hard_cap: u64,
    pub start_time: i64,
    pub end_time: i64,
    pub min_contribution: u64,
    pub max_contribution: u64,
    pub max_tokens_per_wallet: u64,
    pub distribution_delay: i64,
}

fn instruction_data<T: BorshSerialize>(name: &'static str, args: &T) -> SdkResult<Vec<u8>> {
    let mut data = instruction_discriminator(name).to_vec();
    args.serialize(&mut data)
        .map_err(|e| SdkError::InstructionBuild {
            instruction: name,
            reason: e.to_string(),
        })?;
    Ok(data)
}

// ── Instruction Builders ────────────────────────────────────────────────────

/// Create the curve configuration for `mint`.
///
/// Accounts:
///   0. `[writable]` curve_configuration PDA
///   1. `[]` token_mint
///   2. `[signer, writable]` admin (payer)
///   3. `[]` rent sysvar
///   4. `[]` system_program
pub fn create_initialize_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    args: &InitializeArgs,
) -> SdkResult<Instruction> {
    let (config, _) = find_curve_configuration(program_id, mint)?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(config, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new(args.admin, true),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: instruction_data(IX_INITIALIZE, args)?,
    })
}

/// Create the bonding curve pool and its vaults.
///
/// Accounts:
///   0. `[writable]` curve_configuration PDA
///   1. `[writable]` bonding_curve PDA
///   2. `[writable]` token_mint
///   3. `[writable]` pool_token_account (ATA of bonding_curve)
///   4. `[writable]` pool_sol_vault PDA
///   5. `[writable]` user_token_account
///   6. `[signer, writable]` user (payer)
///   7. `[]` token_program
///   8. `[]` rent sysvar
///   9. `[]` system_program
///  10. `[]` associated_token_program
pub fn create_pool_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    user: &Pubkey,
) -> SdkResult<Instruction> {
    let (config, _) = find_curve_configuration(program_id, mint)?;
    let (bonding_curve, _) = find_bonding_curve(program_id, mint)?;
    let (sol_vault, _) = find_sol_vault(program_id, mint)?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(config, false),
            AccountMeta::new(bonding_curve, false),
            AccountMeta::new(*mint, false),
            AccountMeta::new(get_associated_token_address(&bonding_curve, mint), false),
            AccountMeta::new(sol_vault, false),
            AccountMeta::new(get_associated_token_address(user, mint), false),
            AccountMeta::new(*user, true),
            AccountMeta::new_readonly(spl_token::ID, false),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(spl_associated_token_account::ID, false),
        ],
        data: instruction_discriminator(IX_CREATE_POOL).to_vec(),
    })
}

fn trade_accounts(program_id: &Pubkey, mint: &Pubkey, user: &Pubkey) -> SdkResult<Vec<AccountMeta>> {
    let (config, _) = find_curve_configuration(program_id, mint)?;
    let (bonding_curve, _) = find_bonding_curve(program_id, mint)?;
    let (sol_vault, _) = find_sol_vault(program_id, mint)?;

    Ok(vec![
        AccountMeta::new(config, false),
        AccountMeta::new(bonding_curve, false),
        AccountMeta::new(*mint, false),
        AccountMeta::new_readonly(spl_token::ID, false),
        AccountMeta::new_readonly(spl_associated_token_account::ID, false),
        AccountMeta::new(sol_vault, false),
        AccountMeta::new(get_associated_token_address(&bonding_curve, mint), false),
        AccountMeta::new(get_associated_token_address(user, mint), false),
        AccountMeta::new(*user, true),
        AccountMeta::new_readonly(system_program::ID, false),
    ])
}

/// Buy `amount` tokens from the curve.
///
/// Accounts:
///   0. `[writable]` curve_configuration PDA
///   1. `[writable]` bonding_curve PDA
///   2. `[writable]` token_mint
///   3. `[]` token_program
///   4. `[]` associated_token_program
///   5. `[writable]` pool_sol_vault PDA
///   6. `[writable]` pool_token_account
///   7. `[writable]` user_token_account
///   8. `[signer, writable]` user
///   9. `[]` system_program
pub fn create_buy_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    user: &Pubkey,
    amount: u64,
) -> SdkResult<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: trade_accounts(program_id, mint, user)?,
        data: instruction_data(IX_BUY, &AmountArgs { amount })?,
    })
}

/// Sell `amount` tokens back to the curve. Fee recipients are appended as
/// writable remaining accounts in configuration order.
///
/// Accounts: same as buy, followed by
///  10+. `[writable]` fee recipients
pub fn create_sell_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    user: &Pubkey,
    amount: u64,
    fee_recipients: &[Pubkey],
) -> SdkResult<Instruction> {
    let (_, sol_vault_bump) = find_sol_vault(program_id, mint)?;
    let mut accounts = trade_accounts(program_id, mint, user)?;
    accounts.extend(fee_recipients.iter().map(|r| AccountMeta::new(*r, false)));

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: instruction_data(
            IX_SELL,
            &SellArgs {
                amount,
                bump: sol_vault_bump,
            },
        )?,
    })
}

fn liquidity_accounts(
    program_id: &Pubkey,
    mint: &Pubkey,
    user: &Pubkey,
) -> SdkResult<Vec<AccountMeta>> {
    let (config, _) = find_curve_configuration(program_id, mint)?;
    let (bonding_curve, _) = find_bonding_curve(program_id, mint)?;
    let (sol_vault, _) = find_sol_vault(program_id, mint)?;

    Ok(vec![
        AccountMeta::new(config, false),
        AccountMeta::new(bonding_curve, false),
        AccountMeta::new(*mint, false),
        AccountMeta::new(get_associated_token_address(&bonding_curve, mint), false),
        AccountMeta::new(sol_vault, false),
        AccountMeta::new(get_associated_token_address(user, mint), false),
        AccountMeta::new(*user, true),
        AccountMeta::new_readonly(sysvar::rent::ID, false),
        AccountMeta::new_readonly(system_program::ID, false),
        AccountMeta::new_readonly(spl_token::ID, false),
        AccountMeta::new_readonly(spl_associated_token_account::ID, false),
    ])
}

/// Deposit `amount` tokens into the pool.
///
/// Accounts:
///   0. `[writable]` curve_configuration PDA
///   1. `[writable]` bonding_curve PDA
///   2. `[writable]` token_mint
///   3. `[writable]` pool_token_account
///   4. `[writable]` pool_sol_vault PDA
///   5. `[writable]` user_token_account
///   6. `[signer, writable]` user
///   7. `[]` rent sysvar
///   8. `[]` system_program
///   9. `[]` token_program
///  10. `[]` associated_token_program
pub fn create_add_liquidity_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    user: &Pubkey,
    amount: u64,
) -> SdkResult<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: liquidity_accounts(program_id, mint, user)?,
        data: instruction_data(IX_ADD_LIQUIDITY, &AmountArgs { amount })?,
    })
}

/// Withdraw pool liquidity. Accounts as add_liquidity.
pub fn create_remove_liquidity_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    user: &Pubkey,
) -> SdkResult<Instruction> {
    let (_, sol_vault_bump) = find_sol_vault(program_id, mint)?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: liquidity_accounts(program_id, mint, user)?,
        data: instruction_data(
            IX_REMOVE_LIQUIDITY,
            &BumpArgs {
                bump: sol_vault_bump,
            },
        )?,
    })
}

/// Create the allocation record for `wallet` and its token vault.
///
/// Accounts:
///   0. `[writable]` allocation PDA
///   1. `[]` wallet
///   2. `[writable]` token_mint
///   3. `[writable]` allocation_vault (ATA of allocation)
///   4. `[]` token_program
///   5. `[]` associated_token_program
///   6. `[]` rent sysvar
///   7. `[]` system_program
///   8. `[signer, writable]` authority (payer)
pub fn create_allocation_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    wallet: &Pubkey,
    authority: &Pubkey,
    args: &CreateAllocationArgs,
) -> SdkResult<Instruction> {
    let (allocation, _) = find_allocation(program_id, wallet, mint)?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(allocation, false),
            AccountMeta::new_readonly(*wallet, false),
            AccountMeta::new(*mint, false),
            AccountMeta::new(get_associated_token_address(&allocation, mint), false),
            AccountMeta::new_readonly(spl_token::ID, false),
            AccountMeta::new_readonly(spl_associated_token_account::ID, false),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new(*authority, true),
        ],
        data: instruction_data(IX_CREATE_ALLOCATION, args)?,
    })
}

/// Open a fair-launch sale for `mint`.
///
/// Accounts:
///   0. `[writable]` launchpad PDA (of authority)
///   1. `[writable]` fair_launch_data PDA
///   2. `[]` token_mint
///   3. `[writable]` launchpad_vault (ATA of launchpad)
///   4. `[writable]` contribution_vault PDA
///   5. `[signer, writable]` authority
///   6. `[]` system_program
///   7. `[]` token_program
///   8. `[]` associated_token_program
///   9. `[]` rent sysvar
pub fn create_fair_launch_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    authority: &Pubkey,
    args: &CreateFairLaunchArgs,
) -> SdkResult<Instruction> {
    let (launchpad, _) = find_launchpad(program_id, authority)?;
    let (fair_launch_data, _) = find_fair_launch_data(program_id, mint)?;
    let (contribution_vault, _) = find_fair_launch_vault(program_id, &fair_launch_data)?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(launchpad, false),
            AccountMeta::new(fair_launch_data, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new(get_associated_token_address(&launchpad, mint), false),
            AccountMeta::new(contribution_vault, false),
            AccountMeta::new(*authority, true),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(spl_token::ID, false),
            AccountMeta::new_readonly(spl_associated_token_account::ID, false),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
        ],
        data: instruction_data(IX_CREATE_FAIR_LAUNCH, args)?,
    })
}

/// Withdraw the caller's accrued fees from the fee pool.
///
/// Accounts:
///   0. `[writable]` curve_configuration PDA
///   1. `[writable]` bonding_curve PDA
///   2. `[]` token_mint
///   3. `[writable]` fee_pool PDA
///   4. `[writable]` fee_pool_vault PDA
///   5. `[signer, writable]` user
///   6. `[]` system_program
pub fn create_claim_fee_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    user: &Pubkey,
) -> SdkResult<Instruction> {
    let (config, _) = find_curve_configuration(program_id, mint)?;
    let (bonding_curve, _) = find_bonding_curve(program_id, mint)?;
    let (fee_pool, _) = find_fee_pool(program_id, mint)?;
    let (fee_pool_vault, vault_bump) = find_fee_pool_vault(program_id, mint)?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(config, false),
            AccountMeta::new(bonding_curve, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new(fee_pool, false),
            AccountMeta::new(fee_pool_vault, false),
            AccountMeta::new(*user, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: instruction_data(IX_CLAIM_FEE, &BumpArgs { bump: vault_bump })?,
    })
}
