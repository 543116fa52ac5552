//! SPL mint setup: account creation, initialization, initial supply, metadata,
//! and optional authority hand-off.
//!
//! Order matters. The mint account must exist before it is initialized, the
//! creator token account before tokens are minted into it, and authorities are
//! moved last because `mint_to` needs the creator as mint authority.

use mpl_token_metadata::{
    instructions::{CreateMetadataAccountV3, CreateMetadataAccountV3InstructionArgs},
    types::DataV2,
};
use solana_program::{instruction::Instruction, pubkey::Pubkey, system_instruction, system_program, sysvar};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};
use spl_token::instruction::{initialize_mint2, mint_to, set_authority, AuthorityType};

use crate::constants::MINT_ACCOUNT_LEN;
use crate::error::{SdkError, SdkResult};
use crate::pda::find_metadata;

pub const MAX_NAME_LEN: usize = 32;
pub const MAX_SYMBOL_LEN: usize = 10;
pub const MAX_URI_LEN: usize = 200;

/// Everything needed to stand up a new mint with its full initial supply in
/// the creator's token account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintSetup {
    pub payer: Pubkey,
    pub mint: Pubkey,
    pub decimals: u8,
    /// Whole tokens; scaled by `10^decimals` before minting.
    pub supply: u64,
    /// Rent-exempt minimum for an 82-byte mint account.
    pub rent_lamports: u64,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    /// New mint authority. `None` leaves the creator in control.
    pub mint_authority_target: Option<Pubkey>,
    /// New freeze authority. `None` leaves the creator in control.
    pub freeze_authority_target: Option<Pubkey>,
}

/// Whole tokens to base units: `amount * 10^decimals`, checked.
pub fn to_base_units(amount: u64, decimals: u8) -> SdkResult<u64> {
    10u64
        .checked_pow(decimals as u32)
        .and_then(|scale| amount.checked_mul(scale))
        .ok_or(SdkError::ArithmeticOverflow)
}

fn token_error(instruction: &'static str) -> impl Fn(solana_program::program_error::ProgramError) -> SdkError {
    move |e| SdkError::InstructionBuild {
        instruction,
        reason: e.to_string(),
    }
}

/// Metaplex `CreateMetadataAccountV3` with the creator as update authority.
pub fn create_metadata_instruction(setup: &MintSetup) -> SdkResult<Instruction> {
    if setup.name.len() > MAX_NAME_LEN {
        return Err(SdkError::InstructionBuild {
            instruction: "create_metadata_account_v3",
            reason: format!("token name exceeds {MAX_NAME_LEN} bytes"),
        });
    }
    if setup.symbol.len() > MAX_SYMBOL_LEN {
        return Err(SdkError::InstructionBuild {
            instruction: "create_metadata_account_v3",
            reason: format!("token symbol exceeds {MAX_SYMBOL_LEN} bytes"),
        });
    }
    if setup.uri.len() > MAX_URI_LEN {
        return Err(SdkError::InstructionBuild {
            instruction: "create_metadata_account_v3",
            reason: format!("metadata URI exceeds {MAX_URI_LEN} bytes"),
        });
    }

    let (metadata, _) = find_metadata(&setup.mint);
    let accounts = CreateMetadataAccountV3 {
        metadata,
        mint: setup.mint,
        mint_authority: setup.payer,
        payer: setup.payer,
        update_authority: (setup.payer, true),
        system_program: system_program::ID,
        rent: Some(sysvar::rent::ID),
    };
    Ok(accounts.instruction(CreateMetadataAccountV3InstructionArgs {
        data: DataV2 {
            name: setup.name.clone(),
            symbol: setup.symbol.clone(),
            uri: setup.uri.clone(),
            seller_fee_basis_points: 0,
            creators: None,
            collection: None,
            uses: None,
        },
        is_mutable: true,
        collection_details: None,
    }))
}

/// Full mint setup sequence.
///
///   1. create mint account (system program)
///   2. initialize_mint2 with the payer as mint and freeze authority
///   3. create the payer's associated token account
///   4. mint the whole supply to it
///   5. create Metaplex metadata
///   6. optional: move mint authority
///   7. optional: move freeze authority
pub fn mint_setup_instructions(setup: &MintSetup) -> SdkResult<Vec<Instruction>> {
    let raw_supply = to_base_units(setup.supply, setup.decimals)?;
    let creator_ata = get_associated_token_address(&setup.payer, &setup.mint);

    let mut ixs = vec![
        system_instruction::create_account(
            &setup.payer,
            &setup.mint,
            setup.rent_lamports,
            MINT_ACCOUNT_LEN as u64,
            &spl_token::ID,
        ),
        initialize_mint2(
            &spl_token::ID,
            &setup.mint,
            &setup.payer,
            Some(&setup.payer),
            setup.decimals,
        )
        .map_err(token_error("initialize_mint2"))?,
        create_associated_token_account(&setup.payer, &setup.payer, &setup.mint, &spl_token::ID),
        mint_to(
            &spl_token::ID,
            &setup.mint,
            &creator_ata,
            &setup.payer,
            &[],
            raw_supply,
        )
        .map_err(token_error("mint_to"))?,
        create_metadata_instruction(setup)?,
    ];

    if let Some(target) = setup.mint_authority_target {
        ixs.push(
            set_authority(
                &spl_token::ID,
                &setup.mint,
                Some(&target),
                AuthorityType::MintTokens,
                &setup.payer,
                &[],
            )
            .map_err(token_error("set_authority"))?,
        );
    }
    if let Some(target) = setup.freeze_authority_target {
        ixs.push(
            set_authority(
                &spl_token::ID,
                &setup.mint,
                Some(&target),
                AuthorityType::FreezeAccount,
                &setup.payer,
                &[],
            )
            .map_err(token_error("set_authority"))?,
        );
    }

    Ok(ixs)
}
