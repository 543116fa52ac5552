//! Deployment plan: instruction groups packed into as few transactions as the
//! size and instruction-count ceiling allow.
//!
//! Stage 1 holds mint setup and the curve pool; stage 2 holds allocations and
//! the sale. Stages never share a transaction, since stage 2 references
//! accounts stage 1 creates and must be simulated after it lands.

use std::fmt;

use potlaunch_sdk::constants::PACKET_DATA_SIZE;
use potlaunch_sdk::instructions::{
    create_allocation_instruction, create_fair_launch_instruction, create_initialize_instruction,
    create_pool_instruction, CreateAllocationArgs, InitializeArgs,
};
use potlaunch_sdk::mint::{mint_setup_instructions, MintSetup};
use potlaunch_sdk::pda::LaunchAddresses;
use solana_sdk::{
    instruction::Instruction, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};

use crate::error::DeployError;
use crate::validate::ValidatedLaunch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKind {
    MintSetup,
    CurvePool,
    Allocation { wallet: Pubkey },
    SaleSetup,
}

impl GroupKind {
    pub fn stage(&self) -> u8 {
        match self {
            Self::MintSetup | Self::CurvePool => 1,
            Self::Allocation { .. } | Self::SaleSetup => 2,
        }
    }

    pub fn join(groups: &[GroupKind]) -> String {
        groups
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MintSetup => f.write_str("mint setup"),
            Self::CurvePool => f.write_str("curve pool"),
            Self::Allocation { wallet } => write!(f, "allocation for {wallet}"),
            Self::SaleSetup => f.write_str("sale setup"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstructionGroup {
    pub kind: GroupKind,
    pub instructions: Vec<Instruction>,
}

/// Ceiling for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_instructions: usize,
    pub max_bytes: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_instructions: 16,
            max_bytes: PACKET_DATA_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxProgress {
    pub simulated: bool,
    pub submitted: bool,
    pub confirmed: bool,
}

#[derive(Debug, Clone)]
pub struct PlannedTransaction {
    pub groups: Vec<GroupKind>,
    pub instructions: Vec<Instruction>,
    /// Contains mint account creation, so the ephemeral mint key must sign.
    pub needs_mint_signature: bool,
    pub progress: TxProgress,
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    pub payer: Pubkey,
    pub addresses: LaunchAddresses,
    pub transactions: Vec<PlannedTransaction>,
}

impl DeploymentPlan {
    pub fn build(
        launch: &ValidatedLaunch,
        program_id: &Pubkey,
        payer: &Pubkey,
        mint: &Pubkey,
        mint_rent_lamports: u64,
        limits: BatchLimits,
    ) -> Result<Self, DeployError> {
        let addresses = LaunchAddresses::derive(program_id, mint, payer)?;
        let groups = build_groups(launch, program_id, payer, mint, mint_rent_lamports)?;
        let transactions = pack(groups, payer, mint, limits)?;
        Ok(Self {
            payer: *payer,
            addresses,
            transactions,
        })
    }

    pub fn mint(&self) -> Pubkey {
        self.addresses.mint
    }

    /// Groups of every confirmed transaction, in order.
    pub fn confirmed_groups(&self) -> Vec<GroupKind> {
        self.transactions
            .iter()
            .filter(|t| t.progress.confirmed)
            .flat_map(|t| t.groups.iter().cloned())
            .collect()
    }
}

/// All instruction groups of a launch in execution order.
pub fn build_groups(
    launch: &ValidatedLaunch,
    program_id: &Pubkey,
    payer: &Pubkey,
    mint: &Pubkey,
    mint_rent_lamports: u64,
) -> Result<Vec<InstructionGroup>, DeployError> {
    let mut groups = Vec::with_capacity(launch.allocations.len() + 3);

    groups.push(InstructionGroup {
        kind: GroupKind::MintSetup,
        instructions: mint_setup_instructions(&MintSetup {
            payer: *payer,
            mint: *mint,
            decimals: launch.decimals,
            supply: launch.supply,
            rent_lamports: mint_rent_lamports,
            name: launch.name.clone(),
            symbol: launch.symbol.clone(),
            uri: launch.uri.clone(),
            mint_authority_target: launch.mint_authority_target,
            freeze_authority_target: launch.freeze_authority_target,
        })?,
    });

    let curve = &launch.curve;
    let initialize = InitializeArgs {
        admin: *payer,
        fee_percentage: launch.fee_percentage,
        initial_quorum: curve.initial_quorum,
        target_liquidity: curve.target_liquidity,
        governance: curve.governance.unwrap_or(*payer),
        dao_quorum: curve.dao_quorum,
        bonding_curve_type: curve.shape.into(),
        max_token_supply: launch.raw_supply,
        liquidity_lock_period: curve.liquidity_lock_period,
        liquidity_pool_percentage: curve.liquidity_pool_percentage,
        initial_price: curve.initial_price,
        initial_supply: launch.raw_supply,
        recipients: launch.fee_recipients.clone(),
        reserve_ratio: curve.reserve_ratio,
    };
    groups.push(InstructionGroup {
        kind: GroupKind::CurvePool,
        instructions: vec![
            create_initialize_instruction(program_id, mint, &initialize)?,
            create_pool_instruction(program_id, mint, payer)?,
        ],
    });

    for allocation in &launch.allocations {
        let args = CreateAllocationArgs {
            name: allocation.name.clone(),
            percentage: allocation.percentage,
            total_tokens: allocation.total_tokens,
            vesting: allocation.vesting,
        };
        groups.push(InstructionGroup {
            kind: GroupKind::Allocation {
                wallet: allocation.wallet,
            },
            instructions: vec![create_allocation_instruction(
                program_id,
                mint,
                &allocation.wallet,
                payer,
                &args,
            )?],
        });
    }

    if let Some(sale) = &launch.sale {
        groups.push(InstructionGroup {
            kind: GroupKind::SaleSetup,
            instructions: vec![create_fair_launch_instruction(program_id, mint, payer, sale)?],
        });
    }

    Ok(groups)
}

/// Serialized size of an unsigned transaction carrying `instructions`,
/// signature slots included.
pub fn transaction_size(instructions: &[Instruction], payer: &Pubkey) -> Result<usize, DeployError> {
    let tx = Transaction::new_with_payer(instructions, Some(payer));
    bincode::serialized_size(&tx)
        .map(|n| n as usize)
        .map_err(|e| DeployError::PlanTooLarge {
            group: GroupKind::MintSetup,
            detail: format!("cannot measure transaction: {e}"),
        })
}

fn fits(instructions: &[Instruction], payer: &Pubkey, limits: BatchLimits) -> Result<bool, DeployError> {
    if instructions.len() > limits.max_instructions {
        return Ok(false);
    }
    Ok(transaction_size(instructions, payer)? <= limits.max_bytes)
}

fn seal(groups: Vec<GroupKind>, instructions: Vec<Instruction>, mint: &Pubkey) -> PlannedTransaction {
    PlannedTransaction {
        needs_mint_signature: instructions
            .iter()
            .any(|ix| ix.accounts.iter().any(|a| a.pubkey == *mint && a.is_signer)),
        groups,
        instructions,
        progress: TxProgress::default(),
        signature: None,
    }
}

/// Greedy packing in order. A stage boundary always starts a new transaction;
/// a group too large to stand alone is an error.
pub fn pack(
    groups: Vec<InstructionGroup>,
    payer: &Pubkey,
    mint: &Pubkey,
    limits: BatchLimits,
) -> Result<Vec<PlannedTransaction>, DeployError> {
    let mut out = Vec::new();
    let mut kinds: Vec<GroupKind> = Vec::new();
    let mut current: Vec<Instruction> = Vec::new();
    let mut stage = 0u8;

    for group in groups {
        let stage_changed = group.kind.stage() != stage;
        stage = group.kind.stage();

        if !current.is_empty() && !stage_changed {
            let mut candidate = current.clone();
            candidate.extend(group.instructions.iter().cloned());
            if fits(&candidate, payer, limits)? {
                current = candidate;
                kinds.push(group.kind);
                continue;
            }
        }

        if !fits(&group.instructions, payer, limits)? {
            let size = transaction_size(&group.instructions, payer)?;
            return Err(DeployError::PlanTooLarge {
                detail: format!(
                    "{} instructions, {} bytes (limit {} instructions, {} bytes)",
                    group.instructions.len(),
                    size,
                    limits.max_instructions,
                    limits.max_bytes
                ),
                group: group.kind,
            });
        }
        if !current.is_empty() {
            out.push(seal(std::mem::take(&mut kinds), std::mem::take(&mut current), mint));
        }
        kinds.push(group.kind);
        current = group.instructions;
    }

    if !current.is_empty() {
        out.push(seal(kinds, current, mint));
    }
    Ok(out)
}
