//! Deployment errors. Every terminal failure carries the transaction it
//! happened at and the on-chain state that was already committed.

use std::fmt;

use potlaunch_sdk::SdkError;
use solana_sdk::{pubkey::Pubkey, signature::Signature};

use crate::ledger::LedgerError;
use crate::orchestrator::Phase;
use crate::plan::GroupKind;
use crate::validate::ValidationError;
use crate::wallet::WalletError;

/// Which transaction of the sequence a failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxStage {
    pub index: usize,
    pub total: usize,
    pub groups: Vec<GroupKind>,
}

impl fmt::Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transaction {} of {} ({})",
            self.index + 1,
            self.total,
            GroupKind::join(&self.groups)
        )
    }
}

/// Irreversible state that exists on-chain at the moment of failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub mint: Pubkey,
    pub confirmed: Vec<GroupKind>,
    /// Submitted but never confirmed; it may still land.
    pub in_doubt: Option<Signature>,
}

impl Committed {
    pub fn nothing(mint: Pubkey) -> Self {
        Self {
            mint,
            confirmed: Vec::new(),
            in_doubt: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.in_doubt.is_none()
    }

    pub fn mint_created(&self) -> bool {
        self.confirmed.contains(&GroupKind::MintSetup)
    }
}

impl fmt::Display for Committed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.confirmed.is_empty() {
            write!(f, "no on-chain state was created")?;
        } else {
            write!(
                f,
                "already created on-chain and irreversible: {} (mint {})",
                GroupKind::join(&self.confirmed),
                self.mint
            )?;
        }
        if let Some(sig) = &self.in_doubt {
            write!(f, "; transaction {sig} was submitted and may still land")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("Launch configuration rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error("{group} does not fit in one transaction: {detail}")]
    PlanTooLarge { group: GroupKind, detail: String },

    #[error("Simulation failed at {stage}: {reason}; {committed}")]
    SimulationFailed {
        stage: TxStage,
        reason: String,
        logs: Vec<String>,
        committed: Committed,
    },

    #[error("Ledger rejected {stage} ({signature}): {reason}; {committed}")]
    TransactionRejected {
        stage: TxStage,
        signature: Signature,
        reason: String,
        committed: Committed,
    },

    #[error("No confirmation for {stage} ({signature}) after {attempts} polls; {committed}")]
    ConfirmationTimeout {
        stage: TxStage,
        signature: Signature,
        attempts: u32,
        committed: Committed,
    },

    #[error("Deployment cancelled during {phase}; {committed}")]
    Cancelled { phase: Phase, committed: Committed },

    #[error("A deployment attempt is already in progress")]
    AttemptInProgress,

    #[error("RPC failure at {stage}: {source}; {committed}")]
    Rpc {
        stage: String,
        #[source]
        source: LedgerError,
        committed: Committed,
    },

    #[error("Wallet failed to sign {stage}: {source}; {committed}")]
    Wallet {
        stage: TxStage,
        #[source]
        source: WalletError,
        committed: Committed,
    },
}

impl DeployError {
    /// On-chain state committed before the failure, when any step ran.
    pub fn committed(&self) -> Option<&Committed> {
        match self {
            Self::SimulationFailed { committed, .. }
            | Self::TransactionRejected { committed, .. }
            | Self::ConfirmationTimeout { committed, .. }
            | Self::Cancelled { committed, .. }
            | Self::Rpc { committed, .. }
            | Self::Wallet { committed, .. } => Some(committed),
            _ => None,
        }
    }
}

/// Returned by [`crate::orchestrator::CancelHandle::cancel`] once the attempt
/// can no longer be stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Cannot cancel during {phase}: a transaction may already be settling")]
pub struct CancelRefused {
    pub phase: Phase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_committed_display_lists_steps_and_mint() {
        let mint = Pubkey::new_unique();
        let committed = Committed {
            mint,
            confirmed: vec![GroupKind::MintSetup, GroupKind::CurvePool],
            in_doubt: None,
        };
        let text = committed.to_string();
        assert!(text.contains("mint setup"));
        assert!(text.contains("curve pool"));
        assert!(text.contains(&mint.to_string()));
        assert!(committed.mint_created());
    }

    #[test]
    fn test_nothing_committed() {
        let committed = Committed::nothing(Pubkey::new_unique());
        assert!(committed.is_empty());
        assert_eq!(committed.to_string(), "no on-chain state was created");
    }

    #[test]
    fn test_stage_display_is_one_based() {
        let stage = TxStage {
            index: 1,
            total: 2,
            groups: vec![GroupKind::SaleSetup],
        };
        assert_eq!(stage.to_string(), "transaction 2 of 2 (sale setup)");
    }
}
