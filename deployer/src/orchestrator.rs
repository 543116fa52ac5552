//! Drives a validated launch through the ledger, one transaction at a time.
//!
//! Each transaction of the plan goes Building, Simulating, AwaitingSignature,
//! Submitted, Confirming. The attempt ends in Succeeded or Failed. Nothing is
//! signed before its simulation passes, and nothing is retried once sent.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use potlaunch_sdk::constants::{BONDING_CURVE_PROGRAM_ID, MINT_ACCOUNT_LEN};
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};
use tracing::{debug, error, info, warn};

use crate::error::{CancelRefused, Committed, DeployError, TxStage};
use crate::launch::TokenLaunchConfig;
use crate::ledger::{retry_with_backoff, LedgerClient, SignatureState};
use crate::plan::{BatchLimits, DeploymentPlan};
use crate::report::{allocation_addresses, DeploymentReport};
use crate::validate::validate;
use crate::wallet::{EphemeralMint, WalletError, WalletSigner};

const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Building,
    Simulating,
    AwaitingSignature,
    Submitted,
    Confirming,
    Succeeded,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Building => "building",
            Self::Simulating => "simulating",
            Self::AwaitingSignature => "awaiting signature",
            Self::Submitted => "submitted",
            Self::Confirming => "confirming",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        })
    }
}

/// Progress reported to the caller as the attempt advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Milestone {
    Validated { transactions: usize },
    Simulated { transaction: usize },
    Submitted { transaction: usize, signature: Signature },
    Confirmed { transaction: usize, signature: Signature },
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub program_id: Pubkey,
    pub poll_interval: Duration,
    pub max_confirmation_polls: u32,
    pub limits: BatchLimits,
    /// Attempts for idempotent reads (blockhash, rent).
    pub rpc_retries: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            program_id: BONDING_CURVE_PROGRAM_ID,
            poll_interval: Duration::from_secs(2),
            max_confirmation_polls: 30,
            limits: BatchLimits::default(),
            rpc_retries: 3,
        }
    }
}

#[derive(Debug)]
struct Control {
    phase: Phase,
    /// Phase in which a cancel was accepted.
    cancel: Option<Phase>,
    submitted: bool,
}

impl Control {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            cancel: None,
            submitted: false,
        }
    }
}

fn lock(control: &Mutex<Control>) -> MutexGuard<'_, Control> {
    control.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Requests cancellation of the session's current attempt.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    control: Arc<Mutex<Control>>,
}

impl CancelHandle {
    /// Accepted only while building or awaiting a signature, and only before
    /// any transaction of the attempt has been submitted.
    pub fn cancel(&self) -> Result<(), CancelRefused> {
        let mut control = lock(&self.control);
        let phase = control.phase;
        if control.submitted {
            return Err(CancelRefused { phase });
        }
        match phase {
            Phase::Building | Phase::AwaitingSignature => {
                control.cancel = Some(phase);
                info!(%phase, "Cancellation requested");
                Ok(())
            }
            _ => Err(CancelRefused { phase }),
        }
    }

    pub fn phase(&self) -> Phase {
        lock(&self.control).phase
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DeploymentSession<L, W> {
    ledger: L,
    wallet: W,
    settings: OrchestratorSettings,
    control: Arc<Mutex<Control>>,
    in_flight: AtomicBool,
}

impl<L: LedgerClient, W: WalletSigner> DeploymentSession<L, W> {
    pub fn new(ledger: L, wallet: W, settings: OrchestratorSettings) -> Self {
        Self {
            ledger,
            wallet,
            settings,
            control: Arc::new(Mutex::new(Control::new())),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            control: Arc::clone(&self.control),
        }
    }

    pub fn phase(&self) -> Phase {
        lock(&self.control).phase
    }

    /// Run one deployment attempt. A second call while one is running is
    /// refused with [`DeployError::AttemptInProgress`].
    pub async fn deploy(
        &self,
        config: &TokenLaunchConfig,
        progress: impl Fn(&Milestone) + Send + Sync,
    ) -> Result<DeploymentReport, DeployError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DeployError::AttemptInProgress);
        }
        let _in_flight = InFlight(&self.in_flight);
        *lock(&self.control) = Control::new();

        let result = self.run(config, &progress).await;
        match &result {
            Ok(report) => {
                self.enter(Phase::Succeeded);
                info!(mint = %report.mint(), transactions = report.transactions.len(), "Deployment succeeded");
            }
            Err(e) => {
                self.enter(Phase::Failed);
                error!(error = %e, "Deployment failed");
            }
        }
        result
    }

    async fn run(
        &self,
        config: &TokenLaunchConfig,
        progress: &(impl Fn(&Milestone) + Send + Sync),
    ) -> Result<DeploymentReport, DeployError> {
        let launch = validate(config, unix_now())?;
        let payer = self.wallet.pubkey();
        let mint = EphemeralMint::generate();
        self.enter(Phase::Building);

        let ledger = &self.ledger;
        let rent = retry_with_backoff(
            "getMinimumBalanceForRentExemption",
            self.settings.rpc_retries,
            RETRY_DELAY,
            || ledger.minimum_balance_for_rent_exemption(MINT_ACCOUNT_LEN),
        )
        .await
        .map_err(|source| DeployError::Rpc {
            stage: "mint rent lookup".to_string(),
            source,
            committed: Committed::nothing(mint.pubkey()),
        })?;

        let mut plan = DeploymentPlan::build(
            &launch,
            &self.settings.program_id,
            &payer,
            &mint.pubkey(),
            rent,
            self.settings.limits,
        )?;
        let allocations = allocation_addresses(
            &plan.addresses,
            launch.allocations.iter().map(|a| &a.wallet),
        )?;
        let total = plan.transactions.len();
        info!(mint = %mint.pubkey(), payer = %payer, transactions = total, "Deployment planned");
        progress(&Milestone::Validated {
            transactions: total,
        });

        for index in 0..total {
            let stage = TxStage {
                index,
                total,
                groups: plan.transactions[index].groups.clone(),
            };
            self.enter(Phase::Building);

            let blockhash = retry_with_backoff(
                "getLatestBlockhash",
                self.settings.rpc_retries,
                RETRY_DELAY,
                || ledger.latest_blockhash(),
            )
            .await
            .map_err(|source| DeployError::Rpc {
                stage: stage.to_string(),
                source,
                committed: committed(&plan, None),
            })?;
            let mut tx =
                Transaction::new_with_payer(&plan.transactions[index].instructions, Some(&payer));
            tx.message.recent_blockhash = blockhash;

            self.advance(Phase::Simulating, &plan)?;
            let outcome = self.ledger.simulate(&tx).await.map_err(|source| DeployError::Rpc {
                stage: stage.to_string(),
                source,
                committed: committed(&plan, None),
            })?;
            if let Some(reason) = outcome.err {
                return Err(DeployError::SimulationFailed {
                    stage,
                    reason,
                    logs: outcome.logs,
                    committed: committed(&plan, None),
                });
            }
            plan.transactions[index].progress.simulated = true;
            debug!(%stage, units = ?outcome.units_consumed, "Simulation passed");
            progress(&Milestone::Simulated { transaction: index });

            self.advance(Phase::AwaitingSignature, &plan)?;
            let wallet_error = |source: WalletError, plan: &DeploymentPlan| DeployError::Wallet {
                stage: stage.clone(),
                source,
                committed: committed(plan, None),
            };
            if plan.transactions[index].needs_mint_signature {
                mint.sign(&mut tx).map_err(|e| wallet_error(e, &plan))?;
            }
            let tx = self
                .wallet
                .sign_transaction(tx)
                .await
                .map_err(|e| wallet_error(e, &plan))?;
            if !tx.is_signed() {
                return Err(wallet_error(
                    WalletError::Signer("transaction is missing signatures".to_string()),
                    &plan,
                ));
            }

            self.begin_submit(&plan)?;
            let signature = self.ledger.send(&tx).await.map_err(|source| DeployError::Rpc {
                stage: stage.to_string(),
                source,
                committed: committed(&plan, tx.signatures.first().copied()),
            })?;
            plan.transactions[index].progress.submitted = true;
            plan.transactions[index].signature = Some(signature);
            info!(%stage, %signature, "Transaction submitted");
            progress(&Milestone::Submitted {
                transaction: index,
                signature,
            });

            self.enter(Phase::Confirming);
            self.confirm(&plan, &stage, signature).await?;
            plan.transactions[index].progress.confirmed = true;
            info!(%stage, %signature, "Transaction confirmed");
            progress(&Milestone::Confirmed {
                transaction: index,
                signature,
            });
        }

        Ok(DeploymentReport::from_plan(
            &plan,
            allocations,
            launch.curve.initial_reserve,
        ))
    }

    async fn confirm(
        &self,
        plan: &DeploymentPlan,
        stage: &TxStage,
        signature: Signature,
    ) -> Result<(), DeployError> {
        let max = self.settings.max_confirmation_polls.max(1);
        for attempt in 1..=max {
            match self.ledger.signature_state(&signature).await {
                Ok(SignatureState::Confirmed) => return Ok(()),
                Ok(SignatureState::Failed(reason)) => {
                    return Err(DeployError::TransactionRejected {
                        stage: stage.clone(),
                        signature,
                        reason,
                        committed: committed(plan, None),
                    });
                }
                Ok(SignatureState::Pending) => debug!(%signature, attempt, "Awaiting confirmation"),
                Err(e) => warn!(%signature, attempt, error = %e, "Status poll failed"),
            }
            if attempt < max {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }
        Err(DeployError::ConfirmationTimeout {
            stage: stage.clone(),
            signature,
            attempts: max,
            committed: committed(plan, Some(signature)),
        })
    }

    fn enter(&self, phase: Phase) {
        let mut control = lock(&self.control);
        if control.phase != phase {
            debug!(from = %control.phase, to = %phase, "Phase transition");
            control.phase = phase;
        }
    }

    /// Move to `phase` unless a cancel was accepted.
    fn advance(&self, phase: Phase, plan: &DeploymentPlan) -> Result<(), DeployError> {
        let mut control = lock(&self.control);
        if let Some(requested) = control.cancel {
            return Err(DeployError::Cancelled {
                phase: requested,
                committed: committed(plan, None),
            });
        }
        debug!(from = %control.phase, to = %phase, "Phase transition");
        control.phase = phase;
        Ok(())
    }

    /// Last point a cancel can take effect. From here on it is refused.
    fn begin_submit(&self, plan: &DeploymentPlan) -> Result<(), DeployError> {
        self.advance(Phase::Submitted, plan)?;
        lock(&self.control).submitted = true;
        Ok(())
    }
}

fn committed(plan: &DeploymentPlan, in_doubt: Option<Signature>) -> Committed {
    Committed {
        mint: plan.mint(),
        confirmed: plan.confirmed_groups(),
        in_doubt,
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_in(phase: Phase, submitted: bool) -> CancelHandle {
        CancelHandle {
            control: Arc::new(Mutex::new(Control {
                phase,
                cancel: None,
                submitted,
            })),
        }
    }

    #[test]
    fn test_cancel_accepted_before_submission() {
        for phase in [Phase::Building, Phase::AwaitingSignature] {
            let handle = handle_in(phase, false);
            assert!(handle.cancel().is_ok());
            assert_eq!(lock(&handle.control).cancel, Some(phase));
        }
    }

    #[test]
    fn test_cancel_refused_in_other_phases() {
        for phase in [
            Phase::Idle,
            Phase::Simulating,
            Phase::Submitted,
            Phase::Confirming,
            Phase::Succeeded,
            Phase::Failed,
        ] {
            assert_eq!(handle_in(phase, false).cancel(), Err(CancelRefused { phase }));
        }
    }

    #[test]
    fn test_cancel_refused_once_anything_was_submitted() {
        let handle = handle_in(Phase::Building, true);
        assert_eq!(
            handle.cancel(),
            Err(CancelRefused {
                phase: Phase::Building
            })
        );
        assert_eq!(lock(&handle.control).cancel, None);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::AwaitingSignature.to_string(), "awaiting signature");
    }
}
