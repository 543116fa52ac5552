//! Ledger access behind a trait, so the orchestrator and account reader can
//! run against an RPC node or an in-memory fake.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig},
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use solana_transaction_status::TransactionStatus;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("RPC request {method} failed: {reason}")]
    Request { method: &'static str, reason: String },
}

impl LedgerError {
    pub fn request(method: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Request {
            method,
            reason: err.to_string(),
        }
    }
}

/// Dry-run result. `err` is the program's error when execution would fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub err: Option<String>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    Pending,
    Confirmed,
    Failed(String),
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError>;

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, LedgerError>;

    /// Execute without committing. Signatures are not verified.
    async fn simulate(&self, tx: &Transaction) -> Result<SimulationOutcome, LedgerError>;

    async fn send(&self, tx: &Transaction) -> Result<Signature, LedgerError>;

    async fn signature_state(&self, signature: &Signature) -> Result<SignatureState, LedgerError>;

    /// `None` when the account does not exist.
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError>;
}

#[async_trait]
impl<T: LedgerClient + ?Sized> LedgerClient for Arc<T> {
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        (**self).latest_blockhash().await
    }

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, LedgerError> {
        (**self).minimum_balance_for_rent_exemption(data_len).await
    }

    async fn simulate(&self, tx: &Transaction) -> Result<SimulationOutcome, LedgerError> {
        (**self).simulate(tx).await
    }

    async fn send(&self, tx: &Transaction) -> Result<Signature, LedgerError> {
        (**self).send(tx).await
    }

    async fn signature_state(&self, signature: &Signature) -> Result<SignatureState, LedgerError> {
        (**self).signature_state(signature).await
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        (**self).account_data(address).await
    }
}

// ── Retry ───────────────────────────────────────────────────────────────────

/// Retry an idempotent read with doubling delay, capped at 60s.
///
/// Never wrap `send` or `simulate` in this: a resend can double-submit and a
/// failed simulation is a verdict, not a transport error.
pub async fn retry_with_backoff<T, F, Fut>(
    label: &str,
    max_retries: u32,
    initial_delay: Duration,
    mut f: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(val) => return Ok(val),
            Err(e) if attempt >= max_retries.max(1) => return Err(e),
            Err(e) => {
                warn!(
                    request = label,
                    attempt,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "RPC request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(60));
                attempt += 1;
            }
        }
    }
}

// ── RPC ─────────────────────────────────────────────────────────────────────

pub struct RpcLedger {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcLedger {
    pub fn new(url: String, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url, commitment),
            commitment,
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

/// Map a status entry to a state at `commitment`.
pub fn signature_state_from_status(
    status: Option<&TransactionStatus>,
    commitment: CommitmentConfig,
) -> SignatureState {
    match status {
        None => SignatureState::Pending,
        Some(status) => match &status.err {
            Some(err) => SignatureState::Failed(err.to_string()),
            None if status.satisfies_commitment(commitment) => SignatureState::Confirmed,
            None => SignatureState::Pending,
        },
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| LedgerError::request("getLatestBlockhash", e))
    }

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, LedgerError> {
        self.client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await
            .map_err(|e| LedgerError::request("getMinimumBalanceForRentExemption", e))
    }

    async fn simulate(&self, tx: &Transaction) -> Result<SimulationOutcome, LedgerError> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: false,
            commitment: Some(self.commitment),
            ..RpcSimulateTransactionConfig::default()
        };
        let result = self
            .client
            .simulate_transaction_with_config(tx, config)
            .await
            .map_err(|e| LedgerError::request("simulateTransaction", e))?
            .value;

        Ok(SimulationOutcome {
            err: result.err.map(|e| e.to_string()),
            logs: result.logs.unwrap_or_default(),
            units_consumed: result.units_consumed,
        })
    }

    async fn send(&self, tx: &Transaction) -> Result<Signature, LedgerError> {
        // Already simulated; preflight would only repeat it.
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            preflight_commitment: Some(self.commitment.commitment),
            ..RpcSendTransactionConfig::default()
        };
        self.client
            .send_transaction_with_config(tx, config)
            .await
            .map_err(|e| LedgerError::request("sendTransaction", e))
    }

    async fn signature_state(&self, signature: &Signature) -> Result<SignatureState, LedgerError> {
        let statuses = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| LedgerError::request("getSignatureStatuses", e))?
            .value;
        Ok(signature_state_from_status(
            statuses.first().and_then(Option::as_ref),
            self.commitment,
        ))
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        let account = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|e| LedgerError::request("getAccountInfo", e))?
            .value;
        Ok(account.map(|a| a.data))
    }
}
