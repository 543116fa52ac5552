// Shared fakes for the deployer integration tests: an in-memory ledger and
// wallets that hook into signing.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use potlaunch_deployer::launch::TokenLaunchConfig;
use potlaunch_deployer::ledger::{LedgerClient, LedgerError, SignatureState, SimulationOutcome};
use potlaunch_deployer::plan::BatchLimits;
use potlaunch_deployer::wallet::{KeypairWallet, WalletError, WalletSigner};
use potlaunch_deployer::{CancelHandle, CancelRefused, OrchestratorSettings};
use potlaunch_sdk::constants::BONDING_CURVE_PROGRAM_ID;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};
use tokio::sync::Notify;

// ── Ledger ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct LedgerState {
    /// Transaction index whose simulation fails, with its logs.
    pub simulation_failures: HashMap<usize, (String, Vec<String>)>,
    /// Transaction index the ledger executes and rejects.
    pub rejections: HashMap<usize, String>,
    /// Transaction indexes that never reach the commitment level.
    pub never_confirm: HashSet<usize>,
    pub fail_send: bool,

    pub simulated: Vec<Transaction>,
    pub sent: Vec<Transaction>,
    pub signatures: HashMap<Signature, usize>,
    pub status_polls: usize,
    pub rent_calls: usize,

    pub accounts: HashMap<Pubkey, Vec<u8>>,
    pub account_reads: usize,
}

#[derive(Default)]
pub struct MockLedger {
    pub state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn with(configure: impl FnOnce(&mut LedgerState)) -> Arc<Self> {
        let ledger = Self::default();
        configure(&mut ledger.state.lock().unwrap());
        Arc::new(ledger)
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        Ok(Hash::new_unique())
    }

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, LedgerError> {
        self.state().rent_calls += 1;
        Ok(890_880 + 6_960 * data_len as u64)
    }

    async fn simulate(&self, tx: &Transaction) -> Result<SimulationOutcome, LedgerError> {
        let mut state = self.state();
        let index = state.simulated.len();
        state.simulated.push(tx.clone());
        Ok(match state.simulation_failures.get(&index) {
            Some((err, logs)) => SimulationOutcome {
                err: Some(err.clone()),
                logs: logs.clone(),
                units_consumed: Some(1_200),
            },
            None => SimulationOutcome {
                err: None,
                logs: vec!["Program log: ok".to_string()],
                units_consumed: Some(45_000),
            },
        })
    }

    async fn send(&self, tx: &Transaction) -> Result<Signature, LedgerError> {
        let mut state = self.state();
        if state.fail_send {
            return Err(LedgerError::request("sendTransaction", "connection reset"));
        }
        let signature = tx.signatures[0];
        let index = state.sent.len();
        state.sent.push(tx.clone());
        state.signatures.insert(signature, index);
        Ok(signature)
    }

    async fn signature_state(&self, signature: &Signature) -> Result<SignatureState, LedgerError> {
        let mut state = self.state();
        state.status_polls += 1;
        let Some(&index) = state.signatures.get(signature) else {
            return Ok(SignatureState::Pending);
        };
        if let Some(reason) = state.rejections.get(&index) {
            return Ok(SignatureState::Failed(reason.clone()));
        }
        if state.never_confirm.contains(&index) {
            return Ok(SignatureState::Pending);
        }
        Ok(SignatureState::Confirmed)
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        let mut state = self.state();
        state.account_reads += 1;
        Ok(state.accounts.get(address).cloned())
    }
}

// ── Wallets ──────────────────────────────────────────────────────────────────

/// Requests cancellation from inside the wallet on the `on_call`-th signature
/// request (zero-based), as a user pressing cancel in the wallet popup would.
pub struct CancellingWallet {
    inner: KeypairWallet,
    on_call: usize,
    calls: AtomicUsize,
    pub handle: Arc<OnceLock<CancelHandle>>,
    pub outcomes: Arc<Mutex<Vec<Result<(), CancelRefused>>>>,
}

impl CancellingWallet {
    pub fn new(on_call: usize) -> Self {
        Self {
            inner: KeypairWallet::new(Keypair::new()),
            on_call,
            calls: AtomicUsize::new(0),
            handle: Arc::new(OnceLock::new()),
            outcomes: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl WalletSigner for CancellingWallet {
    fn pubkey(&self) -> Pubkey {
        self.inner.pubkey()
    }

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.on_call {
            if let Some(handle) = self.handle.get() {
                self.outcomes.lock().unwrap().push(handle.cancel());
            }
        }
        self.inner.sign_transaction(tx).await
    }
}

/// Holds the first signature request open until released.
pub struct GatedWallet {
    inner: KeypairWallet,
    calls: AtomicUsize,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl GatedWallet {
    pub fn new() -> Self {
        Self {
            inner: KeypairWallet::new(Keypair::new()),
            calls: AtomicUsize::new(0),
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl WalletSigner for GatedWallet {
    fn pubkey(&self) -> Pubkey {
        self.inner.pubkey()
    }

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.sign_transaction(tx).await
    }
}

pub struct RejectingWallet {
    pub pubkey: Pubkey,
}

#[async_trait]
impl WalletSigner for RejectingWallet {
    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    async fn sign_transaction(&self, _tx: Transaction) -> Result<Transaction, WalletError> {
        Err(WalletError::Rejected("user declined".to_string()))
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        program_id: BONDING_CURVE_PROGRAM_ID,
        poll_interval: Duration::from_millis(1),
        max_confirmation_polls: 3,
        limits: BatchLimits::default(),
        rpc_retries: 1,
    }
}

pub fn launch_config() -> TokenLaunchConfig {
    let value = serde_json::json!({
        "basicInfo": {
            "name": "Pot Token",
            "symbol": "POT",
            "description": "A test launch",
            "decimals": 6,
            "supply": 1_000_000u64,
            "metadataUri": "https://example.invalid/pot.json"
        },
        "socials": { "twitter": "https://x.com/pot" },
        "fees": {
            "feePercentage": 100,
            "recipients": [
                { "address": Pubkey::new_unique().to_string(), "shareBps": 7_000 },
                { "address": Pubkey::new_unique().to_string(), "shareBps": 3_000, "lockPeriod": 86_400 }
            ]
        },
        "allocation": [
            {
                "description": "team",
                "walletAddress": Pubkey::new_unique().to_string(),
                "percentage": 20,
                "vesting": { "cliff": 0, "duration": 86_400, "interval": 3_600 }
            },
            {
                "walletAddress": Pubkey::new_unique().to_string(),
                "percentage": 10
            }
        ],
        "curve": {
            "curveType": "linear",
            "initialPrice": 1_000,
            "reserveRatio": 5_000,
            "targetLiquidity": 1_000_000_000u64
        },
        "saleSetup": {}
    });
    serde_json::from_value(value).unwrap()
}
