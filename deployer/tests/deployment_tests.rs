// End-to-end deployment scenarios against the in-memory ledger.
// Covers: happy path, failure provenance, cancellation, concurrency.

mod common;

use std::sync::{Arc, Mutex};

use common::{launch_config, settings, CancellingWallet, GatedWallet, MockLedger, RejectingWallet};
use potlaunch_deployer::launch::{Revocation, Socials};
use potlaunch_deployer::plan::GroupKind;
use potlaunch_deployer::validate::{Authority, Section, ValidationError};
use potlaunch_deployer::wallet::KeypairWallet;
use potlaunch_deployer::{CancelRefused, DeployError, DeploymentSession, Milestone, Phase};
use potlaunch_sdk::constants::PACKET_DATA_SIZE;
use potlaunch_sdk::pda::LaunchAddresses;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

fn session(ledger: &Arc<MockLedger>) -> DeploymentSession<Arc<MockLedger>, KeypairWallet> {
    DeploymentSession::new(Arc::clone(ledger), KeypairWallet::new(Keypair::new()), settings())
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_deploy_two_transactions() {
    let ledger = Arc::new(MockLedger::default());
    let session = session(&ledger);
    let config = launch_config();
    let milestones = Mutex::new(Vec::new());

    let report = session
        .deploy(&config, |m| milestones.lock().unwrap().push(m.clone()))
        .await
        .unwrap();

    assert_eq!(session.phase(), Phase::Succeeded);
    assert_eq!(report.transactions.len(), 2);
    assert_eq!(
        report.transactions[0].groups,
        vec![GroupKind::MintSetup, GroupKind::CurvePool]
    );
    assert_eq!(report.allocations.len(), 2);
    // 1_000 lamports * 1_000_000 whole tokens * 50%
    assert_eq!(report.initial_reserve, 500_000_000);

    let state = ledger.state();
    assert_eq!(state.simulated.len(), 2);
    assert_eq!(state.sent.len(), 2);
    // Payer and mint signatures are both present and valid.
    assert!(state.sent[0].verify().is_ok());
    assert!(state.sent[1].verify().is_ok());
    assert_eq!(state.sent[0].signatures.len(), 2);
    assert_eq!(state.sent[1].signatures.len(), 1);
    assert_eq!(state.rent_calls, 1);
    for tx in &state.sent {
        assert!(bincode::serialized_size(tx).unwrap() as usize <= PACKET_DATA_SIZE);
    }

    let milestones = milestones.into_inner().unwrap();
    assert_eq!(milestones.len(), 1 + 3 * 2);
    assert_eq!(milestones[0], Milestone::Validated { transactions: 2 });
    assert_eq!(milestones[1], Milestone::Simulated { transaction: 0 });
    assert!(matches!(
        milestones[3],
        Milestone::Confirmed { transaction: 0, signature } if signature == report.transactions[0].signature
    ));
    assert!(matches!(milestones[6], Milestone::Confirmed { transaction: 1, .. }));
}

#[tokio::test]
async fn test_report_addresses_match_derivation() {
    let ledger = Arc::new(MockLedger::default());
    let session = session(&ledger);
    let config = launch_config();
    let report = session.deploy(&config, |_| {}).await.unwrap();

    let derived = LaunchAddresses::derive(
        &settings().program_id,
        &report.mint(),
        &report.addresses.creator,
    )
    .unwrap();
    assert_eq!(report.addresses, derived);

    let document = report.token_document(&config);
    assert_eq!(document.mint_address, report.mint().to_string());
    assert_eq!(document.signatures.len(), 2);
    let json = document.to_json().unwrap();
    assert!(json.contains("\"mintAddress\""));
    assert!(json.contains("\"basicInfo\""));
}

#[tokio::test]
async fn test_each_attempt_uses_a_fresh_mint() {
    let ledger = Arc::new(MockLedger::default());
    let session = session(&ledger);
    let config = launch_config();
    let first = session.deploy(&config, |_| {}).await.unwrap();
    let second = session.deploy(&config, |_| {}).await.unwrap();
    assert_ne!(first.mint(), second.mint());
}

// ── Failure provenance ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_rejection_reports_committed_steps() {
    let ledger = MockLedger::with(|s| {
        s.rejections.insert(1, "custom program error: 0x1771".to_string());
    });
    let session = session(&ledger);

    let err = session.deploy(&launch_config(), |_| {}).await.unwrap_err();
    assert_eq!(session.phase(), Phase::Failed);

    let DeployError::TransactionRejected {
        stage,
        reason,
        committed,
        ..
    } = &err
    else {
        panic!("expected TransactionRejected, got {err:?}");
    };
    assert_eq!(stage.index, 1);
    assert_eq!(stage.total, 2);
    assert!(reason.contains("0x1771"));
    assert_eq!(committed.confirmed, vec![GroupKind::MintSetup, GroupKind::CurvePool]);
    assert!(committed.mint_created());
    assert_eq!(committed.in_doubt, None);

    let text = err.to_string();
    assert!(text.contains("transaction 2 of 2"));
    assert!(text.contains("mint setup"));
    assert!(text.contains("curve pool"));
    assert!(text.contains(&committed.mint.to_string()));
}

#[tokio::test]
async fn test_simulation_failure_submits_nothing() {
    let ledger = MockLedger::with(|s| {
        s.simulation_failures.insert(
            0,
            (
                "InstructionError(5, Custom(6000))".to_string(),
                vec!["Program log: Error: invalid reserve".to_string()],
            ),
        );
    });
    let session = session(&ledger);

    let err = session.deploy(&launch_config(), |_| {}).await.unwrap_err();
    match &err {
        DeployError::SimulationFailed {
            stage,
            logs,
            committed,
            ..
        } => {
            assert_eq!(stage.index, 0);
            assert_eq!(logs, &vec!["Program log: Error: invalid reserve".to_string()]);
            assert!(committed.is_empty());
        }
        other => panic!("expected SimulationFailed, got {other:?}"),
    }
    assert!(err.to_string().contains("no on-chain state was created"));
    assert!(ledger.state().sent.is_empty());
}

#[tokio::test]
async fn test_second_stage_simulation_failure_keeps_first_stage() {
    let ledger = MockLedger::with(|s| {
        s.simulation_failures
            .insert(1, ("AccountNotFound".to_string(), Vec::new()));
    });
    let session = session(&ledger);

    let err = session.deploy(&launch_config(), |_| {}).await.unwrap_err();
    let committed = err.committed().unwrap();
    assert!(committed.mint_created());
    assert_eq!(ledger.state().sent.len(), 1);
}

#[tokio::test]
async fn test_confirmation_timeout_leaves_transaction_in_doubt() {
    let ledger = MockLedger::with(|s| {
        s.never_confirm.insert(0);
    });
    let session = session(&ledger);

    let err = session.deploy(&launch_config(), |_| {}).await.unwrap_err();
    match &err {
        DeployError::ConfirmationTimeout {
            signature,
            attempts,
            committed,
            ..
        } => {
            assert_eq!(*attempts, 3);
            assert_eq!(committed.in_doubt, Some(*signature));
            assert!(committed.confirmed.is_empty());
        }
        other => panic!("expected ConfirmationTimeout, got {other:?}"),
    }
    assert!(err.to_string().contains("may still land"));

    let state = ledger.state();
    assert_eq!(state.status_polls, 3);
    assert_eq!(state.sent.len(), 1);
}

#[tokio::test]
async fn test_send_failure_is_in_doubt() {
    let ledger = MockLedger::with(|s| s.fail_send = true);
    let session = session(&ledger);

    let err = session.deploy(&launch_config(), |_| {}).await.unwrap_err();
    assert!(matches!(err, DeployError::Rpc { .. }));
    assert!(err.committed().unwrap().in_doubt.is_some());
}

#[tokio::test]
async fn test_wallet_rejection_sends_nothing() {
    let ledger = Arc::new(MockLedger::default());
    let session = DeploymentSession::new(
        Arc::clone(&ledger),
        RejectingWallet {
            pubkey: Pubkey::new_unique(),
        },
        settings(),
    );

    let err = session.deploy(&launch_config(), |_| {}).await.unwrap_err();
    assert!(matches!(err, DeployError::Wallet { .. }));
    assert!(err.committed().unwrap().is_empty());
    assert_eq!(ledger.state().simulated.len(), 1);
    assert!(ledger.state().sent.is_empty());
}

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_incomplete_config_never_reaches_ledger() {
    let ledger = Arc::new(MockLedger::default());
    let session = session(&ledger);
    let mut config = launch_config();
    config.socials = Socials::default();
    config.allocation.clear();

    let err = session.deploy(&config, |_| {}).await.unwrap_err();
    let DeployError::Validation(validation) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(validation.sections(), vec![Section::Socials, Section::Allocation]);

    let state = ledger.state();
    assert_eq!(state.rent_calls, 0);
    assert!(state.simulated.is_empty());
}

#[tokio::test]
async fn test_revocation_without_destination() {
    let ledger = Arc::new(MockLedger::default());
    let session = session(&ledger);
    let mut config = launch_config();
    config.admin_setup.revoke_freeze_authority = Revocation {
        enabled: true,
        destination: None,
    };

    let err = session.deploy(&config, |_| {}).await.unwrap_err();
    assert!(matches!(
        err,
        DeployError::Validation(ValidationError::MissingRevocationTarget {
            authority: Authority::Freeze
        })
    ));
}

#[tokio::test]
async fn test_revocation_adds_authority_changes() {
    let ledger = Arc::new(MockLedger::default());
    let session = session(&ledger);
    let mut config = launch_config();
    config.admin_setup.revoke_mint_authority = Revocation {
        enabled: true,
        destination: Some(Pubkey::new_unique().to_string()),
    };

    session.deploy(&config, |_| {}).await.unwrap();
    // create, initialize, ATA, mint_to, metadata, set_authority, then the pool pair
    assert_eq!(ledger.state().sent[0].message.instructions.len(), 8);
}

// ── Cancellation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cancel_while_awaiting_signature() {
    let ledger = Arc::new(MockLedger::default());
    let wallet = CancellingWallet::new(0);
    let handle_slot = Arc::clone(&wallet.handle);
    let session = DeploymentSession::new(Arc::clone(&ledger), wallet, settings());
    handle_slot.set(session.cancel_handle()).unwrap();

    let err = session.deploy(&launch_config(), |_| {}).await.unwrap_err();
    match &err {
        DeployError::Cancelled { phase, committed } => {
            assert_eq!(*phase, Phase::AwaitingSignature);
            assert!(committed.is_empty());
        }
        other => panic!("expected Cancelled, got {other:?}"),
    }
    assert!(ledger.state().sent.is_empty());
    assert_eq!(session.phase(), Phase::Failed);
}

#[tokio::test]
async fn test_cancel_refused_after_submission() {
    let ledger = Arc::new(MockLedger::default());
    let wallet = CancellingWallet::new(1);
    let handle_slot = Arc::clone(&wallet.handle);
    let outcomes = Arc::clone(&wallet.outcomes);
    let session = DeploymentSession::new(Arc::clone(&ledger), wallet, settings());
    handle_slot.set(session.cancel_handle()).unwrap();

    let report = session.deploy(&launch_config(), |_| {}).await.unwrap();
    assert_eq!(report.transactions.len(), 2);
    assert_eq!(ledger.state().sent.len(), 2);
    assert_eq!(
        *outcomes.lock().unwrap(),
        vec![Err(CancelRefused {
            phase: Phase::AwaitingSignature
        })]
    );
}

#[tokio::test]
async fn test_cancel_refused_when_idle() {
    let ledger = Arc::new(MockLedger::default());
    let session = session(&ledger);
    assert_eq!(
        session.cancel_handle().cancel(),
        Err(CancelRefused { phase: Phase::Idle })
    );
}

// ── Concurrency ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_second_attempt_while_in_flight_is_refused() {
    let ledger = Arc::new(MockLedger::default());
    let wallet = GatedWallet::new();
    let entered = Arc::clone(&wallet.entered);
    let release = Arc::clone(&wallet.release);
    let session = DeploymentSession::new(Arc::clone(&ledger), wallet, settings());
    let config = launch_config();

    let (first, second) = tokio::join!(session.deploy(&config, |_| {}), async {
        entered.notified().await;
        assert_eq!(session.phase(), Phase::AwaitingSignature);
        let second = session.deploy(&config, |_| {}).await;
        release.notify_one();
        second
    });

    assert!(matches!(second, Err(DeployError::AttemptInProgress)));
    assert!(first.is_ok());
    assert_eq!(ledger.state().sent.len(), 2);
}

#[tokio::test]
async fn test_session_reusable_after_failure() {
    let ledger = MockLedger::with(|s| {
        s.simulation_failures
            .insert(0, ("BlockhashNotFound".to_string(), Vec::new()));
    });
    let session = session(&ledger);
    let config = launch_config();

    assert!(session.deploy(&config, |_| {}).await.is_err());
    ledger.state().simulation_failures.clear();
    assert!(session.deploy(&config, |_| {}).await.is_ok());
    assert_eq!(session.phase(), Phase::Succeeded);
}

#[tokio::test]
async fn test_payer_is_wallet_key() {
    let ledger = Arc::new(MockLedger::default());
    let keypair = Keypair::new();
    let payer = keypair.pubkey();
    let session = DeploymentSession::new(Arc::clone(&ledger), KeypairWallet::new(keypair), settings());

    let report = session.deploy(&launch_config(), |_| {}).await.unwrap();
    assert_eq!(report.addresses.creator, payer);
    assert_eq!(ledger.state().sent[0].message.account_keys[0], payer);
}
