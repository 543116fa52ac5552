//! POTLAUNCH deployer: validates a launch configuration and drives the token
//! deployment through simulation, signing, submission and confirmation.

pub mod cache;
pub mod config;
pub mod error;
pub mod launch;
pub mod ledger;
pub mod orchestrator;
pub mod plan;
pub mod reader;
pub mod report;
pub mod validate;
pub mod wallet;

pub use error::{CancelRefused, Committed, DeployError, TxStage};
pub use orchestrator::{CancelHandle, DeploymentSession, Milestone, OrchestratorSettings, Phase};
