//! Deployer settings from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use potlaunch_sdk::constants::{BONDING_CURVE_PROGRAM_ID, PACKET_DATA_SIZE};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};

use crate::orchestrator::OrchestratorSettings;
use crate::plan::BatchLimits;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct DeployerConfig {
    pub rpc_url: String,
    pub program_id: Pubkey,
    pub commitment: CommitmentConfig,
    pub poll_interval: Duration,
    pub max_confirmation_polls: u32,
    pub max_instructions_per_tx: usize,
    pub rpc_retries: u32,
    pub keypair_path: PathBuf,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
}

impl DeployerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup. Unset variables take their defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let rpc_url = var("RPC_URL").unwrap_or_else(|| "http://localhost:8899".to_string());

        let program_id = match var("PROGRAM_ID") {
            Some(s) => Pubkey::from_str(&s).map_err(|e| invalid("PROGRAM_ID", e))?,
            None => BONDING_CURVE_PROGRAM_ID,
        };

        let commitment = match var("COMMITMENT").as_deref() {
            None | Some("confirmed") => CommitmentConfig::confirmed(),
            Some("processed") => CommitmentConfig::processed(),
            Some("finalized") => CommitmentConfig::finalized(),
            Some(other) => {
                return Err(invalid(
                    "COMMITMENT",
                    format!("expected processed, confirmed or finalized, got {other}"),
                ))
            }
        };

        let poll_interval_ms: u64 = parse(&var, "CONFIRM_POLL_INTERVAL_MS", 2_000)?;
        let max_confirmation_polls: u32 = parse(&var, "CONFIRM_MAX_ATTEMPTS", 30)?;
        if max_confirmation_polls == 0 {
            return Err(invalid("CONFIRM_MAX_ATTEMPTS", "must be at least 1"));
        }
        let max_instructions_per_tx: usize = parse(&var, "MAX_INSTRUCTIONS_PER_TX", 16)?;
        if max_instructions_per_tx == 0 {
            return Err(invalid("MAX_INSTRUCTIONS_PER_TX", "must be at least 1"));
        }
        let rpc_retries: u32 = parse(&var, "RPC_RETRIES", 3)?;

        let keypair_path = var("KEYPAIR_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_keypair_path);

        let cache_capacity: usize = parse(&var, "CACHE_CAPACITY", 256)?;
        let cache_ttl_secs: u64 = parse(&var, "CACHE_TTL_SECS", 30)?;

        Ok(Self {
            rpc_url,
            program_id,
            commitment,
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_confirmation_polls,
            max_instructions_per_tx,
            rpc_retries,
            keypair_path,
            cache_capacity,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            program_id: self.program_id,
            poll_interval: self.poll_interval,
            max_confirmation_polls: self.max_confirmation_polls,
            limits: BatchLimits {
                max_instructions: self.max_instructions_per_tx,
                max_bytes: PACKET_DATA_SIZE,
            },
            rpc_retries: self.rpc_retries,
        }
    }
}

fn parse<T>(var: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(s) => s.trim().parse().map_err(|e| invalid(name, e)),
        None => Ok(default),
    }
}

fn default_keypair_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config/solana/id.json"),
        None => PathBuf::from("id.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<DeployerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DeployerConfig::from_vars(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("KEYPAIR_PATH", "/tmp/id.json")]).unwrap();
        assert_eq!(config.rpc_url, "http://localhost:8899");
        assert_eq!(config.program_id, BONDING_CURVE_PROGRAM_ID);
        assert_eq!(config.commitment, CommitmentConfig::confirmed());
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.max_confirmation_polls, 30);
        assert_eq!(config.keypair_path, PathBuf::from("/tmp/id.json"));

        let settings = config.orchestrator_settings();
        assert_eq!(settings.limits, BatchLimits::default());
    }

    #[test]
    fn test_overrides() {
        let program = Pubkey::new_unique();
        let config = config(&[
            ("RPC_URL", "https://api.devnet.solana.com"),
            ("PROGRAM_ID", &program.to_string()),
            ("COMMITMENT", "finalized"),
            ("CONFIRM_POLL_INTERVAL_MS", "250"),
            ("MAX_INSTRUCTIONS_PER_TX", "4"),
            ("CACHE_TTL_SECS", "0"),
        ])
        .unwrap();
        assert_eq!(config.program_id, program);
        assert_eq!(config.commitment, CommitmentConfig::finalized());
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.orchestrator_settings().limits.max_instructions, 4);
        assert_eq!(config.cache_ttl, Duration::ZERO);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = config(&[("PROGRAM_ID", "not-a-key")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PROGRAM_ID", .. }));

        let err = config(&[("COMMITMENT", "max")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "COMMITMENT", .. }));

        let err = config(&[("CONFIRM_MAX_ATTEMPTS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "CONFIRM_MAX_ATTEMPTS", .. }));

        let err = config(&[("RPC_RETRIES", "-1")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "RPC_RETRIES", .. }));
    }
}
