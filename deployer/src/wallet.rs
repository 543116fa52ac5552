//! Signing. The user's key stays behind [`WalletSigner`]; the only secret the
//! deployer ever holds is the ephemeral mint key, kept in zeroizing memory.

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("Signing rejected: {0}")]
    Rejected(String),

    #[error("Signer error: {0}")]
    Signer(String),
}

#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Add this wallet's signature, keeping any signatures already present.
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError>;
}

/// Local keypair signer, used by the CLI and tests.
pub struct KeypairWallet {
    keypair: Keypair,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

#[async_trait]
impl WalletSigner for KeypairWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::Signer(e.to_string()))?;
        Ok(tx)
    }
}

/// Fresh mint key for one deployment attempt. Never persisted; the secret is
/// wiped when the value drops.
pub struct EphemeralMint {
    pubkey: Pubkey,
    secret: Zeroizing<[u8; 64]>,
}

impl EphemeralMint {
    pub fn generate() -> Self {
        let keypair = Keypair::new();
        Self {
            pubkey: keypair.pubkey(),
            secret: Zeroizing::new(keypair.to_bytes()),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    /// Partially sign `tx` as the mint account.
    pub fn sign(&self, tx: &mut Transaction) -> Result<(), WalletError> {
        let keypair =
            Keypair::from_bytes(&self.secret[..]).map_err(|e| WalletError::Signer(e.to_string()))?;
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&keypair], blockhash)
            .map_err(|e| WalletError::Signer(e.to_string()))
    }
}

impl std::fmt::Debug for EphemeralMint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralMint")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}
