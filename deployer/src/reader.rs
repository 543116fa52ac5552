//! Typed reads of program accounts through the ledger seam and an
//! [`AccountCache`].

use potlaunch_sdk::accounts::{
    check_discriminator, decode_allocation, decode_bonding_curve, decode_curve_configuration,
    AllocationRecord, BondingCurveState, CurveConfiguration, CurveShape,
};
use potlaunch_sdk::constants::{ALLOCATION_ACCOUNT, BONDING_CURVE_ACCOUNT, CURVE_CONFIGURATION_ACCOUNT};
use potlaunch_sdk::pda::{find_allocation, find_bonding_curve, find_curve_configuration};
use potlaunch_sdk::pricing::{curve_buy_cost, curve_sell_reward, curve_spot_price};
use potlaunch_sdk::SdkError;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::cache::AccountCache;
use crate::ledger::{LedgerClient, LedgerError};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Account {address} not found")]
    NotFound { address: Pubkey },

    #[error(transparent)]
    Sdk(#[from] SdkError),
}

/// Price quote against the live curve state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub shape: CurveShape,
    pub amount: u64,
    pub supply: u64,
    pub lamports: u128,
    pub spot_price: u128,
}

struct CurveInputs {
    shape: CurveShape,
    reserve_ratio: u16,
    supply: u64,
}

pub struct AccountReader<L> {
    ledger: L,
    cache: AccountCache,
    program_id: Pubkey,
}

impl<L: LedgerClient> AccountReader<L> {
    pub fn new(ledger: L, cache: AccountCache, program_id: Pubkey) -> Self {
        Self {
            ledger,
            cache,
            program_id,
        }
    }

    pub fn cache(&self) -> &AccountCache {
        &self.cache
    }

    async fn fetch(&self, address: &Pubkey, account: &'static str) -> Result<Vec<u8>, ReadError> {
        let data = match self.cache.get(address) {
            Some(data) => {
                debug!(%address, account, "Account cache hit");
                data
            }
            None => {
                let data = self
                    .ledger
                    .account_data(address)
                    .await?
                    .ok_or(ReadError::NotFound { address: *address })?;
                self.cache.insert(*address, data.clone());
                data
            }
        };
        check_discriminator(&data, account)?;
        Ok(data)
    }

    pub async fn curve_configuration(&self, mint: &Pubkey) -> Result<CurveConfiguration, ReadError> {
        let (address, _) = find_curve_configuration(&self.program_id, mint)?;
        let data = self.fetch(&address, CURVE_CONFIGURATION_ACCOUNT).await?;
        Ok(decode_curve_configuration(&data)?)
    }

    pub async fn bonding_curve(&self, mint: &Pubkey) -> Result<BondingCurveState, ReadError> {
        let (address, _) = find_bonding_curve(&self.program_id, mint)?;
        let data = self.fetch(&address, BONDING_CURVE_ACCOUNT).await?;
        Ok(decode_bonding_curve(&data)?)
    }

    pub async fn allocation(&self, wallet: &Pubkey, mint: &Pubkey) -> Result<AllocationRecord, ReadError> {
        let (address, _) = find_allocation(&self.program_id, wallet, mint)?;
        let data = self.fetch(&address, ALLOCATION_ACCOUNT).await?;
        Ok(decode_allocation(&data)?)
    }

    /// Cost of buying `amount` base units at the current supply, priced on
    /// the curve shape stored in the configuration.
    pub async fn quote_buy(&self, mint: &Pubkey, amount: u64) -> Result<Quote, ReadError> {
        let inputs = self.curve_inputs(mint).await?;
        Ok(Quote {
            shape: inputs.shape,
            amount,
            supply: inputs.supply,
            lamports: curve_buy_cost(inputs.shape, amount, inputs.reserve_ratio, inputs.supply)?,
            spot_price: curve_spot_price(inputs.shape, inputs.supply, inputs.reserve_ratio)?,
        })
    }

    /// Reward for selling `amount` base units at the current supply.
    pub async fn quote_sell(&self, mint: &Pubkey, amount: u64) -> Result<Quote, ReadError> {
        let inputs = self.curve_inputs(mint).await?;
        Ok(Quote {
            shape: inputs.shape,
            amount,
            supply: inputs.supply,
            lamports: curve_sell_reward(inputs.shape, amount, inputs.reserve_ratio, inputs.supply)?,
            spot_price: curve_spot_price(inputs.shape, inputs.supply, inputs.reserve_ratio)?,
        })
    }

    async fn curve_inputs(&self, mint: &Pubkey) -> Result<CurveInputs, ReadError> {
        let config = self.curve_configuration(mint).await?;
        let curve = self.bonding_curve(mint).await?;
        Ok(CurveInputs {
            shape: config.curve_shape,
            reserve_ratio: config.reserve_ratio,
            supply: curve.total_supply,
        })
    }
}
