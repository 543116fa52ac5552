//! POTLAUNCH SDK: derivation, decoding, pricing, and instruction builders for the bonding curve program.

pub mod accounts;
pub mod codec;
pub mod constants;
pub mod error;
pub mod instructions;
pub mod mint;
pub mod pda;
pub mod pricing;

pub use error::{SdkError, SdkResult};
