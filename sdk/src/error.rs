//! Errors raised by address derivation, account decoding, and curve pricing.

/// Decode errors mean the client and the deployed program disagree on a layout;
/// pricing errors mean the caller passed parameters the curve cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdkError {
    #[error("No valid bump seed for derived address with seed tag {tag:?}")]
    DerivationExhausted { tag: String },

    #[error("Buffer too short reading {field} at offset {offset}: need {needed} bytes, {available} available")]
    BufferTooShort {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Unknown value {value} for {field}")]
    UnknownVariant { field: &'static str, value: u8 },

    #[error("Account discriminator mismatch for {account}: expected {expected:?}, found {found:?}")]
    DiscriminatorMismatch {
        account: &'static str,
        expected: [u8; 8],
        found: [u8; 8],
    },

    #[error("Invalid curve parameters: {0}")]
    InvalidCurveParameters(String),

    #[error("Cannot sell {amount} tokens from a supply of {supply}")]
    InsufficientSupply { amount: u64, supply: u64 },

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Failed to build instruction {instruction}: {reason}")]
    InstructionBuild {
        instruction: &'static str,
        reason: String,
    },
}

pub type SdkResult<T> = Result<T, SdkError>;
