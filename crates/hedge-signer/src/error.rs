//! Signer error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("Short string too long ({len} bytes, max 31): {value}")]
    ShortStringTooLong { value: String, len: usize },

    #[error("Short string is not ASCII: {0}")]
    NonAsciiShortString(String),

    #[error("Invalid felt literal: {0}")]
    InvalidFelt(String),

    #[error("Chain quantum conversion failed: {0}")]
    Quantum(#[from] hedge_core::CoreError),

    #[error("Ethereum signing failed: {0}")]
    EthSigning(#[from] alloy::signers::Error),

    #[error("Stark signing failed: {0}")]
    StarkSigning(String),
}

pub type SignerResult<T> = Result<T, SignerError>;
