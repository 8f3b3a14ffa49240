//! Registry error types.

use hedge_core::AccountId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Market not found: {0}")]
    MarketNotFound(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("No active session for account {0}")]
    MissingSession(AccountId),

    #[error("Invalid system config: {0}")]
    InvalidConfig(String),

    #[error("Signing failed: {0}")]
    Signing(#[from] hedge_signer::SignerError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistryError {
    /// True for errors raised by the transport or the remote service.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::HttpClient(_) | Self::Decode(_) | Self::Json(_)
        )
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
