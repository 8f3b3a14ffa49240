//! Executor error types.

use hedge_core::AccountId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Order signing failed: {0}")]
    Signing(#[from] hedge_signer::SignerError),

    #[error(transparent)]
    Registry(#[from] hedge_registry::RegistryError),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(AccountId),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
