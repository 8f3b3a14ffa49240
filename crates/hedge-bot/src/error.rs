//! Application error types.

use hedge_executor::ExecutorError;
use hedge_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Key loading error: {0}")]
    Keys(#[from] hedge_signer::KeyError),

    #[error("Account derivation error: {0}")]
    Signer(#[from] hedge_signer::SignerError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] hedge_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;

/// Failure of a single trading cycle. Logged; the loop continues.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Session refresh failed: {0}")]
    Session(RegistryError),

    #[error("Exchange request failed: {0}")]
    Exchange(RegistryError),

    #[error("Market not found: {0}")]
    MarketNotFound(String),

    #[error("Invalid quote: {0}")]
    InvalidQuote(String),

    #[error("Order execution failed: {0}")]
    Execution(ExecutorError),
}

impl CycleError {
    /// Cause class used in logs: network, signing, validation or not_found.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session(e) | Self::Exchange(e) => registry_kind(e),
            Self::MarketNotFound(_) => "not_found",
            Self::InvalidQuote(_) => "validation",
            Self::Execution(e) => match e {
                ExecutorError::Signing(_) => "signing",
                ExecutorError::Registry(e) => registry_kind(e),
                ExecutorError::InvalidOrder(_) => "validation",
                ExecutorError::UnknownAccount(_) => "not_found",
            },
        }
    }
}

fn registry_kind(error: &RegistryError) -> &'static str {
    match error {
        RegistryError::Signing(_) => "signing",
        RegistryError::MarketNotFound(_) => "not_found",
        RegistryError::MissingSession(_) | RegistryError::InvalidConfig(_) => "validation",
        _ => "network",
    }
}

impl From<RegistryError> for CycleError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::MarketNotFound(symbol) => Self::MarketNotFound(symbol),
            other => Self::Exchange(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_kinds() {
        let not_found: CycleError = RegistryError::MarketNotFound("X".to_string()).into();
        assert_eq!(not_found.kind(), "not_found");

        let http: CycleError = RegistryError::Http {
            status: 500,
            body: String::new(),
        }
        .into();
        assert_eq!(http.kind(), "network");

        let invalid = CycleError::Execution(ExecutorError::InvalidOrder("zero".to_string()));
        assert_eq!(invalid.kind(), "validation");
    }
}
