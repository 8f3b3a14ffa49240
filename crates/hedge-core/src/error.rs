//! Error types for hedge-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Value out of chain quantum range: {0}")]
    QuantumOverflow(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
