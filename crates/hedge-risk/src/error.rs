//! Risk error types.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Bid-ask spread too wide: {ratio} > {max}")]
    SpreadTooWide { ratio: Decimal, max: Decimal },

    #[error("Invalid quote: {0}")]
    InvalidQuote(String),

    #[error(transparent)]
    Registry(#[from] hedge_registry::RegistryError),
}

pub type RiskResult<T> = Result<T, RiskError>;
