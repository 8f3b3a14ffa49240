//! Position error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("Hedge pair for {0} has no participants")]
    EmptyPair(String),
}

pub type PositionResult<T> = Result<T, PositionError>;
