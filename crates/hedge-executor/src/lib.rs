//! Order execution for hedge pairs.
//!
//! Builds StarkNet-signed market orders and submits them through the
//! exchange service:
//! - Paired entry: long and short legs submitted concurrently
//! - Pair close: every participant's open leg flattened concurrently
//!
//! Each leg reports its own outcome so callers can track partial fills.

pub mod error;
pub mod executor;
pub mod nonce;
pub mod order;

pub use error::{ExecutorError, ExecutorResult};
pub use executor::{CloseOutcome, Executor, LegCloseResult, LegOutcome, PairOutcome};
pub use nonce::NonceManager;
pub use order::{OrderSigner, SignedOrder};
