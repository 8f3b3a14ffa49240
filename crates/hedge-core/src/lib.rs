//! Core domain types for the Paradex hedge agent.
//!
//! This crate provides fundamental types used throughout the system:
//! - `Price`, `Size`: Precision-safe numeric types with chain quantum conversion
//! - `Market`, `Bbo`: Market metadata and top-of-book snapshot
//! - `OrderSide`, `OrderType`: Trading enums with their signed encodings
//! - `AccountId`: Identity of a managed account (hex contract address)
//! - `Clock`: Time source abstraction for signature timestamps

pub mod account;
pub mod clock;
pub mod decimal;
pub mod error;
pub mod market;
pub mod order;

pub use account::AccountId;
pub use clock::{Clock, SystemClock};
pub use decimal::{round_to_multiple, Price, Size, CHAIN_QUANTUM_DECIMALS};
pub use error::{CoreError, Result};
pub use market::{Bbo, Market};
pub use order::{OrderSide, OrderType, PositionSide};
