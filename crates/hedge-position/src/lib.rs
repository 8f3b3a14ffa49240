//! Hedge pair tracking.
//!
//! - [`PairLedger`]: which accounts hold offsetting legs in which market
//! - [`close`]: closing orders derived from exchange position snapshots

pub mod close;
pub mod error;
pub mod ledger;

pub use close::{plan_close_leg, CloseLeg, CloseReason};
pub use error::{PositionError, PositionResult};
pub use ledger::{HedgePair, PairId, PairKey, PairLedger};
