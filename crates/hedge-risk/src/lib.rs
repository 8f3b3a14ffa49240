//! Risk controls for the hedge agent.
//!
//! - Spread guard: refuse to trade into a wide book
//! - Trade sizing: notional to per-leg sizes on the market's size grid
//! - Collateral check: unwind tracked pairs when free collateral runs short

pub mod config;
pub mod error;
pub mod monitor;
pub mod sizing;

pub use config::RiskConfig;
pub use error::{RiskError, RiskResult};
pub use monitor::{CollateralStatus, RiskMonitor};
pub use sizing::{size_trade, validate_spread, TradeSizes};
