//! Delta-neutral hedge agent for Paradex perpetuals.
//!
//! Each cycle picks a market, a notional and two distinct accounts, then
//! opens offsetting market orders (long on one account, short on the other).
//! Accounts short on collateral have their tracked pairs unwound first, and
//! every tracked pair is closed on shutdown.

pub mod app;
pub mod config;
pub mod error;
pub mod random;

pub use app::{Application, CleanupReport, CycleOutcome, CyclePlan, HedgeEngine, SkipReason};
pub use config::AppConfig;
pub use error::{AppError, AppResult, CycleError};
pub use random::{RandomSource, RngSource, ScriptedRandom};
