//! Exchange access for the hedge agent.
//!
//! - [`ExchangeApi`]: dyn-compatible request/response service consumed by the core
//! - [`RestClient`]: `reqwest` implementation against the exchange REST API
//! - [`MarketCache`]: one-shot cache of market size increments
//! - [`SessionManager`]: signs auth challenges and keeps bearer tokens per account
//! - [`MockExchange`]: in-memory exchange for tests

pub mod api;
pub mod client;
pub mod error;
pub mod market_cache;
pub mod mock;
pub mod session;

pub use api::{
    AuthHeaders, BalanceEntry, BoxFuture, DynExchangeApi, ExchangeApi, OrderAck, OrderRequest,
    PositionEntry, PositionStatus, SystemConfig,
};
pub use client::RestClient;
pub use error::{RegistryError, RegistryResult};
pub use market_cache::MarketCache;
pub use mock::MockExchange;
pub use session::{ManagedAccount, SessionManager, SessionToken};
