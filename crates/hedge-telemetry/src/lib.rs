//! Prometheus metrics and structured logging for the hedge agent.
//!
//! - Structured logging with `tracing` (JSON in production, pretty otherwise)
//! - Process-wide Prometheus counters for cycles, orders, pairs and sessions

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
