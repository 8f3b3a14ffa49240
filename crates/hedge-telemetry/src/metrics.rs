//! Prometheus metrics for the hedge agent.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a startup configuration error. These panics
//! only occur during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, Encoder,
    HistogramVec, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Trading cycles by outcome.
/// Labels: outcome (traded/skipped/failed)
pub static CYCLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hedge_cycles_total",
        "Total trading cycles by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Orders submitted.
/// Labels: side (buy/sell), result (ok/error)
pub static ORDERS_SUBMITTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hedge_orders_submitted_total",
        "Total orders submitted by side and result",
        &["side", "result"]
    )
    .unwrap()
});

/// Order round-trip latency in milliseconds.
pub static ORDER_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "hedge_order_latency_ms",
        "Order submission round-trip latency in milliseconds",
        &["side"],
        vec![10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap()
});

/// Hedge pairs registered in the ledger.
pub static PAIRS_OPENED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hedge_pairs_opened_total",
        "Total hedge pairs registered",
        &["market"]
    )
    .unwrap()
});

/// Closing legs by result.
/// Labels: reason (collateral/cleanup), result (ok/error)
pub static LEGS_CLOSED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hedge_legs_closed_total",
        "Total closing legs by reason and result",
        &["reason", "result"]
    )
    .unwrap()
});

/// Pairs currently tracked.
pub static OPEN_PAIRS: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("hedge_open_pairs", "Hedge pairs currently tracked").unwrap());

/// Session refreshes by result.
pub static SESSION_REFRESH_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hedge_session_refresh_total",
        "Total session refreshes by result",
        &["result"]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    pub fn cycle_completed(outcome: &str) {
        CYCLES_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn order_submitted(side: &str, result: &str) {
        ORDERS_SUBMITTED_TOTAL
            .with_label_values(&[side, result])
            .inc();
    }

    pub fn order_latency(side: &str, latency_ms: f64) {
        ORDER_LATENCY_MS.with_label_values(&[side]).observe(latency_ms);
    }

    pub fn pair_opened(market: &str) {
        PAIRS_OPENED_TOTAL.with_label_values(&[market]).inc();
    }

    pub fn leg_closed(reason: &str, result: &str) {
        LEGS_CLOSED_TOTAL.with_label_values(&[reason, result]).inc();
    }

    pub fn open_pairs(count: usize) {
        OPEN_PAIRS.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn session_refreshed(result: &str) {
        SESSION_REFRESH_TOTAL.with_label_values(&[result]).inc();
    }

    /// Render the default registry in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_recorded_metrics() {
        Metrics::cycle_completed("traded");
        Metrics::open_pairs(3);

        let text = Metrics::render().unwrap();
        assert!(text.contains("hedge_cycles_total"));
        assert!(text.contains("hedge_open_pairs 3"));
    }

    #[test]
    fn test_counters_increment() {
        let before = SESSION_REFRESH_TOTAL.with_label_values(&["error"]).get();
        Metrics::session_refreshed("error");
        let after = SESSION_REFRESH_TOTAL.with_label_values(&["error"]).get();
        assert!(after >= before + 1.0);
    }
}
