//! Prometheus metrics for the bracket engine.
//!
//! # Example
//!
//! ```ignore
//! use bracket_engine::observability::{init_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::default())?;
//! record_monitor_outcome("bracket", "COMPLETE_STOP");
//! ```

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for monitor lifetimes (in seconds).
    pub lifetime_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
            // 100ms to 30 minutes
            lifetime_buckets: vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 1800.0],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.lifetime_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Monitor Metrics
// ============================================================================

/// Update the active monitors gauge.
pub fn update_active_monitors(count: usize) {
    gauge!("monitors_active").set(count as f64);
}

/// Record one poll of the broker by a monitor.
///
/// * `phase` - `fill`, `confirmation` or `bracket`
pub fn record_poll(phase: &'static str) {
    counter!("monitor_polls_total", "phase" => phase).increment(1);
}

/// Record a transient broker error that will be retried next tick.
pub fn record_transient_error(operation: &'static str, kind: &'static str) {
    counter!(
        "broker_transient_errors_total",
        "operation" => operation,
        "kind" => kind
    )
    .increment(1);
}

/// Record a cancel request.
///
/// * `reason` - `fill_timeout` or `sibling`
/// * `success` - whether the broker acknowledged it
pub fn record_cancel(reason: &'static str, success: bool) {
    counter!(
        "cancels_issued_total",
        "reason" => reason,
        "success" => if success { "true" } else { "false" }
    )
    .increment(1);
}

/// Record an exit order placement attempt.
///
/// * `leg` - `profit` or `stop`
pub fn record_exit_order(leg: &'static str, success: bool) {
    counter!(
        "exit_orders_placed_total",
        "leg" => leg,
        "success" => if success { "true" } else { "false" }
    )
    .increment(1);
}

/// Record a monitor reaching a terminal state.
pub fn record_monitor_outcome(strategy: &'static str, state: &'static str) {
    counter!(
        "monitor_outcomes_total",
        "strategy" => strategy,
        "state" => state
    )
    .increment(1);
}

/// Record how long a monitor ran.
pub fn record_monitor_lifetime(strategy: &'static str, seconds: f64) {
    histogram!("monitor_lifetime_seconds", "strategy" => strategy).record(seconds);
}
