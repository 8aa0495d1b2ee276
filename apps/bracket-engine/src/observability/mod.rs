//! Observability: Prometheus metrics.

mod metrics;

pub use self::metrics::{
    MetricsConfig, MetricsError, init_metrics, record_cancel, record_exit_order,
    record_monitor_lifetime, record_monitor_outcome, record_poll, record_transient_error,
    update_active_monitors,
};
