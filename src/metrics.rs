//! Error counters for order operations.
//!
//! Errors are counted by category through the `metrics` facade. The
//! Prometheus exporter serves them on a pull endpoint whose port comes from
//! configuration.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Counter: errors by category, labelled `type`.
pub const ERRORS_TOTAL: &str = "topological_inventory_ansible_tower_operations_errors_total";

/// Closed set of error categories used by dashboards and alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    General,
    RemoteSystem,
    RemoteSystemTimeout,
    RemoteSystemUnreachable,
    RemoteSystemErrorResponse,
    Order,
    TaskUpdate,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 7] = [
        ErrorCategory::General,
        ErrorCategory::RemoteSystem,
        ErrorCategory::RemoteSystemTimeout,
        ErrorCategory::RemoteSystemUnreachable,
        ErrorCategory::RemoteSystemErrorResponse,
        ErrorCategory::Order,
        ErrorCategory::TaskUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::General => "general",
            ErrorCategory::RemoteSystem => "remote_system",
            ErrorCategory::RemoteSystemTimeout => "remote_system_timeout",
            ErrorCategory::RemoteSystemUnreachable => "remote_system_unreachable",
            ErrorCategory::RemoteSystemErrorResponse => "remote_system_error_response",
            ErrorCategory::Order => "order",
            ErrorCategory::TaskUpdate => "task_update",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter registry the workflow reports errors to.
///
/// Implementations must not fail or block.
pub trait MetricsSink {
    fn record_error(&self, category: ErrorCategory);
}

impl<M: MetricsSink> MetricsSink for Option<M> {
    fn record_error(&self, category: ErrorCategory) {
        if let Some(sink) = self {
            sink.record_error(category);
        }
    }
}

impl<M: MetricsSink + ?Sized> MetricsSink for &M {
    fn record_error(&self, category: ErrorCategory) {
        (**self).record_error(category);
    }
}

/// Sink backed by whatever `metrics` recorder is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl PrometheusMetrics {
    /// Registers metric descriptions and zero-initializes every category so
    /// dashboards see the full series from startup.
    pub fn register(&self) {
        describe_counter!(ERRORS_TOTAL, "Total order operation errors by category");
        for category in ErrorCategory::ALL {
            counter!(ERRORS_TOTAL, "type" => category.as_str()).absolute(0);
        }
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record_error(&self, category: ErrorCategory) {
        counter!(ERRORS_TOTAL, "type" => category.as_str()).increment(1);
    }
}

/// Installs the global Prometheus recorder with an HTTP listener on `port`.
///
/// Must be called from within a Tokio runtime.
pub fn install_exporter(port: u16) -> anyhow::Result<PrometheusMetrics> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install prometheus exporter on {addr}: {e}"))?;

    let sink = PrometheusMetrics;
    sink.register();
    tracing::info!(%addr, "Prometheus metrics exporter listening");
    Ok(sink)
}
