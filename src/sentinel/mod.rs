//! Sentinel watcher: connection, notification loop, counters.
//!
//! Internal modules:
//! - [`conn`]: RESP2 pub/sub client (`AUTH`, `PSUBSCRIBE`, `pmessage` stream);
//! - [`watcher`]: the [`Worker`](crate::Worker) that owns a connection and emits signals;
//! - [`metrics`]: injected counter sink.

mod conn;
mod metrics;
mod watcher;

pub use conn::{PATTERNS, PMessage, SentinelConn};
pub use metrics::{MetricsSink, NoopMetrics, PrometheusMetrics};
pub use watcher::SentinelWatcher;
