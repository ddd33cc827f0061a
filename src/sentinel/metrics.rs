//! # Failover counters.
//!
//! Watchers report parsed notifications to an injected [`MetricsSink`].
//! [`NoopMetrics`] discards everything; [`PrometheusMetrics`] registers the
//! counter families below in a caller-supplied registry.
//!
//! | Metric | Labels | Incremented on |
//! |--------|--------|----------------|
//! | `switch_master_count` | `sentinel`, `shard` | `+switch-master` |
//! | `failover_abort_no_good_slave_count` | `sentinel`, `shard` | `-failover-abort-no-good-slave` |
//! | `sdown_count` | `sentinel`, `shard`, `redis_server`, `role` | `+sdown` |

use prometheus::{CounterVec, Opts, Registry};

use crate::error::MetricsError;
use crate::events::{EventMessage, FAILOVER_ABORT_NO_GOOD_SLAVE, SDOWN, SWITCH_MASTER};

/// Destination for failover counters.
pub trait MetricsSink: Send + Sync + 'static {
    fn switch_master(&self, sentinel: &str, shard: &str);

    fn failover_abort_no_good_slave(&self, sentinel: &str, shard: &str);

    fn sdown(&self, sentinel: &str, shard: &str, redis_server: &str, role: &str);

    /// Routes a parsed message to the matching counter.
    ///
    /// Kinds without a counter are ignored.
    fn record(&self, sentinel: &str, msg: &EventMessage) {
        match msg.kind.as_str() {
            SWITCH_MASTER => self.switch_master(sentinel, &msg.master.name),
            FAILOVER_ABORT_NO_GOOD_SLAVE => {
                self.failover_abort_no_good_slave(sentinel, &msg.target.name)
            }
            SDOWN => self.sdown(sentinel, &msg.master.name, &msg.target.ip, &msg.target.role),
            _ => {}
        }
    }
}

/// Sink that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn switch_master(&self, _sentinel: &str, _shard: &str) {}

    fn failover_abort_no_good_slave(&self, _sentinel: &str, _shard: &str) {}

    fn sdown(&self, _sentinel: &str, _shard: &str, _redis_server: &str, _role: &str) {}
}

/// Prometheus-backed sink.
///
/// Cheap to clone; clones share the same counters.
#[derive(Clone)]
pub struct PrometheusMetrics {
    switch_master_count: CounterVec,
    failover_abort_no_good_slave_count: CounterVec,
    sdown_count: CounterVec,
}

impl PrometheusMetrics {
    /// Creates the counter families and registers them with `registry`.
    ///
    /// # Errors
    ///
    /// Fails if a family is already registered under the same name.
    pub fn new(registry: &Registry) -> Result<Self, MetricsError> {
        let switch_master_count = CounterVec::new(
            Opts::new("switch_master_count", "Number of master switches per shard"),
            &["sentinel", "shard"],
        )?;
        registry.register(Box::new(switch_master_count.clone()))?;

        let failover_abort_no_good_slave_count = CounterVec::new(
            Opts::new(
                "failover_abort_no_good_slave_count",
                "Number of failovers aborted for lack of a good replica",
            ),
            &["sentinel", "shard"],
        )?;
        registry.register(Box::new(failover_abort_no_good_slave_count.clone()))?;

        let sdown_count = CounterVec::new(
            Opts::new("sdown_count", "Number of subjectively-down reports"),
            &["sentinel", "shard", "redis_server", "role"],
        )?;
        registry.register(Box::new(sdown_count.clone()))?;

        Ok(Self {
            switch_master_count,
            failover_abort_no_good_slave_count,
            sdown_count,
        })
    }
}

impl MetricsSink for PrometheusMetrics {
    fn switch_master(&self, sentinel: &str, shard: &str) {
        self.switch_master_count
            .with_label_values(&[sentinel, shard])
            .inc();
    }

    fn failover_abort_no_good_slave(&self, sentinel: &str, shard: &str) {
        self.failover_abort_no_good_slave_count
            .with_label_values(&[sentinel, shard])
            .inc();
    }

    fn sdown(&self, sentinel: &str, shard: &str, redis_server: &str, role: &str) {
        self.sdown_count
            .with_label_values(&[sentinel, shard, redis_server, role])
            .inc();
    }
}
