//! # sentinelvisor
//!
//! **Sentinelvisor** keeps a fleet of Redis Sentinel watchers alive, one per
//! monitored Sentinel endpoint, and turns the failover notifications they
//! receive into "re-examine this owner" signals for a reconciliation loop.
//!
//! The crate is the control-plane core of a Sentinel-managed Redis cluster
//! operator: the reconciliation framework itself (what child resources to
//! create, how to regenerate a proxy's server list) lives elsewhere and only
//! talks to this crate through [`WorkerManager`] and its signal channel.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   reconcile loop (external)
//!      │  reconcile_workers(owner, [SentinelWatcher, ...])
//!      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  WorkerManager                                                    │
//! │  - registry: WorkerKey (<ns>/<name>_<id>) → WorkerRef             │
//! │  - one mpsc::Sender<Signal> shared by every worker                │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐
//!  │SentinelWatcher│  │SentinelWatcher│  │SentinelWatcher│
//!  │  PSUBSCRIBE   │  │  PSUBSCRIBE   │  │  PSUBSCRIBE   │
//!  └┬──────────────┘  └┬──────────────┘  └┬──────────────┘
//!   │ pmessage          │                  │
//!   ├─► Signal(owner) ──┴──────────────────┴──► output_channel() ──► reconcile loop
//!   └─► EventMessage::parse ──► MetricsSink (switch_master / sdown / ...)
//! ```
//!
//! ### Lifecycle
//! ```text
//! SentinelWatcher: Idle ──start()──► Running ──stop() / ctx cancelled──► Idle
//!
//! start():
//!   ├─► connect ─► [AUTH] ─► PSUBSCRIBE +switch-master
//!   │                                  -failover-abort-no-good-slave
//!   │                                  [+\-]sdown
//!   │   (one deadline for the whole handshake; aborted when ctx is cancelled)
//!   └─► spawn loop, started = true
//!
//! loop {
//!   ├─► cancelled            ─► exit
//!   ├─► pmessage             ─► send Signal (backpressure), parse, count
//!   └─► connection lost      ─► send Signal, exit
//! }
//! on exit: drop connection, started = false
//! ```
//!
//! ## Features
//! | Area            | Description                                                | Key types / traits                          |
//! |-----------------|------------------------------------------------------------|---------------------------------------------|
//! | **Workers**     | Long-lived background executions with start/stop/liveness. | [`Worker`], [`WorkerRef`], [`StopHandle`]   |
//! | **Manager**     | Keyed registry, per-owner reconcile, cleanup, shutdown.     | [`WorkerManager`], [`WorkerKey`]            |
//! | **Watcher**     | Sentinel pub/sub client and notification loop.              | [`SentinelWatcher`], [`SentinelConn`]       |
//! | **Parsing**     | Sentinel notification grammar.                              | [`EventMessage`], [`InstanceDetails`]       |
//! | **Metrics**     | Injected counter sink, Prometheus-backed or no-op.          | [`MetricsSink`], [`PrometheusMetrics`]      |
//! | **Errors**      | Typed errors for start, parse and shutdown.                 | [`WorkerError`], [`ParseError`], [`RuntimeError`] |
//! | **Configuration** | Manager and watcher settings.                             | [`ManagerConfig`], [`WatcherConfig`]        |
//!
//! ## Example
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use sentinelvisor::{ManagerConfig, OwnerRef, SentinelWatcher, WorkerManager, WorkerRef};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mgr = WorkerManager::new(ManagerConfig::default());
//!     let mut signals = mgr.output_channel().expect("first call");
//!
//!     let ctx = CancellationToken::new();
//!     let owner = OwnerRef::new("prod", "cache");
//!     let desired: Vec<WorkerRef> = ["10.0.0.1:26379", "10.0.0.2:26379"]
//!         .into_iter()
//!         .map(|addr| SentinelWatcher::arc(addr, owner.clone()) as WorkerRef)
//!         .collect();
//!     mgr.reconcile_workers(&ctx, &owner, desired, &tracing::Span::current()).await?;
//!
//!     while let Some(signal) = signals.recv().await {
//!         println!("re-examine {}", signal.owner);
//!     }
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod sentinel;
mod workers;

// ---- Public re-exports ----

pub use config::{ManagerConfig, WatcherConfig};
pub use crate::core::WorkerManager;
pub use error::{MetricsError, ParseError, RuntimeError, WorkerError};
pub use events::{
    EventMessage, FAILOVER_ABORT_NO_GOOD_SLAVE, InstanceDetails, OwnerRef, ROLE_MASTER, SDOWN,
    SDOWN_CLEARED, SWITCH_MASTER, Signal, TILT_KINDS,
};
pub use sentinel::{
    MetricsSink, NoopMetrics, PATTERNS, PMessage, PrometheusMetrics, SentinelConn,
    SentinelWatcher,
};
pub use workers::{StopHandle, Worker, WorkerKey, WorkerRef};
