//! # SentinelWatcher: one background listener per Sentinel endpoint.
//!
//! Keeps a pub/sub connection to one Sentinel, forwards a [`Signal`] for
//! every notification, and feeds parsed notifications to a [`MetricsSink`].
//!
//! ## Event flow
//! ```text
//! start():
//!   open (connect + AUTH + PSUBSCRIBE, one deadline, cancellable)
//!     ─► spawn loop ─► Running
//!
//! loop {
//!   select! {
//!     cancelled         ─► break
//!     next pmessage     ─► send Signal(owner)   (blocks until accepted, cancellable)
//!                       ─► EventMessage::parse
//!                            ├─ Ok  ─► metrics.record()
//!                            └─ Err ─► warn!, continue
//!     closed / error    ─► send Signal(owner), break
//!   }
//! }
//! drop(conn) ─► started = false
//! ```
//!
//! ## Rules
//! - Notifications from one Sentinel are handled strictly in arrival order.
//! - Parse failures never stop the loop.
//! - A lost connection ends the loop; the owner is signalled so the next
//!   reconcile restarts the watcher.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, warn};

use super::conn::{PATTERNS, PMessage, SentinelConn};
use super::metrics::{MetricsSink, NoopMetrics};
use crate::config::WatcherConfig;
use crate::error::WorkerError;
use crate::events::{EventMessage, OwnerRef, Signal};
use crate::workers::{StopHandle, Worker};

#[derive(Default)]
struct WatchState {
    tx: Option<mpsc::Sender<Signal>>,
    cancel: Option<CancellationToken>,
    join: Option<JoinHandle<()>>,
}

/// Worker watching a single Sentinel endpoint on behalf of an owner.
pub struct SentinelWatcher {
    addr: String,
    owner: OwnerRef,
    cfg: WatcherConfig,
    metrics: Arc<dyn MetricsSink>,
    started: Arc<AtomicBool>,
    state: Mutex<WatchState>,
}

impl SentinelWatcher {
    /// Creates an idle watcher for `addr` (`host:port`).
    ///
    /// The worker id is the address itself.
    pub fn new(addr: impl Into<String>, owner: OwnerRef) -> Self {
        Self {
            addr: addr.into(),
            owner,
            cfg: WatcherConfig::default(),
            metrics: Arc::new(NoopMetrics),
            started: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(WatchState::default()),
        }
    }

    /// Creates the watcher and returns it as a shared handle.
    pub fn arc(addr: impl Into<String>, owner: OwnerRef) -> Arc<Self> {
        Arc::new(Self::new(addr, owner))
    }

    pub fn with_config(mut self, cfg: WatcherConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn owner(&self) -> &OwnerRef {
        &self.owner
    }
}

#[async_trait]
impl Worker for SentinelWatcher {
    fn id(&self) -> &str {
        &self.addr
    }

    fn set_output_channel(&self, tx: mpsc::Sender<Signal>) {
        self.state.lock().tx = Some(tx);
    }

    async fn start(&self, ctx: &CancellationToken, log: &Span) -> Result<(), WorkerError> {
        if self.is_started() {
            return Ok(());
        }
        let span = tracing::info_span!(
            parent: log,
            "sentinel_watcher",
            sentinel = %self.addr,
            owner = %self.owner
        );

        let handshake = SentinelConn::open(&self.addr, &self.cfg, &PATTERNS, ctx);
        let conn = match handshake.instrument(span.clone()).await {
            Ok(conn) => conn,
            Err(err) => {
                span.in_scope(|| error!(error = %err, "failed to subscribe to sentinel"));
                return Err(err);
            }
        };

        let cancel = ctx.child_token();
        let watch = WatchLoop {
            conn,
            owner: self.owner.clone(),
            tx: self.state.lock().tx.clone(),
            metrics: Arc::clone(&self.metrics),
            started: Arc::clone(&self.started),
        };

        self.started.store(true, Ordering::SeqCst);
        let join = tokio::spawn(watch.run(cancel.clone()).instrument(span.clone()));
        {
            let mut st = self.state.lock();
            st.cancel = Some(cancel);
            st.join = Some(join);
        }
        span.in_scope(|| info!("watching sentinel"));
        Ok(())
    }

    fn stop(&self) -> StopHandle {
        let mut st = self.state.lock();
        if let Some(cancel) = st.cancel.take() {
            cancel.cancel();
        }
        st.join.take().map(StopHandle::new).unwrap_or_default()
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

/// State moved into the background task.
struct WatchLoop {
    conn: SentinelConn,
    owner: OwnerRef,
    tx: Option<mpsc::Sender<Signal>>,
    metrics: Arc<dyn MetricsSink>,
    started: Arc<AtomicBool>,
}

impl WatchLoop {
    async fn run(mut self, cancel: CancellationToken) {
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = self.conn.next_message() => next,
            };
            match next {
                Ok(Some(msg)) => {
                    if !self.dispatch(msg, &cancel).await {
                        break;
                    }
                }
                Ok(None) => {
                    warn!("sentinel closed the connection");
                    self.notify(&cancel).await;
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "sentinel connection failed");
                    self.notify(&cancel).await;
                    break;
                }
            }
        }

        drop(self.conn);
        self.started.store(false, Ordering::SeqCst);
        debug!("sentinel watcher stopped");
    }

    /// Handles one notification; returns `false` when cancelled meanwhile.
    async fn dispatch(&self, msg: PMessage, cancel: &CancellationToken) -> bool {
        debug!(channel = %msg.channel, payload = %msg.payload, "sentinel notification");
        if !self.notify(cancel).await {
            return false;
        }
        match EventMessage::parse(&msg.channel, &msg.payload) {
            Ok(event) => self.metrics.record(self.conn.addr(), &event),
            Err(err) => warn!(
                error = %err,
                channel = %msg.channel,
                payload = %msg.payload,
                "dropping malformed sentinel notification"
            ),
        }
        true
    }

    /// Sends a signal for the owner; returns `false` when cancelled first.
    async fn notify(&self, cancel: &CancellationToken) -> bool {
        let Some(tx) = &self.tx else {
            return true;
        };
        tokio::select! {
            _ = cancel.cancelled() => false,
            res = tx.send(Signal::new(self.owner.clone())) => {
                if res.is_err() {
                    debug!("signal channel closed; dropping signal");
                }
                true
            }
        }
    }
}
