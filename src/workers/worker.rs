//! # Worker abstraction.
//!
//! A [`Worker`] is a long-lived background execution that can be started,
//! stopped and asked whether it is running. The common handle type is
//! [`WorkerRef`], an `Arc<dyn Worker>` owned by the
//! [`WorkerManager`](crate::WorkerManager) registry.
//!
//! ## Lifecycle
//! ```text
//! Idle ──start() ok──► Running ──stop() / parent cancelled──► Idle
//! ```
//!
//! ## Rules
//! - `start` on a running worker is a no-op returning `Ok(())`.
//! - `stop` never fails and never blocks; it returns a [`StopHandle`] that
//!   can be awaited when the caller needs teardown to have finished.
//! - `stop` before `start` is allowed.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::error::WorkerError;
use crate::events::Signal;

/// Shared handle to a worker.
pub type WorkerRef = Arc<dyn Worker>;

/// # Long-lived, stoppable background execution.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use async_trait::async_trait;
/// use tokio::sync::mpsc;
/// use tokio_util::sync::CancellationToken;
/// use tracing::Span;
/// use sentinelvisor::{Signal, StopHandle, Worker, WorkerError};
///
/// struct Flag(AtomicBool);
///
/// #[async_trait]
/// impl Worker for Flag {
///     fn id(&self) -> &str { "flag" }
///     fn set_output_channel(&self, _tx: mpsc::Sender<Signal>) {}
///     async fn start(&self, _ctx: &CancellationToken, _log: &Span) -> Result<(), WorkerError> {
///         self.0.store(true, Ordering::SeqCst);
///         Ok(())
///     }
///     fn stop(&self) -> StopHandle {
///         self.0.store(false, Ordering::SeqCst);
///         StopHandle::done()
///     }
///     fn is_started(&self) -> bool { self.0.load(Ordering::SeqCst) }
/// }
/// ```
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Stable identifier, unique among the workers of one owner.
    fn id(&self) -> &str;

    /// Installs the channel the worker reports signals on.
    ///
    /// Called by the manager before `start`.
    fn set_output_channel(&self, tx: mpsc::Sender<Signal>);

    /// Starts the background execution as a child of `ctx`.
    ///
    /// `log` is the parent span for everything the worker logs.
    async fn start(&self, ctx: &CancellationToken, log: &Span) -> Result<(), WorkerError>;

    /// Requests cancellation and returns immediately.
    fn stop(&self) -> StopHandle;

    /// True while the background execution is alive.
    fn is_started(&self) -> bool;
}

/// Completion handle returned by [`Worker::stop`].
///
/// Dropping it keeps stop fire-and-forget; [`StopHandle::wait`] resolves once
/// the background execution has released its resources.
#[derive(Debug, Default)]
pub struct StopHandle {
    join: Option<JoinHandle<()>>,
}

impl StopHandle {
    /// Handle for a background execution that is being cancelled.
    pub fn new(join: JoinHandle<()>) -> Self {
        Self { join: Some(join) }
    }

    /// Handle with nothing to wait for.
    pub fn done() -> Self {
        Self::default()
    }

    /// True when teardown already finished (or there was nothing to stop).
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits until teardown finished.
    pub async fn wait(self) {
        if let Some(join) = self.join
            && let Err(err) = join.await
        {
            tracing::warn!(error = %err, "worker task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn done_handle_resolves_immediately() {
        let h = StopHandle::done();
        assert!(h.is_finished());
        h.wait().await;
    }

    #[tokio::test]
    async fn handle_waits_for_task() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            let _ = rx.await;
        });
        let h = StopHandle::new(join);
        assert!(!h.is_finished());

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), h.wait())
            .await
            .unwrap();
    }
}
