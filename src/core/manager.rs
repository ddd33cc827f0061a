//! # Worker manager - keyed registry of running workers.
//!
//! Maps [`WorkerKey`] (owner + worker id) to a running [`Worker`] and owns the
//! single signal channel every worker reports on.
//!
//! ## Architecture
//! ```text
//! reconcile loop ──► reconcile_workers(owner, desired)
//!                      ├─► run_worker(key, w)   for each desired   (start if absent / idle)
//!                      └─► stop_worker(key)     for each stale key of owner
//!
//! SentinelWatcher 1 ──┐
//! SentinelWatcher 2 ──┼──► mpsc::Sender<Signal> ──► output_channel() ──► reconcile loop
//! SentinelWatcher N ──┘
//! ```
//!
//! ## Starting a worker
//! ```text
//! lock ─► started entry or start in flight? ─► return
//!      └► reserve key (ticket) ─► unlock
//! worker.start()                              (no lock held)
//! lock ─► reservation still ours? ─ no ─► stop the new worker
//!      └► yes ─► install, stop the replaced idle entry
//! ```
//!
//! ## Rules
//! - At most one start per key is in flight; a second call for the same key
//!   returns immediately.
//! - A slow or hanging start never holds the registry lock, so other keys
//!   stay serviceable.
//! - Removing a key (stop, reconcile, cleanup, shutdown) revokes a pending
//!   reservation; the worker that was starting is stopped, not installed.
//! - A worker whose `start` fails is not installed.
//! - Stopped workers are removed from the registry, never kept as "stopped".
//! - Operations on unknown keys are no-ops.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::{BoxFuture, join_all};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::config::ManagerConfig;
use crate::error::{RuntimeError, WorkerError};
use crate::events::{OwnerRef, Signal};
use crate::workers::{StopHandle, WorkerKey, WorkerRef};

#[derive(Default)]
struct Registry {
    workers: HashMap<WorkerKey, WorkerRef>,
    /// Keys with a start in flight, tagged with the reserving call's ticket.
    starting: HashMap<WorkerKey, u64>,
    next_ticket: u64,
}

impl Registry {
    fn reserve(&mut self, key: &WorkerKey) -> u64 {
        self.next_ticket += 1;
        self.starting.insert(key.clone(), self.next_ticket);
        self.next_ticket
    }

    /// Drops the reservation if it still belongs to `ticket`.
    fn release(&mut self, key: &WorkerKey, ticket: u64) -> bool {
        if self.starting.get(key) == Some(&ticket) {
            self.starting.remove(key);
            true
        } else {
            false
        }
    }
}

/// Releases a reservation when `run_worker` is dropped mid-start.
struct Reservation<'a> {
    registry: &'a Mutex<Registry>,
    key: WorkerKey,
    ticket: u64,
    armed: bool,
}

impl Reservation<'_> {
    fn settle(mut self, reg: &mut Registry) -> bool {
        self.armed = false;
        reg.release(&self.key, self.ticket)
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.registry.lock().release(&self.key, self.ticket);
        }
    }
}

fn same_worker(a: &WorkerRef, b: &WorkerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Registry of running workers plus their shared output channel.
pub struct WorkerManager {
    cfg: ManagerConfig,
    registry: Mutex<Registry>,
    tx: mpsc::Sender<Signal>,
    rx: Mutex<Option<mpsc::Receiver<Signal>>>,
}

impl WorkerManager {
    /// Creates a manager and its signal channel.
    pub fn new(cfg: ManagerConfig) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(cfg.signal_capacity_clamped());
        Arc::new(Self {
            cfg,
            registry: Mutex::new(Registry::default()),
            tx,
            rx: Mutex::new(Some(rx)),
        })
    }

    /// Hands out the receiving end of the signal channel.
    ///
    /// Returns `Some` on the first call only. The manager keeps its sender,
    /// so the channel stays open for the manager's lifetime.
    pub fn output_channel(&self) -> Option<mpsc::Receiver<Signal>> {
        self.rx.lock().take()
    }

    /// Starts `worker` under `key` unless a started worker is already there
    /// or another start for `key` is in flight.
    ///
    /// Start errors are returned as-is and leave the registry untouched. An
    /// idle entry replaced by `worker` is stopped.
    pub async fn run_worker(
        &self,
        ctx: &CancellationToken,
        key: WorkerKey,
        worker: WorkerRef,
        log: &Span,
    ) -> Result<(), WorkerError> {
        let reservation = {
            let mut reg = self.registry.lock();
            if reg.workers.get(&key).is_some_and(|w| w.is_started()) {
                return Ok(());
            }
            if reg.starting.contains_key(&key) {
                tracing::debug!(parent: log, key = %key, "start already in flight");
                return Ok(());
            }
            Reservation {
                registry: &self.registry,
                ticket: reg.reserve(&key),
                key: key.clone(),
                armed: true,
            }
        };

        worker.set_output_channel(self.tx.clone());
        let started = worker.start(ctx, log).await;

        let replaced = {
            let mut reg = self.registry.lock();
            let still_ours = reservation.settle(&mut reg);
            started?;
            if !still_ours {
                None
            } else {
                Some(reg.workers.insert(key.clone(), Arc::clone(&worker)))
            }
        };

        match replaced {
            None => {
                tracing::debug!(parent: log, key = %key, "worker removed while starting");
                worker.stop();
            }
            Some(old) => {
                tracing::debug!(parent: log, key = %key, "worker started");
                if let Some(old) = old
                    && !same_worker(&old, &worker)
                {
                    old.stop();
                }
            }
        }
        Ok(())
    }

    /// Stops and removes the worker under `key`.
    ///
    /// The returned handle resolves once the worker finished tearing down;
    /// dropping it is fine. A start in flight for `key` is revoked.
    pub async fn stop_worker(&self, key: &WorkerKey) -> StopHandle {
        let removed = {
            let mut reg = self.registry.lock();
            reg.starting.remove(key);
            reg.workers.remove(key)
        };
        match removed {
            Some(worker) => {
                tracing::debug!(key = %key, "stopping worker");
                worker.stop()
            }
            None => StopHandle::done(),
        }
    }

    /// Brings the workers of `owner` in line with `desired`.
    ///
    /// Every desired worker is run (see [`run_worker`](Self::run_worker)); every
    /// registered worker of `owner` that is not desired is stopped. A failed
    /// start does not prevent the others from being processed; the first
    /// error is returned.
    pub async fn reconcile_workers(
        &self,
        ctx: &CancellationToken,
        owner: &OwnerRef,
        desired: Vec<WorkerRef>,
        log: &Span,
    ) -> Result<(), WorkerError> {
        let mut desired_keys = HashSet::with_capacity(desired.len());
        let mut first_err = None;

        for worker in desired {
            let key = WorkerKey::new(owner, worker.id());
            desired_keys.insert(key.clone());
            if let Err(err) = self.run_worker(ctx, key, worker, log).await {
                tracing::warn!(parent: log, error = %err, "worker failed to start");
                first_err.get_or_insert(err);
            }
        }

        let stale = self.take_where(|key| key.in_scope(owner) && !desired_keys.contains(key));
        for (key, worker) in stale {
            tracing::debug!(parent: log, key = %key, "stopping stale worker");
            worker.stop();
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Returns a deferred action that stops every worker of `owner` and
    /// waits for their teardown.
    ///
    /// Meant to run while the owner is being finalized.
    pub fn cleanup_workers(
        self: &Arc<Self>,
        owner: &OwnerRef,
    ) -> impl FnOnce() -> BoxFuture<'static, ()> + Send + 'static {
        let me = Arc::clone(self);
        let owner = owner.clone();
        move || {
            Box::pin(async move {
                let handles = me.stop_scope(&owner).await;
                join_all(handles.into_iter().map(StopHandle::wait)).await;
            })
        }
    }

    /// Stops and removes every worker of `owner`.
    pub async fn stop_scope(&self, owner: &OwnerRef) -> Vec<StopHandle> {
        self.take_where(|key| key.in_scope(owner))
            .into_iter()
            .map(|(key, worker)| {
                tracing::debug!(key = %key, "stopping worker");
                worker.stop()
            })
            .collect()
    }

    /// Returns sorted list of registered keys.
    pub async fn keys(&self) -> Vec<WorkerKey> {
        let mut keys: Vec<WorkerKey> = self.registry.lock().workers.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// True when `key` is registered and its worker reports started.
    pub async fn is_running(&self, key: &WorkerKey) -> bool {
        self.registry
            .lock()
            .workers
            .get(key)
            .is_some_and(|w| w.is_started())
    }

    pub async fn len(&self) -> usize {
        self.registry.lock().workers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.lock().workers.is_empty()
    }

    /// Stops every worker and waits up to [`ManagerConfig::grace`] for teardown.
    ///
    /// Starts still in flight are revoked. Returns
    /// [`RuntimeError::GraceExceeded`] listing the workers still running when
    /// the grace period ran out.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let drained: Vec<(WorkerKey, WorkerRef)> = {
            let mut reg = self.registry.lock();
            reg.starting.clear();
            reg.workers.drain().collect()
        };
        let handles: Vec<StopHandle> = drained.iter().map(|(_, w)| w.stop()).collect();

        let grace = self.cfg.grace;
        let done = join_all(handles.into_iter().map(StopHandle::wait));
        match tokio::time::timeout(grace, done).await {
            Ok(_) => {
                tracing::info!(workers = drained.len(), "all workers stopped within grace");
                Ok(())
            }
            Err(_) => {
                let mut stuck: Vec<String> = drained
                    .iter()
                    .filter(|(_, w)| w.is_started())
                    .map(|(key, _)| key.to_string())
                    .collect();
                stuck.sort_unstable();
                tracing::warn!(?stuck, ?grace, "workers did not stop within grace");
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Atomically removes every entry and reservation whose key matches `pred`.
    fn take_where(&self, pred: impl Fn(&WorkerKey) -> bool) -> Vec<(WorkerKey, WorkerRef)> {
        let mut reg = self.registry.lock();
        reg.starting.retain(|k, _| !pred(k));
        let keys: Vec<WorkerKey> = reg.workers.keys().filter(|k| pred(k)).cloned().collect();
        keys.into_iter()
            .filter_map(|k| reg.workers.remove_entry(&k))
            .collect()
    }
}
