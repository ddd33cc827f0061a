//! Runtime core: the worker manager.
//!
//! The only public API from this module is [`WorkerManager`], which keeps the
//! registry of running workers, reconciles it per owner, and owns the shared
//! signal channel.
//!
//! Internal modules:
//! - [`manager`]: keyed registry, reconcile/cleanup, graceful shutdown.

mod manager;

pub use manager::WorkerManager;
