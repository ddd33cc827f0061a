//! Sentinel notification model and reconcile signals.
//!
//! ## Contents
//! - [`EventMessage`], [`InstanceDetails`] parsed Sentinel notifications
//! - [`OwnerRef`], [`Signal`] owner identity and the "re-examine" message
//!
//! ## Quick reference
//! - **Producers**: `SentinelWatcher` (one per monitored endpoint).
//! - **Consumer**: whoever took the receiver from `WorkerManager::output_channel`.

mod message;
mod signal;

pub use message::{
    EventMessage, FAILOVER_ABORT_NO_GOOD_SLAVE, InstanceDetails, ROLE_MASTER, SDOWN,
    SDOWN_CLEARED, SWITCH_MASTER, TILT_KINDS,
};
pub use signal::{OwnerRef, Signal};
