//! # Worker abstractions.
//!
//! - [`Worker`] - trait for long-lived, stoppable background executions
//! - [`WorkerRef`] - shared reference to a worker (`Arc<dyn Worker>`)
//! - [`StopHandle`] - awaitable completion of a stop request
//! - [`WorkerKey`] - registry key scoping a worker to its owner

mod key;
mod worker;

pub use key::WorkerKey;
pub use worker::{StopHandle, Worker, WorkerRef};
