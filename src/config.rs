//! # Runtime configuration.
//!
//! Provides [`ManagerConfig`] for the [`WorkerManager`](crate::WorkerManager)
//! and [`WatcherConfig`] for every [`SentinelWatcher`](crate::SentinelWatcher).
//!
//! ## Sentinel values
//! - `signal_capacity = 0` → clamped to 1
//! - `connect_timeout = 0s` → no timeout

use std::time::Duration;

/// Configuration for the worker manager.
///
/// ## Field semantics
/// - `signal_capacity`: buffer size of the shared output channel (min 1)
/// - `grace`: how long [`WorkerManager::shutdown`](crate::WorkerManager::shutdown) waits for teardown
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Capacity of the shared signal channel.
    ///
    /// Watchers block on send once it is full, so a slow consumer throttles
    /// how fast owners get re-queued. Minimum value is 1.
    pub signal_capacity: usize,

    /// Maximum time to wait for workers to tear down on shutdown.
    pub grace: Duration,
}

impl ManagerConfig {
    /// Returns the signal channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn signal_capacity_clamped(&self) -> usize {
        self.signal_capacity.max(1)
    }
}

impl Default for ManagerConfig {
    /// Default configuration:
    ///
    /// - `signal_capacity = 1` (closest to a rendezvous channel)
    /// - `grace = 10s`
    fn default() -> Self {
        Self {
            signal_capacity: 1,
            grace: Duration::from_secs(10),
        }
    }
}

/// Connection settings for a Sentinel watcher.
#[derive(Clone, Debug)]
pub struct WatcherConfig {
    /// Deadline for connect, `AUTH` and `PSUBSCRIBE` together
    /// (`Duration::ZERO` = wait indefinitely).
    pub connect_timeout: Duration,

    /// Password sent with `AUTH` before subscribing, if any.
    pub password: Option<String>,
}

impl WatcherConfig {
    /// Returns the connect timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → the handshake must finish within `d`
    #[inline]
    pub fn connect_timeout(&self) -> Option<Duration> {
        if self.connect_timeout == Duration::ZERO {
            None
        } else {
            Some(self.connect_timeout)
        }
    }

    /// Returns a copy with the given password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Returns a copy with the given connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for WatcherConfig {
    /// Default configuration:
    ///
    /// - `connect_timeout = 5s`
    /// - `password = None`
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = ManagerConfig {
            signal_capacity: 0,
            ..ManagerConfig::default()
        };
        assert_eq!(cfg.signal_capacity_clamped(), 1);
    }

    #[test]
    fn zero_connect_timeout_means_none() {
        let cfg = WatcherConfig::default().with_connect_timeout(Duration::ZERO);
        assert!(cfg.connect_timeout().is_none());

        let cfg = cfg.with_connect_timeout(Duration::from_millis(250));
        assert_eq!(cfg.connect_timeout(), Some(Duration::from_millis(250)));
    }
}
