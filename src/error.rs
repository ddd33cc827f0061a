//! Error types used by the worker manager, the Sentinel watcher and the parser.
//!
//! This module defines four error enums:
//!
//! - [`WorkerError`] — a worker failed to start (connection or handshake failure).
//! - [`ParseError`] — a Sentinel notification payload did not match its grammar.
//! - [`RuntimeError`] — errors raised by the manager itself (shutdown grace exceeded).
//! - [`MetricsError`] — metric families could not be registered.
//!
//! Each type provides `as_label` for logs/metrics.

use std::time::Duration;

use thiserror::Error;

/// # Errors produced while starting a worker.
///
/// Start failures are surfaced to the caller of
/// [`WorkerManager::run_worker`](crate::WorkerManager::run_worker); they are
/// never retried internally. Retry is the reconciliation loop's job (requeue).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// TCP connection to the endpoint could not be established.
    #[error("connect to {addr}: {source}")]
    Connect {
        /// Endpoint address.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Connect and handshake did not complete within the configured timeout.
    #[error("handshake with {addr} timed out after {timeout:?}")]
    ConnectTimeout {
        /// Endpoint address.
        addr: String,
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Endpoint rejected the `AUTH` command.
    #[error("authentication against {addr} failed: {reason}")]
    Auth {
        /// Endpoint address.
        addr: String,
        /// Error string returned by the endpoint.
        reason: String,
    },

    /// Unexpected or undecodable reply during the handshake.
    #[error("protocol error from {addr}: {reason}")]
    Protocol {
        /// Endpoint address.
        addr: String,
        /// What went wrong.
        reason: String,
    },

    /// Peer closed the connection before the handshake finished.
    #[error("connection to {addr} closed during handshake")]
    Closed {
        /// Endpoint address.
        addr: String,
    },

    /// The start context was cancelled before the handshake finished.
    #[error("start of {addr} cancelled")]
    Cancelled {
        /// Endpoint address.
        addr: String,
    },
}

impl WorkerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use sentinelvisor::WorkerError;
    ///
    /// let err = WorkerError::Closed { addr: "10.0.0.1:26379".into() };
    /// assert_eq!(err.as_label(), "worker_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Connect { .. } => "worker_connect",
            WorkerError::ConnectTimeout { .. } => "worker_connect_timeout",
            WorkerError::Auth { .. } => "worker_auth",
            WorkerError::Protocol { .. } => "worker_protocol",
            WorkerError::Closed { .. } => "worker_closed",
            WorkerError::Cancelled { .. } => "worker_cancelled",
        }
    }

    /// Returns the endpoint address the error refers to.
    pub fn addr(&self) -> &str {
        match self {
            WorkerError::Connect { addr, .. }
            | WorkerError::ConnectTimeout { addr, .. }
            | WorkerError::Auth { addr, .. }
            | WorkerError::Protocol { addr, .. }
            | WorkerError::Closed { addr }
            | WorkerError::Cancelled { addr } => addr,
        }
    }
}

/// # Errors produced by [`EventMessage::parse`](crate::EventMessage::parse).
///
/// Parse errors are recoverable: the watcher logs them and keeps running.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Tilt notifications carry no payload.
    #[error("payload for tilt events should be empty")]
    TiltPayloadNotEmpty,

    /// `+switch-master` arrived without payload.
    #[error("empty payload for switch event")]
    EmptySwitchPayload,

    /// `+switch-master` payload has fewer than five fields.
    #[error("invalid payload for switch event")]
    InvalidSwitchPayload {
        /// Number of fields received.
        fields: usize,
    },

    /// Instance event arrived without payload.
    #[error("empty payload for instance event")]
    EmptyInstancePayload,

    /// Instance event payload has fewer than four fields.
    #[error("invalid payload for instance event")]
    InvalidInstancePayload {
        /// Number of fields received.
        fields: usize,
    },
}

impl ParseError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ParseError::TiltPayloadNotEmpty => "parse_tilt_payload",
            ParseError::EmptySwitchPayload => "parse_switch_empty",
            ParseError::InvalidSwitchPayload { .. } => "parse_switch_invalid",
            ParseError::EmptyInstancePayload => "parse_instance_empty",
            ParseError::InvalidInstancePayload { .. } => "parse_instance_invalid",
        }
    }
}

/// # Errors produced by the manager runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some workers had not torn down.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Keys of the workers that did not finish in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use sentinelvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// Errors raised while setting up metric families.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to register a metric with Prometheus.
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
}

impl MetricsError {
    pub fn as_label(&self) -> &'static str {
        match self {
            MetricsError::Registration(_) => "metrics_registration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_messages_are_stable() {
        assert_eq!(
            ParseError::TiltPayloadNotEmpty.to_string(),
            "payload for tilt events should be empty"
        );
        assert_eq!(
            ParseError::EmptySwitchPayload.to_string(),
            "empty payload for switch event"
        );
        assert_eq!(
            ParseError::InvalidInstancePayload { fields: 2 }.to_string(),
            "invalid payload for instance event"
        );
    }

    #[test]
    fn worker_error_exposes_addr() {
        let err = WorkerError::ConnectTimeout {
            addr: "127.0.0.1:26379".into(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(err.addr(), "127.0.0.1:26379");
        assert_eq!(err.as_label(), "worker_connect_timeout");
    }
}
