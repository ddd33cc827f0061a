//! # Sentinel pub/sub connection.
//!
//! Minimal RESP2 client for the part of the Sentinel protocol the watcher
//! needs: optional `AUTH`, `PSUBSCRIBE`, then a stream of `pmessage` frames.
//!
//! ## Handshake
//! ```text
//! connect ─► [AUTH <password> ─► +OK] ─► PSUBSCRIBE p1 p2 p3
//!                                                        ├─► psubscribe p1 1
//!                                                        ├─► psubscribe p2 2
//!                                                        └─► psubscribe p3 3
//! then: *4 pmessage <pattern> <channel> <payload> ...
//! ```
//!
//! [`SentinelConn::open`] runs the whole handshake under one deadline
//! (`WatcherConfig::connect_timeout`) and aborts it when the start context
//! is cancelled.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use redis_protocol::codec::Resp2;
use redis_protocol::resp2::types::BytesFrame;
use tokio::net::TcpStream;
use tokio::time;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use crate::config::WatcherConfig;
use crate::error::WorkerError;

/// Patterns every watcher subscribes to.
///
/// `[+\-]sdown` matches both `+sdown` and `-sdown`.
pub const PATTERNS: [&str; 3] = ["+switch-master", "-failover-abort-no-good-slave", "[+\\-]sdown"];

/// One notification delivered through a pattern subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PMessage {
    pub pattern: String,
    pub channel: String,
    pub payload: String,
}

impl PMessage {
    /// Decodes a `pmessage` push frame; other frames yield `None`.
    pub fn from_frame(frame: &BytesFrame) -> Option<Self> {
        let BytesFrame::Array(parts) = frame else {
            return None;
        };
        match parts.as_slice() {
            [kind, pattern, channel, payload] if frame_str(kind).as_deref() == Some("pmessage") => {
                Some(Self {
                    pattern: frame_str(pattern)?,
                    channel: frame_str(channel)?,
                    payload: frame_str(payload)?,
                })
            }
            _ => None,
        }
    }
}

/// Connection subscribed (or about to be) to Sentinel notifications.
pub struct SentinelConn {
    addr: String,
    framed: Framed<TcpStream, Resp2>,
}

impl SentinelConn {
    /// Connects, authenticates and subscribes to `patterns`.
    ///
    /// The whole exchange must finish within the configured connect timeout;
    /// cancelling `ctx` aborts it with [`WorkerError::Cancelled`].
    pub async fn open(
        addr: &str,
        cfg: &WatcherConfig,
        patterns: &[&str],
        ctx: &CancellationToken,
    ) -> Result<Self, WorkerError> {
        let handshake = async {
            let mut conn = Self::connect(addr, cfg).await?;
            conn.psubscribe(patterns).await?;
            Ok::<_, WorkerError>(conn)
        };
        let bounded = async {
            match cfg.connect_timeout() {
                Some(timeout) => time::timeout(timeout, handshake).await.unwrap_or_else(|_| {
                    Err(WorkerError::ConnectTimeout {
                        addr: addr.to_owned(),
                        timeout,
                    })
                }),
                None => handshake.await,
            }
        };

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(WorkerError::Cancelled { addr: addr.to_owned() }),
            res = bounded => res,
        }
    }

    /// Opens the TCP connection and authenticates when a password is configured.
    ///
    /// No deadline applies here; see [`open`](Self::open).
    pub async fn connect(addr: &str, cfg: &WatcherConfig) -> Result<Self, WorkerError> {
        let socket = TcpStream::connect(addr)
            .await
            .map_err(|source| WorkerError::Connect {
                addr: addr.to_owned(),
                source,
            })?;
        socket.set_nodelay(true).ok();

        let mut conn = Self {
            addr: addr.to_owned(),
            framed: Framed::new(socket, Resp2::default()),
        };
        if let Some(password) = &cfg.password {
            conn.auth(password).await?;
        }
        Ok(conn)
    }

    /// Endpoint this connection talks to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn auth(&mut self, password: &str) -> Result<(), WorkerError> {
        self.send(command(&["AUTH", password])).await?;
        match self.read_reply().await? {
            BytesFrame::SimpleString(s) if s.as_ref() == b"OK" => Ok(()),
            BytesFrame::Error(err) => Err(WorkerError::Auth {
                addr: self.addr.clone(),
                reason: err.to_string(),
            }),
            other => Err(self.protocol(format!("unexpected AUTH reply: {other:?}"))),
        }
    }

    /// Subscribes to `patterns` and waits for one confirmation per pattern.
    pub async fn psubscribe(&mut self, patterns: &[&str]) -> Result<(), WorkerError> {
        let mut args = Vec::with_capacity(patterns.len() + 1);
        args.push("PSUBSCRIBE");
        args.extend_from_slice(patterns);
        self.send(command(&args)).await?;

        for pattern in patterns {
            let reply = self.read_reply().await?;
            let confirmed = match &reply {
                BytesFrame::Array(parts) => matches!(
                    parts.as_slice(),
                    [kind, p, BytesFrame::Integer(_)]
                        if frame_str(kind).as_deref() == Some("psubscribe")
                            && frame_str(p).as_deref() == Some(*pattern)
                ),
                _ => false,
            };
            if !confirmed {
                return Err(self.protocol(format!(
                    "unexpected PSUBSCRIBE reply for {pattern:?}: {reply:?}"
                )));
            }
        }
        Ok(())
    }

    /// Waits for the next notification.
    ///
    /// Returns `Ok(None)` when the peer closed the connection. Cancel-safe.
    pub async fn next_message(&mut self) -> Result<Option<PMessage>, WorkerError> {
        loop {
            match self.framed.next().await {
                None => return Ok(None),
                Some(Err(err)) => return Err(self.protocol(err.to_string())),
                Some(Ok(frame)) => match PMessage::from_frame(&frame) {
                    Some(msg) => return Ok(Some(msg)),
                    None => tracing::debug!(?frame, "skipping non-pmessage frame"),
                },
            }
        }
    }

    async fn send(&mut self, frame: BytesFrame) -> Result<(), WorkerError> {
        let addr = &self.addr;
        self.framed
            .send(frame)
            .await
            .map_err(|err| WorkerError::Protocol {
                addr: addr.clone(),
                reason: err.to_string(),
            })
    }

    async fn read_reply(&mut self) -> Result<BytesFrame, WorkerError> {
        match self.framed.next().await {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(err)) => Err(self.protocol(err.to_string())),
            None => Err(WorkerError::Closed {
                addr: self.addr.clone(),
            }),
        }
    }

    fn protocol(&self, reason: String) -> WorkerError {
        WorkerError::Protocol {
            addr: self.addr.clone(),
            reason,
        }
    }
}

/// Builds a RESP command array from string arguments.
pub(crate) fn command(args: &[&str]) -> BytesFrame {
    BytesFrame::Array(
        args.iter()
            .map(|a| BytesFrame::BulkString(Bytes::from(a.as_bytes().to_vec())))
            .collect(),
    )
}

fn frame_str(frame: &BytesFrame) -> Option<String> {
    match frame {
        BytesFrame::BulkString(b) | BytesFrame::SimpleString(b) => {
            Some(String::from_utf8_lossy(b).into_owned())
        }
        _ => None,
    }
}
