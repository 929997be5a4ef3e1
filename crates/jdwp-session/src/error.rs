//! Errors returned by the session layer.

use std::time::Duration;

use jdwp_core::ProtocolError;
use thiserror::Error;

use crate::session::SessionState;

/// Errors that can occur while starting, using, or stopping a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation is not allowed in the session's current state.
    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// The peer sent bytes that are not a valid packet, or a request could
    /// not be framed.
    #[error("framing error: {0}")]
    Framing(#[from] ProtocolError),

    /// Reading from or writing to the connection failed or timed out.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The `JDWP-Handshake` exchange failed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// A reply arrived for an id with no pending request.
    ///
    /// The inbound loop logs and drops such replies; callers never see it.
    #[error("no pending request for reply id {0}")]
    UnknownCorrelation(u32),

    /// The session ended before a reply arrived, or the queues are closed.
    #[error("session channel closed")]
    ChannelClosed,

    /// No reply arrived within the caller's deadline.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// Dialling the target failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
