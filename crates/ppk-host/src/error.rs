//! Error types for transports and sessions.

use ppk_protocol::{DecodeError, MetadataError};
use thiserror::Error;

/// Errors raised by a [`Transport`](crate::transport::Transport)
/// implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The link is gone: the device side disconnected or the transport
    /// was never opened.
    #[error("transport closed")]
    Closed,

    /// Opening the link failed.
    #[error("failed to open transport: {0}")]
    Open(String),

    /// Delivering bytes to the device failed.
    #[error("failed to send to device: {0}")]
    Send(String),
}

/// Errors surfaced by a session, either returned from calls or published
/// on its event stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The operation requires a running session.
    #[error("session is not running")]
    NotRunning,

    /// `start` was called while a session is already active.
    #[error("session is already running")]
    AlreadyRunning,

    /// A trigger burst carried corrupt range bits.
    #[error("measurement decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The device's boot banner did not match the expected grammar.
    #[error("device metadata rejected: {0}")]
    Metadata(#[from] MetadataError),

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
