//! Error types for grommet operations.

use thiserror::Error;

use crate::config::ConfigError;
use crate::session::SessionId;
use crate::transport::TransportError;

/// The error type for [`Context`](crate::Context) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Spawning, reading from or writing to a server failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No live session has this id.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    /// The session has not finished the `initialize` handshake.
    #[error("session {0} is not connected")]
    NotConnected(SessionId),

    /// The session has been asked to shut down and accepts no new traffic.
    #[error("session {0} is shutting down")]
    ShutdownPending(SessionId),

    /// Loading configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A specialized Result type for grommet operations.
pub type Result<T> = std::result::Result<T, Error>;
