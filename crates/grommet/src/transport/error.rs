//! Error types for transport operations.

use thiserror::Error;

/// Errors that can occur while talking to a server process.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server executable does not exist.
    #[error("{command} not found")]
    NotFound {
        /// The command that was not found.
        command: String,
    },

    /// The server process could not be started.
    #[error("failed to spawn server '{command}': {source}")]
    SpawnFailed {
        /// The command that failed to spawn.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The child process started without one of its piped streams.
    #[error("server process has no piped {0}")]
    MissingPipe(&'static str),

    /// I/O error communicating with the server.
    #[error("server communication error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed its output stream, or the transport was closed.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Create a "not found" error.
    #[must_use]
    pub fn not_found(command: &str) -> Self {
        Self::NotFound {
            command: command.to_string(),
        }
    }

    /// Create a spawn failed error.
    #[must_use]
    pub fn spawn_failed(command: &str, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            command: command.to_string(),
            source,
        }
    }

    /// Classify an error returned by `Command::spawn`.
    #[must_use]
    pub fn from_spawn(command: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::not_found(command)
        } else {
            Self::spawn_failed(command, source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn spawn_not_found_is_classified() {
        let err = TransportError::from_spawn("nope", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, TransportError::NotFound { ref command } if command == "nope"));
        assert_eq!(err.to_string(), "nope not found");
    }

    #[test]
    fn other_spawn_errors_keep_their_source() {
        let err = TransportError::from_spawn(
            "server",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, TransportError::SpawnFailed { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}
