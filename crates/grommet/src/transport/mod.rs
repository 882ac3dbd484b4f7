//! Process and pipe transport.
//!
//! A [`Transport`] is a byte pipe to one server: bounded reads from its
//! output, full writes to its input, and forced termination. Higher layers
//! only ever see the trait; [`ProcessSpawner`] produces the real child
//! process implementation, choosing the platform-specific read strategy at
//! build time.
//!
//! ## Design Notes
//!
//! - Unix waits for output with `poll(2)` on the child's stdout
//! - Other platforms move the blocking pipe read onto a helper thread and
//!   wait on a channel with a timeout
//! - The server's stderr is discarded

mod error;
mod process;

#[cfg(not(unix))]
mod threaded;
#[cfg(unix)]
mod unix;

use std::time::Duration;

pub use error::TransportError;
pub use process::{ProcessSpawner, ProcessTransport};

/// How long a single read waits for server output by default.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Upper bound on the bytes returned by one read.
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// A bidirectional byte pipe to a server.
pub trait Transport: Send {
    /// Wait a bounded time for server output.
    ///
    /// Returns `Ok(None)` if nothing arrived in time and `Ok(Some(bytes))`
    /// with whatever was available otherwise. The bytes are not aligned to
    /// message boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] once the server's output stream has
    /// ended or the transport has been closed, or an I/O error.
    fn read(&mut self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Write all of `bytes` to the server and flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. Nothing is retried.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Terminate the server and release its pipes. Safe to call repeatedly.
    fn close(&mut self);

    /// Operating system id of the server process, while it is running.
    fn process_id(&self) -> Option<u32>;
}

/// Creates transports for server commands.
pub trait Spawner: Send {
    /// Start `command` with `args` and return a transport connected to it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotFound`] or [`TransportError::SpawnFailed`]
    /// if the process cannot be started. No process is left running on error.
    fn spawn(&self, command: &str, args: &[String]) -> Result<Box<dyn Transport>, TransportError>;
}

/// Id of the current process, reported to servers during the handshake.
#[must_use]
pub fn current_process_id() -> u32 {
    std::process::id()
}
