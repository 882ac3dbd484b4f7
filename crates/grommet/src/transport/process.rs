//! Child process transport.

use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::Duration;

use tracing::{debug, warn};

use super::{DEFAULT_READ_TIMEOUT, Spawner, Transport, TransportError};

#[cfg(not(unix))]
use super::threaded::PipeReader;
#[cfg(unix)]
use super::unix::PipeReader;

/// Spawns servers as child processes with piped stdin/stdout.
#[derive(Debug, Clone)]
pub struct ProcessSpawner {
    read_timeout: Duration,
}

impl ProcessSpawner {
    /// Create a spawner whose transports wait up to `read_timeout` per read.
    #[must_use]
    pub fn new(read_timeout: Duration) -> Self {
        Self { read_timeout }
    }
}

impl Default for ProcessSpawner {
    fn default() -> Self {
        Self::new(DEFAULT_READ_TIMEOUT)
    }
}

impl Spawner for ProcessSpawner {
    fn spawn(&self, command: &str, args: &[String]) -> Result<Box<dyn Transport>, TransportError> {
        let transport = ProcessTransport::spawn(command, args, self.read_timeout)?;
        Ok(Box::new(transport))
    }
}

/// A running server process.
///
/// Dropping the transport kills and reaps the process.
#[derive(Debug)]
pub struct ProcessTransport {
    command: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    reader: PipeReader,
    read_timeout: Duration,
}

impl ProcessTransport {
    /// Start `command` with `args`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The executable is not found
    /// - The process fails to start
    /// - The process comes up without its piped streams, in which case it is
    ///   killed before returning
    pub fn spawn(
        command: &str,
        args: &[String],
        read_timeout: Duration,
    ) -> Result<Self, TransportError> {
        debug!(command, args = ?args, "Spawning server process");

        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| TransportError::from_spawn(command, e))?;

        let Some(stdin) = child.stdin.take() else {
            reap(command, &mut child);
            return Err(TransportError::MissingPipe("stdin"));
        };
        let Some(stdout) = child.stdout.take() else {
            reap(command, &mut child);
            return Err(TransportError::MissingPipe("stdout"));
        };
        let reader = match PipeReader::new(stdout) {
            Ok(reader) => reader,
            Err(e) => {
                reap(command, &mut child);
                return Err(TransportError::spawn_failed(command, e));
            }
        };

        debug!(command, pid = child.id(), "Server process started");

        Ok(Self {
            command: command.to_string(),
            child: Some(child),
            stdin: Some(stdin),
            reader,
            read_timeout,
        })
    }

    /// The command this transport was spawned from.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Transport for ProcessTransport {
    fn read(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.child.is_none() {
            return Err(TransportError::Closed);
        }
        self.reader.read(self.read_timeout)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let stdin = self.stdin.as_mut().ok_or(TransportError::Closed)?;
        stdin.write_all(bytes)?;
        stdin.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        // Closing stdin first lets a well-behaved server see EOF.
        self.stdin = None;
        self.reader.close();

        let Some(mut child) = self.child.take() else {
            return;
        };
        reap(&self.command, &mut child);
        debug!(command = %self.command, "Server process closed");
    }

    fn process_id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Kill and wait for a child so it does not linger as a zombie.
fn reap(command: &str, child: &mut Child) {
    if let Err(e) = child.kill() {
        // InvalidInput means the process already exited.
        if e.kind() != std::io::ErrorKind::InvalidInput {
            warn!(command, error = %e, "Failed to kill server process");
        }
    }
    if let Err(e) = child.wait() {
        warn!(command, error = %e, "Failed to reap server process");
    }
}
