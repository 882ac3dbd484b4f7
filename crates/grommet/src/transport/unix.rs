//! Bounded pipe reads with `poll(2)`.

use std::io::{self, Read};
use std::os::fd::AsFd;
use std::process::ChildStdout;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

use super::{READ_CHUNK_SIZE, TransportError};

#[derive(Debug)]
pub(super) struct PipeReader {
    stdout: Option<ChildStdout>,
}

impl PipeReader {
    #[allow(clippy::unnecessary_wraps)]
    pub(super) fn new(stdout: ChildStdout) -> io::Result<Self> {
        Ok(Self {
            stdout: Some(stdout),
        })
    }

    pub(super) fn read(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        let stdout = self.stdout.as_mut().ok_or(TransportError::Closed)?;

        let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
        let ready = {
            let mut fds = [PollFd::new(stdout.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, PollTimeout::from(millis)) {
                Ok(0) | Err(Errno::EINTR) => return Ok(None),
                Ok(_) => fds[0].revents().is_some_and(|events| {
                    events.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR)
                }),
                Err(errno) => return Err(TransportError::Io(errno.into())),
            }
        };
        if !ready {
            return Ok(None);
        }

        // poll reported the pipe readable, so this read does not block.
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        match stdout.read(&mut buf) {
            Ok(0) => {
                self.stdout = None;
                Err(TransportError::Closed)
            }
            Ok(n) => {
                buf.truncate(n);
                Ok(Some(buf))
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(super) fn close(&mut self) {
        self.stdout = None;
    }
}
