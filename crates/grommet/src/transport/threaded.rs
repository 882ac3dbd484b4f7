//! Bounded pipe reads for platforms without `poll(2)` on pipes.
//!
//! A helper thread performs the blocking reads and forwards each chunk over a
//! channel; the transport waits on the channel with a timeout. The thread
//! exits when the pipe reaches end of stream or the receiver is dropped.

use std::io::{self, Read};
use std::process::ChildStdout;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use super::{READ_CHUNK_SIZE, TransportError};

type Chunk = io::Result<Vec<u8>>;

#[derive(Debug)]
pub(super) struct PipeReader {
    rx: Option<Receiver<Chunk>>,
}

impl PipeReader {
    pub(super) fn new(stdout: ChildStdout) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("grommet-pipe-reader".to_string())
            .spawn(move || pump(stdout, &tx))?;
        Ok(Self { rx: Some(rx) })
    }

    pub(super) fn read(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        let rx = self.rx.as_ref().ok_or(TransportError::Closed)?;
        match rx.recv_timeout(timeout) {
            Ok(Ok(bytes)) => Ok(Some(bytes)),
            Ok(Err(e)) => Err(e.into()),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                self.rx = None;
                Err(TransportError::Closed)
            }
        }
    }

    pub(super) fn close(&mut self) {
        self.rx = None;
    }
}

fn pump(mut stdout: ChildStdout, tx: &Sender<Chunk>) {
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match stdout.read(&mut buf) {
            // Dropping the sender tells the reader the stream ended.
            Ok(0) => return,
            Ok(n) => {
                if tx.send(Ok(buf[..n].to_vec())).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        }
    }
}
