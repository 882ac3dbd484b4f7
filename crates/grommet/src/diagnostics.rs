//! Diagnostic mirroring of raw wire traffic.
//!
//! When the debug flag is on, every JSON body written to or read from a
//! server is handed to the context's [`DiagnosticSink`]. The default
//! [`TracingSink`] turns it into `debug` events on the `grommet::wire`
//! target; [`MemorySink`] keeps it for inspection in tests.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::session::SessionId;

/// Which way a message travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client to server.
    Outgoing,
    /// Server to client.
    Incoming,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outgoing => f.write_str("-->"),
            Self::Incoming => f.write_str("<--"),
        }
    }
}

/// Receives raw JSON text as it crosses the wire.
pub trait DiagnosticSink: Send {
    /// Called with each body sent to a server.
    fn outgoing(&self, session: SessionId, text: &str);

    /// Called with each body received from a server.
    fn incoming(&self, session: SessionId, text: &str);
}

/// Mirrors traffic into `tracing` on the `grommet::wire` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn outgoing(&self, session: SessionId, text: &str) {
        debug!(target: "grommet::wire", session = %session, direction = %Direction::Outgoing, "{text}");
    }

    fn incoming(&self, session: SessionId, text: &str) {
        debug!(target: "grommet::wire", session = %session, direction = %Direction::Incoming, "{text}");
    }
}

/// One mirrored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRecord {
    /// The session the message belongs to.
    pub session: SessionId,
    /// Which way it travelled.
    pub direction: Direction,
    /// The JSON body.
    pub text: String,
    /// When it was mirrored.
    pub at: DateTime<Utc>,
}

/// Records traffic in memory.
///
/// Clones share the same record list, so a test can keep one clone and hand
/// the other to a [`Context`](crate::Context).
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<WireRecord>>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything recorded so far.
    #[must_use]
    pub fn records(&self) -> Vec<WireRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Texts recorded in one direction, in order.
    #[must_use]
    pub fn texts(&self, direction: Direction) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.direction == direction)
            .map(|r| r.text)
            .collect()
    }

    fn push(&self, session: SessionId, direction: Direction, text: &str) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(WireRecord {
                session,
                direction,
                text: text.to_string(),
                at: Utc::now(),
            });
    }
}

impl DiagnosticSink for MemorySink {
    fn outgoing(&self, session: SessionId, text: &str) {
        self.push(session, Direction::Outgoing, text);
    }

    fn incoming(&self, session: SessionId, text: &str) {
        self.push(session, Direction::Incoming, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_clones_share_records() {
        let sink = MemorySink::new();
        let handle = sink.clone();
        let session = SessionId::new(1);

        sink.outgoing(session, "{}");
        sink.incoming(session, "[]");

        let records = handle.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].direction, Direction::Outgoing);
        assert_eq!(records[1].text, "[]");
        assert!(records[0].at <= records[1].at);
        assert_eq!(handle.texts(Direction::Incoming), vec!["[]".to_string()]);
    }

    #[test]
    fn direction_displays_as_arrow() {
        assert_eq!(Direction::Outgoing.to_string(), "-->");
        assert_eq!(Direction::Incoming.to_string(), "<--");
    }
}
