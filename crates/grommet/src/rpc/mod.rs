//! JSON-RPC envelopes, wire framing and message classification.
//!
//! ## Wire format
//!
//! Every message is `Content-Length: N\r\n\r\n{json}` where `N` is the byte
//! length of the UTF-8 body. Outgoing messages carry only that header;
//! incoming header blocks may carry others, which are ignored.

mod envelope;
mod framing;
mod message;

use std::fmt;

use grommet_json::JsonValue;

pub use envelope::{JSONRPC_VERSION, frame, notification, request, response};
pub use framing::{FrameBuffer, FrameError, MAX_HEADER_SIZE, MAX_MESSAGE_SIZE};
pub use message::{Message, Response, ResponseError};

/// Method name of the handshake request.
pub const INITIALIZE: &str = "initialize";
/// Method name of the notification that completes the handshake.
pub const INITIALIZED: &str = "initialized";
/// Method name of the request that starts teardown.
pub const SHUTDOWN: &str = "shutdown";
/// Method name of the notification that tells the server to exit.
pub const EXIT: &str = "exit";

/// Identifier of a request sent by the client.
///
/// Ids are positive and issued in increasing order per session, starting
/// at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(i64);

impl RequestId {
    /// The first id issued by a session.
    pub const FIRST: Self = Self(1);

    /// Wrap a raw id. Returns `None` unless `raw` is positive.
    #[must_use]
    pub fn new(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// The raw id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// The id issued after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RequestId> for JsonValue {
    fn from(id: RequestId) -> Self {
        JsonValue::Integer(id.0)
    }
}
