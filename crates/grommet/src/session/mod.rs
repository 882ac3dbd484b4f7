//! Per-server protocol state.
//!
//! A [`Session`] owns one server's transport, its pending requests, the
//! frame buffer for its output and whatever the handshake negotiated. The
//! [`Context`](crate::Context) owns the sessions and drives them.
//!
//! ## Lifecycle
//!
//! ```text
//! connect ──> Connecting ──(initialize result)──> Connected
//!                 │                                   │
//!                 └────────── close: shutdown ────────┘
//!                                  │
//!                     (shutdown response) exit, removed
//! ```

pub mod capabilities;

use std::collections::{HashMap, VecDeque};
use std::fmt;

use grommet_json::{JsonValue, encode, try_decode};
use tracing::{debug, info, trace, warn};

use crate::diagnostics::DiagnosticSink;
use crate::rpc::{
    self, EXIT, INITIALIZE, INITIALIZED, Message, RequestId, Response, ResponseError, SHUTDOWN,
};
use crate::transport::{Transport, TransportError};

use capabilities::ServerInfo;

/// Most completions or notifications a session holds before dropping the
/// oldest. Callers that never drain keep at most this many of each.
pub const MAX_QUEUED_MESSAGES: usize = 1024;

/// Identifier of a session within a [`Context`](crate::Context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// An id that never names a session.
    pub const INVALID: Self = Self(0);

    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns `false` for [`SessionId::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a session is in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// No such session, or it has been torn down.
    NotConnected,
    /// `initialize` sent, no successful response yet.
    Connecting,
    /// Handshake complete.
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotConnected => "not connected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        })
    }
}

/// A request awaiting its response.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    /// The request id.
    pub id: RequestId,
    /// The method name.
    pub method: String,
    /// The request as encoded on the wire, without framing.
    pub payload: String,
}

/// A response matched to a request other than `initialize` or `shutdown`.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Id of the request this answers.
    pub id: RequestId,
    /// Method of the request this answers.
    pub method: String,
    /// The result, or the server's error object.
    pub result: Result<JsonValue, ResponseError>,
}

/// A notification sent by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerNotification {
    /// The method name.
    pub method: String,
    /// The parameters, `null` when absent.
    pub params: JsonValue,
}

/// What one pump of a session achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PumpOutcome {
    /// Bytes were read or a frame was handled.
    pub progressed: bool,
    /// The shutdown response arrived and the session has been torn down.
    pub finished: bool,
}

/// One connected or connecting server.
pub(crate) struct Session {
    id: SessionId,
    command: String,
    transport: Box<dyn Transport>,
    status: ConnectionStatus,
    pending: HashMap<RequestId, PendingRequest>,
    next_request_id: RequestId,
    frames: rpc::FrameBuffer,
    server_info: Option<ServerInfo>,
    completions: VecDeque<Completion>,
    notifications: VecDeque<ServerNotification>,
    stream_closed: bool,
    shutdown_requested: bool,
}

impl Session {
    pub(crate) fn new(id: SessionId, command: &str, transport: Box<dyn Transport>) -> Self {
        Self {
            id,
            command: command.to_string(),
            transport,
            status: ConnectionStatus::NotConnected,
            pending: HashMap::new(),
            next_request_id: RequestId::FIRST,
            frames: rpc::FrameBuffer::new(),
            server_info: None,
            completions: VecDeque::new(),
            notifications: VecDeque::new(),
            stream_closed: false,
            shutdown_requested: false,
        }
    }

    pub(crate) fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub(crate) fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    pub(crate) fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// `false` once the server's output has ended.
    pub(crate) fn is_alive(&self) -> bool {
        !self.stream_closed
    }

    pub(crate) fn pending_requests(&self) -> Vec<&PendingRequest> {
        let mut pending: Vec<&PendingRequest> = self.pending.values().collect();
        pending.sort_by_key(|p| p.id);
        pending
    }

    pub(crate) fn drain_completions(&mut self) -> Vec<Completion> {
        self.completions.drain(..).collect()
    }

    pub(crate) fn drain_notifications(&mut self) -> Vec<ServerNotification> {
        self.notifications.drain(..).collect()
    }

    /// Send `initialize` and enter `Connecting`.
    pub(crate) fn begin_handshake(
        &mut self,
        params: JsonValue,
        sink: Option<&dyn DiagnosticSink>,
    ) -> Result<RequestId, TransportError> {
        let id = self.send_request(INITIALIZE, params, sink)?;
        self.status = ConnectionStatus::Connecting;
        debug!(session = %self.id, status = %self.status, "Handshake started");
        Ok(id)
    }

    /// Send `shutdown`; teardown waits for its response.
    pub(crate) fn request_shutdown(
        &mut self,
        sink: Option<&dyn DiagnosticSink>,
    ) -> Result<RequestId, TransportError> {
        let id = self.send_request(SHUTDOWN, JsonValue::Null, sink)?;
        self.shutdown_requested = true;
        debug!(session = %self.id, request_id = %id, "Shutdown requested");
        Ok(id)
    }

    /// Send a request and record it as pending.
    ///
    /// The id is consumed even if the write fails, so ids are never reused.
    pub(crate) fn send_request(
        &mut self,
        method: &str,
        params: JsonValue,
        sink: Option<&dyn DiagnosticSink>,
    ) -> Result<RequestId, TransportError> {
        let id = self.next_request_id;
        self.next_request_id = id.next();

        let envelope = rpc::request(id, method, params);
        let payload = self.write_envelope(&envelope, sink)?;
        debug!(session = %self.id, method, request_id = %id, "Sent request");

        self.pending.insert(
            id,
            PendingRequest {
                id,
                method: method.to_string(),
                payload,
            },
        );
        Ok(id)
    }

    /// Send a notification. Nothing is tracked.
    pub(crate) fn send_notification(
        &mut self,
        method: &str,
        params: JsonValue,
        sink: Option<&dyn DiagnosticSink>,
    ) -> Result<(), TransportError> {
        let envelope = rpc::notification(method, params);
        self.write_envelope(&envelope, sink)?;
        debug!(session = %self.id, method, "Sent notification");
        Ok(())
    }

    /// Encode, mirror and write one envelope. Returns the encoded body.
    fn write_envelope(
        &mut self,
        envelope: &JsonValue,
        sink: Option<&dyn DiagnosticSink>,
    ) -> Result<String, TransportError> {
        let body = encode(envelope);
        if let Some(sink) = sink {
            sink.outgoing(self.id, &body);
        }
        trace!(session = %self.id, body_len = body.len(), "Writing message");
        self.transport.write(&rpc::frame(&body))?;
        Ok(body)
    }

    /// Do one bounded read and handle every complete frame.
    pub(crate) fn pump(&mut self, sink: Option<&dyn DiagnosticSink>) -> PumpOutcome {
        let mut outcome = PumpOutcome::default();
        if self.stream_closed {
            return outcome;
        }

        match self.transport.read() {
            Ok(Some(bytes)) => {
                trace!(session = %self.id, bytes = bytes.len(), "Read from server");
                self.frames.extend(&bytes);
                outcome.progressed = true;
            }
            Ok(None) => {}
            Err(TransportError::Closed) => {
                warn!(session = %self.id, command = %self.command, "Server closed its output");
                self.stream_closed = true;
            }
            Err(e) => {
                warn!(session = %self.id, command = %self.command, error = %e, "Read from server failed");
                self.stream_closed = true;
            }
        }

        while let Some(frame) = self.frames.next_frame() {
            outcome.progressed = true;
            match frame {
                Ok(body) => {
                    if self.handle_frame(&body, sink) {
                        outcome.finished = true;
                        break;
                    }
                }
                Err(e) => warn!(session = %self.id, error = %e, "Dropping malformed frame"),
            }
        }
        outcome
    }

    /// Returns `true` when the frame completed the shutdown.
    fn handle_frame(&mut self, body: &[u8], sink: Option<&dyn DiagnosticSink>) -> bool {
        let text = match std::str::from_utf8(body) {
            Ok(text) => text,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Dropping message that is not UTF-8");
                return false;
            }
        };
        if let Some(sink) = sink {
            sink.incoming(self.id, text);
        }

        let value = match try_decode(text) {
            Ok(value) => value,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Dropping undecodable message");
                return false;
            }
        };

        match Message::classify(value) {
            Some(Message::Response(response)) => return self.handle_response(response, sink),
            Some(Message::Request { id, method, .. }) => {
                // Acknowledge server requests (progress creation, configuration,
                // registration) with a null result.
                trace!(session = %self.id, method = %method, "Acknowledging server request");
                let envelope = rpc::response(id, JsonValue::Null);
                if let Err(e) = self.write_envelope(&envelope, sink) {
                    warn!(session = %self.id, method = %method, error = %e, "Failed to answer server request");
                }
            }
            Some(Message::Notification { method, params }) => {
                trace!(session = %self.id, method = %method, "Received notification");
                if push_bounded(&mut self.notifications, ServerNotification { method, params }) {
                    debug!(session = %self.id, limit = MAX_QUEUED_MESSAGES, "Dropped oldest undrained notification");
                }
            }
            None => warn!(session = %self.id, "Dropping message that is not JSON-RPC"),
        }
        false
    }

    fn handle_response(&mut self, response: Response, sink: Option<&dyn DiagnosticSink>) -> bool {
        let Some(pending) = response
            .request_id()
            .and_then(|id| self.pending.remove(&id))
        else {
            trace!(session = %self.id, id = %response.id, "Dropping response with no pending request");
            return false;
        };

        match pending.method.as_str() {
            INITIALIZE => {
                self.finish_handshake(response, sink);
                false
            }
            SHUTDOWN => {
                self.finish_shutdown(sink);
                true
            }
            _ => {
                debug!(session = %self.id, method = %pending.method, request_id = %pending.id, "Request completed");
                let completion = Completion {
                    id: pending.id,
                    method: pending.method,
                    result: response.into_result(),
                };
                if push_bounded(&mut self.completions, completion) {
                    debug!(session = %self.id, limit = MAX_QUEUED_MESSAGES, "Dropped oldest undrained completion");
                }
                false
            }
        }
    }

    fn finish_handshake(&mut self, response: Response, sink: Option<&dyn DiagnosticSink>) {
        let result = match response.into_result() {
            Ok(result) => result,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Server rejected initialize");
                return;
            }
        };
        if self.status != ConnectionStatus::Connecting {
            return;
        }

        let info = ServerInfo::from_initialize_result(&result);
        if self.shutdown_requested {
            // Only `exit` may follow `shutdown`.
            debug!(session = %self.id, "Handshake finished after shutdown, skipping initialized");
            self.server_info = Some(info);
            return;
        }

        info!(
            session = %self.id,
            server = info.name.as_deref().unwrap_or("unknown"),
            version = info.version.as_deref().unwrap_or("unknown"),
            "Connected"
        );
        self.server_info = Some(info);
        self.status = ConnectionStatus::Connected;

        if let Err(e) = self.send_notification(INITIALIZED, JsonValue::object(), sink) {
            warn!(session = %self.id, error = %e, "Failed to send initialized notification");
        }
    }

    fn finish_shutdown(&mut self, sink: Option<&dyn DiagnosticSink>) {
        if let Err(e) = self.send_notification(EXIT, JsonValue::Null, sink) {
            warn!(session = %self.id, error = %e, "Failed to send exit notification");
        }
        self.teardown();
        info!(session = %self.id, command = %self.command, "Session closed");
    }

    /// Close the transport and release protocol state.
    pub(crate) fn teardown(&mut self) {
        self.transport.close();
        self.pending.clear();
        self.server_info = None;
        self.frames = rpc::FrameBuffer::new();
        self.status = ConnectionStatus::NotConnected;
        self.stream_closed = true;
    }
}

/// Append to a queue, evicting the oldest entry at [`MAX_QUEUED_MESSAGES`].
/// Returns `true` if an entry was evicted.
fn push_bounded<T>(queue: &mut VecDeque<T>, item: T) -> bool {
    let evicted = queue.len() >= MAX_QUEUED_MESSAGES && queue.pop_front().is_some();
    queue.push_back(item);
    evicted
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("command", &self.command)
            .field("status", &self.status)
            .field("pending", &self.pending.len())
            .field("pid", &self.transport.process_id())
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.transport.close();
    }
}
