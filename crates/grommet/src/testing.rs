//! Scripted in-memory servers for tests.
//!
//! Enabled by `#[cfg(test)]` or the `test-util` feature:
//!
//! ```toml
//! [dev-dependencies]
//! grommet = { version = "...", features = ["test-util"] }
//! ```
//!
//! A [`MockSpawner`] hands out [`MockServer`] transports instead of child
//! processes. The test keeps a clone of the spawner, looks up the server a
//! session was given, queues what the server should "send", and inspects
//! what the client wrote.
//!
//! ```rust,ignore
//! use grommet::testing::MockSpawner;
//! use grommet::json::JsonValue;
//! use grommet::{ClientConfig, ConnectParams, ConnectionStatus, Context};
//!
//! let spawner = MockSpawner::new();
//! let mut context = Context::new(ClientConfig::default()).with_spawner(spawner.clone());
//! let session = context.connect("fake-ls", &ConnectParams::default())?;
//!
//! spawner
//!     .server(0)
//!     .unwrap()
//!     .accept_initialize("fake-ls", "1.0", JsonValue::object());
//! context.process_responses();
//! assert_eq!(context.connection_status(session), ConnectionStatus::Connected);
//! ```

use std::collections::{HashSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use grommet_json::{JsonValue, encode, try_decode};

use crate::rpc::{self, FrameBuffer, JSONRPC_VERSION};
use crate::transport::{Spawner, Transport, TransportError};

/// Process id reported by the first mock server; later ones count up.
pub const FIRST_MOCK_PID: u32 = 4000;

#[derive(Debug, Default)]
struct ServerState {
    inbound: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    output_ended: bool,
    fail_writes: bool,
    closed: bool,
    close_calls: usize,
}

/// Handle to one scripted server.
///
/// Clones share state with the transport given to the session.
#[derive(Debug, Clone)]
pub struct MockServer {
    command: String,
    args: Vec<String>,
    pid: u32,
    state: Arc<Mutex<ServerState>>,
}

impl MockServer {
    fn new(command: &str, args: &[String], pid: u32) -> Self {
        Self {
            command: command.to_string(),
            args: args.to_vec(),
            pid,
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The command the session was started with.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The arguments the session was started with.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Queue raw bytes. Each call is delivered by a separate read.
    pub fn queue_bytes(&self, bytes: impl Into<Vec<u8>>) {
        self.state().inbound.push_back(bytes.into());
    }

    /// Queue one framed message body.
    pub fn queue_body(&self, body: &str) {
        self.queue_bytes(rpc::frame(body));
    }

    /// Queue one framed JSON message.
    pub fn queue_message(&self, message: &JsonValue) {
        self.queue_body(&encode(message));
    }

    /// Queue a success response.
    pub fn respond(&self, id: impl Into<JsonValue>, result: JsonValue) {
        self.queue_message(&rpc::response(id.into(), result));
    }

    /// Queue an error response.
    pub fn respond_error(&self, id: impl Into<JsonValue>, code: i64, message: &str) {
        let mut error = JsonValue::object();
        error.set("code", code);
        error.set("message", JsonValue::string(message));

        let mut envelope = JsonValue::object();
        envelope.set("jsonrpc", JSONRPC_VERSION);
        envelope.set("id", id);
        envelope.set("error", error);
        self.queue_message(&envelope);
    }

    /// Queue a notification from the server.
    pub fn notify(&self, method: &str, params: JsonValue) {
        self.queue_message(&rpc::notification(method, params));
    }

    /// Queue a server-to-client request.
    pub fn request(&self, id: impl Into<JsonValue>, method: &str, params: JsonValue) {
        let mut envelope = rpc::notification(method, params);
        envelope.set("id", id);
        self.queue_message(&envelope);
    }

    /// Answer the most recent client request for `method` with `result`.
    ///
    /// Returns the id answered, or `None` if no such request was written.
    pub fn respond_to(&self, method: &str, result: JsonValue) -> Option<i64> {
        let id = self.last_request_id(method)?;
        self.respond(id, result);
        Some(id)
    }

    /// Answer the client's `initialize` with a server identity and
    /// capabilities.
    pub fn accept_initialize(&self, name: &str, version: &str, capabilities: JsonValue) -> Option<i64> {
        let mut info = JsonValue::object();
        info.set("name", JsonValue::string(name));
        info.set("version", JsonValue::string(version));

        let mut result = JsonValue::object();
        result.set("capabilities", capabilities);
        result.set("serverInfo", info);
        self.respond_to(rpc::INITIALIZE, result)
    }

    /// Id of the most recent client request for `method`.
    #[must_use]
    pub fn last_request_id(&self, method: &str) -> Option<i64> {
        self.written_messages()
            .iter()
            .rev()
            .find(|m| m["method"].as_str() == Some(method) && !m["id"].is_null())
            .and_then(|m| m["id"].as_i64())
    }

    /// End the server's output; later reads report the stream closed.
    pub fn end_output(&self) {
        self.state().output_ended = true;
    }

    /// Make every later write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Everything the client wrote, as raw bytes.
    #[must_use]
    pub fn written_bytes(&self) -> Vec<u8> {
        self.state().written.clone()
    }

    /// Everything the client wrote, unframed and decoded.
    ///
    /// # Panics
    ///
    /// Panics if the client wrote a malformed frame or invalid JSON.
    #[must_use]
    pub fn written_messages(&self) -> Vec<JsonValue> {
        let mut frames = FrameBuffer::new();
        frames.extend(&self.written_bytes());

        let mut messages = Vec::new();
        while let Some(frame) = frames.next_frame() {
            let body = frame.unwrap_or_else(|e| panic!("client wrote a bad frame: {e}"));
            let text = String::from_utf8(body).unwrap_or_else(|e| panic!("client wrote non-UTF-8: {e}"));
            let message = try_decode(&text).unwrap_or_else(|e| panic!("client wrote bad JSON: {e}"));
            messages.push(message);
        }
        messages
    }

    /// Method names of everything the client wrote, `<response>` for
    /// responses.
    #[must_use]
    pub fn written_methods(&self) -> Vec<String> {
        self.written_messages()
            .iter()
            .map(|m| m["method"].as_str().unwrap_or("<response>").to_string())
            .collect()
    }

    /// Whether the transport has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// How many times the transport's `close` was called.
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.state().close_calls
    }
}

/// The transport half of a [`MockServer`].
#[derive(Debug)]
struct MockTransport {
    server: MockServer,
}

impl Transport for MockTransport {
    fn read(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut state = self.server.state();
        if state.closed {
            return Err(TransportError::Closed);
        }
        match state.inbound.pop_front() {
            Some(bytes) => Ok(Some(bytes)),
            None if state.output_ended => Err(TransportError::Closed),
            None => Ok(None),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.server.state();
        if state.closed {
            return Err(TransportError::Closed);
        }
        if state.fail_writes {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe).into());
        }
        state.written.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.server.state();
        state.closed = true;
        state.close_calls += 1;
    }

    fn process_id(&self) -> Option<u32> {
        (!self.server.state().closed).then_some(self.server.pid)
    }
}

#[derive(Debug, Default)]
struct SpawnerState {
    servers: Vec<MockServer>,
    missing: HashSet<String>,
    fail_writes_on_spawn: bool,
}

/// Spawns [`MockServer`]s.
///
/// Clones share state, so a test can pass one clone to
/// [`Context::with_spawner`](crate::Context::with_spawner) and keep another
/// to reach the servers.
#[derive(Debug, Clone, Default)]
pub struct MockSpawner {
    state: Arc<Mutex<SpawnerState>>,
}

impl MockSpawner {
    /// Create a spawner with no servers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SpawnerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make spawning `command` fail as if the executable did not exist.
    pub fn fail_command(&self, command: &str) {
        self.state().missing.insert(command.to_string());
    }

    /// Start later servers with failing writes.
    pub fn fail_writes_on_spawn(&self, fail: bool) {
        self.state().fail_writes_on_spawn = fail;
    }

    /// The `index`-th server spawned, counting from zero.
    #[must_use]
    pub fn server(&self, index: usize) -> Option<MockServer> {
        self.state().servers.get(index).cloned()
    }

    /// How many servers were spawned.
    #[must_use]
    pub fn spawn_count(&self) -> usize {
        self.state().servers.len()
    }
}

impl Spawner for MockSpawner {
    fn spawn(&self, command: &str, args: &[String]) -> Result<Box<dyn Transport>, TransportError> {
        let mut state = self.state();
        if state.missing.contains(command) {
            return Err(TransportError::not_found(command));
        }

        let pid = u32::try_from(state.servers.len())
            .map_or(u32::MAX, |n| FIRST_MOCK_PID.saturating_add(n));
        let server = MockServer::new(command, args, pid);
        server.fail_writes(state.fail_writes_on_spawn);
        state.servers.push(server.clone());
        Ok(Box::new(MockTransport { server }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_deliver_queued_chunks_in_order() {
        let spawner = MockSpawner::new();
        let mut transport = spawner.spawn("srv", &[]).unwrap();
        let server = spawner.server(0).unwrap();

        server.queue_bytes(b"ab".to_vec());
        server.queue_bytes(b"cd".to_vec());

        assert_eq!(transport.read().unwrap(), Some(b"ab".to_vec()));
        assert_eq!(transport.read().unwrap(), Some(b"cd".to_vec()));
        assert_eq!(transport.read().unwrap(), None);

        server.end_output();
        assert!(matches!(transport.read(), Err(TransportError::Closed)));
    }

    #[test]
    fn written_frames_are_decoded() {
        let spawner = MockSpawner::new();
        let mut transport = spawner.spawn("srv", &["--stdio".to_string()]).unwrap();
        let server = spawner.server(0).unwrap();

        transport.write(&rpc::frame(r#"{"jsonrpc": "2.0", "id": 1, "method": "initialize"}"#)).unwrap();
        transport.write(&rpc::frame(r#"{"jsonrpc": "2.0", "method": "initialized"}"#)).unwrap();

        assert_eq!(server.args(), ["--stdio".to_string()]);
        assert_eq!(server.written_methods(), vec!["initialize", "initialized"]);
        assert_eq!(server.last_request_id("initialize"), Some(1));
        assert_eq!(server.last_request_id("initialized"), None);
    }

    #[test]
    fn close_is_counted_and_stops_traffic() {
        let spawner = MockSpawner::new();
        let mut transport = spawner.spawn("srv", &[]).unwrap();
        let server = spawner.server(0).unwrap();
        assert_eq!(transport.process_id(), Some(FIRST_MOCK_PID));

        transport.close();
        transport.close();

        assert_eq!(server.close_calls(), 2);
        assert_eq!(transport.process_id(), None);
        assert!(matches!(transport.write(b"x"), Err(TransportError::Closed)));
    }

    #[test]
    fn missing_commands_fail_to_spawn() {
        let spawner = MockSpawner::new();
        spawner.fail_command("nope");

        assert!(matches!(
            spawner.spawn("nope", &[]),
            Err(TransportError::NotFound { .. })
        ));
        assert_eq!(spawner.spawn_count(), 0);
    }
}
