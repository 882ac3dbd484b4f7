//! The engine context: owner of every session.

use std::collections::BTreeMap;
use std::fmt;

use grommet_json::JsonValue;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, ConnectParams};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{Error, Result};
use crate::rpc::RequestId;
use crate::session::capabilities::{ClientCapabilities, InitializeParams, ServerInfo};
use crate::session::{
    Completion, ConnectionStatus, PendingRequest, ServerNotification, Session, SessionId,
};
use crate::transport::{ProcessSpawner, Spawner};

/// Owns client configuration and every live session.
///
/// All progress happens in [`process_responses`](Self::process_responses);
/// nothing runs in the background. Dropping the context force-closes every
/// server.
pub struct Context {
    config: ClientConfig,
    spawner: Box<dyn Spawner>,
    sink: Box<dyn DiagnosticSink>,
    sessions: BTreeMap<SessionId, Session>,
    last_session_id: u64,
}

impl Context {
    /// Create a context that spawns real processes and mirrors debug
    /// traffic into `tracing`.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let spawner = ProcessSpawner::new(config.read_timeout());
        Self {
            config,
            spawner: Box::new(spawner),
            sink: Box::new(TracingSink),
            sessions: BTreeMap::new(),
            last_session_id: 0,
        }
    }

    /// Replace how server transports are created.
    #[must_use]
    pub fn with_spawner(mut self, spawner: impl Spawner + 'static) -> Self {
        self.spawner = Box::new(spawner);
        self
    }

    /// Replace where debug traffic is mirrored.
    #[must_use]
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// The current configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Set the name reported in `clientInfo` for later connections.
    pub fn set_client_name(&mut self, name: impl Into<String>) {
        self.config.client_name = name.into();
    }

    /// Set the version reported in `clientInfo` for later connections.
    pub fn set_client_version(&mut self, version: impl Into<String>) {
        self.config.client_version = version.into();
    }

    /// Set the locale reported in the handshake for later connections.
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.config.locale = locale.into();
    }

    /// Turn wire mirroring on or off. Takes effect immediately.
    pub fn set_debug(&mut self, debug: bool) {
        self.config.debug = debug;
    }

    /// Capabilities advertised by later connections.
    pub fn capabilities_mut(&mut self) -> &mut ClientCapabilities {
        &mut self.config.capabilities
    }

    /// Spawn `command` and start the `initialize` handshake.
    ///
    /// The returned session is `Connecting`; call
    /// [`process_responses`](Self::process_responses) until it is
    /// `Connected`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be spawned or the `initialize`
    /// request cannot be written. No session is registered in either case.
    pub fn connect(&mut self, command: &str, params: &ConnectParams) -> Result<SessionId> {
        let transport = self
            .spawner
            .spawn(command, &params.args)
            .inspect_err(|e| warn!(command, error = %e, "Failed to start server"))?;

        let id = SessionId::new(self.last_session_id + 1);
        self.last_session_id = id.get();

        let mut session = Session::new(id, command, transport);
        let initialize = InitializeParams::new(&self.config, params).build();
        let sink = mirror(self.config.debug, &*self.sink);
        if let Err(e) = session.begin_handshake(initialize, sink) {
            warn!(session = %id, command, error = %e, "Failed to send initialize");
            session.teardown();
            return Err(e.into());
        }

        info!(session = %id, command, "Connecting to server");
        self.sessions.insert(id, session);
        Ok(id)
    }

    /// Read from every session once and handle what arrived.
    ///
    /// Each session gets one bounded read, so a call takes at most the read
    /// timeout times the number of sessions. Returns `true` if any session
    /// read bytes or handled a message.
    pub fn process_responses(&mut self) -> bool {
        let sink = mirror(self.config.debug, &*self.sink);
        let mut progressed = false;
        self.sessions.retain(|_, session| {
            let outcome = session.pump(sink);
            progressed |= outcome.progressed;
            !outcome.finished
        });
        progressed
    }

    /// Ask a server to shut down.
    ///
    /// Sends `shutdown`; the session is removed once the server answers.
    /// Closing a session that is already shutting down does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSession`] for an unknown id. If `shutdown`
    /// cannot be written the session is torn down at once and the transport
    /// error returned.
    pub fn close(&mut self, id: SessionId) -> Result<()> {
        let sink = mirror(self.config.debug, &*self.sink);
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(Error::UnknownSession(id))?;
        if session.shutdown_requested() {
            debug!(session = %id, "Shutdown already pending");
            return Ok(());
        }

        if let Err(e) = session.request_shutdown(sink) {
            warn!(session = %id, error = %e, "Failed to send shutdown, closing now");
            self.sessions.remove(&id);
            return Err(e.into());
        }
        Ok(())
    }

    /// Handshake state of a session. Unknown ids are `NotConnected`.
    #[must_use]
    pub fn connection_status(&self, id: SessionId) -> ConnectionStatus {
        self.sessions
            .get(&id)
            .map_or(ConnectionStatus::NotConnected, Session::status)
    }

    /// Whether the server's output is still open.
    ///
    /// A session whose server has exited keeps its status until it is
    /// closed; this tells a dead server apart from an idle one. Unknown ids
    /// are not alive.
    #[must_use]
    pub fn is_alive(&self, id: SessionId) -> bool {
        self.sessions.get(&id).is_some_and(Session::is_alive)
    }

    /// What the server announced, once the session is `Connected`.
    #[must_use]
    pub fn server_info(&self, id: SessionId) -> Option<&ServerInfo> {
        self.sessions.get(&id).and_then(Session::server_info)
    }

    /// Send a request to a connected server.
    ///
    /// The response shows up in [`drain_completions`](Self::drain_completions).
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown, not yet connected, shutting
    /// down, or the write fails.
    pub fn send_request(
        &mut self,
        id: SessionId,
        method: &str,
        params: JsonValue,
    ) -> Result<RequestId> {
        let sink = mirror(self.config.debug, &*self.sink);
        let session = connected(&mut self.sessions, id)?;
        Ok(session.send_request(method, params, sink)?)
    }

    /// Send a notification to a connected server.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown, not yet connected, shutting
    /// down, or the write fails.
    pub fn send_notification(
        &mut self,
        id: SessionId,
        method: &str,
        params: JsonValue,
    ) -> Result<()> {
        let sink = mirror(self.config.debug, &*self.sink);
        let session = connected(&mut self.sessions, id)?;
        Ok(session.send_notification(method, params, sink)?)
    }

    /// Take the completed requests of a session, in arrival order.
    pub fn drain_completions(&mut self, id: SessionId) -> Vec<Completion> {
        self.sessions
            .get_mut(&id)
            .map(Session::drain_completions)
            .unwrap_or_default()
    }

    /// Take the notifications a server sent, in arrival order.
    pub fn drain_notifications(&mut self, id: SessionId) -> Vec<ServerNotification> {
        self.sessions
            .get_mut(&id)
            .map(Session::drain_notifications)
            .unwrap_or_default()
    }

    /// Requests still waiting for a response, ordered by id.
    #[must_use]
    pub fn pending_requests(&self, id: SessionId) -> Vec<&PendingRequest> {
        self.sessions
            .get(&id)
            .map(Session::pending_requests)
            .unwrap_or_default()
    }

    /// Ids of all live sessions, in creation order.
    #[must_use]
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Force-close every server and drop the context.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        for (id, mut session) in std::mem::take(&mut self.sessions) {
            debug!(session = %id, status = %session.status(), "Force-closing session");
            session.teardown();
        }
    }
}

fn mirror(debug: bool, sink: &dyn DiagnosticSink) -> Option<&dyn DiagnosticSink> {
    debug.then_some(sink)
}

fn connected(
    sessions: &mut BTreeMap<SessionId, Session>,
    id: SessionId,
) -> Result<&mut Session> {
    let session = sessions.get_mut(&id).ok_or(Error::UnknownSession(id))?;
    if session.shutdown_requested() {
        return Err(Error::ShutdownPending(id));
    }
    if session.status() != ConnectionStatus::Connected {
        return Err(Error::NotConnected(id));
    }
    Ok(session)
}
