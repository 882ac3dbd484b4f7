//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use grommet::json::{JsonValue, decode};
use grommet::testing::{MockServer, MockSpawner};
use grommet::{ClientConfig, ConnectParams, ConnectionStatus, Context, SessionId};

/// Upper bound on `process_responses` calls a helper makes before giving up.
pub const MAX_POLLS: usize = 32;

/// A context backed by scripted servers.
pub fn mock_context() -> (Context, MockSpawner) {
    mock_context_with(ClientConfig::default())
}

/// A context with `config`, backed by scripted servers.
pub fn mock_context_with(config: ClientConfig) -> (Context, MockSpawner) {
    let spawner = MockSpawner::new();
    let context = Context::new(config).with_spawner(spawner.clone());
    (context, spawner)
}

/// Capabilities a typical server announces.
pub fn server_capabilities() -> JsonValue {
    decode(
        r#"{"textDocumentSync": 2, "hoverProvider": true, "definitionProvider": true, "renameProvider": false}"#,
    )
}

/// Connect `command` and complete its handshake.
pub fn connect_and_handshake(
    context: &mut Context,
    spawner: &MockSpawner,
    command: &str,
) -> (SessionId, MockServer) {
    let session = context
        .connect(command, &ConnectParams::default())
        .expect("connect should succeed");
    let server = spawner
        .server(spawner.spawn_count() - 1)
        .expect("a server was spawned");
    server
        .accept_initialize(command, "1.0.0", server_capabilities())
        .expect("initialize was sent");

    poll_until(context, |c| c.connection_status(session) == ConnectionStatus::Connected);
    (session, server)
}

/// Call `process_responses` until `done` holds.
///
/// # Panics
///
/// Panics after [`MAX_POLLS`] calls.
pub fn poll_until(context: &mut Context, mut done: impl FnMut(&Context) -> bool) {
    for _ in 0..MAX_POLLS {
        if done(context) {
            return;
        }
        context.process_responses();
    }
    assert!(done(context), "condition not reached after {MAX_POLLS} polls");
}

/// Call `process_responses` until a call makes no progress.
pub fn poll_idle(context: &mut Context) {
    for _ in 0..MAX_POLLS {
        if !context.process_responses() {
            return;
        }
    }
}
