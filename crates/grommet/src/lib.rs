//! Grommet - a poll-driven JSON-RPC client engine.
//!
//! Grommet spawns Language Server Protocol style servers as child processes,
//! talks `Content-Length` framed JSON-RPC to them over stdin/stdout, performs
//! the `initialize` handshake and correlates responses with the requests that
//! caused them. Any number of servers can be connected at once; all progress
//! happens inside [`Context::process_responses`], so the engine never spawns
//! threads of its own or needs an async runtime.
//!
//! # Example
//!
//! ```no_run
//! use grommet::{ClientConfig, ConnectParams, ConnectionStatus, Context};
//!
//! let mut context = Context::new(ClientConfig::default());
//! let session = context.connect("rust-analyzer", &ConnectParams::default())?;
//!
//! while context.connection_status(session) == ConnectionStatus::Connecting {
//!     context.process_responses();
//! }
//!
//! if let Some(info) = context.server_info(session) {
//!     println!("connected to {:?}", info.name);
//! }
//!
//! // Two-phase close: the session goes away once the server answers.
//! context.close(session)?;
//! while context.connection_status(session) != ConnectionStatus::NotConnected {
//!     context.process_responses();
//! }
//! # Ok::<(), grommet::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod rpc;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::{ClientConfig, ConfigError, ConnectParams, TraceLevel, WorkspaceFolder};
pub use context::Context;
pub use diagnostics::{DiagnosticSink, Direction, MemorySink, TracingSink, WireRecord};
pub use error::{Error, Result};
pub use rpc::{FrameBuffer, FrameError, Message, RequestId, ResponseError};
pub use session::capabilities::{ClientCapabilities, ServerCapabilities, ServerInfo};
pub use session::{
    Completion, ConnectionStatus, PendingRequest, ServerNotification, SessionId,
};
pub use transport::{ProcessSpawner, Spawner, Transport, TransportError};

pub use grommet_json as json;
