//! Command execution logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result, bail};
use grommet_json::encode;
use tracing::{debug, warn};

use super::ProbeArgs;
use super::output::{OutputConfig, render_report};
use crate::config::{ClientConfig, ConnectParams};
use crate::context::Context;
use crate::session::{ConnectionStatus, SessionId};

/// Load the configuration file, or defaults when none is given.
pub(super) fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(ClientConfig::default()),
    }
}

/// Execute the probe command
pub(super) fn execute_probe(mut config: ClientConfig, args: &ProbeArgs) -> Result<()> {
    config.debug |= args.debug;
    let timeout = Duration::from_millis(args.timeout_ms);

    let mut params = ConnectParams::default().args(args.args.iter().cloned());
    params.root_path.clone_from(&args.root);

    let mut context = Context::new(config);
    let session = context
        .connect(&args.command, &params)
        .with_context(|| format!("failed to start '{}'", args.command))?;

    if !poll_while(&mut context, session, timeout, ConnectionStatus::Connecting) {
        bail!(
            "'{}' did not complete the handshake within {} ms",
            args.command,
            args.timeout_ms
        );
    }
    let info = context
        .server_info(session)
        .with_context(|| format!("'{}' exited during the handshake", args.command))?;

    print!(
        "{}",
        render_report(&args.command, info, OutputConfig::from_env())
    );

    context.close(session)?;
    let drained = poll_while(&mut context, session, timeout, ConnectionStatus::Connected);
    if !drained {
        warn!(command = %args.command, "Server did not acknowledge shutdown, terminating it");
    }
    context.shutdown();
    Ok(())
}

/// Execute the capabilities command
#[allow(clippy::unnecessary_wraps)]
pub(super) fn execute_capabilities(config: &ClientConfig) -> Result<()> {
    println!("{}", encode(&config.capabilities.to_json()));
    Ok(())
}

/// Process responses while the session is in `status`.
///
/// Returns `false` if `timeout` elapsed first.
fn poll_while(
    context: &mut Context,
    session: SessionId,
    timeout: Duration,
    status: ConnectionStatus,
) -> bool {
    let deadline = Instant::now() + timeout;
    while context.connection_status(session) == status {
        if Instant::now() >= deadline {
            return false;
        }
        context.process_responses();
    }
    debug!(session = %session, status = %context.connection_status(session), "Session changed state");
    true
}
