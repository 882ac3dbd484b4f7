//! Grommet CLI binary.

use anyhow::Result;
use grommet::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so reports on stdout stay clean.
    // Example: RUST_LOG=grommet=debug,grommet::wire=debug grommet probe clangd
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("grommet=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting grommet CLI");

    let cli = Cli::parse_args();
    cli.execute()?;

    tracing::debug!("Grommet CLI completed successfully");
    Ok(())
}
