//! Command-line interface for the `grommet` binary.
//!
//! # Commands
//!
//! - `probe`: start a server, complete the handshake, report what it
//!   announced, then shut it down
//! - `capabilities`: print the capability advertisement a configuration
//!   produces
//!
//! # Example
//!
//! ```bash
//! grommet probe rust-analyzer --root . --timeout-ms 10000
//! grommet probe --debug -- pyright-langserver --stdio
//! grommet capabilities --config grommet.yaml
//! ```

mod execute;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use output::{OutputConfig, render_report};

/// Grommet - a JSON-RPC client for Language Server Protocol style servers
///
/// Starts servers as child processes and speaks `Content-Length` framed
/// JSON-RPC to them over stdin/stdout.
#[derive(Parser, Debug)]
#[command(name = "grommet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML client configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Connect to a server and report its identity and capabilities
    ///
    /// The server is shut down again once the report is printed.
    Probe(ProbeArgs),

    /// Print the client capabilities sent in `initialize`
    Capabilities,
}

/// Arguments for the `probe` command
#[derive(Parser, Debug, Clone)]
pub struct ProbeArgs {
    /// Server executable
    pub command: String,

    /// Arguments passed to the server
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Workspace root announced to the server
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// How long to wait for the handshake and for shutdown, in milliseconds
    #[arg(long, default_value = "5000")]
    pub timeout_ms: u64,

    /// Log raw JSON traffic (shown with `RUST_LOG=grommet::wire=debug`)
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments from the environment
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Run the selected command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the command
    /// fails.
    pub fn execute(&self) -> Result<()> {
        let config = execute::load_config(self.config.as_deref())?;
        match &self.command {
            Commands::Probe(args) => execute::execute_probe(config, args),
            Commands::Capabilities => execute::execute_capabilities(&config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_with_server_args() {
        let cli = Cli::try_parse_from(["grommet", "probe", "pyright-langserver", "--stdio"]).unwrap();
        let Commands::Probe(args) = cli.command else {
            panic!("Expected Probe command");
        };
        assert_eq!(args.command, "pyright-langserver");
        assert_eq!(args.args, vec!["--stdio"]);
        assert_eq!(args.timeout_ms, 5000);
        assert!(!args.debug);
    }

    #[test]
    fn test_parse_probe_options() {
        let cli = Cli::try_parse_from([
            "grommet",
            "probe",
            "--root",
            "/tmp/project",
            "--timeout-ms",
            "250",
            "--debug",
            "clangd",
        ])
        .unwrap();
        let Commands::Probe(args) = cli.command else {
            panic!("Expected Probe command");
        };
        assert_eq!(args.command, "clangd");
        assert!(args.args.is_empty());
        assert_eq!(args.root, Some(PathBuf::from("/tmp/project")));
        assert_eq!(args.timeout_ms, 250);
        assert!(args.debug);
    }

    #[test]
    fn test_parse_global_config() {
        let cli = Cli::try_parse_from(["grommet", "capabilities", "--config", "grommet.yaml"]).unwrap();
        assert!(matches!(cli.command, Commands::Capabilities));
        assert_eq!(cli.config, Some(PathBuf::from("grommet.yaml")));
    }

    #[test]
    fn test_parse_requires_command() {
        assert!(Cli::try_parse_from(["grommet"]).is_err());
        assert!(Cli::try_parse_from(["grommet", "probe"]).is_err());
    }
}
