//! Text output for CLI commands.

use std::env;
use std::fmt::{self, Write};

use colored::Colorize;

use crate::session::capabilities::ServerInfo;

/// Output settings for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to style output with ANSI colors.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Read settings from the environment.
    ///
    /// Colors are off when `NO_COLOR` is set or `GROMMET_COLOR` is `0` or
    /// `false`.
    #[must_use]
    pub fn from_env() -> Self {
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("GROMMET_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);
        Self { use_colors }
    }

    fn label(self, text: &str) -> String {
        if self.use_colors {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn name(self, text: &str) -> String {
        if self.use_colors {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn supported(self, text: &str, supported: bool) -> String {
        match (self.use_colors, supported) {
            (false, _) => text.to_string(),
            (true, true) => text.green().to_string(),
            (true, false) => text.red().to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

/// Render what a server announced during the handshake.
///
/// Capabilities announced as `false` or `null` are marked unsupported.
#[must_use]
pub fn render_report(command: &str, info: &ServerInfo, config: OutputConfig) -> String {
    Report {
        command,
        info,
        config,
    }
    .to_string()
}

struct Report<'a> {
    command: &'a str,
    info: &'a ServerInfo,
    config: OutputConfig,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(f, self.command, self.info, self.config)
    }
}

fn write_report(
    out: &mut impl Write,
    command: &str,
    info: &ServerInfo,
    config: OutputConfig,
) -> fmt::Result {
    let name = info.name.as_deref().unwrap_or(command);
    writeln!(out, "{} {}", config.label("Server: "), config.name(name))?;
    if let Some(version) = &info.version {
        writeln!(out, "{} {version}", config.label("Version:"))?;
    }

    let names = info.capabilities.names();
    writeln!(out, "{} {}", config.label("Capabilities:"), names.len())?;
    for capability in names {
        let supported = info.capabilities.supports(capability);
        let marker = if supported { "+" } else { "-" };
        writeln!(out, "  {} {capability}", config.supported(marker, supported))?;
    }
    Ok(())
}
