//! Client configuration.
//!
//! [`ClientConfig`] holds what the client advertises about itself: identity,
//! locale, trace level and capabilities, plus engine settings such as the
//! debug flag and the per-read timeout. It can be built in code or loaded
//! from YAML:
//!
//! ```yaml
//! client_name: my-editor
//! locale: de
//! debug: true
//! read_timeout_ms: 20
//! capabilities:
//!   textDocument:
//!     hover:
//!       contentFormat: [plaintext]
//! ```
//!
//! Per-connection data lives in [`ConnectParams`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use grommet_json::{JsonArray, JsonValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::capabilities::ClientCapabilities;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid YAML for [`ClientConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Server-side tracing requested in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    /// No tracing.
    #[default]
    Off,
    /// Trace messages only.
    Messages,
    /// Trace messages with details.
    Verbose,
}

impl TraceLevel {
    /// The protocol spelling of this level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Messages => "messages",
            Self::Verbose => "verbose",
        }
    }
}

/// Client identity, capabilities and engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Name reported in `clientInfo`.
    pub client_name: String,

    /// Version reported in `clientInfo`.
    pub client_version: String,

    /// Locale reported in the handshake, e.g. `en` or `de-CH`.
    pub locale: String,

    /// Mirror raw wire traffic to the diagnostic sink.
    pub debug: bool,

    /// How long one transport read waits for output, in milliseconds.
    pub read_timeout_ms: u64,

    /// Trace level requested from servers.
    pub trace: TraceLevel,

    /// Capabilities advertised to servers.
    pub capabilities: ClientCapabilities,
}

impl ClientConfig {
    /// Load configuration from a YAML file.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML for this type.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        // An empty document means "all defaults".
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// The per-read timeout as a [`Duration`].
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_name: env!("CARGO_PKG_NAME").to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            locale: "en".to_string(),
            debug: false,
            read_timeout_ms: 50,
            trace: TraceLevel::Off,
            capabilities: ClientCapabilities::default(),
        }
    }
}

/// A workspace folder announced in the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFolder {
    /// `file://` URI of the folder.
    pub uri: String,
    /// Display name of the folder.
    pub name: String,
}

impl WorkspaceFolder {
    /// Describe a local directory, naming it after its last path component.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self {
            uri: path_to_uri(path),
            name,
        }
    }

    pub(crate) fn to_json(&self) -> JsonValue {
        let mut folder = JsonValue::object();
        folder.set("uri", JsonValue::string(&self.uri));
        folder.set("name", JsonValue::string(&self.name));
        folder
    }
}

/// Per-connection parameters for [`Context::connect`](crate::Context::connect).
#[derive(Debug, Clone, Default)]
pub struct ConnectParams {
    /// Arguments passed to the server command.
    pub args: Vec<String>,

    /// Workspace root, sent as `rootPath` and `rootUri`.
    pub root_path: Option<PathBuf>,

    /// Server-specific `initializationOptions`.
    pub initialization_options: Option<JsonValue>,

    /// Workspace folders. When empty and a root is set, the root is used.
    pub workspace_folders: Vec<WorkspaceFolder>,
}

impl ConnectParams {
    /// Parameters with a workspace root.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: Some(root.into()),
            ..Self::default()
        }
    }

    /// Add arguments for the server command.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The `rootUri` for the handshake, if a root is set.
    #[must_use]
    pub fn root_uri(&self) -> Option<String> {
        self.root_path.as_deref().map(path_to_uri)
    }

    /// The `workspaceFolders` array, or `null` when there are none.
    pub(crate) fn workspace_folders_json(&self) -> JsonValue {
        let folders: JsonArray = if self.workspace_folders.is_empty() {
            match &self.root_path {
                Some(root) => std::iter::once(WorkspaceFolder::from_path(root).to_json()).collect(),
                None => return JsonValue::Null,
            }
        } else {
            self.workspace_folders.iter().map(WorkspaceFolder::to_json).collect()
        };
        JsonValue::Array(folders)
    }
}

/// Convert a filesystem path to a `file://` URI.
///
/// Relative paths are resolved against the current directory. On Unix this
/// produces `file:///home/user/project`; on Windows drive letters become
/// `file:///C:/Users/project`.
#[must_use]
pub fn path_to_uri(path: &Path) -> String {
    let absolute = path
        .canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf());
    let text = absolute.to_string_lossy();

    #[cfg(windows)]
    let uri = {
        let text = text.strip_prefix(r"\\?\").unwrap_or(&text);
        format!("file:///{}", text.replace('\\', "/"))
    };

    #[cfg(not(windows))]
    let uri = format!("file://{text}");

    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_identify_the_crate() {
        let config = ClientConfig::default();
        assert_eq!(config.client_name, "grommet");
        assert_eq!(config.locale, "en");
        assert!(!config.debug);
        assert_eq!(config.read_timeout(), Duration::from_millis(50));
    }

    #[test]
    fn yaml_overrides_only_given_keys() {
        let config = ClientConfig::from_yaml_str(
            "client_name: my-editor\ndebug: true\ntrace: verbose\nread_timeout_ms: 10\n",
        )
        .unwrap();

        assert_eq!(config.client_name, "my-editor");
        assert!(config.debug);
        assert_eq!(config.trace, TraceLevel::Verbose);
        assert_eq!(config.read_timeout_ms, 10);
        assert_eq!(config.locale, "en");
        assert_eq!(config.capabilities, ClientCapabilities::default());
    }

    #[test]
    fn yaml_capabilities_replace_a_category() {
        let config = ClientConfig::from_yaml_str(
            "capabilities:\n  textDocument:\n    hover:\n      contentFormat: [plaintext]\n",
        )
        .unwrap();

        let json = config.capabilities.to_json();
        assert_eq!(
            json["textDocument"]["hover"]["contentFormat"][0].as_str(),
            Some("plaintext")
        );
        assert_eq!(json["window"]["workDoneProgress"].as_bool(), Some(true));
    }

    #[test]
    fn empty_yaml_is_all_defaults() {
        assert_eq!(
            ClientConfig::from_yaml_str("  \n").unwrap(),
            ClientConfig::default()
        );
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        let err = ClientConfig::from_yaml_str("debug: [not, a, bool]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_the_missing_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");

        let err = ClientConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { path: ref p, .. } if *p == path));
    }

    #[test]
    fn load_reads_a_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grommet.yaml");
        std::fs::write(&path, "locale: de-CH\n").unwrap();

        assert_eq!(ClientConfig::load(&path).unwrap().locale, "de-CH");
    }

    #[cfg(unix)]
    #[test]
    fn path_to_uri_is_absolute_file_uri() {
        let dir = TempDir::new().unwrap();
        let uri = path_to_uri(dir.path());
        assert!(uri.starts_with("file:///"));
        assert!(!uri.contains('\\'));
    }

    #[test]
    fn root_becomes_the_only_workspace_folder() {
        let dir = TempDir::new().unwrap();
        let params = ConnectParams::with_root(dir.path());

        let folders = params.workspace_folders_json();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0]["uri"].as_str(), params.root_uri().as_deref());
    }

    #[test]
    fn no_root_and_no_folders_is_null() {
        assert!(ConnectParams::default().workspace_folders_json().is_null());
    }
}
