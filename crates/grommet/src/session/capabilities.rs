//! Capability negotiation data.
//!
//! Capability payloads are treated as opaque JSON: the client advertises
//! whatever objects its configuration holds, and the server's answer is kept
//! as-is for callers to query. Only the category names are fixed.

use grommet_json::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

use crate::config::{ClientConfig, ConnectParams};
use crate::transport::current_process_id;

/// Capabilities the client advertises in `initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientCapabilities {
    /// Workspace-level features.
    pub workspace: JsonObject,
    /// Text document features.
    pub text_document: JsonObject,
    /// Window features such as progress and message requests.
    pub window: JsonObject,
    /// General features such as position encodings.
    pub general: JsonObject,
    /// Notebook document features.
    pub notebook_document: JsonObject,
    /// Experimental, server-specific features.
    pub experimental: JsonObject,
}

impl ClientCapabilities {
    /// Capabilities with every category empty.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            workspace: JsonObject::new(),
            text_document: JsonObject::new(),
            window: JsonObject::new(),
            general: JsonObject::new(),
            notebook_document: JsonObject::new(),
            experimental: JsonObject::new(),
        }
    }

    /// The `capabilities` object for `initialize`. Empty categories are
    /// left out.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let categories = [
            ("workspace", &self.workspace),
            ("textDocument", &self.text_document),
            ("window", &self.window),
            ("general", &self.general),
            ("notebookDocument", &self.notebook_document),
            ("experimental", &self.experimental),
        ];
        categories
            .into_iter()
            .filter(|(_, object)| !object.is_empty())
            .map(|(name, object)| (name, object.clone()))
            .collect::<JsonObject>()
            .into()
    }
}

impl Default for ClientCapabilities {
    /// A conservative advertisement: document sync with save notifications,
    /// hover content formats, workspace folders and progress reporting.
    /// Server-to-client requests are answered with `null`, which satisfies
    /// `window/workDoneProgress/create`.
    fn default() -> Self {
        let mut capabilities = Self::empty();

        capabilities.workspace.set("workspaceFolders", true);

        let mut synchronization = JsonObject::new();
        synchronization.set("dynamicRegistration", false);
        synchronization.set("didSave", true);
        capabilities
            .text_document
            .set("synchronization", synchronization);

        let mut hover = JsonObject::new();
        hover.set(
            "contentFormat",
            vec![
                JsonValue::borrowed("markdown"),
                JsonValue::borrowed("plaintext"),
            ],
        );
        capabilities.text_document.set("hover", hover);

        capabilities.window.set("workDoneProgress", true);

        capabilities.general.set(
            "positionEncodings",
            vec![JsonValue::borrowed("utf-16")],
        );

        capabilities
    }
}

/// Capabilities a server announced in its `initialize` result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerCapabilities {
    raw: JsonValue,
}

impl ServerCapabilities {
    /// Wrap a raw `capabilities` value. Anything but an object is treated as
    /// an empty capability set.
    #[must_use]
    pub fn new(raw: JsonValue) -> Self {
        if raw.is_object() {
            Self { raw }
        } else {
            Self {
                raw: JsonValue::object(),
            }
        }
    }

    /// The value announced for `name`, or `null`.
    #[must_use]
    pub fn get(&self, name: &str) -> &JsonValue {
        self.raw.get(name)
    }

    /// Whether the server announced `name` with a value other than `false`
    /// or `null`. Option objects such as `{"resolveProvider": false}` count
    /// as support.
    #[must_use]
    pub fn supports(&self, name: &str) -> bool {
        !matches!(self.get(name), JsonValue::Null | JsonValue::Bool(false))
    }

    /// Names of all announced capabilities, in the server's order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.raw
            .as_object()
            .map(|o| o.keys().collect())
            .unwrap_or_default()
    }

    /// The raw capability object.
    #[must_use]
    pub fn raw(&self) -> &JsonValue {
        &self.raw
    }
}

/// Server identity and capabilities from a successful handshake.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerInfo {
    /// `serverInfo.name`, if the server sent one.
    pub name: Option<String>,
    /// `serverInfo.version`, if the server sent one.
    pub version: Option<String>,
    /// The announced capabilities.
    pub capabilities: ServerCapabilities,
}

impl ServerInfo {
    /// Read an `initialize` result. Missing pieces are left empty.
    #[must_use]
    pub fn from_initialize_result(result: &JsonValue) -> Self {
        let info = &result["serverInfo"];
        Self {
            name: info["name"].as_str().map(str::to_string),
            version: info["version"].as_str().map(str::to_string),
            capabilities: ServerCapabilities::new(result["capabilities"].clone()),
        }
    }
}

/// Builds the `initialize` request parameters.
#[derive(Debug)]
pub struct InitializeParams<'a> {
    config: &'a ClientConfig,
    connect: &'a ConnectParams,
    process_id: u32,
}

impl<'a> InitializeParams<'a> {
    /// Parameters for the current process.
    #[must_use]
    pub fn new(config: &'a ClientConfig, connect: &'a ConnectParams) -> Self {
        Self {
            config,
            connect,
            process_id: current_process_id(),
        }
    }

    /// Report a different client process id.
    #[must_use]
    pub fn with_process_id(mut self, process_id: u32) -> Self {
        self.process_id = process_id;
        self
    }

    /// The params object.
    #[must_use]
    pub fn build(&self) -> JsonValue {
        let mut client_info = JsonValue::object();
        client_info.set("name", JsonValue::string(&self.config.client_name));
        client_info.set("version", JsonValue::string(&self.config.client_version));

        let root_path = self
            .connect
            .root_path
            .as_deref()
            .map(|p| p.display().to_string());

        let mut params = JsonValue::object();
        params.set("processId", self.process_id);
        params.set("clientInfo", client_info);
        params.set("locale", JsonValue::string(&self.config.locale));
        params.set("rootPath", root_path);
        params.set("rootUri", self.connect.root_uri());
        params.set("workspaceFolders", self.connect.workspace_folders_json());
        if let Some(options) = &self.connect.initialization_options {
            params.set("initializationOptions", options.clone());
        }
        params.set("trace", self.config.trace.as_str());
        params.set("capabilities", self.config.capabilities.to_json());
        params
    }
}
