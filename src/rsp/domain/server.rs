//! Server and deployable state tracked beneath an RSP provider.

use super::{PublishState, RunMode, RunState, ServerId, ServerTypeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Server adapter type advertised by an RSP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerType {
    /// Adapter type identifier.
    pub id: ServerTypeId,
    /// Name shown to users.
    #[serde(default)]
    pub visible_name: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
}

impl ServerType {
    /// Creates a server type with the given identifier and visible name.
    #[must_use]
    pub fn new(id: ServerTypeId, visible_name: impl Into<String>) -> Self {
        Self {
            id,
            visible_name: visible_name.into(),
            description: String::new(),
        }
    }
}

/// Handle identifying a server instance and its adapter type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerHandle {
    /// Server identifier.
    pub id: ServerId,
    /// Adapter type.
    #[serde(rename = "type")]
    pub server_type: ServerType,
}

impl ServerHandle {
    /// Creates a server handle.
    #[must_use]
    pub const fn new(id: ServerId, server_type: ServerType) -> Self {
        Self { id, server_type }
    }
}

/// Reference to deployable content: a label, a filesystem path and options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployableReference {
    /// Label, unique per server.
    pub label: String,
    /// Path of the archive or exploded directory.
    pub path: String,
    /// Free-form deployment options.
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

impl DeployableReference {
    /// Creates a reference without options.
    #[must_use]
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            options: BTreeMap::new(),
        }
    }

    /// Adds a deployment option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// State of one deployment on a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployableState {
    /// What is deployed.
    pub reference: DeployableReference,
    /// Run state of the deployment.
    pub state: RunState,
    /// Publish state of the deployment.
    pub publish_state: PublishState,
}

/// Authoritative state of one server instance, as last reported by the RSP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerState {
    /// Server handle.
    pub server: ServerHandle,
    /// Run state.
    pub state: RunState,
    /// Publish state.
    pub publish_state: PublishState,
    /// Launch mode.
    #[serde(default)]
    pub run_mode: RunMode,
    /// Deployments, in the order the RSP reported them.
    #[serde(default)]
    pub deployable_states: Vec<DeployableState>,
}

impl ServerState {
    /// Creates the placeholder state used before the RSP reports anything.
    #[must_use]
    pub const fn unknown(server: ServerHandle) -> Self {
        Self {
            server,
            state: RunState::Unknown,
            publish_state: PublishState::Unknown,
            run_mode: RunMode::Run,
            deployable_states: Vec::new(),
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> &ServerId {
        &self.server.id
    }

    /// Finds a deployment by label.
    #[must_use]
    pub fn deployable(&self, label: &str) -> Option<&DeployableState> {
        self.deployable_states
            .iter()
            .find(|deployable| deployable.reference.label == label)
    }
}
