//! Request and response values exchanged with an RSP through the client port.
//!
//! The wire encoding lives inside the external client; these are the typed
//! shapes the orchestrator reads and builds.

use super::{
    DeployableReference, PublishKind, RunMode, ServerHandle, ServerId, ServerTypeId,
    Severity, Status,
};
use crate::workflow::domain::{ResponseMap, WorkflowRequestId, WorkflowResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Property on launch details naming the debugger protocol.
pub const DEBUG_TYPE_PROPERTY: &str = "debug.details.type";
/// Property on launch details naming the debug port.
pub const DEBUG_PORT_PROPERTY: &str = "debug.details.port";
/// Attribute pointing a new server at its installation directory.
pub const SERVER_HOME_DIR_ATTRIBUTE: &str = "server.home.dir";

/// Capabilities the client announces when a connection opens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCapabilities {
    /// Capability name to value.
    pub map: BTreeMap<String, String>,
}

/// Capabilities the server acknowledges in return.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    /// Capability name to value.
    #[serde(default)]
    pub server_capabilities: BTreeMap<String, String>,
    /// Per-capability registration result.
    #[serde(default)]
    pub client_registration_status: BTreeMap<String, Status>,
}

/// Value type of a server-creation attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// Text.
    String,
    /// Whole number.
    Int,
    /// Yes/no.
    Bool,
    /// List of strings.
    List,
    /// String-to-string map.
    Map,
}

/// One attribute a server type accepts at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    /// Value type.
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    /// Description shown when prompting.
    #[serde(default)]
    pub description: String,
    /// Default value, if any.
    #[serde(default)]
    pub default_val: Option<Value>,
    /// Whether the value must be masked.
    #[serde(default)]
    pub secret: bool,
}

impl Attribute {
    /// Creates an attribute without a default.
    #[must_use]
    pub fn new(attribute_type: AttributeType, description: impl Into<String>) -> Self {
        Self {
            attribute_type,
            description: description.into(),
            default_val: None,
            secret: false,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_val = Some(value);
        self
    }

    /// Marks the attribute as secret.
    #[must_use]
    pub const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

/// Attributes for a server type, keyed by attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    /// Attribute name to definition.
    pub attributes: BTreeMap<String, Attribute>,
}

impl Attributes {
    /// Adds an attribute definition.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(key.into(), attribute);
        self
    }
}

/// Attribute values used to create or launch a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAttributes {
    /// Adapter type.
    pub server_type: ServerTypeId,
    /// Server identifier.
    pub id: ServerId,
    /// Attribute values.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// Server installation discovered on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerBean {
    /// Installation path.
    pub location: String,
    /// Product family.
    #[serde(default)]
    pub type_category: String,
    /// Specification version.
    #[serde(default)]
    pub specification_version: String,
    /// Product name.
    #[serde(default)]
    pub name: String,
    /// Product version.
    #[serde(default)]
    pub version: String,
    /// Adapter type able to manage this installation; empty when none.
    #[serde(default)]
    pub server_adapter_type_id: String,
}

/// Result of a create or update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServerResponse {
    /// Outcome.
    pub status: Status,
    /// Attribute keys the server rejected.
    #[serde(default)]
    pub invalid_keys: Vec<String>,
}

/// Launch request for a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchParameters {
    /// Launch mode.
    pub mode: RunMode,
    /// Server being launched.
    pub params: ServerAttributes,
}

/// Command line the server will launch with.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLineDetails {
    /// Argument vector.
    #[serde(default)]
    pub cmd_line: Vec<String>,
    /// Working directory.
    #[serde(default)]
    pub working_dir: String,
    /// Environment overrides.
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
    /// Launch properties, including debug details.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl CommandLineDetails {
    /// Returns the debugger protocol and port advertised for a debug launch.
    #[must_use]
    pub fn debug_details(&self) -> Option<(String, u16)> {
        let debug_type = self.properties.get(DEBUG_TYPE_PROPERTY)?;
        let port = self.properties.get(DEBUG_PORT_PROPERTY)?.trim().parse().ok()?;
        Some((debug_type.clone(), port))
    }
}

/// Result of an asynchronous start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartServerResponse {
    /// Outcome.
    pub status: Status,
    /// Launch details, when available.
    #[serde(default)]
    pub details: Option<CommandLineDetails>,
}

/// Stop request for a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopServerAttributes {
    /// Server identifier.
    pub id: ServerId,
    /// Whether to terminate instead of asking nicely.
    pub force: bool,
}

/// Publish request for a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishServerRequest {
    /// Server to publish.
    pub server: ServerHandle,
    /// Publish kind.
    pub kind: PublishKind,
}

/// Adds or removes a deployment on a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDeployableReference {
    /// Target server.
    pub server: ServerHandle,
    /// Deployment.
    pub deployable_reference: DeployableReference,
}

/// A runtime the RSP can download and install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRuntimeDescription {
    /// Runtime identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Runtime version.
    #[serde(default)]
    pub version: String,
    /// Download URL.
    #[serde(default)]
    pub url: String,
    /// Licence URL.
    #[serde(default)]
    pub license_url: String,
    /// Extra properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl DownloadRuntimeDescription {
    /// Creates a runtime description.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: String::new(),
            url: String::new(),
            license_url: String::new(),
            properties: BTreeMap::new(),
        }
    }
}

/// One round of the download-runtime workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSingleRuntimeRequest {
    /// Runtime being downloaded.
    pub download_runtime_id: String,
    /// Correlation identifier from the previous round.
    pub request_id: Option<WorkflowRequestId>,
    /// Answers accumulated so far.
    pub data: Option<ResponseMap>,
}

/// An action a server offers, with the prelude workflow that precedes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerActionWorkflow {
    /// Action identifier.
    pub action_id: String,
    /// Label shown in pickers.
    pub action_label: String,
    /// Items to resolve before executing the action.
    pub action_workflow: WorkflowResponse,
}

/// Actions available on a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListServerActionResponse {
    /// Outcome.
    pub status: Status,
    /// Available actions.
    #[serde(default)]
    pub workflows: Vec<ServerActionWorkflow>,
}

/// One round of the server-action workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerActionRequest {
    /// Action identifier.
    pub action_id: String,
    /// Target server.
    pub server_id: ServerId,
    /// Correlation identifier from the previous round.
    pub request_id: Option<WorkflowRequestId>,
    /// Answers accumulated so far.
    pub data: Option<ResponseMap>,
}

/// Server definition as editable JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetServerJsonResponse {
    /// Outcome.
    pub status: Status,
    /// JSON document.
    #[serde(default)]
    pub server_json: String,
    /// Server the document describes.
    pub server_handle: ServerHandle,
}

/// Replaces a server definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServerRequest {
    /// Server being updated.
    pub handle: ServerHandle,
    /// New JSON document.
    pub server_json: String,
}

/// Result of an update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServerResponse {
    /// Server that was updated.
    pub handle: ServerHandle,
    /// Validation outcome.
    pub validation: CreateServerResponse,
}

/// Which process stream produced a chunk of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// Output appended by a server process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProcessOutput {
    /// Server the process belongs to.
    pub server: ServerHandle,
    /// Process identifier assigned by the RSP.
    #[serde(default)]
    pub process_id: String,
    /// Stream the text came from.
    pub stream_type: OutputStream,
    /// Text appended.
    pub text: String,
}

/// Message the server wants shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBoxNotification {
    /// Severity of the message.
    pub severity: Severity,
    /// Text.
    pub message: String,
}
