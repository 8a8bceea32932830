//! Protocol client port: outgoing RSP requests and push events.

use crate::rsp::{
    domain::{
        Attributes, ClientCapabilities, CommandLineDetails, CreateServerResponse,
        DownloadRuntimeDescription, DownloadSingleRuntimeRequest, GetServerJsonResponse,
        LaunchParameters, ListServerActionResponse, MessageBoxNotification, ProviderId,
        PublishServerRequest, ServerActionRequest, ServerAttributes, ServerBean,
        ServerCapabilities, ServerDeployableReference, ServerHandle, ServerProcessOutput,
        ServerState, ServerType, StartServerResponse, Status, StopServerAttributes,
        UpdateServerRequest, UpdateServerResponse,
    },
    ports::RspLaunch,
};
use crate::workflow::domain::WorkflowResponse;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Result type for protocol round-trips.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Failures below the protocol level.
///
/// A request that reaches the server and comes back with a non-ok
/// [`Status`] is not a `ProtocolError`; callers inspect the status.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// The connection is gone.
    #[error("RSP connection is closed")]
    Disconnected,

    /// Transport or encoding failure.
    #[error("RSP transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProtocolError {
    /// Wraps a transport-level failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}

/// Request issued by the server asking the user for a string.
#[derive(Debug)]
pub struct StringPrompt {
    /// Server-defined prompt code.
    pub code: i32,
    /// Question to show.
    pub message: String,
    /// Whether the answer must be masked.
    pub secret: bool,
    reply: oneshot::Sender<Option<String>>,
}

impl StringPrompt {
    /// Creates a prompt and the receiver its answer arrives on.
    #[must_use]
    pub fn new(
        code: i32,
        message: impl Into<String>,
        secret: bool,
    ) -> (Self, oneshot::Receiver<Option<String>>) {
        let (reply, answer) = oneshot::channel();
        let prompt = Self {
            code,
            message: message.into(),
            secret,
            reply,
        };
        (prompt, answer)
    }

    /// Sends the answer back; `None` means the user declined.
    ///
    /// Returns `false` when the requester no longer waits for it.
    pub fn respond(self, answer: Option<String>) -> bool {
        self.reply.send(answer).is_ok()
    }
}

/// Push notification delivered by a live connection.
#[derive(Debug)]
pub enum ClientEvent {
    /// A server was created.
    ServerAdded(ServerHandle),
    /// A server was deleted.
    ServerRemoved(ServerHandle),
    /// A server's state changed; the payload is the full fresh state.
    ServerStateChanged(ServerState),
    /// A server process wrote output.
    ServerProcessOutputAppended(ServerProcessOutput),
    /// The server asks the user for a string.
    PromptString(StringPrompt),
    /// The server wants a message shown.
    MessageBox(MessageBoxNotification),
    /// The connection closed.
    ConnectionClosed,
}

/// A live connection: the client handle and its push-event stream.
pub struct Connection {
    /// Client used for outgoing requests.
    pub client: Arc<dyn RspClient>,
    /// Push events; subscribed exactly once per connection.
    pub events: mpsc::Receiver<ClientEvent>,
}

/// Opens protocol connections to launched RSP processes.
#[async_trait]
pub trait RspConnector: Send + Sync {
    /// Connects to the RSP described by `launch`.
    async fn connect(&self, provider: &ProviderId, launch: &RspLaunch)
    -> ProtocolResult<Connection>;
}

/// Outgoing requests understood by an RSP.
#[async_trait]
pub trait RspClient: Send + Sync {
    /// Announces client capabilities.
    async fn register_client_capabilities(
        &self,
        capabilities: &ClientCapabilities,
    ) -> ProtocolResult<ServerCapabilities>;

    /// Asks the RSP process to shut down.
    async fn shutdown_server(&self) -> ProtocolResult<()>;

    /// Closes the connection without stopping the RSP process.
    async fn disconnect(&self) -> ProtocolResult<()>;

    /// Lists every server the RSP manages.
    async fn get_server_handles(&self) -> ProtocolResult<Vec<ServerHandle>>;

    /// Returns the full state of one server.
    async fn get_server_state(&self, handle: &ServerHandle) -> ProtocolResult<ServerState>;

    /// Lists server adapter types.
    async fn get_server_types(&self) -> ProtocolResult<Vec<ServerType>>;

    /// Returns the attributes a server type requires at creation.
    async fn get_required_attributes(&self, server_type: &ServerType)
    -> ProtocolResult<Attributes>;

    /// Returns the attributes a server type optionally accepts.
    async fn get_optional_attributes(&self, server_type: &ServerType)
    -> ProtocolResult<Attributes>;

    /// Finds server installations beneath a path.
    async fn find_server_beans(&self, path: &str) -> ProtocolResult<Vec<ServerBean>>;

    /// Creates a server.
    async fn create_server(
        &self,
        attributes: &ServerAttributes,
    ) -> ProtocolResult<CreateServerResponse>;

    /// Deletes a server.
    async fn delete_server(&self, handle: &ServerHandle) -> ProtocolResult<Status>;

    /// Starts a server; completion is reported through state pushes.
    async fn start_server_async(
        &self,
        parameters: &LaunchParameters,
    ) -> ProtocolResult<StartServerResponse>;

    /// Stops a server; completion is reported through state pushes.
    async fn stop_server_async(&self, attributes: &StopServerAttributes)
    -> ProtocolResult<Status>;

    /// Returns the command line a launch would use.
    async fn get_launch_command(
        &self,
        parameters: &LaunchParameters,
    ) -> ProtocolResult<CommandLineDetails>;

    /// Publishes and waits for completion.
    async fn publish(&self, request: &PublishServerRequest) -> ProtocolResult<Status>;

    /// Schedules a publish and returns immediately.
    async fn publish_async(&self, request: &PublishServerRequest) -> ProtocolResult<Status>;

    /// Adds a deployment.
    async fn add_deployable(&self, request: &ServerDeployableReference) -> ProtocolResult<Status>;

    /// Removes a deployment.
    async fn remove_deployable(
        &self,
        request: &ServerDeployableReference,
    ) -> ProtocolResult<Status>;

    /// Lists runtimes available for download.
    async fn list_downloadable_runtimes(&self) -> ProtocolResult<Vec<DownloadRuntimeDescription>>;

    /// Runs one round of the download-runtime workflow.
    async fn download_runtime(
        &self,
        request: &DownloadSingleRuntimeRequest,
    ) -> ProtocolResult<WorkflowResponse>;

    /// Lists actions a server offers.
    async fn list_server_actions(
        &self,
        handle: &ServerHandle,
    ) -> ProtocolResult<ListServerActionResponse>;

    /// Runs one round of a server action.
    async fn execute_server_action(
        &self,
        request: &ServerActionRequest,
    ) -> ProtocolResult<WorkflowResponse>;

    /// Returns the editable JSON definition of a server.
    async fn get_server_as_json(&self, handle: &ServerHandle)
    -> ProtocolResult<GetServerJsonResponse>;

    /// Replaces a server definition.
    async fn update_server(
        &self,
        request: &UpdateServerRequest,
    ) -> ProtocolResult<UpdateServerResponse>;
}
