//! In-memory RSP that answers protocol requests from a script.

use crate::rsp::{
    domain::{
        Attributes, ClientCapabilities, CommandLineDetails, CreateServerResponse, DeployableState,
        DownloadRuntimeDescription, DownloadSingleRuntimeRequest, GetServerJsonResponse,
        LaunchParameters, ListServerActionResponse, ProviderId, PublishServerRequest,
        PublishState, RunState, ServerActionRequest, ServerActionWorkflow, ServerAttributes,
        ServerBean, ServerCapabilities, ServerDeployableReference, ServerHandle, ServerId,
        ServerState, ServerType, ServerTypeId, StartServerResponse, Status, StopServerAttributes,
        UpdateServerRequest, UpdateServerResponse,
    },
    ports::{
        ClientEvent, Connection, ProtocolError, ProtocolResult, RspClient, RspConnector,
        RspLaunch,
    },
};
use crate::workflow::domain::WorkflowResponse;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

/// Requests whose behaviour a script can alter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptedRequest {
    /// Opening the connection.
    Connect,
    /// Client capability registration.
    Capabilities,
    /// RSP shutdown.
    Shutdown,
    /// Server stop.
    StopServer,
    /// Publish, synchronous or not.
    Publish,
    /// Downloadable runtime listing.
    RuntimeListing,
}

/// A request received by the in-memory RSP.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    /// Capabilities were registered.
    RegisterCapabilities(ClientCapabilities),
    /// Shutdown was requested.
    Shutdown,
    /// The client disconnected.
    Disconnect,
    /// A server start.
    Start(LaunchParameters),
    /// A server stop.
    Stop(StopServerAttributes),
    /// A publish.
    Publish {
        /// Request payload.
        request: PublishServerRequest,
        /// Whether the synchronous variant was used.
        synchronous: bool,
    },
    /// A deployment was added.
    AddDeployable(ServerDeployableReference),
    /// A deployment was removed.
    RemoveDeployable(ServerDeployableReference),
    /// A server was deleted.
    Delete(ServerHandle),
    /// A creation attempt.
    Create(ServerAttributes),
    /// A download-runtime round.
    DownloadRuntime(DownloadSingleRuntimeRequest),
    /// A server-action round.
    ServerAction(ServerActionRequest),
    /// A server definition update.
    UpdateServer(UpdateServerRequest),
}

#[derive(Debug, Default)]
struct RspScript {
    servers: Vec<ServerState>,
    server_types: Vec<ServerType>,
    required: HashMap<ServerTypeId, Attributes>,
    optional: HashMap<ServerTypeId, Attributes>,
    beans: HashMap<String, Vec<ServerBean>>,
    runtimes: Vec<DownloadRuntimeDescription>,
    download_rounds: VecDeque<WorkflowResponse>,
    actions: HashMap<ServerId, Vec<ServerActionWorkflow>>,
    action_rounds: VecDeque<WorkflowResponse>,
    launch_commands: HashMap<ServerId, CommandLineDetails>,
    create_rejections: VecDeque<Vec<String>>,
    faults: HashSet<ScriptedRequest>,
    silenced: HashSet<ScriptedRequest>,
    delays: HashMap<ScriptedRequest, Duration>,
    requests: Vec<RecordedRequest>,
    sender: Option<mpsc::Sender<ClientEvent>>,
}

/// Scripted in-memory RSP acting as both connector and client.
///
/// Server starts, stops, creations and deletions update the scripted
/// inventory and are echoed as push events on the open connection, the
/// way a real RSP reports them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRsp {
    script: Arc<Mutex<RspScript>>,
}

impl InMemoryRsp {
    /// Creates an RSP with no servers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a server to the inventory.
    #[must_use]
    pub fn with_server(self, server: ServerState) -> Self {
        self.edit(|script| script.servers.push(server))
    }

    /// Adds a server type with its required attributes.
    #[must_use]
    pub fn with_server_type(self, server_type: ServerType, required: Attributes) -> Self {
        self.edit(|script| {
            script.required.insert(server_type.id.clone(), required);
            script.server_types.push(server_type);
        })
    }

    /// Sets the optional attributes of a server type.
    #[must_use]
    pub fn with_optional_attributes(self, server_type: &ServerTypeId, optional: Attributes) -> Self {
        self.edit(|script| {
            script.optional.insert(server_type.clone(), optional);
        })
    }

    /// Registers installations discoverable beneath a path.
    #[must_use]
    pub fn with_beans(self, path: impl Into<String>, beans: Vec<ServerBean>) -> Self {
        self.edit(|script| {
            script.beans.insert(path.into(), beans);
        })
    }

    /// Adds a downloadable runtime.
    #[must_use]
    pub fn with_runtime(self, runtime: DownloadRuntimeDescription) -> Self {
        self.edit(|script| script.runtimes.push(runtime))
    }

    /// Queues the response to the next download-runtime round.
    #[must_use]
    pub fn with_download_round(self, response: WorkflowResponse) -> Self {
        self.edit(|script| script.download_rounds.push_back(response))
    }

    /// Adds an action offered by a server.
    #[must_use]
    pub fn with_action(self, server: &ServerId, action: ServerActionWorkflow) -> Self {
        self.edit(|script| {
            script.actions.entry(server.clone()).or_default().push(action);
        })
    }

    /// Queues the response to the next server-action round.
    #[must_use]
    pub fn with_action_round(self, response: WorkflowResponse) -> Self {
        self.edit(|script| script.action_rounds.push_back(response))
    }

    /// Sets the launch command reported for a server.
    #[must_use]
    pub fn with_launch_command(self, server: &ServerId, command: CommandLineDetails) -> Self {
        self.edit(|script| {
            script.launch_commands.insert(server.clone(), command);
        })
    }

    /// Makes the next creation attempt report `keys` as invalid.
    #[must_use]
    pub fn with_create_rejection(self, keys: Vec<String>) -> Self {
        self.edit(|script| script.create_rejections.push_back(keys))
    }

    /// Makes a request fail.
    #[must_use]
    pub fn failing(self, request: ScriptedRequest) -> Self {
        self.edit(|script| {
            script.faults.insert(request);
        })
    }

    /// Delays a request.
    #[must_use]
    pub fn delaying(self, request: ScriptedRequest, delay: Duration) -> Self {
        self.edit(|script| {
            script.delays.insert(request, delay);
        })
    }

    /// Accepts a request without pushing the state change it would cause.
    #[must_use]
    pub fn silencing(self, request: ScriptedRequest) -> Self {
        self.edit(|script| {
            script.silenced.insert(request);
        })
    }

    /// Returns every request received so far.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the script lock is poisoned.
    pub fn requests(&self) -> ProtocolResult<Vec<RecordedRequest>> {
        Ok(self.lock()?.requests.clone())
    }

    /// Pushes an event on the open connection.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Disconnected`] when no connection is open.
    pub async fn push(&self, event: ClientEvent) -> ProtocolResult<()> {
        let sender = self.lock()?.sender.clone().ok_or(ProtocolError::Disconnected)?;
        sender
            .send(event)
            .await
            .map_err(|_| ProtocolError::Disconnected)
    }

    fn edit(self, change: impl FnOnce(&mut RspScript)) -> Self {
        if let Ok(mut script) = self.script.lock() {
            change(&mut script);
        }
        self
    }

    fn lock(&self) -> ProtocolResult<MutexGuard<'_, RspScript>> {
        self.script
            .lock()
            .map_err(|err| ProtocolError::transport(std::io::Error::other(err.to_string())))
    }

    fn record(&self, request: RecordedRequest) -> ProtocolResult<()> {
        self.lock()?.requests.push(request);
        Ok(())
    }

    async fn pause(&self, request: ScriptedRequest) -> ProtocolResult<()> {
        let delay = self.lock()?.delays.get(&request).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn gate(&self, request: ScriptedRequest) -> ProtocolResult<()> {
        self.pause(request).await?;
        if self.fails(request)? {
            return Err(ProtocolError::transport(std::io::Error::other(format!(
                "scripted {request:?} failure"
            ))));
        }
        Ok(())
    }

    fn fails(&self, request: ScriptedRequest) -> ProtocolResult<bool> {
        Ok(self.lock()?.faults.contains(&request))
    }

    fn silenced(&self, request: ScriptedRequest) -> ProtocolResult<bool> {
        Ok(self.lock()?.silenced.contains(&request))
    }

    fn server(&self, id: &ServerId) -> ProtocolResult<ServerState> {
        self.lock()?
            .servers
            .iter()
            .find(|server| server.id() == id)
            .cloned()
            .ok_or_else(|| {
                ProtocolError::transport(std::io::Error::other(format!("unknown server {id}")))
            })
    }

    async fn update_server_state(
        &self,
        id: &ServerId,
        change: impl FnOnce(&mut ServerState),
    ) -> ProtocolResult<()> {
        let updated = {
            let mut script = self.lock()?;
            let server = script
                .servers
                .iter_mut()
                .find(|server| server.id() == id)
                .ok_or_else(|| {
                    ProtocolError::transport(std::io::Error::other(format!("unknown server {id}")))
                })?;
            change(server);
            server.clone()
        };
        self.notify(ClientEvent::ServerStateChanged(updated)).await;
        Ok(())
    }

    async fn notify(&self, event: ClientEvent) {
        let sender = self.lock().ok().and_then(|script| script.sender.clone());
        if let Some(sender) = sender {
            if sender.send(event).await.is_err() {
                debug!("client went away before the event was delivered");
            }
        }
    }

    fn close(&self) -> ProtocolResult<()> {
        self.lock()?.sender = None;
        Ok(())
    }
}

#[async_trait]
impl RspConnector for InMemoryRsp {
    async fn connect(
        &self,
        _provider: &ProviderId,
        _launch: &RspLaunch,
    ) -> ProtocolResult<Connection> {
        self.gate(ScriptedRequest::Connect).await?;
        let (sender, events) = mpsc::channel(EVENT_CAPACITY);
        self.lock()?.sender = Some(sender);
        Ok(Connection {
            client: Arc::new(self.clone()),
            events,
        })
    }
}

#[async_trait]
impl RspClient for InMemoryRsp {
    async fn register_client_capabilities(
        &self,
        capabilities: &ClientCapabilities,
    ) -> ProtocolResult<ServerCapabilities> {
        self.gate(ScriptedRequest::Capabilities).await?;
        self.record(RecordedRequest::RegisterCapabilities(capabilities.clone()))?;
        Ok(ServerCapabilities::default())
    }

    async fn shutdown_server(&self) -> ProtocolResult<()> {
        self.gate(ScriptedRequest::Shutdown).await?;
        self.record(RecordedRequest::Shutdown)?;
        self.close()
    }

    async fn disconnect(&self) -> ProtocolResult<()> {
        self.record(RecordedRequest::Disconnect)?;
        self.close()
    }

    async fn get_server_handles(&self) -> ProtocolResult<Vec<ServerHandle>> {
        Ok(self
            .lock()?
            .servers
            .iter()
            .map(|server| server.server.clone())
            .collect())
    }

    async fn get_server_state(&self, handle: &ServerHandle) -> ProtocolResult<ServerState> {
        self.server(&handle.id)
    }

    async fn get_server_types(&self) -> ProtocolResult<Vec<ServerType>> {
        Ok(self.lock()?.server_types.clone())
    }

    async fn get_required_attributes(
        &self,
        server_type: &ServerType,
    ) -> ProtocolResult<Attributes> {
        Ok(self
            .lock()?
            .required
            .get(&server_type.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_optional_attributes(
        &self,
        server_type: &ServerType,
    ) -> ProtocolResult<Attributes> {
        Ok(self
            .lock()?
            .optional
            .get(&server_type.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_server_beans(&self, path: &str) -> ProtocolResult<Vec<ServerBean>> {
        Ok(self.lock()?.beans.get(path).cloned().unwrap_or_default())
    }

    async fn create_server(
        &self,
        attributes: &ServerAttributes,
    ) -> ProtocolResult<CreateServerResponse> {
        let created = {
            let mut script = self.lock()?;
            script
                .requests
                .push(RecordedRequest::Create(attributes.clone()));
            let invalid_keys = script.create_rejections.pop_front().unwrap_or_default();
            if !invalid_keys.is_empty() {
                return Ok(CreateServerResponse {
                    status: Status::error("invalid attribute values"),
                    invalid_keys,
                });
            }
            let server_type = script
                .server_types
                .iter()
                .find(|candidate| candidate.id == attributes.server_type)
                .cloned()
                .unwrap_or_else(|| {
                    ServerType::new(attributes.server_type.clone(), attributes.server_type.as_str())
                });
            let handle = ServerHandle::new(attributes.id.clone(), server_type);
            script.servers.push(ServerState::unknown(handle.clone()));
            handle
        };
        self.notify(ClientEvent::ServerAdded(created)).await;
        Ok(CreateServerResponse {
            status: Status::ok(),
            invalid_keys: Vec::new(),
        })
    }

    async fn delete_server(&self, handle: &ServerHandle) -> ProtocolResult<Status> {
        {
            let mut script = self.lock()?;
            script.requests.push(RecordedRequest::Delete(handle.clone()));
            script.servers.retain(|server| server.id() != &handle.id);
        }
        self.notify(ClientEvent::ServerRemoved(handle.clone())).await;
        Ok(Status::ok())
    }

    async fn start_server_async(
        &self,
        parameters: &LaunchParameters,
    ) -> ProtocolResult<StartServerResponse> {
        self.record(RecordedRequest::Start(parameters.clone()))?;
        let mode = parameters.mode;
        self.update_server_state(&parameters.params.id, |server| {
            server.state = RunState::Starting;
            server.run_mode = mode;
        })
        .await?;
        self.update_server_state(&parameters.params.id, |server| {
            server.state = RunState::Started;
        })
        .await?;
        let details = self
            .lock()?
            .launch_commands
            .get(&parameters.params.id)
            .cloned();
        Ok(StartServerResponse {
            status: Status::ok(),
            details,
        })
    }

    async fn stop_server_async(
        &self,
        attributes: &StopServerAttributes,
    ) -> ProtocolResult<Status> {
        self.record(RecordedRequest::Stop(attributes.clone()))?;
        self.pause(ScriptedRequest::StopServer).await?;
        if self.fails(ScriptedRequest::StopServer)? {
            return Ok(Status::error("Server refused to stop"));
        }
        if self.silenced(ScriptedRequest::StopServer)? {
            return Ok(Status::ok());
        }
        self.update_server_state(&attributes.id, |server| {
            server.state = RunState::Stopped;
        })
        .await?;
        Ok(Status::ok())
    }

    async fn get_launch_command(
        &self,
        parameters: &LaunchParameters,
    ) -> ProtocolResult<CommandLineDetails> {
        Ok(self
            .lock()?
            .launch_commands
            .get(&parameters.params.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn publish(&self, request: &PublishServerRequest) -> ProtocolResult<Status> {
        self.record_publish(request, true)
    }

    async fn publish_async(&self, request: &PublishServerRequest) -> ProtocolResult<Status> {
        self.record_publish(request, false)
    }

    async fn add_deployable(&self, request: &ServerDeployableReference) -> ProtocolResult<Status> {
        self.record(RecordedRequest::AddDeployable(request.clone()))?;
        let reference = request.deployable_reference.clone();
        self.update_server_state(&request.server.id, |server| {
            server.publish_state = PublishState::PublishRequired;
            server.deployable_states.push(DeployableState {
                reference,
                state: RunState::Unknown,
                publish_state: PublishState::IncrementalAddRequired,
            });
        })
        .await?;
        Ok(Status::ok())
    }

    async fn remove_deployable(
        &self,
        request: &ServerDeployableReference,
    ) -> ProtocolResult<Status> {
        self.record(RecordedRequest::RemoveDeployable(request.clone()))?;
        let label = request.deployable_reference.label.clone();
        self.update_server_state(&request.server.id, |server| {
            server
                .deployable_states
                .retain(|deployable| deployable.reference.label != label);
        })
        .await?;
        Ok(Status::ok())
    }

    async fn list_downloadable_runtimes(&self) -> ProtocolResult<Vec<DownloadRuntimeDescription>> {
        self.gate(ScriptedRequest::RuntimeListing).await?;
        Ok(self.lock()?.runtimes.clone())
    }

    async fn download_runtime(
        &self,
        request: &DownloadSingleRuntimeRequest,
    ) -> ProtocolResult<WorkflowResponse> {
        let mut script = self.lock()?;
        script
            .requests
            .push(RecordedRequest::DownloadRuntime(request.clone()));
        Ok(script
            .download_rounds
            .pop_front()
            .unwrap_or_else(|| WorkflowResponse::terminal(Status::ok())))
    }

    async fn list_server_actions(
        &self,
        handle: &ServerHandle,
    ) -> ProtocolResult<ListServerActionResponse> {
        Ok(ListServerActionResponse {
            status: Status::ok(),
            workflows: self
                .lock()?
                .actions
                .get(&handle.id)
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn execute_server_action(
        &self,
        request: &ServerActionRequest,
    ) -> ProtocolResult<WorkflowResponse> {
        let mut script = self.lock()?;
        script
            .requests
            .push(RecordedRequest::ServerAction(request.clone()));
        Ok(script
            .action_rounds
            .pop_front()
            .unwrap_or_else(|| WorkflowResponse::terminal(Status::ok())))
    }

    async fn get_server_as_json(
        &self,
        handle: &ServerHandle,
    ) -> ProtocolResult<GetServerJsonResponse> {
        let server = self.server(&handle.id)?;
        let server_json = serde_json::to_string_pretty(&server).map_err(ProtocolError::transport)?;
        Ok(GetServerJsonResponse {
            status: Status::ok(),
            server_json,
            server_handle: handle.clone(),
        })
    }

    async fn update_server(
        &self,
        request: &UpdateServerRequest,
    ) -> ProtocolResult<UpdateServerResponse> {
        self.record(RecordedRequest::UpdateServer(request.clone()))?;
        let status = match serde_json::from_str::<serde_json::Value>(&request.server_json) {
            Ok(_) => Status::ok(),
            Err(err) => Status::error(format!("Invalid server definition: {err}")),
        };
        Ok(UpdateServerResponse {
            handle: request.handle.clone(),
            validation: CreateServerResponse {
                status,
                invalid_keys: Vec::new(),
            },
        })
    }
}

impl InMemoryRsp {
    fn record_publish(
        &self,
        request: &PublishServerRequest,
        synchronous: bool,
    ) -> ProtocolResult<Status> {
        self.record(RecordedRequest::Publish {
            request: request.clone(),
            synchronous,
        })?;
        if self.fails(ScriptedRequest::Publish)? {
            return Ok(Status::error("Publish failed"));
        }
        Ok(Status::ok())
    }
}
