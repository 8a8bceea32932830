//! Commands driven through the workflow engine: server creation, runtime
//! download and server actions.

use super::{LifecycleController, accept};
use crate::rsp::{
    domain::{
        Attribute, AttributeType, Attributes, DownloadSingleRuntimeRequest, ProviderId,
        SERVER_HOME_DIR_ATTRIBUTE, ServerActionRequest, ServerAttributes, ServerId, ServerType,
        ServerTypeId, Status,
    },
    ports::{PickRequest, RspClient, UserInterface},
    services::{LifecycleError, LifecycleResult},
};
use crate::workflow::{
    domain::{
        ResponseMap, ResponseType, WorkflowPrompt, WorkflowResponse, WorkflowResponseItem,
        WorkflowResult,
    },
    services::{WorkflowOutcome, WorkflowRound, WorkflowSubmitter},
};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::info;

impl<U, C> LifecycleController<U, C>
where
    U: UserInterface + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Lists the server types a provider can create.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::CannotContactProvider`] when disconnected.
    pub async fn server_types(&self, provider: &ProviderId) -> LifecycleResult<Vec<ServerType>> {
        let client = self.client_for(provider)?;
        Ok(client.get_server_types().await?)
    }

    /// Creates a server, prompting for every required attribute.
    ///
    /// Attributes with a declared default are not prompted for. Keys the
    /// server reports as invalid are prompted for again.
    ///
    /// # Errors
    ///
    /// Returns domain errors for an empty `server_id`,
    /// [`LifecycleError::CannotContactProvider`] when disconnected and
    /// workflow errors when the server rejects the creation.
    pub async fn create_server(
        &self,
        provider: &ProviderId,
        server_type: ServerType,
        server_id: &str,
    ) -> LifecycleResult<WorkflowOutcome<Status>> {
        let server_id = ServerId::new(server_id)?;
        let client = self.client_for(provider)?;
        self.create_with_seed(client, server_type, server_id, ResponseMap::new())
            .await
    }

    /// Creates a server from the installation found beneath `path`.
    ///
    /// The installation location seeds the `server.home.dir` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NoServerFound`] when discovery finds
    /// nothing, and the errors of [`LifecycleController::create_server`].
    pub async fn create_server_from_bean(
        &self,
        provider: &ProviderId,
        path: &str,
        server_id: &str,
    ) -> LifecycleResult<WorkflowOutcome<Status>> {
        let server_id = ServerId::new(server_id)?;
        let client = self.client_for(provider)?;
        let bean = client
            .find_server_beans(path)
            .await?
            .into_iter()
            .find(|bean| !bean.server_adapter_type_id.trim().is_empty())
            .ok_or_else(|| LifecycleError::NoServerFound(path.to_owned()))?;
        let type_id = ServerTypeId::new(bean.server_adapter_type_id.as_str())?;
        let server_type = client
            .get_server_types()
            .await?
            .into_iter()
            .find(|candidate| candidate.id == type_id)
            .unwrap_or_else(|| ServerType::new(type_id, bean.name.clone()));

        let mut seed = ResponseMap::new();
        seed.insert(SERVER_HOME_DIR_ATTRIBUTE, Value::String(bean.location));
        self.create_with_seed(client, server_type, server_id, seed).await
    }

    /// Downloads a runtime picked from the provider's listing.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NoResponseInTime`] when the listing
    /// exceeds its budget, [`LifecycleError::NoRuntimes`] for an empty
    /// listing and workflow errors.
    pub async fn download_runtime(
        &self,
        provider: &ProviderId,
    ) -> LifecycleResult<WorkflowOutcome<Status>> {
        let client = self.client_for(provider)?;
        let runtimes = timeout(
            self.config.runtime_listing_timeout(),
            client.list_downloadable_runtimes(),
        )
        .await
        .map_err(|_| LifecycleError::NoResponseInTime {
            provider: provider.clone(),
            request: "downloadable runtime listing",
        })??;
        if runtimes.is_empty() {
            return Err(LifecycleError::NoRuntimes);
        }

        let names = runtimes.iter().map(|runtime| runtime.name.clone()).collect();
        let Some(choice) = self
            .ui
            .pick(PickRequest::new("Select a runtime to download", names))
            .await
        else {
            return Ok(WorkflowOutcome::Canceled);
        };
        let Some(runtime) = runtimes.into_iter().find(|runtime| runtime.name == choice) else {
            return Ok(WorkflowOutcome::Canceled);
        };

        info!(provider = %provider, runtime = %runtime.id, "downloading runtime");
        let rounds = DownloadRuntimeRounds {
            client,
            runtime_id: runtime.id,
        };
        Ok(self.engine.run(&rounds).await?)
    }

    /// Runs an action picked from the server's action listing.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NoServerActions`] when the server offers
    /// none, [`LifecycleError::StatusRejected`] when the listing fails and
    /// workflow errors.
    pub async fn run_server_action(
        &self,
        provider: &ProviderId,
        server: &ServerId,
    ) -> LifecycleResult<WorkflowOutcome<Status>> {
        let (client, state) = self.connected_server(provider, server)?;
        let listing = client.list_server_actions(&state.server).await?;
        accept(listing.status)?;
        if listing.workflows.is_empty() {
            return Err(LifecycleError::NoServerActions(server.clone()));
        }

        let labels = listing
            .workflows
            .iter()
            .map(|workflow| workflow.action_label.clone())
            .collect();
        let Some(choice) = self
            .ui
            .pick(PickRequest::new("Select an action", labels))
            .await
        else {
            return Ok(WorkflowOutcome::Canceled);
        };
        let Some(action) = listing
            .workflows
            .into_iter()
            .find(|workflow| workflow.action_label == choice)
        else {
            return Ok(WorkflowOutcome::Canceled);
        };

        info!(provider = %provider, server = %server, action = %action.action_id, "running server action");
        let rounds = ServerActionRounds {
            client,
            action_id: action.action_id,
            server_id: server.clone(),
        };
        Ok(self.engine.resume(action.action_workflow, &rounds).await?)
    }

    async fn create_with_seed(
        &self,
        client: Arc<dyn RspClient>,
        server_type: ServerType,
        server_id: ServerId,
        mut seed: ResponseMap,
    ) -> LifecycleResult<WorkflowOutcome<Status>> {
        let required = client.get_required_attributes(&server_type).await?;
        let optional = client.get_optional_attributes(&server_type).await?;
        for (key, attribute) in &required.attributes {
            if seed.contains(key) {
                continue;
            }
            if let Some(default) = &attribute.default_val {
                seed.insert(key.clone(), default.clone());
            }
        }

        info!(server = %server_id, server_type = %server_type.id, "creating server");
        let rounds = CreateServerRounds {
            client,
            server_type: server_type.id,
            server_id,
            required,
            optional,
        };
        let outcome = self.engine.run_collecting(&rounds, seed).await?;
        Ok(match outcome {
            WorkflowOutcome::Completed((status, _)) => WorkflowOutcome::Completed(status),
            WorkflowOutcome::Canceled => WorkflowOutcome::Canceled,
        })
    }
}

struct DownloadRuntimeRounds {
    client: Arc<dyn RspClient>,
    runtime_id: String,
}

#[async_trait]
impl WorkflowSubmitter for DownloadRuntimeRounds {
    async fn submit(&self, round: WorkflowRound) -> WorkflowResult<WorkflowResponse> {
        let request = DownloadSingleRuntimeRequest {
            download_runtime_id: self.runtime_id.clone(),
            request_id: round.request_id,
            data: round.data,
        };
        Ok(self.client.download_runtime(&request).await?)
    }
}

struct ServerActionRounds {
    client: Arc<dyn RspClient>,
    action_id: String,
    server_id: ServerId,
}

#[async_trait]
impl WorkflowSubmitter for ServerActionRounds {
    async fn submit(&self, round: WorkflowRound) -> WorkflowResult<WorkflowResponse> {
        let request = ServerActionRequest {
            action_id: self.action_id.clone(),
            server_id: self.server_id.clone(),
            request_id: round.request_id,
            data: round.data,
        };
        Ok(self.client.execute_server_action(&request).await?)
    }
}

/// Presents server creation as a workflow: missing required attributes
/// and keys the server rejects become prompt items.
struct CreateServerRounds {
    client: Arc<dyn RspClient>,
    server_type: ServerTypeId,
    server_id: ServerId,
    required: Attributes,
    optional: Attributes,
}

impl CreateServerRounds {
    fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.required
            .attributes
            .get(key)
            .or_else(|| self.optional.attributes.get(key))
    }
}

#[async_trait]
impl WorkflowSubmitter for CreateServerRounds {
    async fn submit(&self, round: WorkflowRound) -> WorkflowResult<WorkflowResponse> {
        let data = round.data.unwrap_or_default();
        let missing: Vec<WorkflowResponseItem> = self
            .required
            .attributes
            .iter()
            .filter(|(key, _)| !data.contains(key))
            .map(|(key, attribute)| attribute_item(key, Some(attribute)))
            .collect();
        if !missing.is_empty() {
            return Ok(WorkflowResponse::needs_input(round.request_id, missing));
        }

        let attributes = ServerAttributes {
            server_type: self.server_type.clone(),
            id: self.server_id.clone(),
            attributes: data.into_inner(),
        };
        let response = self.client.create_server(&attributes).await?;
        if response.invalid_keys.is_empty() {
            return Ok(WorkflowResponse::terminal(response.status));
        }
        let retry = response
            .invalid_keys
            .iter()
            .map(|key| attribute_item(key, self.attribute(key)))
            .collect();
        Ok(WorkflowResponse::needs_input(round.request_id, retry))
    }
}

fn attribute_item(key: &str, attribute: Option<&Attribute>) -> WorkflowResponseItem {
    let Some(attribute) = attribute else {
        return WorkflowResponseItem::new(key, key)
            .with_prompt(WorkflowPrompt::new(ResponseType::String));
    };
    let response_type = match attribute.attribute_type {
        AttributeType::Bool => ResponseType::Bool,
        AttributeType::Int => ResponseType::Int,
        AttributeType::String | AttributeType::List | AttributeType::Map => ResponseType::String,
    };
    let prompt = if attribute.secret {
        WorkflowPrompt::new(response_type).secret()
    } else {
        WorkflowPrompt::new(response_type)
    };
    let label = if attribute.description.trim().is_empty() {
        key
    } else {
        attribute.description.as_str()
    };
    WorkflowResponseItem::new(key, label).with_prompt(prompt)
}
