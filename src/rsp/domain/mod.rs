//! Domain model for RSP providers, servers and deployables.
//!
//! Identifiers are validated on construction and every status is a closed
//! enum with explicit wire-code conversion. Protocol request and response
//! shapes live alongside the state they describe. Infrastructure concerns
//! (connections, processes, UI) remain outside this boundary.

mod error;
mod ids;
mod protocol;
mod provider;
mod server;
mod status;

pub use error::RspDomainError;
pub use ids::{ProviderId, ServerId, ServerTypeId};
pub use protocol::{
    Attribute, AttributeType, Attributes, ClientCapabilities, CommandLineDetails,
    CreateServerResponse, DEBUG_PORT_PROPERTY, DEBUG_TYPE_PROPERTY, DownloadRuntimeDescription,
    DownloadSingleRuntimeRequest, GetServerJsonResponse, LaunchParameters,
    ListServerActionResponse, MessageBoxNotification, OutputStream, PublishServerRequest,
    SERVER_HOME_DIR_ATTRIBUTE, ServerActionRequest, ServerActionWorkflow, ServerAttributes,
    ServerBean, ServerCapabilities, ServerDeployableReference, ServerProcessOutput,
    StartServerResponse, StopServerAttributes, UpdateServerRequest, UpdateServerResponse,
};
pub use provider::{RspProviderState, ServerInventory};
pub use server::{DeployableReference, DeployableState, ServerHandle, ServerState, ServerType};
pub use status::{PublishKind, PublishState, RunMode, RunState, Severity, Status};
