//! Errors raised by lifecycle commands.

use super::RegistryError;
use crate::rsp::{
    domain::{ProviderId, RspDomainError, RunState, ServerId, Status},
    ports::{ControllerError, DebugError, ProtocolError},
};
use crate::workflow::domain::WorkflowError;
use thiserror::Error;

/// Lifecycle command failures.
///
/// User cancellation is never an error; commands report it through their
/// return value.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Registry lookup or mutation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] RspDomainError),

    /// The protocol client failed below the protocol level.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The RSP controller failed.
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// A workflow failed.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// The debugger could not attach.
    #[error(transparent)]
    Debug(#[from] DebugError),

    /// Start was requested for a provider that is not stopped.
    #[error("RSP provider {0} is already running")]
    AlreadyRunning(ProviderId),

    /// Stop was requested for a provider that is not running.
    #[error("RSP provider {provider} is not running (status {status})")]
    NotRunning {
        /// Affected provider.
        provider: ProviderId,
        /// Status at the time of the request.
        status: RunState,
    },

    /// No controller is registered for the provider.
    #[error("no RSP controller is available for provider {0}")]
    NoController(ProviderId),

    /// The provider has no live client.
    #[error("cannot contact RSP provider {0}")]
    CannotContactProvider(ProviderId),

    /// A budgeted request did not answer in time.
    #[error("RSP provider {provider} did not respond to {request} in time")]
    NoResponseInTime {
        /// Affected provider.
        provider: ProviderId,
        /// Request that timed out.
        request: &'static str,
    },

    /// Forced stop failed; the provider status was restored.
    #[error("failed to terminate RSP provider {provider}: {source}")]
    TerminateFailed {
        /// Affected provider.
        provider: ProviderId,
        /// Controller failure.
        source: ControllerError,
    },

    /// The server's state does not allow the operation.
    #[error("cannot {operation} server {server} while it is {state}")]
    InvalidServerState {
        /// Affected server.
        server: ServerId,
        /// Requested operation.
        operation: &'static str,
        /// Current run state.
        state: RunState,
    },

    /// The server answered with a non-ok status.
    #[error("{}", .0.message)]
    StatusRejected(Status),

    /// The launch command carries no debug details.
    #[error("server {0} does not advertise debug details")]
    DebugNotSupported(ServerId),

    /// No debugger handles the advertised protocol.
    #[error("debug type {0} is not supported")]
    UnsupportedDebugType(String),

    /// The companion debugger extension is missing.
    #[error("debugger extension {0} is not installed")]
    MissingDebugExtension(String),

    /// A restart observed something other than a stop.
    #[error("server {server} failed to restart: it is {state}")]
    RestartFailed {
        /// Affected server.
        server: ServerId,
        /// Observed state.
        state: RunState,
    },

    /// A restart never observed the server stopping.
    #[error("server {0} did not stop in time to restart")]
    RestartTimedOut(ServerId),

    /// The server has no deployment with the label.
    #[error("server {server} has no deployment {label}")]
    NoSuchDeployable {
        /// Affected server.
        server: ServerId,
        /// Missing label.
        label: String,
    },

    /// The server offers no actions.
    #[error("no actions are available for server {0}")]
    NoServerActions(ServerId),

    /// Bean discovery found nothing.
    #[error("no server found at {0}")]
    NoServerFound(String),

    /// The provider offers no downloadable runtimes.
    #[error("no downloadable runtimes are available")]
    NoRuntimes,
}

/// Result type for lifecycle commands.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
