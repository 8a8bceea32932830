//! Controller port: launches and stops the RSP process for a provider type.

use crate::rsp::{
    domain::{ProviderId, RunState},
    ports::OutputChannel,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Result type for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Where a launched RSP listens and whether this client spawned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RspLaunch {
    /// Host name.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// `true` when the process was spawned locally, `false` when an
    /// already-running RSP was found and attached to.
    pub spawned: bool,
}

impl RspLaunch {
    /// Creates launch metadata for `localhost`.
    #[must_use]
    pub fn local(port: u16, spawned: bool) -> Self {
        Self {
            host: "localhost".to_owned(),
            port,
            spawned,
        }
    }
}

/// Output sinks the controller writes RSP process output to.
#[derive(Clone)]
pub struct ProcessSinks {
    /// Standard output sink.
    pub stdout: Arc<dyn OutputChannel>,
    /// Standard error sink.
    pub stderr: Arc<dyn OutputChannel>,
}

/// Errors returned by controller adapters.
#[derive(Debug, Clone, Error)]
pub enum ControllerError {
    /// The RSP process could not be launched.
    #[error("RSP launch failed: {0}")]
    Launch(Arc<dyn std::error::Error + Send + Sync>),

    /// Generic controller failure.
    #[error("{0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ControllerError {
    /// Wraps a launch failure.
    pub fn launch(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Launch(Arc::new(err))
    }

    /// Wraps a runtime failure.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}

/// External launcher for one provider type's RSP process.
///
/// Controllers are optional plugins; a missing or broken controller is a
/// reportable error for that provider only.
#[async_trait]
pub trait RspController: Send + Sync {
    /// Launches (or locates) the RSP process.
    async fn start_rsp(&self, sinks: ProcessSinks) -> ControllerResult<RspLaunch>;

    /// Forcibly stops the RSP process.
    async fn stop_rsp(&self) -> ControllerResult<()>;

    /// Subscribes to process state changes observed by the controller.
    fn state_changes(&self) -> broadcast::Receiver<RunState>;
}

/// Controllers keyed by provider identifier.
#[derive(Clone, Default)]
pub struct ControllerDirectory {
    controllers: HashMap<ProviderId, Arc<dyn RspController>>,
}

impl ControllerDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the controller for a provider, replacing any earlier one.
    pub fn insert(&mut self, provider: ProviderId, controller: Arc<dyn RspController>) {
        self.controllers.insert(provider, controller);
    }

    /// Adds a controller, builder style.
    #[must_use]
    pub fn with(mut self, provider: ProviderId, controller: Arc<dyn RspController>) -> Self {
        self.insert(provider, controller);
        self
    }

    /// Resolves the controller for a provider.
    #[must_use]
    pub fn resolve(&self, provider: &ProviderId) -> Option<Arc<dyn RspController>> {
        self.controllers.get(provider).cloned()
    }
}
