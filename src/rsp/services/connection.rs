//! Live connection resources held per provider.

use crate::rsp::ports::{ProcessSinks, ProtocolResult, RspClient, RspLaunch};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Owns the event-pump task of one connection and aborts it when dropped.
#[derive(Debug)]
pub struct PumpGuard {
    handle: Option<JoinHandle<()>>,
}

impl PumpGuard {
    /// Wraps a spawned pump task.
    #[must_use]
    pub const fn new(handle: JoinHandle<()>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Lets the task run to completion instead of aborting it.
    pub fn detach(mut self) {
        self.handle.take();
    }

    /// Returns whether the pump task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for PumpGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// How a connection is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Teardown {
    /// Detach the client; the RSP process keeps running.
    Disconnect,
    /// Ask the RSP process to shut down.
    Shutdown,
    /// The process is already going away; release local resources only.
    Release,
    /// Released by the event pump itself after the connection closed.
    Closed,
}

/// The live, externally-resourced part of a provider.
pub struct ConnectionContext {
    client: Arc<dyn RspClient>,
    launch: RspLaunch,
    sinks: ProcessSinks,
    pump: Option<PumpGuard>,
}

impl ConnectionContext {
    /// Creates a context without an event pump.
    #[must_use]
    pub fn new(client: Arc<dyn RspClient>, launch: RspLaunch, sinks: ProcessSinks) -> Self {
        Self {
            client,
            launch,
            sinks,
            pump: None,
        }
    }

    /// Attaches the event pump guard.
    #[must_use]
    pub fn with_pump(mut self, pump: PumpGuard) -> Self {
        self.pump = Some(pump);
        self
    }

    /// Client handle.
    #[must_use]
    pub const fn client(&self) -> &Arc<dyn RspClient> {
        &self.client
    }

    /// Launch metadata.
    #[must_use]
    pub const fn launch(&self) -> &RspLaunch {
        &self.launch
    }

    /// Releases the connection.
    ///
    /// Output sinks are disposed and the pump is stopped on every path,
    /// including when the client call fails.
    ///
    /// # Errors
    ///
    /// Returns the client error from disconnect or shutdown.
    pub async fn release(mut self, teardown: Teardown) -> ProtocolResult<()> {
        debug!(host = %self.launch.host, port = self.launch.port, ?teardown, "releasing RSP connection");
        match (teardown, self.pump.take()) {
            (Teardown::Closed, Some(pump)) => pump.detach(),
            (_, pump) => drop(pump),
        }
        let result = match teardown {
            Teardown::Disconnect => self.client.disconnect().await,
            Teardown::Shutdown => self.client.shutdown_server().await,
            Teardown::Release | Teardown::Closed => Ok(()),
        };
        self.sinks.stdout.dispose();
        self.sinks.stderr.dispose();
        result
    }
}
