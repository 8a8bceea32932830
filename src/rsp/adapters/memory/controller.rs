//! In-memory RSP controller.

use crate::rsp::{
    domain::RunState,
    ports::{ControllerError, ControllerResult, ProcessSinks, RspController, RspLaunch},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::trace;

const STATE_CAPACITY: usize = 16;

#[derive(Debug, Default)]
struct ControllerFaults {
    start: Option<String>,
    stop: Option<String>,
}

/// Controller that pretends to launch an RSP process.
///
/// Starting writes a banner to the stdout sink and reports `Started`;
/// stopping reports `Stopped`. Either call can be scripted to fail.
#[derive(Debug, Clone)]
pub struct InMemoryController {
    launch: RspLaunch,
    faults: Arc<Mutex<ControllerFaults>>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    states: broadcast::Sender<RunState>,
}

impl InMemoryController {
    /// Creates a controller reporting `launch` from every start.
    #[must_use]
    pub fn new(launch: RspLaunch) -> Self {
        let (states, _) = broadcast::channel(STATE_CAPACITY);
        Self {
            launch,
            faults: Arc::default(),
            starts: Arc::default(),
            stops: Arc::default(),
            states,
        }
    }

    /// Makes every start fail with `message`.
    #[must_use]
    pub fn failing_start(self, message: impl Into<String>) -> Self {
        if let Ok(mut faults) = self.faults.lock() {
            faults.start = Some(message.into());
        }
        self
    }

    /// Makes every stop fail with `message`.
    #[must_use]
    pub fn failing_stop(self, message: impl Into<String>) -> Self {
        if let Ok(mut faults) = self.faults.lock() {
            faults.stop = Some(message.into());
        }
        self
    }

    /// Number of `start_rsp` calls.
    #[must_use]
    pub fn start_calls(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of `stop_rsp` calls.
    #[must_use]
    pub fn stop_calls(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Reports that the process exited on its own.
    pub fn crash(&self) {
        self.report(RunState::Stopped);
    }

    fn report(&self, state: RunState) {
        if self.states.send(state).is_err() {
            trace!(%state, "no process state subscribers");
        }
    }

    fn fault(&self, select: impl FnOnce(&ControllerFaults) -> Option<String>) -> Option<String> {
        self.faults
            .lock()
            .map_or_else(|err| Some(err.to_string()), |faults| select(&faults))
    }
}

#[async_trait]
impl RspController for InMemoryController {
    async fn start_rsp(&self, sinks: ProcessSinks) -> ControllerResult<RspLaunch> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fault(|faults| faults.start.clone()) {
            return Err(ControllerError::launch(std::io::Error::other(message)));
        }
        sinks
            .stdout
            .append(&format!("RSP listening on port {}\n", self.launch.port));
        self.report(RunState::Started);
        Ok(self.launch.clone())
    }

    async fn stop_rsp(&self) -> ControllerResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fault(|faults| faults.stop.clone()) {
            return Err(ControllerError::runtime(std::io::Error::other(message)));
        }
        self.report(RunState::Stopped);
        Ok(())
    }

    fn state_changes(&self) -> broadcast::Receiver<RunState> {
        self.states.subscribe()
    }
}
