//! Recording debugger bridge.

use crate::rsp::ports::{DebugBridge, DebugError, DebugSession};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct BridgeState {
    extensions: HashMap<String, String>,
    installed: HashSet<String>,
    attaches: Vec<DebugSession>,
    attach_failure: Option<String>,
}

/// Debugger bridge that records attach requests.
#[derive(Debug, Clone, Default)]
pub struct RecordingDebugBridge {
    state: Arc<Mutex<BridgeState>>,
}

impl RecordingDebugBridge {
    /// Creates a bridge supporting no debugger protocol.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Supports `debug_type` through `extension`, optionally installed.
    #[must_use]
    pub fn supporting(self, debug_type: &str, extension: &str, installed: bool) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state
                .extensions
                .insert(debug_type.to_owned(), extension.to_owned());
            if installed {
                state.installed.insert(extension.to_owned());
            }
        }
        self
    }

    /// Makes every attach fail with `message`.
    #[must_use]
    pub fn failing_attach(self, message: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.attach_failure = Some(message.into());
        }
        self
    }

    /// Sessions attached so far.
    #[must_use]
    pub fn attaches(&self) -> Vec<DebugSession> {
        self.state
            .lock()
            .map(|state| state.attaches.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DebugBridge for RecordingDebugBridge {
    fn required_extension(&self, debug_type: &str) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.extensions.get(debug_type).cloned())
    }

    fn is_extension_installed(&self, extension_id: &str) -> bool {
        self.state
            .lock()
            .is_ok_and(|state| state.installed.contains(extension_id))
    }

    async fn attach(&self, session: DebugSession) -> Result<(), DebugError> {
        let mut state = self
            .state
            .lock()
            .map_err(|err| DebugError::attach(std::io::Error::other(err.to_string())))?;
        state.attaches.push(session);
        match state.attach_failure.clone() {
            Some(message) => Err(DebugError::attach(std::io::Error::other(message))),
            None => Ok(()),
        }
    }
}
