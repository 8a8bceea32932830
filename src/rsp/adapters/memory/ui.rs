//! Scripted user interface and recording output channels.

use crate::rsp::ports::{
    EditRequest, InputRequest, MessageLevel, OutputChannel, OutputChannelFactory, PickRequest,
    UserInterface,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Output log that keeps everything appended to it.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    text: Mutex<String>,
    disposals: AtomicUsize,
}

impl RecordingChannel {
    /// Everything appended so far.
    #[must_use]
    pub fn text(&self) -> String {
        self.text.lock().map(|text| text.clone()).unwrap_or_default()
    }

    /// How many times the channel was disposed.
    #[must_use]
    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

impl OutputChannel for RecordingChannel {
    fn append(&self, text: &str) {
        if let Ok(mut buffer) = self.text.lock() {
            buffer.push_str(text);
        }
    }

    fn dispose(&self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct UiScript {
    picks: VecDeque<Option<String>>,
    inputs: VecDeque<Option<String>>,
    edits: VecDeque<Option<String>>,
    pick_requests: Vec<PickRequest>,
    input_requests: Vec<InputRequest>,
    edit_requests: Vec<EditRequest>,
    messages: Vec<(MessageLevel, String)>,
    browsers: Vec<String>,
    terminals: Vec<(String, String)>,
    channels: HashMap<String, Arc<RecordingChannel>>,
}

/// User interface answering from queued replies.
///
/// An exhausted queue answers `None`, which callers treat as the user
/// dismissing the dialog. Every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct ScriptedUi {
    script: Arc<Mutex<UiScript>>,
}

impl ScriptedUi {
    /// Creates a UI with no queued replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a picker reply.
    #[must_use]
    pub fn with_pick(self, choice: Option<&str>) -> Self {
        self.lock().picks.push_back(choice.map(str::to_owned));
        self
    }

    /// Queues an input box reply.
    #[must_use]
    pub fn with_input(self, text: Option<&str>) -> Self {
        self.lock().inputs.push_back(text.map(str::to_owned));
        self
    }

    /// Queues an editor reply.
    #[must_use]
    pub fn with_edit(self, content: Option<&str>) -> Self {
        self.lock().edits.push_back(content.map(str::to_owned));
        self
    }

    /// Pickers shown so far.
    #[must_use]
    pub fn pick_requests(&self) -> Vec<PickRequest> {
        self.lock().pick_requests.clone()
    }

    /// Input boxes shown so far.
    #[must_use]
    pub fn input_requests(&self) -> Vec<InputRequest> {
        self.lock().input_requests.clone()
    }

    /// Editors opened so far.
    #[must_use]
    pub fn edit_requests(&self) -> Vec<EditRequest> {
        self.lock().edit_requests.clone()
    }

    /// Toasts shown so far.
    #[must_use]
    pub fn messages(&self) -> Vec<(MessageLevel, String)> {
        self.lock().messages.clone()
    }

    /// URIs opened so far.
    #[must_use]
    pub fn browsers(&self) -> Vec<String> {
        self.lock().browsers.clone()
    }

    /// Terminals opened so far, as `(name, command)`.
    #[must_use]
    pub fn terminals(&self) -> Vec<(String, String)> {
        self.lock().terminals.clone()
    }

    /// The output channel opened under `name`, if any.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<Arc<RecordingChannel>> {
        self.lock().channels.get(name).cloned()
    }

    /// Names of every channel opened so far, sorted.
    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().channels.keys().cloned().collect();
        names.sort();
        names
    }

    // A poisoned lock only follows a panicking test; keep serving its data.
    fn lock(&self) -> MutexGuard<'_, UiScript> {
        self.script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl OutputChannelFactory for ScriptedUi {
    fn open_channel(&self, name: &str) -> Arc<dyn OutputChannel> {
        let channel = Arc::new(RecordingChannel::default());
        self.lock()
            .channels
            .insert(name.to_owned(), Arc::clone(&channel));
        channel
    }
}

#[async_trait]
impl UserInterface for ScriptedUi {
    async fn pick(&self, request: PickRequest) -> Option<String> {
        let mut script = self.lock();
        script.pick_requests.push(request);
        script.picks.pop_front().flatten()
    }

    async fn input(&self, request: InputRequest) -> Option<String> {
        let mut script = self.lock();
        script.input_requests.push(request);
        script.inputs.pop_front().flatten()
    }

    async fn edit(&self, request: EditRequest) -> Option<String> {
        let mut script = self.lock();
        script.edit_requests.push(request);
        script.edits.pop_front().flatten()
    }

    fn open_browser(&self, uri: &str) {
        self.lock().browsers.push(uri.to_owned());
    }

    fn open_terminal(&self, name: &str, command: &str) {
        self.lock()
            .terminals
            .push((name.to_owned(), command.to_owned()));
    }

    fn show_message(&self, level: MessageLevel, message: &str) {
        self.lock().messages.push((level, message.to_owned()));
    }
}
