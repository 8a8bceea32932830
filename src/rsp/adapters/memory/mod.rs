//! In-memory adapters for local development and tests.

mod client;
mod controller;
mod debug;
mod ui;

pub use client::{InMemoryRsp, RecordedRequest, ScriptedRequest};
pub use controller::InMemoryController;
pub use debug::RecordingDebugBridge;
pub use ui::{RecordingChannel, ScriptedUi};
