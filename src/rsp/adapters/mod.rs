//! Adapters implementing the RSP ports.

pub mod memory;

pub use memory::{
    InMemoryController, InMemoryRsp, RecordedRequest, RecordingChannel, RecordingDebugBridge,
    ScriptedRequest, ScriptedUi,
};
