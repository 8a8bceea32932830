//! Port contracts for the collaborators the orchestrator drives but does
//! not implement: the protocol client, the RSP process controller, the UI
//! capability surface and the debugger bridge.

mod client;
mod controller;
mod debug;
mod ui;

pub use client::{
    ClientEvent, Connection, ProtocolError, ProtocolResult, RspClient, RspConnector, StringPrompt,
};
pub use controller::{
    ControllerDirectory, ControllerError, ControllerResult, ProcessSinks, RspController,
    RspLaunch,
};
pub use debug::{DebugBridge, DebugError, DebugSession};
pub use ui::{
    EditRequest, InputKind, InputRequest, MessageLevel, OutputChannel, OutputChannelFactory,
    PickRequest, UserInterface,
};
