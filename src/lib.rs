//! RSP Conductor: client-side orchestration for Runtime Server Protocol
//! providers.
//!
//! An RSP provider is an external process that manages application
//! servers. This crate keeps a consistent model of every provider and its
//! servers, reacts to the provider's push events, runs the commands that
//! start, stop and configure providers and servers, and drives the
//! multi-round interactive workflows some of those commands require.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure state machines and protocol shapes
//! - **Ports**: Trait interfaces for the protocol client, the RSP process
//!   controller, the UI and the debugger
//! - **Adapters**: In-memory implementations of the ports
//!
//! # Modules
//!
//! - [`rsp`]: State registry, event pump and lifecycle controller
//! - [`workflow`]: Workflow strategy dispatch and the workflow engine
//! - [`config`]: Orchestrator tunables

pub mod config;
pub mod rsp;
pub mod workflow;
