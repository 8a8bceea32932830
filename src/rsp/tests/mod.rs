//! Unit tests for the RSP module.
//!
//! Tests are organised by concern: domain state machines, the state
//! registry, the event pump and the lifecycle commands.

mod server_tests;
mod workflow_command_tests;
