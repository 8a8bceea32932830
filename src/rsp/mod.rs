//! RSP provider and server lifecycle orchestration.
//!
//! Tracks every RSP provider and the servers it manages, keeps that model
//! consistent under asynchronous push events, and runs the commands that
//! start, stop, publish and configure them. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
