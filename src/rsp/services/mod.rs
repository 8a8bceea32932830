//! Orchestration services: the state registry, the per-connection event
//! pump and the lifecycle controller.

mod connection;
mod error;
mod events;
mod lifecycle;
mod pump;
mod registry;

pub use connection::{ConnectionContext, PumpGuard, Teardown};
pub use error::{LifecycleError, LifecycleResult};
pub use events::RegistryEvent;
pub use lifecycle::{
    DebugAttachWatch, LifecycleController, LifecycleDependencies, ServerLaunch, failure_message,
};
pub use pump::spawn_event_pump;
pub use registry::{RegistryError, RegistryResult, StateRegistry};
