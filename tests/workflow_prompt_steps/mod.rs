//! Step definitions for workflow prompt scenarios.

mod given;
mod then;
mod when;
pub mod world;
