//! Local collaborators for reveille
//!
//! Provides:
//! - A tokio-backed deferred scheduler
//! - An actuator that runs the configured device command
//! - Presence and feature flags backed by marker files
//! - An event source that expands the configured daily alarms

mod actuator;
mod events;
mod flags;
mod scheduler;

pub use actuator::*;
pub use events::*;
pub use flags::*;
pub use scheduler::*;
