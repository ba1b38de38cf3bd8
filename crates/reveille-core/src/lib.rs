//! Alarm controller core for reveille
//!
//! This crate is the heart of reveille, containing:
//! - The controller state machine (Unconfigured -> Configured)
//! - Turning today's alarm timestamps into deferred tasks
//! - The fire-time guard that re-checks the feature flag and presence
//!   before telling the device to play

mod controller;
mod error;
mod guard;
mod scheduling;
mod state;

pub use controller::*;
pub use error::*;
pub use guard::*;
pub use scheduling::*;
pub use state::*;
