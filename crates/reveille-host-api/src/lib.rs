//! Collaborator trait interfaces for reveille
//!
//! This crate defines the narrow contracts between the controller core and
//! the outside world: the device that plays the alarm, the facility that runs
//! deferred work, and the providers of presence, feature flag and alarm data.
//! It contains no platform code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
