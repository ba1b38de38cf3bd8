//! Shared utilities for reveille
//!
//! This crate provides:
//! - ID types (TaskId)
//! - Time utilities (mock-aware wall clock, weekday masks, delay helpers)
//! - Default paths for the config file

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
