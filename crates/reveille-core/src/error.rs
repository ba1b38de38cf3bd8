//! Error types for the controller

use reveille_host_api::HostError;
use thiserror::Error;

/// Errors surfaced by [`crate::Controller`] operations
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Failed to submit alarm task: {0}")]
    Submit(#[from] HostError),
}

impl ControllerError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_configured() -> Self {
        Self::IllegalState("Not configured".into())
    }

    /// Error for a required collaborator that was not supplied
    pub(crate) fn missing(name: &str) -> Self {
        Self::InvalidArgument(format!("'{}' must not be absent", name))
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;
