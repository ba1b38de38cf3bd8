//! Collaborator traits

use chrono::{DateTime, Local};
use reveille_util::TaskId;
use std::time::Duration;
use thiserror::Error;

/// Errors from collaborator operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Submission rejected: {0}")]
    Rejected(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("No async runtime available")]
    NoRuntime,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// A unit of work handed to a [`DeferredScheduler`].
pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

/// The device the controller instructs when an alarm fires.
pub trait Actuator: Send + Sync {
    /// Short human-readable identifier, used in logs
    fn identifier(&self) -> String;

    /// Perform the action (e.g. start playing the next item).
    ///
    /// The scheduler is the one bound alongside this actuator, so follow-up
    /// work can be queued on the same facility.
    fn perform_action(&self, scheduler: &dyn DeferredScheduler) -> HostResult<()>;
}

/// Runs a unit of work once a delay has elapsed.
pub trait DeferredScheduler: Send + Sync {
    /// Submit `task` to run after `delay`.
    ///
    /// Must never run the task before `delay` has elapsed and must not block
    /// waiting for it. Failure to accept the task is reported synchronously.
    fn submit(&self, task: DeferredTask, delay: Duration) -> HostResult<TaskId>;
}

/// Whether the tracked user is currently present.
pub trait PresenceProvider: Send + Sync {
    fn is_user_present(&self) -> bool;
}

/// Whether the alarm feature is currently enabled.
pub trait FeatureFlagProvider: Send + Sync {
    fn is_feature_enabled(&self) -> bool;
}

/// Source of today's alarm timestamps.
pub trait EventSource: Send + Sync {
    /// Absolute alarm timestamps. May be empty.
    fn alarm_timestamps(&self) -> Vec<DateTime<Local>>;
}
