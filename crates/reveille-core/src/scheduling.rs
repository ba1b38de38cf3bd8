//! Turning alarm timestamps into deferred tasks

use chrono::{DateTime, Local};
use reveille_host_api::DeferredScheduler;
use reveille_util::{delay_until, format_duration, TaskId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::{ControllerResult, ExecutionGuard};

/// An alarm that was handed to the deferred scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAlarm {
    pub task_id: TaskId,
    pub at: DateTime<Local>,
    pub delay: Duration,
}

/// Outcome of one scheduling pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Alarms submitted, in submission order
    pub submitted: Vec<SubmittedAlarm>,
    /// Alarms already in the past
    pub skipped: Vec<DateTime<Local>>,
}

impl ScheduleReport {
    pub fn submitted_count(&self) -> usize {
        self.submitted.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Submits one guarded task per future alarm
pub struct EventScheduler {
    scheduler: Arc<dyn DeferredScheduler>,
}

impl EventScheduler {
    pub fn new(scheduler: Arc<dyn DeferredScheduler>) -> Self {
        Self { scheduler }
    }

    /// Submit a task for every alarm at or after `now`, in iteration order.
    ///
    /// Past alarms are skipped with a warning. A submission failure aborts
    /// the pass; tasks already submitted stay submitted.
    pub fn schedule(
        &self,
        alarms: &[DateTime<Local>],
        guard: &ExecutionGuard,
        now: DateTime<Local>,
    ) -> ControllerResult<ScheduleReport> {
        let mut report = ScheduleReport::default();

        if alarms.is_empty() {
            warn!("No alarms for today, nothing scheduled");
            return Ok(report);
        }

        for &at in alarms {
            let Some(delay) = delay_until(&at, &now) else {
                warn!(alarm = %at, "Cannot schedule alarm for past date");
                report.skipped.push(at);
                continue;
            };

            let task_id = self
                .scheduler
                .submit(guard.to_task(), delay)
                .inspect_err(|e| error!(alarm = %at, error = %e, "Failed to submit alarm task"))?;

            debug!(
                task_id = %task_id,
                delay_secs = delay.as_secs(),
                delay = %format_duration(delay),
                "Scheduled alarm task"
            );

            report.submitted.push(SubmittedAlarm { task_id, at, delay });
        }

        Ok(report)
    }
}
