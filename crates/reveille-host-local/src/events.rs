//! Event source that expands the configured daily alarms

use chrono::{DateTime, Local, NaiveDate};
use reveille_config::Policy;
use reveille_host_api::EventSource;
use std::sync::Arc;

/// Alarm timestamps taken from the loaded policy.
///
/// Unpinned, the date is read when queried, so a long-lived source follows
/// the clock across midnight. A pinned source always yields one date.
#[derive(Debug, Clone)]
pub struct ConfigEventSource {
    policy: Arc<Policy>,
    date: Option<NaiveDate>,
}

impl ConfigEventSource {
    /// Source for whatever the current local day is
    pub fn new(policy: Arc<Policy>) -> Self {
        Self { policy, date: None }
    }

    /// Source pinned to `date`
    pub fn on_date(policy: Arc<Policy>, date: NaiveDate) -> Self {
        Self {
            policy,
            date: Some(date),
        }
    }

    pub fn alarms_for(&self, date: NaiveDate) -> Vec<DateTime<Local>> {
        self.policy.alarms_on(date)
    }
}

impl EventSource for ConfigEventSource {
    fn alarm_timestamps(&self) -> Vec<DateTime<Local>> {
        let date = self
            .date
            .unwrap_or_else(|| reveille_util::now().date_naive());
        self.alarms_for(date)
    }
}
