//! Mock collaborators for testing

use chrono::{DateTime, Local};
use reveille_util::TaskId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{
    Actuator, DeferredScheduler, DeferredTask, EventSource, FeatureFlagProvider, HostError,
    HostResult, PresenceProvider,
};

/// Mock actuator that counts how often it was told to act
pub struct MockActuator {
    name: String,
    actions: AtomicUsize,

    /// Configure perform_action to fail
    pub fail_action: Arc<Mutex<bool>>,
}

impl MockActuator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: AtomicUsize::new(0),
            fail_action: Arc::new(Mutex::new(false)),
        }
    }

    /// Number of times perform_action was called (including failed calls)
    pub fn action_count(&self) -> usize {
        self.actions.load(Ordering::SeqCst)
    }

    pub fn set_fail_action(&self, fail: bool) {
        *self.fail_action.lock().unwrap() = fail;
    }
}

impl Default for MockActuator {
    fn default() -> Self {
        Self::new("mock-actuator")
    }
}

impl Actuator for MockActuator {
    fn identifier(&self) -> String {
        self.name.clone()
    }

    fn perform_action(&self, _scheduler: &dyn DeferredScheduler) -> HostResult<()> {
        self.actions.fetch_add(1, Ordering::SeqCst);
        if *self.fail_action.lock().unwrap() {
            return Err(HostError::ActionFailed("Mock action failure".into()));
        }
        Ok(())
    }
}

/// A task held by [`MockScheduler`] until the test fires it
pub struct MockSubmission {
    pub id: TaskId,
    pub delay: Duration,
    task: Option<DeferredTask>,
}

/// Mock scheduler that records submissions and only runs them on demand
pub struct MockScheduler {
    submissions: Mutex<Vec<MockSubmission>>,

    /// Reject submissions once this many have been accepted
    pub accept_limit: Arc<Mutex<Option<usize>>>,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
            accept_limit: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_accept_limit(&self, limit: Option<usize>) {
        *self.accept_limit.lock().unwrap() = limit;
    }

    /// Number of accepted submissions
    pub fn submitted_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    /// Delays of accepted submissions, in submission order
    pub fn delays(&self) -> Vec<Duration> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.delay)
            .collect()
    }

    /// Run every submitted task that has not run yet, in submission order.
    ///
    /// Returns the number of tasks run.
    pub fn fire_all(&self) -> usize {
        // Take the tasks out first so a task may submit follow-up work
        let tasks: Vec<DeferredTask> = self
            .submissions
            .lock()
            .unwrap()
            .iter_mut()
            .filter_map(|s| s.task.take())
            .collect();

        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }
}

impl Default for MockScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredScheduler for MockScheduler {
    fn submit(&self, task: DeferredTask, delay: Duration) -> HostResult<TaskId> {
        let mut submissions = self.submissions.lock().unwrap();

        if let Some(limit) = *self.accept_limit.lock().unwrap()
            && submissions.len() >= limit
        {
            return Err(HostError::Rejected("Mock submit failure".into()));
        }

        let id = TaskId::new();
        submissions.push(MockSubmission {
            id,
            delay,
            task: Some(task),
        });
        Ok(id)
    }
}

/// A switchable boolean usable as presence or feature flag
#[derive(Debug, Default)]
pub struct StaticFlag {
    value: AtomicBool,
    reads: AtomicUsize,
}

impl StaticFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Number of times the flag was queried
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read(&self) -> bool {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.value.load(Ordering::SeqCst)
    }
}

impl PresenceProvider for StaticFlag {
    fn is_user_present(&self) -> bool {
        self.read()
    }
}

impl FeatureFlagProvider for StaticFlag {
    fn is_feature_enabled(&self) -> bool {
        self.read()
    }
}

/// Event source returning a fixed list of alarm timestamps
#[derive(Debug, Default)]
pub struct FixedEventSource {
    alarms: Mutex<Vec<DateTime<Local>>>,
    reads: AtomicUsize,
}

impl FixedEventSource {
    pub fn new(alarms: Vec<DateTime<Local>>) -> Self {
        Self {
            alarms: Mutex::new(alarms),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn set_alarms(&self, alarms: Vec<DateTime<Local>>) {
        *self.alarms.lock().unwrap() = alarms;
    }

    /// Number of times the alarms were read
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl EventSource for FixedEventSource {
    fn alarm_timestamps(&self) -> Vec<DateTime<Local>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.alarms.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_scheduler_records_and_fires() {
        let scheduler = MockScheduler::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let counter = ran.clone();
        scheduler
            .submit(
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
                Duration::from_secs(3),
            )
            .unwrap();

        assert_eq!(scheduler.submitted_count(), 1);
        assert_eq!(scheduler.delays(), vec![Duration::from_secs(3)]);
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        assert_eq!(scheduler.fire_all(), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        // Tasks run once only
        assert_eq!(scheduler.fire_all(), 0);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn mock_scheduler_accept_limit() {
        let scheduler = MockScheduler::new();
        scheduler.set_accept_limit(Some(1));

        assert!(scheduler.submit(Box::new(|| {}), Duration::ZERO).is_ok());
        let err = scheduler.submit(Box::new(|| {}), Duration::ZERO).unwrap_err();
        assert!(matches!(err, HostError::Rejected(_)));
        assert_eq!(scheduler.submitted_count(), 1);
    }

    #[test]
    fn mock_actuator_counts_and_fails() {
        let actuator = MockActuator::new("speaker");
        let scheduler = MockScheduler::new();

        assert!(actuator.perform_action(&scheduler).is_ok());
        actuator.set_fail_action(true);
        assert!(actuator.perform_action(&scheduler).is_err());
        assert_eq!(actuator.action_count(), 2);
        assert_eq!(actuator.identifier(), "speaker");
    }

    #[test]
    fn static_flag_counts_reads() {
        let flag = StaticFlag::new(false);
        assert!(!flag.is_feature_enabled());
        flag.set(true);
        assert!(flag.is_user_present());
        assert_eq!(flag.read_count(), 2);
    }
}
