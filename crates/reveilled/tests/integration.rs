//! Integration tests for reveilled
//!
//! These tests wire the controller to config-driven and local collaborators
//! the same way the daemon does.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate, NaiveTime};
use reveille_config::{parse_config, ConfigError, Policy};
use reveille_core::{Bindings, BindingsBuilder, Controller, ControllerError};
use reveille_host_api::{
    Actuator, DeferredScheduler, EventSource, FeatureFlagProvider, FixedEventSource, MockActuator,
    MockScheduler, PresenceProvider, StaticFlag,
};
use reveille_host_local::{CommandActuator, ConfigEventSource, FileFlag, TokioScheduler};
use reveille_util::{next_schedule_date, rollover_instant};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const TEST_CONFIG: &str = r#"
config_version = 1

[service]
log_level = "debug"

[actuator]
command = "true"
stop_command = "true"
stop_after_seconds = 600

[[alarms]]
id = "school"
days = "weekdays"
time = "06:45"

[[alarms]]
id = "late"
days = ["sat", "sun"]
time = "09:30"

[[alarms]]
id = "evening"
time = "19:00"
"#;

struct Harness {
    actuator: Arc<MockActuator>,
    scheduler: Arc<MockScheduler>,
    presence: Arc<StaticFlag>,
    feature: Arc<StaticFlag>,
    events: Arc<FixedEventSource>,
}

impl Harness {
    fn new(alarms: Vec<DateTime<Local>>) -> Self {
        Self {
            actuator: Arc::new(MockActuator::new("speaker")),
            scheduler: Arc::new(MockScheduler::new()),
            presence: Arc::new(StaticFlag::new(true)),
            feature: Arc::new(StaticFlag::new(true)),
            events: Arc::new(FixedEventSource::new(alarms)),
        }
    }

    fn bindings(&self) -> BindingsBuilder {
        Bindings::builder()
            .actuator(self.actuator.clone())
            .scheduler(self.scheduler.clone())
            .presence(self.presence.clone())
            .event_source(self.events.clone())
            .feature_flag(self.feature.clone())
    }

    fn events(&self) -> Option<Arc<dyn EventSource>> {
        let events: Arc<dyn EventSource> = self.events.clone();
        Some(events)
    }

    fn feature(&self) -> Option<Arc<dyn FeatureFlagProvider>> {
        let feature: Arc<dyn FeatureFlagProvider> = self.feature.clone();
        Some(feature)
    }
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Local> {
    reveille_util::local_datetime(date, NaiveTime::from_hms_opt(hour, minute, 0).unwrap()).unwrap()
}

fn make_test_policy() -> Policy {
    parse_config(TEST_CONFIG).unwrap()
}

async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

#[test]
fn test_config_parsing() {
    let policy = make_test_policy();
    assert_eq!(policy.alarms.len(), 3);
    assert_eq!(policy.service.log_level.as_deref(), Some("debug"));

    let stop = policy.actuator.stop.as_ref().unwrap();
    assert_eq!(stop.after, Duration::from_secs(600));
}

#[test]
fn test_invalid_config_rejected() {
    let config = r#"
        config_version = 1

        [[alarms]]
        id = "broken"
        time = "25:00"
    "#;

    match parse_config(config) {
        Err(ConfigError::ValidationFailed { errors }) => {
            // Missing [actuator] and the bad time are both reported
            assert_eq!(errors.len(), 2);
        }
        other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_schedule_before_configure_fails() {
    let harness = Harness::new(vec![reveille_util::now() + ChronoDuration::seconds(60)]);
    let controller = Controller::new();

    let err = controller
        .schedule_today(harness.events(), harness.feature())
        .unwrap_err();
    assert!(matches!(err, ControllerError::IllegalState(_)));
    assert_eq!(harness.events.read_count(), 0);
    assert_eq!(harness.scheduler.submitted_count(), 0);

    controller.configure(harness.bindings()).unwrap();
    for _ in 0..3 {
        assert!(controller
            .schedule_today(harness.events(), harness.feature())
            .is_ok());
    }
}

#[test]
fn test_config_alarms_scheduled_for_day() {
    let policy = Arc::new(make_test_policy());
    let source = ConfigEventSource::new(policy);
    let harness = Harness::new(vec![]);
    let controller = Controller::new();
    controller.configure(harness.bindings()).unwrap();

    // 2025-03-05 is a Wednesday
    let wednesday = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
    harness.events.set_alarms(source.alarms_for(wednesday));

    let now = at(wednesday, 6, 0);
    let report = controller
        .schedule_today_at(harness.events(), harness.feature(), now)
        .unwrap();

    assert_eq!(report.submitted_count(), 2);
    assert_eq!(report.skipped_count(), 0);
    assert_eq!(
        harness.scheduler.delays(),
        vec![
            Duration::from_secs(45 * 60),
            Duration::from_secs(13 * 3600),
        ]
    );
}

#[test]
fn test_midnight_alarm_scheduled_before_day_starts() {
    let config = r#"
        config_version = 1

        [actuator]
        command = "true"

        [[alarms]]
        id = "midnight"
        time = "00:00"
    "#;
    let policy = Arc::new(parse_config(config).unwrap());
    let harness = Harness::new(vec![]);
    let controller = Controller::new();
    controller.configure(harness.bindings()).unwrap();

    let today = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
    let tomorrow = next_schedule_date(today, today);
    let wake = rollover_instant(tomorrow, Duration::from_secs(60)).unwrap();
    assert_eq!(wake.date_naive(), today);

    let events: Arc<dyn EventSource> = Arc::new(ConfigEventSource::on_date(policy.clone(), tomorrow));
    let report = controller
        .schedule_today_at(Some(events), harness.feature(), wake)
        .unwrap();

    assert_eq!(report.submitted_count(), 1);
    assert_eq!(report.skipped_count(), 0);
    assert_eq!(harness.scheduler.delays(), vec![Duration::from_secs(60)]);

    // Scheduling the same day once it has started loses the alarm
    let late = at(tomorrow, 0, 0) + ChronoDuration::milliseconds(1);
    let events: Arc<dyn EventSource> = Arc::new(ConfigEventSource::on_date(policy, tomorrow));
    let report = controller
        .schedule_today_at(Some(events), harness.feature(), late)
        .unwrap();
    assert_eq!(report.submitted_count(), 0);
    assert_eq!(report.skipped_count(), 1);
}

#[test]
fn test_past_alarms_skipped() {
    let now = reveille_util::now();
    let harness = Harness::new(vec![
        now - ChronoDuration::seconds(10),
        now + ChronoDuration::milliseconds(5000),
    ]);
    let controller = Controller::new();
    controller.configure(harness.bindings()).unwrap();

    let report = controller
        .schedule_today_at(harness.events(), harness.feature(), now)
        .unwrap();

    assert_eq!(report.skipped_count(), 1);
    assert_eq!(harness.scheduler.delays(), vec![Duration::from_millis(5000)]);
}

#[test]
fn test_empty_day() {
    let harness = Harness::new(vec![]);
    let controller = Controller::new();
    controller.configure(harness.bindings()).unwrap();

    let report = controller.schedule_today_bound().unwrap();
    assert_eq!(report.submitted_count(), 0);
    assert_eq!(harness.scheduler.submitted_count(), 0);
}

#[test]
fn test_guard_gating_matrix() {
    for (feature, present, expected) in [
        (false, true, 0),
        (true, false, 0),
        (true, true, 1),
        (false, false, 0),
    ] {
        let harness = Harness::new(vec![reveille_util::now() + ChronoDuration::seconds(30)]);
        let controller = Controller::new();
        controller.configure(harness.bindings()).unwrap();
        controller
            .schedule_today(harness.events(), harness.feature())
            .unwrap();

        // Conditions are read when the task fires, not when it is submitted
        harness.feature.set(feature);
        harness.presence.set(present);
        harness.scheduler.fire_all();

        assert_eq!(
            harness.actuator.action_count(),
            expected,
            "feature={} present={}",
            feature,
            present
        );
    }
}

#[test]
fn test_reconfigure_replaces_everything() {
    let alarm = reveille_util::now() + ChronoDuration::seconds(30);
    let first = Harness::new(vec![alarm]);
    let second = Harness::new(vec![alarm]);
    let controller = Controller::new();

    controller.configure(first.bindings()).unwrap();
    controller.configure(second.bindings()).unwrap();
    controller.schedule_today_bound().unwrap();

    assert_eq!(first.scheduler.submitted_count(), 0);
    assert_eq!(second.scheduler.submitted_count(), 1);

    second.scheduler.fire_all();
    assert_eq!(first.actuator.action_count(), 0);
    assert_eq!(first.presence.read_count(), 0);
    assert_eq!(second.actuator.action_count(), 1);
}

#[test]
fn test_submission_failure_propagates() {
    let now = reveille_util::now();
    let harness = Harness::new(vec![
        now + ChronoDuration::seconds(10),
        now + ChronoDuration::seconds(20),
        now + ChronoDuration::seconds(30),
    ]);
    harness.scheduler.set_accept_limit(Some(1));
    let controller = Controller::new();
    controller.configure(harness.bindings()).unwrap();

    let err = controller
        .schedule_today_at(harness.events(), harness.feature(), now)
        .unwrap_err();
    assert!(matches!(err, ControllerError::Submit(_)));

    // The accepted task is not rolled back
    assert_eq!(harness.scheduler.submitted_count(), 1);
}

#[tokio::test]
async fn test_tokio_scheduler_fires_guard() {
    let harness = Harness::new(vec![reveille_util::now() + ChronoDuration::milliseconds(100)]);
    let scheduler = Arc::new(TokioScheduler::current().unwrap());
    let controller = Controller::new();
    controller
        .configure(harness.bindings().scheduler(scheduler.clone()))
        .unwrap();

    let report = controller.schedule_today_bound().unwrap();
    assert_eq!(report.submitted_count(), 1);
    assert_eq!(harness.actuator.action_count(), 0);

    let actuator = harness.actuator.clone();
    assert!(wait_for(|| actuator.action_count() == 1).await);
    assert_eq!(scheduler.pending(), 0);
}

#[tokio::test]
async fn test_command_actuator_gated_by_marker_file() {
    let dir = tempfile::tempdir().unwrap();
    let presence_marker = dir.path().join("present");
    let fired = dir.path().join("fired");

    let config = format!(
        r#"
        config_version = 1

        [presence]
        marker_file = "{}"

        [actuator]
        command = "touch"
        args = ["{}"]
        "#,
        presence_marker.display(),
        fired.display()
    );
    let policy = Arc::new(parse_config(&config).unwrap());

    let scheduler = Arc::new(TokioScheduler::current().unwrap());
    let actuator: Arc<dyn Actuator> = Arc::new(CommandActuator::new(policy.actuator.clone()));
    let presence: Arc<dyn PresenceProvider> = Arc::new(FileFlag::from_presence(&policy.presence));
    let feature: Arc<dyn FeatureFlagProvider> = Arc::new(FileFlag::from_feature(&policy.feature));
    let events = Arc::new(FixedEventSource::new(vec![]));

    let controller = Controller::new();
    controller
        .configure(
            Bindings::builder()
                .actuator(actuator)
                .scheduler(scheduler.clone() as Arc<dyn DeferredScheduler>)
                .presence(presence)
                .event_source(events.clone())
                .feature_flag(feature),
        )
        .unwrap();

    // Nobody home: the alarm fires but does nothing
    events.set_alarms(vec![reveille_util::now() + ChronoDuration::milliseconds(50)]);
    controller.schedule_today_bound().unwrap();
    assert!(wait_for(|| scheduler.pending() == 0).await);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!fired.exists());

    // Marker present when the next alarm fires
    std::fs::write(&presence_marker, "").unwrap();
    events.set_alarms(vec![reveille_util::now() + ChronoDuration::milliseconds(50)]);
    controller.schedule_today_bound().unwrap();

    let fired_path = fired.clone();
    assert!(wait_for(move || Path::new(&fired_path).exists()).await);
}

#[tokio::test]
async fn test_closed_scheduler_fails_scheduling() {
    let harness = Harness::new(vec![reveille_util::now() + ChronoDuration::seconds(60)]);
    let scheduler = Arc::new(TokioScheduler::current().unwrap());
    let controller = Controller::new();
    controller
        .configure(harness.bindings().scheduler(scheduler.clone()))
        .unwrap();

    scheduler.close();
    let err = controller.schedule_today_bound().unwrap_err();
    assert!(matches!(err, ControllerError::Submit(_)));
}
