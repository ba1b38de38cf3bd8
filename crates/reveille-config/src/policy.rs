//! Validated policy structures

use crate::schema::{
    RawActuatorConfig, RawAlarm, RawConfig, RawFeatureConfig, RawPresenceConfig,
    RawServiceConfig,
};
use crate::validation::{parse_days, parse_time};
use chrono::{DateTime, Local, NaiveDate};
use reveille_util::{AlarmId, DaysOfWeek, WallClock};
use std::path::PathBuf;
use std::time::Duration;

/// Validated policy ready for use by the service
#[derive(Debug, Clone)]
pub struct Policy {
    pub service: ServiceConfig,
    pub feature: FeaturePolicy,
    pub presence: PresencePolicy,
    pub actuator: ActuatorPolicy,
    pub alarms: Vec<Alarm>,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            feature: FeaturePolicy::from_raw(raw.feature),
            presence: PresencePolicy::from_raw(raw.presence),
            actuator: raw
                .actuator
                .map(ActuatorPolicy::from_raw)
                .unwrap_or_default(),
            alarms: raw.alarms.into_iter().map(Alarm::from_raw).collect(),
        }
    }

    /// Get alarm by ID
    pub fn get_alarm(&self, id: &AlarmId) -> Option<&Alarm> {
        self.alarms.iter().find(|a| &a.id == id)
    }

    /// Absolute timestamps of every enabled alarm that rings on `date`,
    /// sorted ascending.
    pub fn alarms_on(&self, date: NaiveDate) -> Vec<DateTime<Local>> {
        let mut timestamps: Vec<_> = self
            .alarms
            .iter()
            .filter_map(|alarm| alarm.occurrence_on(date))
            .collect();
        timestamps.sort();
        timestamps
    }
}

/// Service configuration
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub log_level: Option<String>,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            log_level: raw.log_level,
        }
    }
}

/// Where the feature flag comes from
#[derive(Debug, Clone)]
pub struct FeaturePolicy {
    pub enabled: bool,
    pub flag_file: Option<PathBuf>,
}

impl FeaturePolicy {
    fn from_raw(raw: RawFeatureConfig) -> Self {
        Self {
            enabled: raw.enabled,
            flag_file: raw.flag_file,
        }
    }
}

/// Where presence comes from
#[derive(Debug, Clone)]
pub struct PresencePolicy {
    pub assume_present: bool,
    pub marker_file: Option<PathBuf>,
}

impl PresencePolicy {
    fn from_raw(raw: RawPresenceConfig) -> Self {
        Self {
            assume_present: raw.assume_present,
            marker_file: raw.marker_file,
        }
    }
}

/// The command run when an alarm fires
#[derive(Debug, Clone, Default)]
pub struct ActuatorPolicy {
    pub command: String,
    pub args: Vec<String>,
    pub stop: Option<StopPolicy>,
}

/// Follow-up command that stops playback after a delay
#[derive(Debug, Clone)]
pub struct StopPolicy {
    pub command: String,
    pub args: Vec<String>,
    pub after: Duration,
}

impl ActuatorPolicy {
    fn from_raw(raw: RawActuatorConfig) -> Self {
        let stop = match (raw.stop_command, raw.stop_after_seconds) {
            (Some(command), Some(secs)) => Some(StopPolicy {
                command,
                args: raw.stop_args,
                after: Duration::from_secs(secs),
            }),
            _ => None,
        };

        Self {
            command: raw.command,
            args: raw.args,
            stop,
        }
    }
}

/// Validated alarm definition
#[derive(Debug, Clone)]
pub struct Alarm {
    pub id: AlarmId,
    pub days: DaysOfWeek,
    pub time: WallClock,
    pub disabled: bool,
}

impl Alarm {
    fn from_raw(raw: RawAlarm) -> Self {
        let days_mask = parse_days(&raw.days).unwrap_or(0x7F);
        let (hour, minute) = parse_time(&raw.time).unwrap_or((0, 0));

        Self {
            id: AlarmId::new(raw.id),
            days: DaysOfWeek::new(days_mask),
            time: WallClock::new(hour, minute).unwrap_or(WallClock { hour: 0, minute: 0 }),
            disabled: raw.disabled,
        }
    }

    /// When this alarm rings on `date`, if it does
    pub fn occurrence_on(&self, date: NaiveDate) -> Option<DateTime<Local>> {
        use chrono::Datelike;

        if self.disabled || !self.days.contains(date.weekday()) {
            return None;
        }
        self.time.on(date)
    }
}
