//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global service settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Feature flag source
    #[serde(default)]
    pub feature: RawFeatureConfig,

    /// Presence source
    #[serde(default)]
    pub presence: RawPresenceConfig,

    /// Device command to run when an alarm fires
    pub actuator: Option<RawActuatorConfig>,

    /// Daily alarms
    #[serde(default)]
    pub alarms: Vec<RawAlarm>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Default log level when neither RUST_LOG nor --log-level is given
    pub log_level: Option<String>,
}

/// Feature flag settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawFeatureConfig {
    /// Used when no flag file is configured
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Feature is enabled while this file exists
    pub flag_file: Option<PathBuf>,
}

impl Default for RawFeatureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flag_file: None,
        }
    }
}

/// Presence settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPresenceConfig {
    /// Used when no marker file is configured
    #[serde(default = "default_true")]
    pub assume_present: bool,

    /// User is present while this file exists
    pub marker_file: Option<PathBuf>,
}

impl Default for RawPresenceConfig {
    fn default() -> Self {
        Self {
            assume_present: true,
            marker_file: None,
        }
    }
}

/// Actuator command settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawActuatorConfig {
    /// Program to run when an alarm fires
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Program to run after `stop_after_seconds`
    pub stop_command: Option<String>,

    #[serde(default)]
    pub stop_args: Vec<String>,

    pub stop_after_seconds: Option<u64>,
}

/// Raw alarm definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawAlarm {
    /// Unique stable ID
    pub id: String,

    /// Days of week: "weekdays", "weekends", "all", or list like ["mon", "tue", "wed"]
    #[serde(default = "default_days")]
    pub days: RawDays,

    /// Local time of day (HH:MM format)
    pub time: String,

    /// Explicitly disabled
    #[serde(default)]
    pub disabled: bool,
}

/// Days specification
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawDays {
    Preset(String),
    List(Vec<String>),
}

fn default_true() -> bool {
    true
}

fn default_days() -> RawDays {
    RawDays::Preset("all".to_string())
}
