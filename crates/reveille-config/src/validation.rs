//! Configuration validation

use crate::schema::{RawActuatorConfig, RawAlarm, RawConfig, RawDays};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Alarm '{alarm_id}': {message}")]
    AlarmError { alarm_id: String, message: String },

    #[error("Duplicate alarm ID: {0}")]
    DuplicateAlarmId(String),

    #[error("Invalid time format '{value}': {message}")]
    InvalidTimeFormat { value: String, message: String },

    #[error("Actuator: {0}")]
    ActuatorError(String),

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen_ids = HashSet::new();
    for alarm in &config.alarms {
        if !seen_ids.insert(&alarm.id) {
            errors.push(ValidationError::DuplicateAlarmId(alarm.id.clone()));
        }
    }

    for alarm in &config.alarms {
        errors.extend(validate_alarm(alarm));
    }

    match &config.actuator {
        Some(actuator) => errors.extend(validate_actuator(actuator)),
        None => errors.push(ValidationError::GlobalError(
            "missing [actuator] section".into(),
        )),
    }

    errors
}

fn validate_alarm(alarm: &RawAlarm) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if alarm.id.trim().is_empty() {
        errors.push(ValidationError::AlarmError {
            alarm_id: alarm.id.clone(),
            message: "id cannot be empty".into(),
        });
    }

    if let Err(e) = parse_days(&alarm.days) {
        errors.push(ValidationError::AlarmError {
            alarm_id: alarm.id.clone(),
            message: e,
        });
    }

    if let Err(e) = parse_time(&alarm.time) {
        errors.push(ValidationError::InvalidTimeFormat {
            value: alarm.time.clone(),
            message: e,
        });
    }

    errors
}

fn validate_actuator(actuator: &RawActuatorConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if actuator.command.trim().is_empty() {
        errors.push(ValidationError::ActuatorError("command cannot be empty".into()));
    }

    match (actuator.stop_after_seconds, &actuator.stop_command) {
        (Some(0), _) => errors.push(ValidationError::ActuatorError(
            "stop_after_seconds must be greater than 0".into(),
        )),
        (Some(_), None) => errors.push(ValidationError::ActuatorError(
            "stop_after_seconds requires stop_command".into(),
        )),
        (None, Some(_)) => errors.push(ValidationError::ActuatorError(
            "stop_command requires stop_after_seconds".into(),
        )),
        (_, Some(stop)) if stop.trim().is_empty() => errors.push(
            ValidationError::ActuatorError("stop_command cannot be empty".into()),
        ),
        _ => {}
    }

    errors
}

/// Parse HH:MM time format
pub fn parse_time(s: &str) -> Result<(u8, u8), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Expected HH:MM format".into());
    }

    let hour: u8 = parts[0]
        .parse()
        .map_err(|_| "Invalid hour".to_string())?;
    let minute: u8 = parts[1]
        .parse()
        .map_err(|_| "Invalid minute".to_string())?;

    if hour >= 24 {
        return Err("Hour must be 0-23".into());
    }
    if minute >= 60 {
        return Err("Minute must be 0-59".into());
    }

    Ok((hour, minute))
}

/// Parse days specification
pub fn parse_days(days: &RawDays) -> Result<u8, String> {
    match days {
        RawDays::Preset(preset) => match preset.to_lowercase().as_str() {
            "all" | "every" | "daily" => Ok(0x7F),
            "weekdays" => Ok(0x1F), // Mon-Fri
            "weekends" => Ok(0x60), // Sat-Sun
            other => Err(format!("Unknown day preset: {}", other)),
        },
        RawDays::List(list) => {
            if list.is_empty() {
                return Err("Day list cannot be empty".into());
            }
            let mut mask = 0u8;
            for day in list {
                let bit = match day.to_lowercase().as_str() {
                    "mon" | "monday" => 1 << 0,
                    "tue" | "tuesday" => 1 << 1,
                    "wed" | "wednesday" => 1 << 2,
                    "thu" | "thursday" => 1 << 3,
                    "fri" | "friday" => 1 << 4,
                    "sat" | "saturday" => 1 << 5,
                    "sun" | "sunday" => 1 << 6,
                    other => return Err(format!("Unknown day: {}", other)),
                };
                mask |= bit;
            }
            Ok(mask)
        }
    }
}
