//! Config validation CLI tool
//!
//! Validates a reveille configuration file, reports any errors and shows
//! which alarms would ring today.

use reveille_util::{default_config_path, format_datetime_full};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a reveille configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match reveille_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", reveille_config::CURRENT_CONFIG_VERSION);
            println!("  Alarms: {}", policy.alarms.len());
            println!("  Actuator: {} {}", policy.actuator.command, policy.actuator.args.join(" "));

            if !policy.alarms.is_empty() {
                println!();
                println!("Alarms:");
                for alarm in &policy.alarms {
                    let state = if alarm.disabled { " (disabled)" } else { "" };
                    println!(
                        "  - {} at {} ({}){}",
                        alarm.id,
                        alarm.time,
                        alarm.days,
                        state
                    );
                }
            }

            let today = reveille_util::now().date_naive();
            let ringing = policy.alarms_on(today);
            println!();
            println!("Today ({}): {} alarm(s)", today, ringing.len());
            for ts in ringing {
                println!("  - {}", format_datetime_full(&ts));
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                reveille_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                reveille_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                reveille_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                reveille_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        reveille_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
