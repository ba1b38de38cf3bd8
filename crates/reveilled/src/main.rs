//! reveilled - The reveille background service
//!
//! Wires together:
//! - Configuration loading
//! - Local collaborators (tokio scheduler, command actuator, marker flags)
//! - The controller core
//!
//! Alarms for the current day are scheduled at startup. Each following
//! day's alarms are scheduled shortly before that day starts, so alarms at
//! 00:00 are still in the future when submitted.

use anyhow::{Context, Result};
use clap::Parser;
use chrono::NaiveDate;
use reveille_config::{load_config, Policy};
use reveille_core::{Bindings, BindingsBuilder, Controller, ScheduleReport};
use reveille_host_api::EventSource;
use reveille_host_local::{CommandActuator, ConfigEventSource, FileFlag, TokioScheduler};
use reveille_util::{
    default_config_path, delay_until, format_duration, next_schedule_date, rollover_instant,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// reveilled - Presence-aware daily alarm service
#[derive(Parser, Debug)]
#[command(name = "reveilled")]
#[command(about = "Presence-aware daily alarm service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/reveille/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Log level (default: the config's log_level, then "info")
    #[arg(short, long, env = "REVEILLE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

/// How long before a day starts its alarms are submitted
const ROLLOVER_LEAD: Duration = Duration::from_secs(60);

/// Main service state
struct Service {
    config_path: PathBuf,
    policy: Arc<Policy>,
    controller: Controller,
    scheduler: Arc<TokioScheduler>,
}

impl Service {
    fn new(config_path: PathBuf, policy: Policy) -> Result<Self> {
        let scheduler = Arc::new(
            TokioScheduler::current().context("Failed to attach scheduler to runtime")?,
        );

        let policy = Arc::new(policy);
        let controller = Controller::new();
        controller
            .configure(bindings_for(policy.clone(), scheduler.clone()))
            .context("Failed to configure controller")?;

        Ok(Self {
            config_path,
            policy,
            controller,
            scheduler,
        })
    }

    async fn run(mut self) -> Result<()> {
        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        let mut scheduled_through = reveille_util::now().date_naive();
        self.schedule_day(scheduled_through)?;

        info!("Service running");

        loop {
            let next_day = next_schedule_date(scheduled_through, reveille_util::now().date_naive());
            let wait = rollover_instant(next_day, ROLLOVER_LEAD)
                .and_then(|at| delay_until(&at, &reveille_util::now()))
                .unwrap_or(Duration::ZERO);
            debug!(
                date = %next_day,
                wait = %format_duration(wait),
                "Waiting to schedule next day"
            );

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // Reconfigure only; today's tasks keep the snapshot they were
                // submitted with
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading configuration");
                    self.reload();
                }

                _ = tokio::time::sleep(wait) => {
                    self.schedule_day(next_day)?;
                    scheduled_through = next_day;
                }
            }
        }

        self.scheduler.close();
        let pending = self.scheduler.pending();
        if pending > 0 {
            warn!(pending, "Dropping alarms that have not fired yet");
        }

        info!("Shutting down reveilled");
        Ok(())
    }

    /// Schedule the alarms of `date`, gated by the bound feature flag
    fn schedule_day(&self, date: NaiveDate) -> Result<ScheduleReport> {
        let state = self.controller.state();
        let feature_flag = state.bindings().map(|b| b.feature_flag().clone());
        let events: Arc<dyn EventSource> =
            Arc::new(ConfigEventSource::on_date(self.policy.clone(), date));

        let report = self
            .controller
            .schedule_today_at(Some(events), feature_flag, reveille_util::now())
            .with_context(|| format!("Failed to schedule alarms for {}", date))?;

        info!(
            date = %date,
            submitted = report.submitted_count(),
            skipped = report.skipped_count(),
            "Scheduled alarms"
        );
        for alarm in &report.submitted {
            debug!(
                task_id = %alarm.task_id,
                at = %reveille_util::format_datetime_full(&alarm.at),
                "Alarm pending"
            );
        }

        Ok(report)
    }

    /// Reload the config file. A bad file leaves the current bindings in place.
    fn reload(&mut self) {
        let policy = match load_config(&self.config_path) {
            Ok(policy) => policy,
            Err(e) => {
                error!(
                    config_path = %self.config_path.display(),
                    error = %e,
                    "Failed to reload config, keeping previous configuration"
                );
                return;
            }
        };

        let policy = Arc::new(policy);
        match self
            .controller
            .configure(bindings_for(policy.clone(), self.scheduler.clone()))
        {
            Ok(()) => {
                info!(alarm_count = policy.alarms.len(), "Configuration reloaded");
                self.policy = policy;
            }
            Err(e) => error!(error = %e, "Failed to apply reloaded configuration"),
        }
    }
}

/// Collaborators for a loaded policy, sharing the service's scheduler
fn bindings_for(policy: Arc<Policy>, scheduler: Arc<TokioScheduler>) -> BindingsBuilder {
    Bindings::builder()
        .actuator(Arc::new(CommandActuator::new(policy.actuator.clone())))
        .scheduler(scheduler)
        .presence(Arc::new(FileFlag::from_presence(&policy.presence)))
        .feature_flag(Arc::new(FileFlag::from_feature(&policy.feature)))
        .event_source(Arc::new(ConfigEventSource::new(policy)))
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let policy = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let level = args
        .log_level
        .clone()
        .or_else(|| policy.service.log_level.clone())
        .unwrap_or_else(|| "info".into());
    init_logging(&level, args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "reveilled starting"
    );
    info!(
        config_path = %args.config.display(),
        alarm_count = policy.alarms.len(),
        actuator = %policy.actuator.command,
        "Configuration loaded"
    );
    if reveille_util::is_mock_time_active() {
        warn!(now = %reveille_util::format_datetime_full(&reveille_util::now()), "Mock time is active");
    }

    let service = Service::new(args.config, policy)?;
    service.run().await
}
