//! Actuator that runs the configured device command

use reveille_config::{ActuatorPolicy, StopPolicy};
use reveille_host_api::{Actuator, DeferredScheduler, HostError, HostResult};
use std::process::Stdio;
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// Starts the configured command when an alarm fires.
///
/// When a stop command is configured, it is submitted through the same
/// scheduler so it runs after the configured interval.
#[derive(Debug, Clone)]
pub struct CommandActuator {
    policy: ActuatorPolicy,
}

impl CommandActuator {
    pub fn new(policy: ActuatorPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ActuatorPolicy {
        &self.policy
    }

    fn schedule_stop(&self, stop: &StopPolicy, scheduler: &dyn DeferredScheduler) -> HostResult<()> {
        let command = stop.command.clone();
        let args = stop.args.clone();

        let task_id = scheduler.submit(
            Box::new(move || {
                if let Err(e) = spawn_command(&command, &args) {
                    error!(command = %command, error = %e, "Failed to run stop command");
                }
            }),
            stop.after,
        )?;

        debug!(
            task_id = %task_id,
            command = %stop.command,
            after_secs = stop.after.as_secs(),
            "Scheduled stop command"
        );
        Ok(())
    }
}

impl Actuator for CommandActuator {
    fn identifier(&self) -> String {
        self.policy.command.clone()
    }

    fn perform_action(&self, scheduler: &dyn DeferredScheduler) -> HostResult<()> {
        spawn_command(&self.policy.command, &self.policy.args)?;
        info!(command = %self.policy.command, "Alarm command started");

        // Playback has started; a missing stop does not fail the alarm
        if let Some(stop) = &self.policy.stop
            && let Err(e) = self.schedule_stop(stop, scheduler)
        {
            warn!(command = %stop.command, error = %e, "Failed to schedule stop command");
        }

        Ok(())
    }
}

/// Spawn a command detached from our stdio and reap it in the background.
fn spawn_command(program: &str, args: &[String]) -> HostResult<()> {
    let handle = Handle::try_current().map_err(|_| HostError::NoRuntime)?;
    let _enter = handle.enter();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| HostError::ActionFailed(format!("failed to spawn '{}': {}", program, e)))?;

    let pid = child.id();
    debug!(pid = ?pid, program = %program, "Process spawned");

    let program = program.to_string();
    handle.spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => {
                debug!(pid = ?pid, program = %program, "Process exited");
            }
            Ok(status) => {
                warn!(pid = ?pid, program = %program, status = %status, "Process exited with failure");
            }
            Err(e) => {
                warn!(pid = ?pid, program = %program, error = %e, "Failed to wait for process");
            }
        }
    });

    Ok(())
}
