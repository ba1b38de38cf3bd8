//! The public-facing alarm controller

use arc_swap::ArcSwap;
use chrono::{DateTime, Local};
use reveille_host_api::{EventSource, FeatureFlagProvider};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::{
    Bindings, BindingsBuilder, ControllerError, ControllerResult, ControllerState,
    EventScheduler, ScheduleReport,
};

/// Owns the current [`ControllerState`] and dispatches operations to it.
///
/// The state is an `Arc` swapped whole. Readers load the `Arc` without
/// locking and then work on that snapshot, so a `configure` racing with
/// `schedule_today` resolves to either the old or the new collaborator set,
/// never a mix.
pub struct Controller {
    state: ArcSwap<ControllerState>,
}

impl Controller {
    /// Create an unconfigured controller
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(ControllerState::Unconfigured),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> Arc<ControllerState> {
        self.state.load_full()
    }

    pub fn is_configured(&self) -> bool {
        self.state().is_configured()
    }

    /// Bind a fresh set of collaborators, replacing any previous set.
    ///
    /// Legal in every state. Fails with `InvalidArgument` if a collaborator
    /// is missing, leaving the current state untouched.
    pub fn configure(&self, bindings: BindingsBuilder) -> ControllerResult<()> {
        let bindings = bindings.build()?;
        self.set_state(ControllerState::Configured(bindings));
        Ok(())
    }

    /// Schedule today's alarms from `event_source`, gated at fire time by
    /// `feature_flag`.
    ///
    /// The actuator, scheduler and presence provider come from the bindings
    /// current at the time of the call.
    pub fn schedule_today(
        &self,
        event_source: Option<Arc<dyn EventSource>>,
        feature_flag: Option<Arc<dyn FeatureFlagProvider>>,
    ) -> ControllerResult<ScheduleReport> {
        self.schedule_today_at(event_source, feature_flag, reveille_util::now())
    }

    /// Like [`Controller::schedule_today`], measuring delays from `now`
    pub fn schedule_today_at(
        &self,
        event_source: Option<Arc<dyn EventSource>>,
        feature_flag: Option<Arc<dyn FeatureFlagProvider>>,
        now: DateTime<Local>,
    ) -> ControllerResult<ScheduleReport> {
        let event_source = event_source.ok_or_else(|| ControllerError::missing("event_source"))?;
        let feature_flag = feature_flag.ok_or_else(|| ControllerError::missing("feature_flag"))?;

        let state = self.state();
        match state.as_ref() {
            ControllerState::Unconfigured => Err(ControllerError::not_configured()),
            ControllerState::Configured(bindings) => {
                schedule_with(bindings, event_source.as_ref(), feature_flag, now)
            }
        }
    }

    /// Schedule today's alarms using the event source and feature flag bound
    /// at configure time.
    pub fn schedule_today_bound(&self) -> ControllerResult<ScheduleReport> {
        self.schedule_today_bound_at(reveille_util::now())
    }

    /// Like [`Controller::schedule_today_bound`], measuring delays from `now`
    pub fn schedule_today_bound_at(&self, now: DateTime<Local>) -> ControllerResult<ScheduleReport> {
        let state = self.state();
        match state.as_ref() {
            ControllerState::Unconfigured => Err(ControllerError::not_configured()),
            ControllerState::Configured(bindings) => schedule_with(
                bindings,
                bindings.event_source().as_ref(),
                bindings.feature_flag().clone(),
                now,
            ),
        }
    }

    fn set_state(&self, new_state: ControllerState) {
        let new_state = Arc::new(new_state);
        self.state.store(new_state.clone());
        debug!(state = %new_state, "Changed controller state");
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Controller[state='{}']", self.state())
    }
}

fn schedule_with(
    bindings: &Bindings,
    event_source: &dyn EventSource,
    feature_flag: Arc<dyn FeatureFlagProvider>,
    now: DateTime<Local>,
) -> ControllerResult<ScheduleReport> {
    let guard = bindings.guard(feature_flag);
    let alarms = event_source.alarm_timestamps();

    EventScheduler::new(bindings.scheduler().clone()).schedule(&alarms, &guard, now)
}
