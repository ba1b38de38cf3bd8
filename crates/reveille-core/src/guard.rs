//! Fire-time guard around the actuation

use reveille_host_api::{
    Actuator, DeferredScheduler, DeferredTask, FeatureFlagProvider, PresenceProvider,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What happened when a guard fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Feature flag was off; nothing done
    FeatureDisabled,
    /// User was not present; nothing done
    UserAbsent,
    /// The actuator was told to act
    Actuated,
    /// The actuator was told to act and reported an error
    ActuatorFailed,
}

/// Checks the feature flag, then presence, then acts.
///
/// Owns its handles so a task that is already submitted keeps working
/// against the collaborators it was created with, whatever the controller
/// is reconfigured to afterwards. Both conditions are read when the guard
/// fires, never when it is built.
#[derive(Clone)]
pub struct ExecutionGuard {
    actuator: Arc<dyn Actuator>,
    scheduler: Arc<dyn DeferredScheduler>,
    presence: Arc<dyn PresenceProvider>,
    feature_flag: Arc<dyn FeatureFlagProvider>,
}

impl ExecutionGuard {
    pub fn new(
        actuator: Arc<dyn Actuator>,
        scheduler: Arc<dyn DeferredScheduler>,
        presence: Arc<dyn PresenceProvider>,
        feature_flag: Arc<dyn FeatureFlagProvider>,
    ) -> Self {
        Self {
            actuator,
            scheduler,
            presence,
            feature_flag,
        }
    }

    /// Run the two checks and, if both pass, perform the action.
    ///
    /// Actuator errors stay local to this firing: they are logged and
    /// reported in the outcome, never propagated.
    pub fn fire(&self) -> GuardOutcome {
        let actuator = self.actuator.identifier();

        if !self.feature_flag.is_feature_enabled() {
            warn!(actuator = %actuator, "Alarm feature is not enabled, skipping action");
            return GuardOutcome::FeatureDisabled;
        }

        if !self.presence.is_user_present() {
            debug!(actuator = %actuator, "User is not present, skipping action");
            return GuardOutcome::UserAbsent;
        }

        debug!(actuator = %actuator, "User is present, performing action");
        match self.actuator.perform_action(self.scheduler.as_ref()) {
            Ok(()) => GuardOutcome::Actuated,
            Err(e) => {
                error!(actuator = %actuator, error = %e, "Actuator failed");
                GuardOutcome::ActuatorFailed
            }
        }
    }

    /// Wrap a copy of this guard as a deferred task
    pub fn to_task(&self) -> DeferredTask {
        let guard = self.clone();
        Box::new(move || {
            guard.fire();
        })
    }
}

impl fmt::Debug for ExecutionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionGuard")
            .field("actuator", &self.actuator.identifier())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reveille_host_api::{MockActuator, MockScheduler, StaticFlag};

    struct Fixture {
        actuator: Arc<MockActuator>,
        presence: Arc<StaticFlag>,
        feature: Arc<StaticFlag>,
        guard: ExecutionGuard,
    }

    fn fixture(feature: bool, present: bool) -> Fixture {
        let actuator = Arc::new(MockActuator::new("speaker"));
        let presence = Arc::new(StaticFlag::new(present));
        let feature = Arc::new(StaticFlag::new(feature));
        let guard = ExecutionGuard::new(
            actuator.clone(),
            Arc::new(MockScheduler::new()),
            presence.clone(),
            feature.clone(),
        );
        Fixture {
            actuator,
            presence,
            feature,
            guard,
        }
    }

    #[test]
    fn gating_matrix() {
        let cases = [
            (false, true, GuardOutcome::FeatureDisabled, 0),
            (true, false, GuardOutcome::UserAbsent, 0),
            (true, true, GuardOutcome::Actuated, 1),
            (false, false, GuardOutcome::FeatureDisabled, 0),
        ];

        for (feature, present, expected, actions) in cases {
            let f = fixture(feature, present);
            assert_eq!(f.guard.fire(), expected, "feature={feature} present={present}");
            assert_eq!(f.actuator.action_count(), actions, "feature={feature} present={present}");
        }
    }

    #[test]
    fn presence_not_consulted_when_feature_disabled() {
        let f = fixture(false, true);
        f.guard.fire();
        assert_eq!(f.feature.read_count(), 1);
        assert_eq!(f.presence.read_count(), 0);
    }

    #[test]
    fn conditions_read_at_fire_time() {
        let f = fixture(false, false);
        let task = f.guard.to_task();

        // Building the task reads nothing
        assert_eq!(f.feature.read_count(), 0);
        assert_eq!(f.presence.read_count(), 0);

        f.feature.set(true);
        f.presence.set(true);
        task();

        assert_eq!(f.actuator.action_count(), 1);
    }

    #[test]
    fn actuator_failure_is_contained() {
        let f = fixture(true, true);
        f.actuator.set_fail_action(true);
        assert_eq!(f.guard.fire(), GuardOutcome::ActuatorFailed);
        assert_eq!(f.actuator.action_count(), 1);
    }

    #[test]
    fn debug_shows_actuator() {
        let f = fixture(true, true);
        assert!(format!("{:?}", f.guard).contains("speaker"));
    }
}
