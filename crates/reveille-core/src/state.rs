//! Controller lifecycle states

use reveille_host_api::{
    Actuator, DeferredScheduler, EventSource, FeatureFlagProvider, PresenceProvider,
};
use std::fmt;
use std::sync::Arc;

use crate::{ControllerError, ControllerResult, ExecutionGuard};

/// The five collaborators bound by `configure`.
///
/// Immutable once built: reconfiguring builds a new `Bindings` rather than
/// changing fields, so a value is always the complete set from one call.
#[derive(Clone)]
pub struct Bindings {
    actuator: Arc<dyn Actuator>,
    scheduler: Arc<dyn DeferredScheduler>,
    presence: Arc<dyn PresenceProvider>,
    event_source: Arc<dyn EventSource>,
    feature_flag: Arc<dyn FeatureFlagProvider>,
}

impl Bindings {
    pub fn builder() -> BindingsBuilder {
        BindingsBuilder::default()
    }

    pub fn actuator(&self) -> &Arc<dyn Actuator> {
        &self.actuator
    }

    pub fn scheduler(&self) -> &Arc<dyn DeferredScheduler> {
        &self.scheduler
    }

    pub fn presence(&self) -> &Arc<dyn PresenceProvider> {
        &self.presence
    }

    pub fn event_source(&self) -> &Arc<dyn EventSource> {
        &self.event_source
    }

    pub fn feature_flag(&self) -> &Arc<dyn FeatureFlagProvider> {
        &self.feature_flag
    }

    /// Guard over this snapshot's actuator, scheduler and presence, gated
    /// by `feature_flag`.
    pub fn guard(&self, feature_flag: Arc<dyn FeatureFlagProvider>) -> ExecutionGuard {
        ExecutionGuard::new(
            self.actuator.clone(),
            self.scheduler.clone(),
            self.presence.clone(),
            feature_flag,
        )
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("actuator", &self.actuator.identifier())
            .finish_non_exhaustive()
    }
}

/// Collects collaborators for `Controller::configure`
#[derive(Default)]
pub struct BindingsBuilder {
    actuator: Option<Arc<dyn Actuator>>,
    scheduler: Option<Arc<dyn DeferredScheduler>>,
    presence: Option<Arc<dyn PresenceProvider>>,
    event_source: Option<Arc<dyn EventSource>>,
    feature_flag: Option<Arc<dyn FeatureFlagProvider>>,
}

impl BindingsBuilder {
    pub fn actuator(mut self, actuator: Arc<dyn Actuator>) -> Self {
        self.actuator = Some(actuator);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn DeferredScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn presence(mut self, presence: Arc<dyn PresenceProvider>) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn event_source(mut self, event_source: Arc<dyn EventSource>) -> Self {
        self.event_source = Some(event_source);
        self
    }

    pub fn feature_flag(mut self, feature_flag: Arc<dyn FeatureFlagProvider>) -> Self {
        self.feature_flag = Some(feature_flag);
        self
    }

    /// Fails with `InvalidArgument` naming the first missing collaborator
    pub fn build(self) -> ControllerResult<Bindings> {
        Ok(Bindings {
            actuator: self.actuator.ok_or_else(|| ControllerError::missing("actuator"))?,
            scheduler: self
                .scheduler
                .ok_or_else(|| ControllerError::missing("scheduler"))?,
            presence: self
                .presence
                .ok_or_else(|| ControllerError::missing("presence"))?,
            event_source: self
                .event_source
                .ok_or_else(|| ControllerError::missing("event_source"))?,
            feature_flag: self
                .feature_flag
                .ok_or_else(|| ControllerError::missing("feature_flag"))?,
        })
    }
}

/// Lifecycle state of the controller
#[derive(Debug, Clone, Default)]
pub enum ControllerState {
    /// No collaborators yet; scheduling fails
    #[default]
    Unconfigured,
    /// Collaborators bound by the latest `configure` call
    Configured(Bindings),
}

impl ControllerState {
    pub fn is_configured(&self) -> bool {
        matches!(self, ControllerState::Configured(_))
    }

    pub fn bindings(&self) -> Option<&Bindings> {
        match self {
            ControllerState::Unconfigured => None,
            ControllerState::Configured(bindings) => Some(bindings),
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::Unconfigured => write!(f, "Unconfigured"),
            ControllerState::Configured(bindings) => {
                write!(f, "Configured[actuator='{}']", bindings.actuator.identifier())
            }
        }
    }
}
