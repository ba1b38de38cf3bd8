//! Presence and feature flags backed by marker files

use reveille_config::{FeaturePolicy, PresencePolicy};
use reveille_host_api::{FeatureFlagProvider, PresenceProvider};
use std::path::{Path, PathBuf};
use tracing::trace;

/// A boolean read fresh on every query.
///
/// With a marker path, the flag is set exactly when the path exists.
/// Without one, the fixed default is returned.
#[derive(Debug, Clone)]
pub struct FileFlag {
    marker: Option<PathBuf>,
    default: bool,
}

impl FileFlag {
    pub fn new(marker: Option<PathBuf>, default: bool) -> Self {
        Self { marker, default }
    }

    pub fn fixed(value: bool) -> Self {
        Self::new(None, value)
    }

    pub fn from_feature(policy: &FeaturePolicy) -> Self {
        Self::new(policy.flag_file.clone(), policy.enabled)
    }

    pub fn from_presence(policy: &PresencePolicy) -> Self {
        Self::new(policy.marker_file.clone(), policy.assume_present)
    }

    pub fn marker(&self) -> Option<&Path> {
        self.marker.as_deref()
    }

    pub fn is_set(&self) -> bool {
        match &self.marker {
            Some(path) => {
                let exists = path.exists();
                trace!(path = %path.display(), exists, "Checked marker file");
                exists
            }
            None => self.default,
        }
    }
}

impl PresenceProvider for FileFlag {
    fn is_user_present(&self) -> bool {
        self.is_set()
    }
}

impl FeatureFlagProvider for FileFlag {
    fn is_feature_enabled(&self) -> bool {
        self.is_set()
    }
}
