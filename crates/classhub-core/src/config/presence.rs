//! Presence debounce configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Presence state machine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Grace window in seconds before a `false` detection signal is allowed
    /// to transition a student to absent. Flickers shorter than this window
    /// are absorbed without any broadcast.
    #[serde(default = "default_grace")]
    pub grace_seconds: u64,
    /// Nominal detection sampling interval in seconds. Informational; the
    /// tracker is driven entirely by inbound signals.
    #[serde(default = "default_sample_interval")]
    pub sample_interval_seconds: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            grace_seconds: default_grace(),
            sample_interval_seconds: default_sample_interval(),
        }
    }
}

impl PresenceConfig {
    /// The grace window as a [`Duration`].
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_seconds)
    }
}

fn default_grace() -> u64 {
    10
}

fn default_sample_interval() -> u64 {
    1
}
