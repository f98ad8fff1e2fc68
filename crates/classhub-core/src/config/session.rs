//! Live session (poll/quiz lifecycle) configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Ephemeral entity lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unconditional time-to-live for a poll/quiz in seconds.
    #[serde(default = "default_entity_ttl")]
    pub entity_ttl_seconds: u64,
    /// Grace period in seconds between the completion edge (all targeted
    /// students responded) and entity removal.
    #[serde(default = "default_completion_grace")]
    pub completion_grace_seconds: u64,
    /// Internal per-participant outbound buffer size.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            entity_ttl_seconds: default_entity_ttl(),
            completion_grace_seconds: default_completion_grace(),
            channel_buffer_size: default_channel_buffer(),
        }
    }
}

impl SessionConfig {
    /// The entity TTL as a [`Duration`].
    pub fn entity_ttl(&self) -> Duration {
        Duration::from_secs(self.entity_ttl_seconds)
    }

    /// The completion grace period as a [`Duration`].
    pub fn completion_grace(&self) -> Duration {
        Duration::from_secs(self.completion_grace_seconds)
    }
}

fn default_entity_ttl() -> u64 {
    180
}

fn default_completion_grace() -> u64 {
    10
}

fn default_channel_buffer() -> usize {
    256
}
