//! Presence state definitions.

use serde::{Deserialize, Serialize};

/// Debounced presence state of a student.
///
/// Only `Present` and `Absent` are externally visible; `Unknown` and
/// `PendingAbsent` are internal to the debounce machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    /// No signal received yet.
    Unknown,
    /// Student is observed in frame.
    Present,
    /// Student left frame; a grace timer is running before we believe it.
    PendingAbsent,
    /// Student is absent (grace window elapsed or forced by disconnect).
    Absent,
}

impl PresenceState {
    /// The externally-known presence, if any has been established.
    ///
    /// `PendingAbsent` still reads as present: the absence has not been
    /// confirmed until the grace window elapses.
    pub fn externally_present(&self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::Present | Self::PendingAbsent => Some(true),
            Self::Absent => Some(false),
        }
    }

    /// Converts to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Present => "present",
            Self::PendingAbsent => "pending_absent",
            Self::Absent => "absent",
        }
    }
}
