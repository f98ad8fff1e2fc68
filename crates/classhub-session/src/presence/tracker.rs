//! Presence tracker — debounced per-student presence state machine.
//!
//! Driven by the periodic face-detection signal. A single `false` reading
//! never broadcasts absence directly; it arms a grace timer, and only an
//! uninterrupted run of `false` readings longer than the grace window
//! confirms the transition. This absorbs detection flicker without spurious
//! absence broadcasts.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use classhub_core::types::id::UserId;
use classhub_entity::presence::PresenceState;

use crate::hub::BroadcastHub;
use crate::message::types::{PresenceUpdate, ServerEvent};

/// Per-student presence record. Created lazily on the first signal and kept
/// for the lifetime of the process; only its state transitions.
#[derive(Debug)]
struct PresenceRecord {
    state: PresenceState,
    student_name: String,
    last_active: DateTime<Utc>,
    /// Grace timer armed while in `PendingAbsent`.
    pending: Option<JoinHandle<()>>,
}

impl PresenceRecord {
    fn new(student_name: String) -> Self {
        Self {
            state: PresenceState::Unknown,
            student_name,
            last_active: Utc::now(),
            pending: None,
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

/// Tracks debounced presence state for all students.
#[derive(Debug)]
pub struct PresenceTracker {
    /// Student ID → presence record.
    records: DashMap<UserId, PresenceRecord>,
    /// Fan-out for `presence-update` events.
    hub: Arc<BroadcastHub>,
    /// Grace window before a `false` signal is believed.
    grace: Duration,
}

impl PresenceTracker {
    /// Creates a new presence tracker.
    pub fn new(hub: Arc<BroadcastHub>, grace: Duration) -> Self {
        Self {
            records: DashMap::new(),
            hub,
            grace,
        }
    }

    /// Feeds one detection signal for a student.
    pub fn signal(
        self: &Arc<Self>,
        student_id: UserId,
        student_name: &str,
        is_present: bool,
        last_active: DateTime<Utc>,
    ) {
        if is_present {
            self.signal_present(student_id, student_name, last_active);
        } else {
            self.signal_not_observed(student_id, student_name);
        }
    }

    /// Forces a student to `Absent` immediately (disconnect or logout),
    /// regardless of current state, cancelling any grace timer.
    pub fn force_absent(&self, student_id: UserId, student_name: &str) {
        let update = {
            let mut record = self
                .records
                .entry(student_id)
                .or_insert_with(|| PresenceRecord::new(student_name.to_string()));
            record.cancel_pending();
            record.state = PresenceState::Absent;
            PresenceUpdate {
                student_id,
                student_name: record.student_name.clone(),
                is_present: false,
                last_active: record.last_active,
            }
        };

        info!(student_id = %student_id, "Student forced absent");
        self.hub.broadcast(&ServerEvent::PresenceUpdate(update));
    }

    /// The current state of a student, if any signal has been seen.
    pub fn state_of(&self, student_id: &UserId) -> Option<PresenceState> {
        self.records.get(student_id).map(|r| r.state)
    }

    /// Number of students currently in the `PendingAbsent` grace window.
    pub fn pending_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.state == PresenceState::PendingAbsent)
            .count()
    }

    fn signal_present(&self, student_id: UserId, student_name: &str, last_active: DateTime<Utc>) {
        let update = {
            let mut record = self
                .records
                .entry(student_id)
                .or_insert_with(|| PresenceRecord::new(student_name.to_string()));
            record.cancel_pending();
            record.student_name = student_name.to_string();
            record.last_active = last_active;

            let newly_present = record.state.externally_present() != Some(true);
            record.state = PresenceState::Present;
            newly_present.then(|| PresenceUpdate {
                student_id,
                student_name: student_name.to_string(),
                is_present: true,
                last_active,
            })
        };

        if let Some(update) = update {
            debug!(student_id = %student_id, "Student became present");
            self.hub.broadcast(&ServerEvent::PresenceUpdate(update));
        }
    }

    fn signal_not_observed(self: &Arc<Self>, student_id: UserId, student_name: &str) {
        let mut record = self
            .records
            .entry(student_id)
            .or_insert_with(|| PresenceRecord::new(student_name.to_string()));

        // Only a currently-present student with no timer running arms the
        // grace window; repeated false signals while pending are ignored.
        if record.state != PresenceState::Present || record.pending.is_some() {
            return;
        }

        record.state = PresenceState::PendingAbsent;
        let tracker = Arc::clone(self);
        let grace = self.grace;
        record.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            tracker.confirm_absent(student_id);
        }));
        debug!(student_id = %student_id, grace_secs = grace.as_secs(), "Grace timer armed");
    }

    /// Grace timer fired without an intervening positive signal.
    fn confirm_absent(&self, student_id: UserId) {
        let update = {
            let Some(mut record) = self.records.get_mut(&student_id) else {
                return;
            };
            // A positive signal that raced the timer already reverted the
            // state; in that case the fire is a no-op.
            if record.state != PresenceState::PendingAbsent {
                return;
            }
            record.state = PresenceState::Absent;
            record.pending = None;
            PresenceUpdate {
                student_id,
                student_name: record.student_name.clone(),
                is_present: false,
                last_active: record.last_active,
            }
        };

        info!(student_id = %student_id, "Student became absent");
        self.hub.broadcast(&ServerEvent::PresenceUpdate(update));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classhub_entity::user::Role;
    use tokio::sync::mpsc;
    use tokio::time::advance;

    fn fixture() -> (Arc<PresenceTracker>, mpsc::Receiver<String>) {
        let hub = Arc::new(BroadcastHub::new(64));
        let (_handle, rx) = hub.register(UserId::new(), Role::Teacher, "T".to_string());
        let tracker = Arc::new(PresenceTracker::new(hub, Duration::from_secs(10)));
        (tracker, rx)
    }

    fn presence_frames(rx: &mut mpsc::Receiver<String>) -> Vec<bool> {
        let mut states = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            if frame.contains("presence-update") {
                states.push(frame.contains("\"isPresent\":true"));
            }
        }
        states
    }

    #[tokio::test(start_paused = true)]
    async fn test_flicker_shorter_than_grace_is_absorbed() {
        let (tracker, mut rx) = fixture();
        let student = UserId::new();

        // [true, false, false, true] sampled at 1s intervals.
        for signal in [true, false, false, true] {
            tracker.signal(student, "Alice", signal, Utc::now());
            advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }

        assert_eq!(tracker.state_of(&student), Some(PresenceState::Present));
        // One Present broadcast, no Absent.
        assert_eq!(presence_frames(&mut rx), vec![true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sustained_absence_broadcasts_once() {
        let (tracker, mut rx) = fixture();
        let student = UserId::new();

        tracker.signal(student, "Alice", true, Utc::now());
        for _ in 0..11 {
            tracker.signal(student, "Alice", false, Utc::now());
            advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }

        assert_eq!(tracker.state_of(&student), Some(PresenceState::Absent));
        assert_eq!(presence_frames(&mut rx), vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_true_does_not_rebroadcast() {
        let (tracker, mut rx) = fixture();
        let student = UserId::new();

        for _ in 0..5 {
            tracker.signal(student, "Alice", true, Utc::now());
            advance(Duration::from_secs(1)).await;
        }

        assert_eq!(presence_frames(&mut rx), vec![true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_during_grace_does_not_rebroadcast_present() {
        let (tracker, mut rx) = fixture();
        let student = UserId::new();

        tracker.signal(student, "Alice", true, Utc::now());
        tracker.signal(student, "Alice", false, Utc::now());
        advance(Duration::from_secs(5)).await;
        // Recovers mid-grace: externally the student never stopped being
        // present, so no second broadcast.
        tracker.signal(student, "Alice", true, Utc::now());
        advance(Duration::from_secs(20)).await;
        tokio::task::yield_now().await;

        assert_eq!(tracker.state_of(&student), Some(PresenceState::Present));
        assert_eq!(presence_frames(&mut rx), vec![true]);
        assert_eq!(tracker.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_false_before_any_true_stays_unknown() {
        let (tracker, mut rx) = fixture();
        let student = UserId::new();

        tracker.signal(student, "Alice", false, Utc::now());
        advance(Duration::from_secs(20)).await;
        tokio::task::yield_now().await;

        assert_eq!(tracker.state_of(&student), Some(PresenceState::Unknown));
        assert!(presence_frames(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_absent_is_unconditional() {
        let (tracker, mut rx) = fixture();
        let student = UserId::new();

        tracker.signal(student, "Alice", true, Utc::now());
        tracker.signal(student, "Alice", false, Utc::now());
        tracker.force_absent(student, "Alice");
        // Grace timer was cancelled; nothing further fires.
        advance(Duration::from_secs(20)).await;
        tokio::task::yield_now().await;

        assert_eq!(tracker.state_of(&student), Some(PresenceState::Absent));
        assert_eq!(presence_frames(&mut rx), vec![true, false]);
    }
}
