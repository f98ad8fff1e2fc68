//! Publish/subscribe fan-out to connected session participants.

pub mod participant;
pub mod pool;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use classhub_core::types::id::{ConnectionId, UserId};
use classhub_entity::user::Role;

use crate::message::types::ServerEvent;

pub use participant::ParticipantHandle;
pub use pool::ParticipantPool;

/// Fan-out hub: broadcasts named events to every connected participant and
/// routes directed events (errors, quiz feedback) to a single recipient.
#[derive(Debug)]
pub struct BroadcastHub {
    /// Connected participants.
    pool: ParticipantPool,
    /// Outbound buffer size per participant.
    buffer_size: usize,
}

impl BroadcastHub {
    /// Creates a new hub.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            pool: ParticipantPool::new(),
            buffer_size,
        }
    }

    /// Registers a new participant.
    ///
    /// Returns the handle and the receiver the transport drains into its
    /// socket. The handle is inserted fully built, so broadcasts running
    /// concurrently with registration observe either the whole participant
    /// or none of it.
    pub fn register(
        &self,
        user_id: UserId,
        role: Role,
        name: String,
    ) -> (Arc<ParticipantHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let handle = Arc::new(ParticipantHandle::new(user_id, role, name, tx));
        self.pool.add(handle.clone());

        info!(
            conn_id = %handle.id,
            user_id = %user_id,
            role = %role,
            "Participant registered"
        );

        (handle, rx)
    }

    /// Unregisters a participant, returning its handle if it was connected.
    pub fn unregister(&self, conn_id: &ConnectionId) -> Option<Arc<ParticipantHandle>> {
        let handle = self.pool.remove(conn_id)?;
        handle.mark_closed();
        info!(
            conn_id = %conn_id,
            user_id = %handle.user_id,
            "Participant unregistered"
        );
        Some(handle)
    }

    /// Broadcasts an event to every participant connected at call time.
    ///
    /// The event is serialized once; per-participant delivery is best-effort
    /// (a slow participant drops the frame rather than blocking the session).
    pub fn broadcast(&self, event: &ServerEvent) {
        let Some(frame) = self.serialize(event) else {
            return;
        };

        let participants = self.pool.all();
        let mut sent = 0usize;
        for participant in &participants {
            if participant.send(frame.clone()) {
                sent += 1;
            }
        }

        debug!(
            event = event.name(),
            recipients = participants.len(),
            sent,
            "Broadcast"
        );
    }

    /// Sends an event to a single connection.
    pub fn send_to_conn(&self, conn_id: &ConnectionId, event: &ServerEvent) {
        let Some(frame) = self.serialize(event) else {
            return;
        };
        match self.pool.get(conn_id) {
            Some(participant) => {
                participant.send(frame);
            }
            None => debug!(conn_id = %conn_id, event = event.name(), "Directed event to unknown connection"),
        }
    }

    /// Sends an event to every connection a user currently holds.
    pub fn send_to_user(&self, user_id: &UserId, event: &ServerEvent) {
        let Some(frame) = self.serialize(event) else {
            return;
        };
        for participant in self.pool.get_user_connections(user_id) {
            participant.send(frame.clone());
        }
    }

    /// Checks if a user is currently connected.
    pub fn is_user_connected(&self, user_id: &UserId) -> bool {
        self.pool.is_user_connected(user_id)
    }

    /// Returns the total connection count.
    pub fn participant_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Closes all connections.
    pub fn close_all(&self) {
        let all = self.pool.all();
        for participant in &all {
            participant.mark_closed();
            self.pool.remove(&participant.id);
        }
        info!(count = all.len(), "All participants closed");
    }

    fn serialize(&self, event: &ServerEvent) -> Option<String> {
        match serde_json::to_string(event) {
            Ok(frame) => Some(frame),
            Err(e) => {
                error!(event = event.name(), error = %e, "Failed to serialize outbound event");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classhub_core::types::id::PollId;

    #[tokio::test]
    async fn test_broadcast_reaches_all_connected() {
        let hub = BroadcastHub::new(8);
        let (_a, mut rx_a) = hub.register(UserId::new(), Role::Student, "A".to_string());
        let (_b, mut rx_b) = hub.register(UserId::new(), Role::Student, "B".to_string());

        hub.broadcast(&ServerEvent::PollRemoved { id: PollId::new() });

        assert!(rx_a.recv().await.expect("a").contains("poll-removed"));
        assert!(rx_b.recv().await.expect("b").contains("poll-removed"));
    }

    #[tokio::test]
    async fn test_directed_send_skips_other_participants() {
        let hub = BroadcastHub::new(8);
        let target = UserId::new();
        let (_t, mut rx_t) = hub.register(target, Role::Student, "T".to_string());
        let (_o, mut rx_o) = hub.register(UserId::new(), Role::Student, "O".to_string());

        hub.send_to_user(
            &target,
            &ServerEvent::QuizError {
                message: "nope".to_string(),
            },
        );

        assert!(rx_t.recv().await.expect("t").contains("quiz-error"));
        assert!(rx_o.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_late_joiner_misses_earlier_broadcast() {
        let hub = BroadcastHub::new(8);
        hub.broadcast(&ServerEvent::PollRemoved { id: PollId::new() });

        let (_late, mut rx) = hub.register(UserId::new(), Role::Student, "L".to_string());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let hub = BroadcastHub::new(8);
        let (handle, mut rx) = hub.register(UserId::new(), Role::Student, "A".to_string());

        hub.unregister(&handle.id);
        hub.broadcast(&ServerEvent::PollRemoved { id: PollId::new() });

        assert!(rx.try_recv().is_err());
        assert_eq!(hub.participant_count(), 0);
    }
}
