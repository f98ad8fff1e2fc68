//! Participant pool — tracks all connected participants, indexed by
//! connection and by user.

use std::sync::Arc;

use dashmap::DashMap;

use classhub_core::types::id::{ConnectionId, UserId};

use super::participant::ParticipantHandle;

/// Thread-safe pool of all connected participants.
///
/// Handles are inserted fully built, so a concurrent broadcast iterating the
/// pool never observes a half-registered participant.
#[derive(Debug, Default)]
pub struct ParticipantPool {
    /// Connection ID → handle, for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ParticipantHandle>>,
    /// User ID → handles (one user can hold multiple connections).
    by_user: DashMap<UserId, Vec<Arc<ParticipantHandle>>>,
}

impl ParticipantPool {
    /// Creates a new empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a participant to the pool.
    pub fn add(&self, handle: Arc<ParticipantHandle>) {
        self.by_id.insert(handle.id, handle.clone());
        self.by_user.entry(handle.user_id).or_default().push(handle);
    }

    /// Removes a participant from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ParticipantHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let Some(mut connections) = self.by_user.get_mut(&handle.user_id) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_user.remove(&handle.user_id);
            }
        }
        Some(handle)
    }

    /// Gets a participant by connection id.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ParticipantHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Gets all connections for a user.
    pub fn get_user_connections(&self, user_id: &UserId) -> Vec<Arc<ParticipantHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns all participant handles.
    pub fn all(&self) -> Vec<Arc<ParticipantHandle>> {
        self.by_id.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Returns total number of connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Checks if a user is currently connected.
    pub fn is_user_connected(&self, user_id: &UserId) -> bool {
        !self.get_user_connections(user_id).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classhub_entity::user::Role;
    use tokio::sync::mpsc;

    fn handle_for(user_id: UserId) -> Arc<ParticipantHandle> {
        let (tx, _rx) = mpsc::channel(4);
        Arc::new(ParticipantHandle::new(
            user_id,
            Role::Student,
            "S".to_string(),
            tx,
        ))
    }

    #[tokio::test]
    async fn test_user_index_tracks_multiple_connections() {
        let pool = ParticipantPool::new();
        let user = UserId::new();
        let first = handle_for(user);
        let second = handle_for(user);

        pool.add(first.clone());
        pool.add(second.clone());
        assert_eq!(pool.connection_count(), 2);
        assert_eq!(pool.user_count(), 1);

        pool.remove(&first.id);
        assert!(pool.is_user_connected(&user));
        pool.remove(&second.id);
        assert!(!pool.is_user_connected(&user));
        assert_eq!(pool.user_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_unknown_is_none() {
        let pool = ParticipantPool::new();
        assert!(pool.remove(&ConnectionId::new()).is_none());
    }
}
