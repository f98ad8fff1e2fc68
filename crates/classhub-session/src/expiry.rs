//! Entity expiry under two competing policies.
//!
//! Every entity gets an unconditional TTL timer at creation; the completion
//! edge replaces it with a short grace timer. The arena maps each entity id
//! to its single live timer handle — scheduling always goes through the
//! arena, so at most one timer is ever outstanding per entity and the two
//! policies cannot double-fire: whichever task reaches the store first wins
//! the idempotent removal, and the loser's fire is a no-op.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use classhub_core::types::id::{PollId, QuizId};

use crate::archive::ArchiveSink;
use crate::hub::BroadcastHub;
use crate::message::types::ServerEvent;
use crate::store::SessionStore;

/// Key for the timer arena: a poll or quiz id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityId {
    /// A poll.
    Poll(PollId),
    /// A quiz.
    Quiz(QuizId),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poll(id) => write!(f, "poll/{id}"),
            Self::Quiz(id) => write!(f, "quiz/{id}"),
        }
    }
}

/// Schedules and cancels per-entity removal timers.
#[derive(Debug)]
pub struct ExpiryScheduler {
    /// Authoritative store; the idempotent removal is the race tiebreak.
    store: Arc<SessionStore>,
    /// Fan-out for `*-removed` events.
    hub: Arc<BroadcastHub>,
    /// Fire-and-forget audit sink.
    archive: Arc<dyn ArchiveSink>,
    /// Entity id → the single live timer handle.
    timers: DashMap<EntityId, JoinHandle<()>>,
}

impl ExpiryScheduler {
    /// Creates a new scheduler.
    pub fn new(store: Arc<SessionStore>, hub: Arc<BroadcastHub>, archive: Arc<dyn ArchiveSink>) -> Self {
        Self {
            store,
            hub,
            archive,
            timers: DashMap::new(),
        }
    }

    /// Schedules the unconditional TTL removal for a newly created entity.
    pub fn schedule_ttl(self: &Arc<Self>, entity: EntityId, after: Duration) {
        debug!(entity = %entity, after_secs = after.as_secs(), "Scheduling TTL removal");
        self.schedule(entity, after);
    }

    /// Schedules the short grace removal on the completion edge, replacing
    /// (and thereby cancelling) the outstanding TTL timer.
    pub fn schedule_completion(self: &Arc<Self>, entity: EntityId, after: Duration) {
        info!(entity = %entity, grace_secs = after.as_secs(), "All targeted students responded, scheduling removal");
        self.schedule(entity, after);
    }

    /// Cancels the outstanding timer for an entity. Safe against missing,
    /// already-fired, and already-cancelled timers.
    pub fn cancel(&self, entity: EntityId) {
        if let Some((_, handle)) = self.timers.remove(&entity) {
            handle.abort();
            debug!(entity = %entity, "Cancelled expiry timer");
        }
    }

    /// Number of timers currently outstanding.
    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }

    /// Aborts all outstanding timers (shutdown).
    pub fn shutdown(&self) {
        let keys: Vec<EntityId> = self.timers.iter().map(|entry| *entry.key()).collect();
        for key in keys {
            self.cancel(key);
        }
    }

    fn schedule(self: &Arc<Self>, entity: EntityId, after: Duration) {
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            scheduler.fire(entity).await;
        });

        // Arena invariant: at most one live timer per entity.
        if let Some(previous) = self.timers.insert(entity, handle) {
            previous.abort();
        }
    }

    /// Removes the entity and publishes its `*-removed` event.
    ///
    /// The store removal happens first and is the only gate: if the entity
    /// was already removed by the competing policy this fire is a no-op, and
    /// a failure while archiving can never leave the entity half-removed.
    async fn fire(&self, entity: EntityId) {
        self.timers.remove(&entity);

        match entity {
            EntityId::Poll(id) => {
                let Some(poll) = self.store.remove_poll(id) else {
                    debug!(entity = %entity, "Timer fired for already-removed entity");
                    return;
                };
                info!(poll_id = %id, responses = poll.respondent_count(), "Poll expired");
                self.hub.broadcast(&ServerEvent::PollRemoved { id });

                let archive = Arc::clone(&self.archive);
                tokio::spawn(async move {
                    if let Err(e) = archive.archive_poll(&poll).await {
                        warn!(poll_id = %poll.id, error = %e, "Failed to archive expired poll");
                    }
                });
            }
            EntityId::Quiz(id) => {
                let Some(quiz) = self.store.remove_quiz(id) else {
                    debug!(entity = %entity, "Timer fired for already-removed entity");
                    return;
                };
                info!(quiz_id = %id, responses = quiz.respondent_count(), "Quiz expired");
                self.hub.broadcast(&ServerEvent::QuizRemoved { id });

                let archive = Arc::clone(&self.archive);
                tokio::spawn(async move {
                    if let Err(e) = archive.archive_quiz(&quiz).await {
                        warn!(quiz_id = %quiz.id, error = %e, "Failed to archive expired quiz");
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classhub_core::types::id::UserId;
    use classhub_entity::user::Role;
    use tokio::sync::mpsc;
    use tokio::time::{Duration, advance};

    use crate::archive::LoggingArchive;

    struct Fixture {
        store: Arc<SessionStore>,
        scheduler: Arc<ExpiryScheduler>,
        rx: mpsc::Receiver<String>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(SessionStore::new());
        let hub = Arc::new(BroadcastHub::new(32));
        let (_handle, rx) = hub.register(UserId::new(), Role::Teacher, "T".to_string());
        let scheduler = Arc::new(ExpiryScheduler::new(
            store.clone(),
            hub.clone(),
            Arc::new(LoggingArchive),
        ));
        Fixture {
            store,
            scheduler,
            rx,
        }
    }

    fn create_poll(store: &SessionStore) -> PollId {
        store
            .create_poll(
                "q".to_string(),
                vec!["a".to_string()],
                Some(UserId::new()),
                Vec::new(),
            )
            .expect("create")
            .id
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_removes_and_publishes_once() {
        let mut fx = fixture();
        let poll_id = create_poll(&fx.store);

        fx.scheduler
            .schedule_ttl(EntityId::Poll(poll_id), Duration::from_secs(180));
        tokio::task::yield_now().await;
        advance(Duration::from_secs(181)).await;
        tokio::task::yield_now().await;

        assert!(fx.store.get_poll(poll_id).is_none());
        assert_eq!(fx.scheduler.pending_count(), 0);
        let frames = drain(&mut fx.rx);
        assert_eq!(
            frames
                .iter()
                .filter(|f| f.contains("poll-removed"))
                .count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_replaces_ttl_without_double_fire() {
        let mut fx = fixture();
        let poll_id = create_poll(&fx.store);
        let entity = EntityId::Poll(poll_id);

        fx.scheduler.schedule_ttl(entity, Duration::from_secs(180));
        fx.scheduler
            .schedule_completion(entity, Duration::from_secs(10));
        assert_eq!(fx.scheduler.pending_count(), 1);

        tokio::task::yield_now().await;
        advance(Duration::from_secs(11)).await;
        tokio::task::yield_now().await;
        assert!(fx.store.get_poll(poll_id).is_none());

        // Well past the original TTL: no second removal event.
        advance(Duration::from_secs(300)).await;
        tokio::task::yield_now().await;
        let frames = drain(&mut fx.rx);
        assert_eq!(
            frames
                .iter()
                .filter(|f| f.contains("poll-removed"))
                .count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_noop_for_missing_and_fired_timers() {
        let fx = fixture();
        let poll_id = create_poll(&fx.store);
        let entity = EntityId::Poll(poll_id);

        // Never scheduled: no-op.
        fx.scheduler.cancel(entity);

        fx.scheduler.schedule_ttl(entity, Duration::from_secs(1));
        advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        // Already fired: no-op.
        fx.scheduler.cancel(entity);
        assert_eq!(fx.scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_for_externally_removed_entity_is_silent() {
        let mut fx = fixture();
        let poll_id = create_poll(&fx.store);

        fx.scheduler
            .schedule_ttl(EntityId::Poll(poll_id), Duration::from_secs(5));
        fx.store.remove_poll(poll_id);

        advance(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;

        assert!(drain(&mut fx.rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_outstanding_timers() {
        let fx = fixture();
        let poll_id = create_poll(&fx.store);

        fx.scheduler
            .schedule_ttl(EntityId::Poll(poll_id), Duration::from_secs(180));
        fx.scheduler.shutdown();
        assert_eq!(fx.scheduler.pending_count(), 0);

        advance(Duration::from_secs(300)).await;
        tokio::task::yield_now().await;
        // Aborted timer never removed the entity.
        assert!(fx.store.get_poll(poll_id).is_some());
    }
}
