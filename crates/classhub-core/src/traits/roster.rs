//! Student roster trait for target-audience snapshots.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::UserId;

/// Source of the current set of eligible students.
///
/// When a teacher creates a poll or quiz, the coordinator snapshots this set
/// as the entity's immutable target audience. The [`StudentDirectory`] trait
/// is defined here in `classhub-core` and implemented in `classhub-session`
/// (in-memory roster) or by an external user registry.
#[async_trait]
pub trait StudentDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Return the ids of all students currently eligible to respond.
    async fn eligible_students(&self) -> AppResult<Vec<UserId>>;
}
