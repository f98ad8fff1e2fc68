//! In-memory student roster.

use async_trait::async_trait;
use dashmap::DashSet;

use classhub_core::result::AppResult;
use classhub_core::traits::roster::StudentDirectory;
use classhub_core::types::id::UserId;

/// Roster of currently eligible students, maintained by the coordinator from
/// student connects and logouts.
///
/// A disconnect does not remove a student: a dropped connection should not
/// shrink the audience of the next poll, only an explicit logout does.
#[derive(Debug, Default)]
pub struct InMemoryRoster {
    students: DashSet<UserId>,
}

impl InMemoryRoster {
    /// Creates a new empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enrolls a student.
    pub fn add(&self, student_id: UserId) {
        self.students.insert(student_id);
    }

    /// Removes a student (explicit logout).
    pub fn remove(&self, student_id: &UserId) {
        self.students.remove(student_id);
    }

    /// Number of enrolled students.
    pub fn len(&self) -> usize {
        self.students.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[async_trait]
impl StudentDirectory for InMemoryRoster {
    async fn eligible_students(&self) -> AppResult<Vec<UserId>> {
        Ok(self.students.iter().map(|entry| *entry.key()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enroll_and_logout() {
        let roster = InMemoryRoster::new();
        let student = UserId::new();

        roster.add(student);
        roster.add(student);
        assert_eq!(roster.len(), 1);

        let eligible = roster.eligible_students().await.expect("eligible");
        assert_eq!(eligible, vec![student]);

        roster.remove(&student);
        assert!(roster.is_empty());
    }
}
