//! Ephemeral poll entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use classhub_core::types::id::{PollId, UserId};

/// A single student's poll response. At most one entry per student is kept;
/// re-submitting replaces the previous entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    /// Responding student.
    pub student_id: UserId,
    /// Display name (cached at submission time).
    pub student_name: String,
    /// The chosen option text.
    pub response: String,
}

/// An ephemeral classroom poll.
///
/// `options` keeps insertion order — it is the display order. The target
/// audience is snapshotted at creation and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    /// Poll identifier.
    pub id: PollId,
    /// The question text.
    pub question: String,
    /// Answer options, in display order.
    pub options: Vec<String>,
    /// Responses, at most one per student.
    pub responses: Vec<PollResponse>,
    /// Teacher who created the poll.
    pub created_by: UserId,
    /// Students eligible to respond (creation-time snapshot).
    pub target_students: Vec<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Create a new poll with an empty response list.
    pub fn new(
        question: String,
        options: Vec<String>,
        created_by: UserId,
        target_students: Vec<UserId>,
    ) -> Self {
        Self {
            id: PollId::new(),
            question,
            options,
            responses: Vec::new(),
            created_by,
            target_students,
            created_at: Utc::now(),
        }
    }

    /// Whether the given student is in the target audience.
    pub fn is_targeted(&self, student_id: &UserId) -> bool {
        self.target_students.contains(student_id)
    }

    /// Number of distinct students that have responded.
    pub fn respondent_count(&self) -> usize {
        self.responses.len()
    }

    /// Whether every targeted student has responded.
    ///
    /// An empty target audience never counts as complete; such a poll is
    /// only ever removed by its TTL.
    pub fn is_complete(&self) -> bool {
        !self.target_students.is_empty() && self.respondent_count() == self.target_students.len()
    }

    /// Insert or replace the response for a student (last write wins).
    pub fn upsert_response(&mut self, student_id: UserId, student_name: String, response: String) {
        match self
            .responses
            .iter_mut()
            .find(|r| r.student_id == student_id)
        {
            Some(existing) => {
                existing.student_name = student_name;
                existing.response = response;
            }
            None => self.responses.push(PollResponse {
                student_id,
                student_name,
                response,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_poll(audience: Vec<UserId>) -> Poll {
        Poll::new(
            "How are you feeling?".to_string(),
            vec!["😊".to_string(), "😴".to_string()],
            UserId::new(),
            audience,
        )
    }

    #[test]
    fn test_upsert_replaces_existing_response() {
        let student = UserId::new();
        let mut poll = sample_poll(vec![student]);

        poll.upsert_response(student, "Alice".to_string(), "😊".to_string());
        poll.upsert_response(student, "Alice".to_string(), "😴".to_string());

        assert_eq!(poll.respondent_count(), 1);
        assert_eq!(poll.responses[0].response, "😴");
    }

    #[test]
    fn test_empty_audience_never_complete() {
        let poll = sample_poll(Vec::new());
        assert!(!poll.is_complete());
    }

    #[test]
    fn test_complete_when_all_responded() {
        let a = UserId::new();
        let b = UserId::new();
        let mut poll = sample_poll(vec![a, b]);

        poll.upsert_response(a, "A".to_string(), "😊".to_string());
        assert!(!poll.is_complete());
        poll.upsert_response(b, "B".to_string(), "😴".to_string());
        assert!(poll.is_complete());
    }
}
