//! Ephemeral quiz entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use classhub_core::types::id::{QuizId, UserId};

/// A single multiple-choice quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Question text.
    pub prompt: String,
    /// Answer options, in display order.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_option: usize,
}

/// A single student's graded quiz submission. At most one entry per student
/// is kept; re-submitting replaces the previous entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    /// Responding student.
    pub student_id: UserId,
    /// Display name (cached at submission time).
    pub student_name: String,
    /// Chosen option index per question; `None` marks an unanswered
    /// question. Always the same length as the quiz's question list —
    /// short submissions are padded with `None` before storage.
    pub answers: Vec<Option<usize>>,
    /// Derived score; always computed by the scoring engine, never set
    /// directly by clients.
    pub score: usize,
}

/// An ephemeral classroom quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    /// Quiz identifier.
    pub id: QuizId,
    /// Quiz title.
    pub title: String,
    /// Questions, in display order.
    pub questions: Vec<QuizQuestion>,
    /// Graded responses, at most one per student.
    pub responses: Vec<QuizResponse>,
    /// Teacher who created the quiz.
    pub created_by: UserId,
    /// Students eligible to respond (creation-time snapshot).
    pub target_students: Vec<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    /// Create a new quiz with an empty response list.
    pub fn new(
        title: String,
        questions: Vec<QuizQuestion>,
        created_by: UserId,
        target_students: Vec<UserId>,
    ) -> Self {
        Self {
            id: QuizId::new(),
            title,
            questions,
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

    /// Number of distinct students that have submitted.
    pub fn respondent_count(&self) -> usize {
        self.responses.len()
    }

    /// Whether every targeted student has submitted. Empty audiences never
    /// count as complete.
    pub fn is_complete(&self) -> bool {
        !self.target_students.is_empty() && self.respondent_count() == self.target_students.len()
    }

    /// Insert or replace the graded submission for a student.
    pub fn upsert_response(&mut self, response: QuizResponse) {
        match self
            .responses
            .iter_mut()
            .find(|r| r.student_id == response.student_id)
        {
            Some(existing) => *existing = response,
            None => self.responses.push(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quiz(audience: Vec<UserId>) -> Quiz {
        Quiz::new(
            "Fractions".to_string(),
            vec![QuizQuestion {
                prompt: "1/2 + 1/4 = ?".to_string(),
                options: vec!["3/4".to_string(), "2/6".to_string()],
                correct_option: 0,
            }],
            UserId::new(),
            audience,
        )
    }

    #[test]
    fn test_upsert_replaces_submission() {
        let student = UserId::new();
        let mut quiz = sample_quiz(vec![student]);

        quiz.upsert_response(QuizResponse {
            student_id: student,
            student_name: "Alice".to_string(),
            answers: vec![Some(1)],
            score: 0,
        });
        quiz.upsert_response(QuizResponse {
            student_id: student,
            student_name: "Alice".to_string(),
            answers: vec![Some(0)],
            score: 1,
        });

        assert_eq!(quiz.respondent_count(), 1);
        assert_eq!(quiz.responses[0].score, 1);
    }
}
