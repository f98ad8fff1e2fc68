//! Authoritative in-memory state for active polls and quizzes.
//!
//! Each map key is served by a dashmap shard lock, so mutations to the same
//! entity id are serialized while operations on independent entities proceed
//! concurrently. Entities are ephemeral: once removed they never re-enter
//! the store under the same id.

use dashmap::DashMap;

use classhub_core::error::AppError;
use classhub_core::result::AppResult;
use classhub_core::types::id::{PollId, QuizId, UserId};
use classhub_entity::poll::Poll;
use classhub_entity::quiz::{Quiz, QuizQuestion, QuizResponse};

use crate::message::types::QuizFeedback;
use crate::scoring;

/// In-memory store of all active session entities.
#[derive(Debug, Default)]
pub struct SessionStore {
    /// Poll id → poll.
    polls: DashMap<PollId, Poll>,
    /// Quiz id → quiz.
    quizzes: DashMap<QuizId, Quiz>,
}

impl SessionStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a poll after validating the teacher's input.
    ///
    /// The target audience is the caller's snapshot of currently eligible
    /// students; it is stored immutably on the entity.
    pub fn create_poll(
        &self,
        question: String,
        options: Vec<String>,
        created_by: Option<UserId>,
        target_students: Vec<UserId>,
    ) -> AppResult<Poll> {
        let created_by = created_by
            .ok_or_else(|| AppError::validation("User ID is required to create a poll"))?;
        if question.trim().is_empty() {
            return Err(AppError::validation("Poll question must not be blank"));
        }
        if options.is_empty() {
            return Err(AppError::validation("Poll needs at least one option"));
        }

        let poll = Poll::new(question, options, created_by, target_students);
        self.polls.insert(poll.id, poll.clone());
        Ok(poll)
    }

    /// Creates a quiz after validating the teacher's input.
    pub fn create_quiz(
        &self,
        title: String,
        questions: Vec<QuizQuestion>,
        created_by: Option<UserId>,
        target_students: Vec<UserId>,
    ) -> AppResult<Quiz> {
        let created_by = created_by
            .ok_or_else(|| AppError::validation("User ID is required to create a quiz"))?;
        if title.trim().is_empty() {
            return Err(AppError::validation("Quiz title must not be blank"));
        }
        if questions.is_empty() {
            return Err(AppError::validation("Quiz needs at least one question"));
        }
        for (i, q) in questions.iter().enumerate() {
            if q.prompt.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "Question {} must not be blank",
                    i + 1
                )));
            }
            if q.options.is_empty() {
                return Err(AppError::validation(format!(
                    "Question {} needs at least one option",
                    i + 1
                )));
            }
            if q.correct_option >= q.options.len() {
                return Err(AppError::validation(format!(
                    "Question {} has an out-of-range correct option",
                    i + 1
                )));
            }
        }

        let quiz = Quiz::new(title, questions, created_by, target_students);
        self.quizzes.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    /// Inserts or replaces a student's poll response (last write wins).
    ///
    /// Returns the updated poll and whether this upsert was the completion
    /// edge: the first response bringing the distinct respondent count up to
    /// the full target audience. Responses after completion are still
    /// accepted but never re-signal the edge.
    pub fn upsert_poll_response(
        &self,
        poll_id: PollId,
        student_id: UserId,
        student_name: String,
        response: String,
    ) -> AppResult<(Poll, bool)> {
        if response.trim().is_empty() {
            return Err(AppError::validation("Poll response must not be blank"));
        }

        let mut poll = self
            .polls
            .get_mut(&poll_id)
            .ok_or_else(|| AppError::not_found(format!("Poll {poll_id} not found")))?;
        if !poll.is_targeted(&student_id) {
            return Err(AppError::validation(
                "Student is not in the poll's target audience",
            ));
        }

        let was_complete = poll.is_complete();
        poll.upsert_response(student_id, student_name, response);
        let is_now_complete = poll.is_complete();

        Ok((poll.clone(), is_now_complete && !was_complete))
    }

    /// Inserts or replaces a student's graded quiz submission.
    ///
    /// The score is derived by the scoring engine before storage and the
    /// stored answer vector is normalized to the question count. Returns the
    /// updated quiz, the directed feedback payload for the submitter, and
    /// the completion-edge flag.
    pub fn upsert_quiz_response(
        &self,
        quiz_id: QuizId,
        student_id: UserId,
        student_name: String,
        answers: Vec<Option<usize>>,
    ) -> AppResult<(Quiz, QuizFeedback, bool)> {
        let mut quiz = self
            .quizzes
            .get_mut(&quiz_id)
            .ok_or_else(|| AppError::not_found(format!("Quiz {quiz_id} not found")))?;
        if !quiz.is_targeted(&student_id) {
            return Err(AppError::validation(
                "Student is not in the quiz's target audience",
            ));
        }

        let score = scoring::score(&quiz.questions, &answers);
        let answers = scoring::normalize_answers(answers, quiz.questions.len());
        let feedback = QuizFeedback {
            quiz_id,
            score,
            total_questions: quiz.questions.len(),
            correct_answers: scoring::answer_key(&quiz.questions),
        };

        let was_complete = quiz.is_complete();
        quiz.upsert_response(QuizResponse {
            student_id,
            student_name,
            answers,
            score,
        });
        let is_now_complete = quiz.is_complete();

        Ok((quiz.clone(), feedback, is_now_complete && !was_complete))
    }

    /// Removes a poll. Idempotent: returns the poll only on the first
    /// removal, `None` thereafter.
    pub fn remove_poll(&self, poll_id: PollId) -> Option<Poll> {
        self.polls.remove(&poll_id).map(|(_, poll)| poll)
    }

    /// Removes a quiz. Idempotent like [`remove_poll`](Self::remove_poll).
    pub fn remove_quiz(&self, quiz_id: QuizId) -> Option<Quiz> {
        self.quizzes.remove(&quiz_id).map(|(_, quiz)| quiz)
    }

    /// A point-in-time copy of a poll.
    pub fn get_poll(&self, poll_id: PollId) -> Option<Poll> {
        self.polls.get(&poll_id).map(|p| p.clone())
    }

    /// A point-in-time copy of a quiz.
    pub fn get_quiz(&self, quiz_id: QuizId) -> Option<Quiz> {
        self.quizzes.get(&quiz_id).map(|q| q.clone())
    }

    /// Active polls addressed to the given student, read at call time.
    pub fn active_polls_for(&self, student_id: &UserId) -> Vec<Poll> {
        self.polls
            .iter()
            .filter(|p| p.is_targeted(student_id))
            .map(|p| p.clone())
            .collect()
    }

    /// Active quizzes addressed to the given student, read at call time.
    pub fn active_quizzes_for(&self, student_id: &UserId) -> Vec<Quiz> {
        self.quizzes
            .iter()
            .filter(|q| q.is_targeted(student_id))
            .map(|q| q.clone())
            .collect()
    }

    /// All active polls (teacher view).
    pub fn all_polls(&self) -> Vec<Poll> {
        self.polls.iter().map(|p| p.clone()).collect()
    }

    /// All active quizzes (teacher view).
    pub fn all_quizzes(&self) -> Vec<Quiz> {
        self.quizzes.iter().map(|q| q.clone()).collect()
    }

    /// Number of active polls.
    pub fn poll_count(&self) -> usize {
        self.polls.len()
    }

    /// Number of active quizzes.
    pub fn quiz_count(&self) -> usize {
        self.quizzes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teacher() -> Option<UserId> {
        Some(UserId::new())
    }

    fn one_question() -> Vec<QuizQuestion> {
        vec![QuizQuestion {
            prompt: "1/2 + 1/4 = ?".to_string(),
            options: vec!["3/4".to_string(), "2/6".to_string()],
            correct_option: 0,
        }]
    }

    #[test]
    fn test_create_poll_requires_creator() {
        let store = SessionStore::new();
        let err = store
            .create_poll("q".to_string(), vec!["a".to_string()], None, Vec::new())
            .unwrap_err();
        assert_eq!(err.kind, classhub_core::error::ErrorKind::Validation);
    }

    #[test]
    fn test_create_poll_rejects_blank_question_and_empty_options() {
        let store = SessionStore::new();
        assert!(
            store
                .create_poll("   ".to_string(), vec!["a".to_string()], teacher(), Vec::new())
                .is_err()
        );
        assert!(
            store
                .create_poll("q".to_string(), Vec::new(), teacher(), Vec::new())
                .is_err()
        );
        assert_eq!(store.poll_count(), 0);
    }

    #[test]
    fn test_create_quiz_rejects_out_of_range_correct_option() {
        let store = SessionStore::new();
        let questions = vec![QuizQuestion {
            prompt: "q".to_string(),
            options: vec!["a".to_string()],
            correct_option: 1,
        }];
        assert!(
            store
                .create_quiz("t".to_string(), questions, teacher(), Vec::new())
                .is_err()
        );
    }

    #[test]
    fn test_upsert_is_idempotent_per_student() {
        let store = SessionStore::new();
        let student = UserId::new();
        let poll = store
            .create_poll(
                "q".to_string(),
                vec!["a".to_string(), "b".to_string()],
                teacher(),
                vec![student, UserId::new()],
            )
            .expect("create");

        for response in ["a", "b", "a"] {
            store
                .upsert_poll_response(poll.id, student, "Alice".to_string(), response.to_string())
                .expect("upsert");
        }

        let stored = store.get_poll(poll.id).expect("poll");
        assert_eq!(stored.respondent_count(), 1);
        assert_eq!(stored.responses[0].response, "a");
    }

    #[test]
    fn test_completion_edge_fires_exactly_once() {
        let store = SessionStore::new();
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        let poll = store
            .create_poll(
                "How are you feeling?".to_string(),
                vec!["😊".to_string(), "😴".to_string()],
                teacher(),
                vec![a, b, c],
            )
            .expect("create");

        let (_, edge) = store
            .upsert_poll_response(poll.id, a, "A".to_string(), "😊".to_string())
            .expect("a");
        assert!(!edge);
        let (_, edge) = store
            .upsert_poll_response(poll.id, b, "B".to_string(), "😊".to_string())
            .expect("b");
        assert!(!edge);
        let (_, edge) = store
            .upsert_poll_response(poll.id, c, "C".to_string(), "😴".to_string())
            .expect("c");
        assert!(edge);

        // Re-submissions after completion never re-signal the edge.
        let (_, edge) = store
            .upsert_poll_response(poll.id, a, "A".to_string(), "😴".to_string())
            .expect("re-submit");
        assert!(!edge);
    }

    #[test]
    fn test_response_from_outside_audience_rejected() {
        let store = SessionStore::new();
        let poll = store
            .create_poll(
                "q".to_string(),
                vec!["a".to_string()],
                teacher(),
                vec![UserId::new()],
            )
            .expect("create");

        let outsider = UserId::new();
        let err = store
            .upsert_poll_response(poll.id, outsider, "X".to_string(), "a".to_string())
            .unwrap_err();
        assert_eq!(err.kind, classhub_core::error::ErrorKind::Validation);
        assert_eq!(store.get_poll(poll.id).expect("poll").respondent_count(), 0);
    }

    #[test]
    fn test_unknown_poll_is_not_found() {
        let store = SessionStore::new();
        let err = store
            .upsert_poll_response(PollId::new(), UserId::new(), "A".to_string(), "a".to_string())
            .unwrap_err();
        assert_eq!(err.kind, classhub_core::error::ErrorKind::NotFound);
    }

    #[test]
    fn test_quiz_submission_scored_and_padded() {
        let store = SessionStore::new();
        let student = UserId::new();
        let mut questions = one_question();
        questions.push(QuizQuestion {
            prompt: "2 * 3 = ?".to_string(),
            options: vec!["5".to_string(), "6".to_string()],
            correct_option: 1,
        });
        let quiz = store
            .create_quiz("Math".to_string(), questions, teacher(), vec![student])
            .expect("create");

        let (stored, feedback, edge) = store
            .upsert_quiz_response(quiz.id, student, "Alice".to_string(), vec![Some(0)])
            .expect("submit");

        assert!(edge);
        assert_eq!(feedback.score, 1);
        assert_eq!(feedback.total_questions, 2);
        assert_eq!(feedback.correct_answers, vec![0, 1]);
        assert_eq!(stored.responses[0].answers, vec![Some(0), None]);
        assert_eq!(stored.responses[0].score, 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = SessionStore::new();
        let poll = store
            .create_poll("q".to_string(), vec!["a".to_string()], teacher(), Vec::new())
            .expect("create");

        assert!(store.remove_poll(poll.id).is_some());
        assert!(store.remove_poll(poll.id).is_none());
        assert_eq!(store.poll_count(), 0);
    }

    #[test]
    fn test_empty_audience_never_edges() {
        let store = SessionStore::new();
        let quiz = store
            .create_quiz("t".to_string(), one_question(), teacher(), Vec::new())
            .expect("create");
        // No student can respond, so the quiz can only expire by TTL.
        assert!(!store.get_quiz(quiz.id).expect("quiz").is_complete());
    }

    #[test]
    fn test_snapshots_filtered_by_audience() {
        let store = SessionStore::new();
        let (a, b) = (UserId::new(), UserId::new());
        store
            .create_poll("q1".to_string(), vec!["x".to_string()], teacher(), vec![a])
            .expect("p1");
        store
            .create_poll("q2".to_string(), vec!["x".to_string()], teacher(), vec![a, b])
            .expect("p2");

        assert_eq!(store.active_polls_for(&a).len(), 2);
        assert_eq!(store.active_polls_for(&b).len(), 1);
        assert_eq!(store.all_polls().len(), 2);
    }
}
