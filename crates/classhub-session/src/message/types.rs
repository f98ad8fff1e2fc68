//! Inbound and outbound event type definitions.
//!
//! Events are internally tagged with `type` carrying the kebab-case event
//! name; payload fields use the camelCase names the classroom clients expect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use classhub_core::types::id::{PollId, QuizId, UserId};
use classhub_entity::poll::Poll;
use classhub_entity::quiz::{Quiz, QuizQuestion};

/// Events sent by a participant to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Teacher creates a poll.
    CreatePoll {
        /// Question text.
        question: String,
        /// Answer options, in display order.
        options: Vec<String>,
        /// Creating teacher; rejected with a validation error when absent.
        #[serde(default)]
        created_by: Option<UserId>,
    },
    /// Student answers a poll.
    PollResponse {
        /// Target poll.
        poll_id: PollId,
        /// Responding student.
        student_id: UserId,
        /// Display name.
        student_name: String,
        /// Chosen option text.
        response: String,
    },
    /// Teacher creates a quiz.
    CreateQuiz {
        /// Quiz title.
        title: String,
        /// Questions, in display order.
        questions: Vec<QuizQuestion>,
        /// Creating teacher; rejected with a validation error when absent.
        #[serde(default)]
        created_by: Option<UserId>,
    },
    /// Student submits quiz answers.
    QuizSubmission {
        /// Target quiz.
        quiz_id: QuizId,
        /// Submitting student.
        student_id: UserId,
        /// Display name.
        student_name: String,
        /// Chosen option index per question; short vectors score as wrong.
        answers: Vec<Option<usize>>,
    },
    /// Periodic face-detection signal for a student.
    StudentPresence {
        /// Observed student.
        student_id: UserId,
        /// Display name.
        student_name: String,
        /// Whether a face was observed this tick.
        is_present: bool,
        /// Client-side timestamp of the last positive observation.
        last_active: DateTime<Utc>,
    },
    /// Explicit student logout.
    StudentLogout {
        /// Departing student.
        student_id: UserId,
    },
}

/// Events sent by the coordinator to participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// A poll was created (broadcast, full entity).
    PollCreated(Poll),
    /// A poll received a response (broadcast, full entity).
    PollUpdated(Poll),
    /// A poll was removed (broadcast, id only).
    PollRemoved {
        /// Removed poll id.
        id: PollId,
    },
    /// A quiz was created (broadcast, full entity).
    QuizCreated(Quiz),
    /// A quiz received a submission (broadcast, full entity).
    QuizUpdated(Quiz),
    /// A quiz was removed (broadcast, id only).
    QuizRemoved {
        /// Removed quiz id.
        id: QuizId,
    },
    /// Graded feedback for one submission (directed, submitter only).
    QuizFeedback(QuizFeedback),
    /// Debounced presence change for a student (broadcast).
    PresenceUpdate(PresenceUpdate),
    /// Catch-up snapshot of active polls (directed, on connect).
    ActivePolls {
        /// Active polls addressed to the connecting participant.
        polls: Vec<Poll>,
    },
    /// Catch-up snapshot of active quizzes (directed, on connect).
    ActiveQuizzes {
        /// Active quizzes addressed to the connecting participant.
        quizzes: Vec<Quiz>,
    },
    /// Poll operation failure (directed, to the failing sender).
    PollError {
        /// Human-readable description.
        message: String,
    },
    /// Quiz operation failure (directed, to the failing sender).
    QuizError {
        /// Human-readable description.
        message: String,
    },
}

impl ServerEvent {
    /// The kebab-case event name carried on the wire, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PollCreated(_) => "poll-created",
            Self::PollUpdated(_) => "poll-updated",
            Self::PollRemoved { .. } => "poll-removed",
            Self::QuizCreated(_) => "quiz-created",
            Self::QuizUpdated(_) => "quiz-updated",
            Self::QuizRemoved { .. } => "quiz-removed",
            Self::QuizFeedback(_) => "quiz-feedback",
            Self::PresenceUpdate(_) => "presence-update",
            Self::ActivePolls { .. } => "active-polls",
            Self::ActiveQuizzes { .. } => "active-quizzes",
            Self::PollError { .. } => "poll-error",
            Self::QuizError { .. } => "quiz-error",
        }
    }
}

/// Graded feedback payload for a single quiz submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizFeedback {
    /// The quiz this feedback is for.
    pub quiz_id: QuizId,
    /// Number of correct answers.
    pub score: usize,
    /// Number of questions in the quiz.
    pub total_questions: usize,
    /// The correct option index per question.
    pub correct_answers: Vec<usize>,
}

/// Debounced presence-change payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUpdate {
    /// The student whose presence changed.
    pub student_id: UserId,
    /// Display name.
    pub student_name: String,
    /// Externally-known presence after the change.
    pub is_present: bool,
    /// Last time a positive signal was observed.
    pub last_active: DateTime<Utc>,
}
