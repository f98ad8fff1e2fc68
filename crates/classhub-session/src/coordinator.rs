//! Session coordinator — the protocol logic tying all subsystems together.
//!
//! Inbound client events are validated, applied to the store, scored and
//! scheduled as needed, and fanned out through the hub. A failure caused by
//! one participant's event is surfaced to that participant (when it is their
//! fault) or logged (when it is ours), and never stops processing of other
//! participants' events or timers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use classhub_core::config::AppConfig;
use classhub_core::error::AppError;
use classhub_core::result::AppResult;
use classhub_core::traits::roster::StudentDirectory;
use classhub_core::types::id::{ConnectionId, PollId, QuizId, UserId};
use classhub_entity::quiz::QuizQuestion;
use classhub_entity::user::Role;

use crate::archive::{ArchiveSink, LoggingArchive};
use crate::expiry::{EntityId, ExpiryScheduler};
use crate::hub::{BroadcastHub, ParticipantHandle};
use crate::message::types::{ClientEvent, ServerEvent};
use crate::presence::tracker::PresenceTracker;
use crate::roster::InMemoryRoster;
use crate::store::SessionStore;

/// Central coordinator for a live classroom session.
pub struct SessionCoordinator {
    /// Authoritative entity state.
    pub store: Arc<SessionStore>,
    /// Participant fan-out.
    pub hub: Arc<BroadcastHub>,
    /// Removal timers.
    pub expiry: Arc<ExpiryScheduler>,
    /// Debounced presence.
    pub presence: Arc<PresenceTracker>,
    /// Enrolled students (maintained from connects/logouts).
    roster: Arc<InMemoryRoster>,
    /// Audience snapshot source; by default the in-memory roster.
    directory: Arc<dyn StudentDirectory>,
    /// Lifecycle configuration.
    config: AppConfig,
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator").finish()
    }
}

impl SessionCoordinator {
    /// Creates a coordinator with the default in-memory collaborators.
    pub fn new(config: AppConfig) -> Self {
        let roster = Arc::new(InMemoryRoster::new());
        Self::with_collaborators(config, roster, Arc::new(LoggingArchive))
    }

    /// Creates a coordinator with an explicit archive sink. The in-memory
    /// roster always doubles as the audience directory.
    pub fn with_collaborators(
        config: AppConfig,
        roster: Arc<InMemoryRoster>,
        archive: Arc<dyn ArchiveSink>,
    ) -> Self {
        let store = Arc::new(SessionStore::new());
        let hub = Arc::new(BroadcastHub::new(config.session.channel_buffer_size));
        let expiry = Arc::new(ExpiryScheduler::new(store.clone(), hub.clone(), archive));
        let presence = Arc::new(PresenceTracker::new(hub.clone(), config.presence.grace()));

        info!("Session coordinator initialized");

        Self {
            store,
            hub,
            expiry,
            presence,
            directory: roster.clone(),
            roster,
            config,
        }
    }

    /// Registers a connecting participant and pushes the catch-up snapshot.
    ///
    /// The snapshot reflects store state at the instant of connection:
    /// students see the entities addressed to them, teachers see everything.
    pub fn connect(
        &self,
        user_id: UserId,
        name: &str,
        role: Role,
    ) -> (Arc<ParticipantHandle>, tokio::sync::mpsc::Receiver<String>) {
        let (handle, rx) = self.hub.register(user_id, role, name.to_string());

        if role.is_student() {
            self.roster.add(user_id);
        }

        let (polls, quizzes) = match role {
            Role::Student => (
                self.store.active_polls_for(&user_id),
                self.store.active_quizzes_for(&user_id),
            ),
            Role::Teacher => (self.store.all_polls(), self.store.all_quizzes()),
        };
        self.hub
            .send_to_conn(&handle.id, &ServerEvent::ActivePolls { polls });
        self.hub
            .send_to_conn(&handle.id, &ServerEvent::ActiveQuizzes { quizzes });

        (handle, rx)
    }

    /// Unregisters a participant. Disconnecting students are forced absent
    /// (exactly once per disconnect) but stay enrolled for future polls.
    pub fn disconnect(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.hub.unregister(conn_id)
            && handle.role.is_student()
        {
            self.presence.force_absent(handle.user_id, &handle.name);
        }
    }

    /// Parses and dispatches one raw frame from a participant.
    pub async fn handle_frame(&self, conn_id: &ConnectionId, raw: &str) {
        let event: ClientEvent = match serde_json::from_str(raw) {
            Ok(event) => event,
            Err(e) => {
                // Unknown or malformed events are dropped, matching the
                // tolerance expected of a mixed-client classroom.
                warn!(conn_id = %conn_id, error = %e, "Ignoring unparseable frame");
                return;
            }
        };
        self.handle_event(conn_id, event).await;
    }

    /// Dispatches one decoded client event.
    pub async fn handle_event(&self, conn_id: &ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::CreatePoll {
                question,
                options,
                created_by,
            } => {
                if let Err(e) = self.create_poll(question, options, created_by).await {
                    self.surface_error(conn_id, "poll", e);
                }
            }
            ClientEvent::PollResponse {
                poll_id,
                student_id,
                student_name,
                response,
            } => {
                if let Err(e) = self.poll_response(poll_id, student_id, student_name, response) {
                    self.surface_error(conn_id, "poll", e);
                }
            }
            ClientEvent::CreateQuiz {
                title,
                questions,
                created_by,
            } => {
                if let Err(e) = self.create_quiz(title, questions, created_by).await {
                    self.surface_error(conn_id, "quiz", e);
                }
            }
            ClientEvent::QuizSubmission {
                quiz_id,
                student_id,
                student_name,
                answers,
            } => {
                if let Err(e) = self.quiz_submission(quiz_id, student_id, student_name, answers) {
                    self.surface_error(conn_id, "quiz", e);
                }
            }
            ClientEvent::StudentPresence {
                student_id,
                student_name,
                is_present,
                last_active,
            } => {
                self.student_presence(student_id, &student_name, is_present, last_active);
            }
            ClientEvent::StudentLogout { student_id } => {
                self.student_logout(student_id);
            }
        }
    }

    /// Gracefully shuts the session down: timers aborted, participants
    /// closed. Entities are simply dropped — they are ephemeral by design.
    pub fn shutdown(&self) {
        info!("Shutting down session coordinator");
        self.expiry.shutdown();
        self.hub.close_all();
    }

    async fn create_poll(
        &self,
        question: String,
        options: Vec<String>,
        created_by: Option<UserId>,
    ) -> AppResult<()> {
        let audience = self.directory.eligible_students().await?;
        let poll = self
            .store
            .create_poll(question, options, created_by, audience)?;

        info!(
            poll_id = %poll.id,
            audience = poll.target_students.len(),
            "Poll created"
        );
        let poll_id = poll.id;
        self.hub.broadcast(&ServerEvent::PollCreated(poll));
        self.expiry
            .schedule_ttl(EntityId::Poll(poll_id), self.config.session.entity_ttl());
        Ok(())
    }

    fn poll_response(
        &self,
        poll_id: PollId,
        student_id: UserId,
        student_name: String,
        response: String,
    ) -> AppResult<()> {
        let (poll, completed) =
            self.store
                .upsert_poll_response(poll_id, student_id, student_name, response)?;

        debug!(
            poll_id = %poll_id,
            student_id = %student_id,
            respondents = poll.respondent_count(),
            "Poll response recorded"
        );
        self.hub.broadcast(&ServerEvent::PollUpdated(poll));
        if completed {
            self.expiry.schedule_completion(
                EntityId::Poll(poll_id),
                self.config.session.completion_grace(),
            );
        }
        Ok(())
    }

    async fn create_quiz(
        &self,
        title: String,
        questions: Vec<QuizQuestion>,
        created_by: Option<UserId>,
    ) -> AppResult<()> {
        let audience = self.directory.eligible_students().await?;
        let quiz = self
            .store
            .create_quiz(title, questions, created_by, audience)?;

        info!(
            quiz_id = %quiz.id,
            questions = quiz.questions.len(),
            audience = quiz.target_students.len(),
            "Quiz created"
        );
        let quiz_id = quiz.id;
        self.hub.broadcast(&ServerEvent::QuizCreated(quiz));
        self.expiry
            .schedule_ttl(EntityId::Quiz(quiz_id), self.config.session.entity_ttl());
        Ok(())
    }

    fn quiz_submission(
        &self,
        quiz_id: QuizId,
        student_id: UserId,
        student_name: String,
        answers: Vec<Option<usize>>,
    ) -> AppResult<()> {
        let (quiz, feedback, completed) =
            self.store
                .upsert_quiz_response(quiz_id, student_id, student_name, answers)?;

        debug!(
            quiz_id = %quiz_id,
            student_id = %student_id,
            score = feedback.score,
            "Quiz submission graded"
        );
        self.hub.broadcast(&ServerEvent::QuizUpdated(quiz));
        self.hub
            .send_to_user(&student_id, &ServerEvent::QuizFeedback(feedback));
        if completed {
            self.expiry.schedule_completion(
                EntityId::Quiz(quiz_id),
                self.config.session.completion_grace(),
            );
        }
        Ok(())
    }

    fn student_presence(
        &self,
        student_id: UserId,
        student_name: &str,
        is_present: bool,
        last_active: DateTime<Utc>,
    ) {
        self.presence
            .signal(student_id, student_name, is_present, last_active);
    }

    fn student_logout(&self, student_id: UserId) {
        info!(student_id = %student_id, "Student logged out");
        self.roster.remove(&student_id);
        // The tracker keeps the student's last known name; the fallback is
        // only used when no presence signal was ever seen.
        self.presence.force_absent(student_id, "unknown");
    }

    /// Routes an operation failure: the sender's fault goes back to the
    /// sender as a directed error event, ours is logged and swallowed.
    fn surface_error(&self, conn_id: &ConnectionId, domain: &str, error: AppError) {
        if error.is_client_facing() {
            debug!(conn_id = %conn_id, domain, error = %error, "Rejecting client event");
            let event = match domain {
                "quiz" => ServerEvent::QuizError {
                    message: error.message.clone(),
                },
                _ => ServerEvent::PollError {
                    message: error.message.clone(),
                },
            };
            self.hub.send_to_conn(conn_id, &event);
        } else {
            error!(conn_id = %conn_id, domain, error = %error, "Internal failure handling client event");
        }
    }
}
