//! Optional audit archive for expired entities.
//!
//! Invoked fire-and-forget when an entity is removed; a failing sink must
//! never affect the live broadcast path.

use async_trait::async_trait;

use classhub_core::result::AppResult;
use classhub_entity::poll::Poll;
use classhub_entity::quiz::Quiz;

/// Sink for durably storing completed polls/quizzes for audit.
#[async_trait]
pub trait ArchiveSink: Send + Sync + std::fmt::Debug + 'static {
    /// Archive a removed poll.
    async fn archive_poll(&self, poll: &Poll) -> AppResult<()>;

    /// Archive a removed quiz.
    async fn archive_quiz(&self, quiz: &Quiz) -> AppResult<()>;
}

/// Archive sink that records removals in the log only.
#[derive(Debug, Default)]
pub struct LoggingArchive;

#[async_trait]
impl ArchiveSink for LoggingArchive {
    async fn archive_poll(&self, poll: &Poll) -> AppResult<()> {
        tracing::info!(
            poll_id = %poll.id,
            responses = poll.respondent_count(),
            audience = poll.target_students.len(),
            "Archived expired poll"
        );
        Ok(())
    }

    async fn archive_quiz(&self, quiz: &Quiz) -> AppResult<()> {
        tracing::info!(
            quiz_id = %quiz.id,
            responses = quiz.respondent_count(),
            audience = quiz.target_students.len(),
            "Archived expired quiz"
        );
        Ok(())
    }
}
