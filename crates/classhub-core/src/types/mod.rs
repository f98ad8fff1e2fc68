//! Shared type definitions.

pub mod id;

pub use id::{ConnectionId, PollId, QuizId, UserId};
