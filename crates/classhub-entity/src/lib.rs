//! # classhub-entity
//!
//! Domain entity models for ClassHub: ephemeral polls and quizzes, user
//! roles, and presence states. Entities are plain data; lifecycle rules
//! (validation, expiry, completion detection) live in `classhub-session`.

pub mod poll;
pub mod presence;
pub mod quiz;
pub mod user;

pub use poll::{Poll, PollResponse};
pub use presence::PresenceState;
pub use quiz::{Quiz, QuizQuestion, QuizResponse};
pub use user::Role;
