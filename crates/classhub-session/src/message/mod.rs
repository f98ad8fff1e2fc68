//! Wire message definitions for the persistent classroom connection.

pub mod types;

pub use types::{ClientEvent, QuizFeedback, ServerEvent};
