//! # classhub-session
//!
//! Real-time session engine for ClassHub. Provides:
//!
//! - Authoritative in-memory store for ephemeral polls and quizzes
//! - Pure scoring of quiz submissions
//! - Entity expiry under competing TTL / completion-grace policies
//! - Debounced per-student presence tracking
//! - Broadcast and directed event fan-out to connected participants
//! - The session coordinator that ties the protocol together

pub mod archive;
pub mod coordinator;
pub mod expiry;
pub mod hub;
pub mod message;
pub mod presence;
pub mod roster;
pub mod scoring;
pub mod store;

pub use archive::{ArchiveSink, LoggingArchive};
pub use coordinator::SessionCoordinator;
pub use expiry::{EntityId, ExpiryScheduler};
pub use hub::BroadcastHub;
pub use presence::tracker::PresenceTracker;
pub use roster::InMemoryRoster;
pub use store::SessionStore;
