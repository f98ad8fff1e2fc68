//! Traits for external collaborators.

pub mod roster;

pub use roster::StudentDirectory;
