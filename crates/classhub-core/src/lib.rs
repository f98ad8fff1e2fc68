//! # classhub-core
//!
//! Core crate for ClassHub. Contains typed identifiers, configuration
//! schemas, external-collaborator traits, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ClassHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
