//! Application state shared across all handlers.

use std::sync::Arc;

use classhub_core::config::AppConfig;
use classhub_session::coordinator::SessionCoordinator;

/// Shared state threaded through the router via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Merged application configuration.
    pub config: Arc<AppConfig>,
    /// The live classroom session.
    pub coordinator: Arc<SessionCoordinator>,
}
