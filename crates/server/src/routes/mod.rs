//! Route handlers for the webdasher server.

pub mod health;
pub mod sessions;
pub mod upload;

use std::sync::Arc;

use axum::{http::StatusCode, Router};

use crate::state::AppState;

/// Create the combined router.
///
/// Routes:
/// - GET  /health - Health check
/// - POST /new-session - Create an experiment session
/// - POST /finish-session - Finish a session and issue its completion code
/// - POST /upload-data - Append a batch of event/input rows to a session
///
/// Each POST endpoint is also mounted under its legacy `.php` path, and
/// answers any other method with 403.
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(sessions::router())
        .merge(upload::router())
        .with_state(state)
}

/// Response for non-POST requests to a data endpoint.
pub async fn access_denied() -> (StatusCode, &'static str) {
    (StatusCode::FORBIDDEN, "Access denied.")
}
