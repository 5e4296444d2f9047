// crates/server/src/lib.rs
//! webdasher server library.
//!
//! Axum HTTP surface for the experiment backend: create a session, upload
//! event/input batches, finish the session and hand out its completion code.

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::{Config, DEFAULT_BODY_LIMIT};
pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use webdasher_db::Database;

/// Create the Axum application with the default body limit.
pub fn create_app(db: Database) -> Router {
    create_app_full(db, DEFAULT_BODY_LIMIT)
}

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - Session, upload and health routes
/// - CORS for any origin (the experiment page is hosted elsewhere)
/// - A request body limit
/// - Request tracing
pub fn create_app_full(db: Database, body_limit: usize) -> Router {
    let state = AppState::new(db);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
