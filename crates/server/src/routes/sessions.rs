// crates/server/src/routes/sessions.rs
//! Session lifecycle endpoints: create and finish.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::Serialize;
use webdasher_core::{parse_request, FinishSessionRequest, NewSessionRequest};

use super::access_denied;
use crate::error::ApiResult;
use crate::state::AppState;

/// Response for `POST /new-session`.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct NewSessionResponse {
    pub success: bool,
    #[serde(rename = "session-id")]
    pub session_id: i64,
}

/// Response for `POST /finish-session`. `code` is the completion code shown
/// to the participant.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct FinishSessionResponse {
    pub success: bool,
    pub code: String,
}

/// POST /new-session - Create an open session and return its id.
pub async fn new_session(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<NewSessionResponse>> {
    let req: NewSessionRequest = parse_request(&body)?;
    let session_id = state.db.create_session(&req.session).await?;
    Ok(Json(NewSessionResponse {
        success: true,
        session_id,
    }))
}

/// POST /finish-session - Finish a session and issue its completion code.
pub async fn finish_session(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<FinishSessionResponse>> {
    let req: FinishSessionRequest = parse_request(&body)?;
    let code = state.db.finish_session(req.session).await?;
    Ok(Json(FinishSessionResponse {
        success: true,
        code,
    }))
}

/// Create the session routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/new-session", post(new_session).fallback(access_denied))
        .route("/new-session.php", post(new_session).fallback(access_denied))
        .route("/finish-session", post(finish_session).fallback(access_denied))
        .route(
            "/finish-session.php",
            post(finish_session).fallback(access_denied),
        )
}
