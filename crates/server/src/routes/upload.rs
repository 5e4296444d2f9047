// crates/server/src/routes/upload.rs
//! Upload endpoint: append a batch of client rows to a session.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::Serialize;
use webdasher_core::{parse_request, UploadRequest};

use super::access_denied;
use crate::error::ApiResult;
use crate::state::AppState;

/// Response for a stored batch.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct UploadResponse {
    pub success: bool,
}

/// POST /upload-data - Store every row of the batch or none of them.
pub async fn upload_data(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<UploadResponse>> {
    let req: UploadRequest = parse_request(&body)?;
    state
        .db
        .ingest_batch(req.session, &req.participant, &req.data)
        .await?;
    Ok(Json(UploadResponse { success: true }))
}

/// Create the upload routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload-data", post(upload_data).fallback(access_denied))
        .route("/upload-data.php", post(upload_data).fallback(access_denied))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use webdasher_core::NewSession;

    async fn test_app() -> (Router, Arc<AppState>, i64) {
        let db = webdasher_db::Database::new_in_memory()
            .await
            .expect("in-memory DB");
        let id = db
            .create_session(&NewSession {
                scenario: 1,
                scenario_name: "pilot".into(),
                participant_id: "P1".into(),
                browser_info: None,
                machine_info: None,
            })
            .await
            .unwrap();
        let state = AppState::new(db);
        (router().with_state(state.clone()), state, id)
    }

    async fn post_raw(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload-data")
                    .body(body.into())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upload_stores_rows() {
        let (app, state, id) = test_app().await;
        let payload = json!({
            "session": id,
            "participant": "P1",
            "data": [
                {"type": "event", "date_time": "t1", "time_stamp_ms": 10, "trial_row_id": 1,
                 "event_type": "dialog_response", "event_value": "yes"},
                {"type": "input", "date_time": "t2", "time_stamp_ms": 11,
                 "event_type": "keyup", "event_value": "Enter"}
            ]
        });

        let (status, body) = post_raw(app, payload.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        assert_eq!(state.db.list_events(id).await.unwrap().len(), 1);
        assert_eq!(state.db.list_inputs(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_reports_failing_row() {
        let (app, state, id) = test_app().await;
        let bad_row = json!({"type": "scroll", "event_value": 1});
        let payload = json!({
            "session": id,
            "participant": "P1",
            "data": [
                {"type": "input", "date_time": "t2", "time_stamp_ms": 11,
                 "event_type": "keyup", "event_value": "Enter"},
                bad_row
            ]
        });

        let (_, body) = post_raw(app, payload.to_string()).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["current_row"], bad_row);
        assert!(body["reason"].as_str().unwrap().contains("scroll"));
        assert!(state.db.list_inputs(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_malformed_json() {
        let (app, _, _) = test_app().await;
        let (_, body) = post_raw(app, "{\"session\": ").await;
        assert_eq!(
            body,
            json!({"success": false, "reason": "Could not parse JSON. Check it with jsonlint.com"})
        );
    }

    #[tokio::test]
    async fn test_upload_unknown_session() {
        let (app, _, _) = test_app().await;
        let payload = json!({"session": 999, "participant": "P1", "data": []});
        let (_, body) = post_raw(app, payload.to_string()).await;
        assert_eq!(body, json!({"success": false, "reason": "Session 999 not found."}));
    }
}
