// crates/server/src/error.rs
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use webdasher_core::RequestError;
use webdasher_db::DbError;

/// Body returned for every failed request.
///
/// The experiment page only looks at `success`, so failures are sent with
/// HTTP 200 and the reason carried in the body.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct FailureResponse {
    pub success: bool,
    pub reason: String,
    /// The upload row that was being processed when the batch failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_row: Option<Value>,
}

impl FailureResponse {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: reason.into(),
            current_row: None,
        }
    }

    pub fn with_row(reason: impl Into<String>, row: Value) -> Self {
        Self {
            current_row: Some(row),
            ..Self::new(reason)
        }
    }
}

/// Errors surfaced by the endpoint handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let reason = self.to_string();
        let body = match self {
            ApiError::Request(RequestError::MalformedInput) => {
                // The payload itself was logged by the validator.
                tracing::warn!("Rejected malformed payload");
                FailureResponse::new(reason)
            }
            ApiError::Request(RequestError::Invalid(err)) => {
                tracing::warn!(error = %err, "Invalid request");
                FailureResponse::new(reason)
            }
            ApiError::Database(DbError::RowRejected { index, row, .. }) => {
                tracing::warn!(index, reason = %reason, "Upload batch rolled back");
                FailureResponse::with_row(reason, row)
            }
            ApiError::Database(
                DbError::SessionNotFound(id)
                | DbError::AlreadyFinished(id)
                | DbError::SessionClosed { session_id: id, .. },
            ) => {
                tracing::warn!(session_id = id, reason = %reason, "Session state rejected request");
                FailureResponse::new(reason)
            }
            ApiError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                FailureResponse::new(reason)
            }
        };

        Json(body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use serde_json::json;
    use webdasher_core::ValidationError;
    use webdasher_db::RowError;

    async fn extract_response(response: Response) -> (StatusCode, FailureResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let failure: FailureResponse = serde_json::from_slice(&body).unwrap();
        (status, failure)
    }

    #[tokio::test]
    async fn test_malformed_input() {
        let response = ApiError::from(RequestError::MalformedInput).into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::OK);
        assert!(!body.success);
        assert_eq!(body.reason, "Could not parse JSON. Check it with jsonlint.com");
        assert!(body.current_row.is_none());
    }

    #[tokio::test]
    async fn test_already_finished() {
        let response = ApiError::from(DbError::AlreadyFinished(42)).into_response();
        let (_, body) = extract_response(response).await;
        assert_eq!(body.reason, "Session already finished.");
    }

    #[tokio::test]
    async fn test_not_found_names_session() {
        let response = ApiError::from(DbError::SessionNotFound(5)).into_response();
        let (_, body) = extract_response(response).await;
        assert_eq!(body.reason, "Session 5 not found.");
    }

    #[tokio::test]
    async fn test_row_rejected_echoes_row() {
        let row = json!({"type": "bogus", "event_value": 3});
        let err = DbError::RowRejected {
            index: 2,
            row: row.clone(),
            source: RowError::Invalid(ValidationError::UnknownRowType("bogus".into())),
        };
        let (_, body) = extract_response(ApiError::from(err).into_response()).await;

        assert!(body.reason.starts_with("Invalid row:"));
        assert_eq!(body.current_row, Some(row));
    }

    #[test]
    fn test_failure_serialization_omits_missing_row() {
        let json = serde_json::to_string(&FailureResponse::new("nope")).unwrap();
        assert_eq!(json, r#"{"success":false,"reason":"nope"}"#);
    }
}
