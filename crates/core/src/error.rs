// crates/core/src/error.rs
use thiserror::Error;

/// Errors raised while validating an inbound request body.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Could not parse JSON. Check it with jsonlint.com")]
    MalformedInput,

    #[error("Invalid request: {0}")]
    Invalid(#[from] ValidationError),
}

/// A request or row that parsed as JSON but does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Decode(String),

    #[error("row has no `type` field")]
    MissingRowType,

    #[error("unrecognized row type `{0}` (expected `event` or `input`)")]
    UnknownRowType(String),

    #[error("`{event_type}` event needs a cue object: {message}")]
    Cue { event_type: String, message: String },
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
