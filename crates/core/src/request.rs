// crates/core/src/request.rs
//! Request validation: raw body → JSON value → typed request.
//!
//! The browser client is loose about scalar types (ids echo back as strings,
//! participant ids may be numeric), so the decoders below accept either form
//! where the stored column type is unambiguous.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{RequestError, ValidationError};

/// Parse a raw request body as JSON.
///
/// Bodies that fail to parse, or that parse to an empty value (`null`,
/// `false`, `0`, `""`, `"0"`, `[]`, `{}`), are rejected with
/// [`RequestError::MalformedInput`]. The offending payload is logged.
pub fn parse_payload(raw: &[u8]) -> Result<Value, RequestError> {
    match serde_json::from_slice::<Value>(raw) {
        Ok(value) if !is_empty(&value) => Ok(value),
        Ok(_) => {
            warn!(payload = %String::from_utf8_lossy(raw), "Empty JSON payload");
            Err(RequestError::MalformedInput)
        }
        Err(e) => {
            warn!(
                payload = %String::from_utf8_lossy(raw),
                error = %e,
                "Could not parse JSON"
            );
            Err(RequestError::MalformedInput)
        }
    }
}

/// Parse and decode a body in one step.
pub fn parse_request<T: DeserializeOwned>(raw: &[u8]) -> Result<T, RequestError> {
    let value = parse_payload(raw)?;
    Ok(decode(value)?)
}

/// Decode an already-validated JSON value into a typed request.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ValidationError> {
    Ok(serde_json::from_value(value)?)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Textual form of a free-form client value: strings verbatim, `null` as
/// `None`, anything else as compact JSON.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `POST /new-session` body.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSessionRequest {
    pub session: NewSession,
}

/// Fields of a session as reported by the experiment page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewSession {
    #[serde(deserialize_with = "int_or_numeric_string")]
    pub scenario: i64,
    #[serde(rename = "scenario-name", deserialize_with = "scalar_text")]
    pub scenario_name: String,
    #[serde(rename = "participant", deserialize_with = "scalar_text")]
    pub participant_id: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub browser_info: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub machine_info: Option<String>,
}

/// `POST /finish-session` body.
#[derive(Debug, Clone, Deserialize)]
pub struct FinishSessionRequest {
    #[serde(deserialize_with = "int_or_numeric_string")]
    pub session: i64,
}

/// `POST /upload-data` body. Rows stay untyped here so a failing row can be
/// echoed back exactly as the client sent it.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    #[serde(deserialize_with = "int_or_numeric_string")]
    pub session: i64,
    #[serde(deserialize_with = "scalar_text")]
    pub participant: String,
    pub data: Vec<Value>,
}

pub(crate) fn int_or_numeric_string<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("expected an integer, found {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected an integer, found \"{s}\""))),
        other => Err(de::Error::custom(format!(
            "expected an integer, found {other}"
        ))),
    }
}

pub(crate) fn scalar_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        v @ (Value::Number(_) | Value::Bool(_)) => Ok(v.to_string()),
        other => Err(de::Error::custom(format!("expected a string, found {other}"))),
    }
}

fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(value_text(&Value::deserialize(d)?))
}
