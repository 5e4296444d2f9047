// crates/core/src/rows.rs
//! Client-reported upload rows and the records they map to.
//!
//! A row is dispatched on its `type` field: `event` rows become
//! [`EventRecord`]s (with cue-tracking samples decomposed into columns),
//! `input` rows become [`InputRecord`]s. Any other `type` is rejected.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::request::{int_or_numeric_string, scalar_text, value_text};

/// Stored in every `cue_*` column of an event that is not a cue sample.
pub const CUE_SENTINEL: f64 = -1.0;

/// `event_type` labels of UI interaction events. Every other label is a
/// cue-tracking sample.
const UI_EVENT_TYPES: [&str; 3] = ["dialog_response", "speed_change", "pause"];

/// Whether an event labelled `event_type` carries a [`CueSample`].
pub fn carries_cue(event_type: &str) -> bool {
    !UI_EVENT_TYPES.contains(&event_type)
}

/// The `event_value` of a cue-tracking event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CueSample {
    pub missed: bool,
    pub value: f64,
    pub top: f64,
    pub velocity: f64,
    pub target_offset: f64,
}

/// A row destined for `event_log`. Session and participant ids are attached
/// at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub date_time: String,
    pub time_stamp_ms: f64,
    pub trial_row_id: i64,
    pub event_type: String,
    pub event_value: Option<String>,
    pub cue_pos_x: f64,
    pub cue_pos_y: f64,
    pub cue_vy: f64,
    pub cue_target_offset: f64,
}

/// A row destined for `input_log`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    pub date_time: String,
    pub time_stamp_ms: f64,
    pub event_type: String,
    pub event_value: Option<String>,
}

/// One decoded upload row.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadRow {
    Event(EventRecord),
    Input(InputRecord),
}

impl UploadRow {
    /// Decode a raw client row.
    pub fn from_json(row: &Value) -> Result<Self, ValidationError> {
        let kind = row.get("type").ok_or(ValidationError::MissingRowType)?;
        match kind.as_str() {
            Some("event") => {
                let wire: EventWire = serde_json::from_value(row.clone())?;
                Ok(Self::Event(wire.into_record()?))
            }
            Some("input") => {
                let wire: InputWire = serde_json::from_value(row.clone())?;
                Ok(Self::Input(wire.into_record()))
            }
            Some(other) => Err(ValidationError::UnknownRowType(other.to_string())),
            None => Err(ValidationError::UnknownRowType(kind.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct EventWire {
    #[serde(deserialize_with = "scalar_text")]
    date_time: String,
    time_stamp_ms: f64,
    #[serde(deserialize_with = "int_or_numeric_string")]
    trial_row_id: i64,
    event_type: String,
    #[serde(default)]
    event_value: Value,
}

impl EventWire {
    fn into_record(self) -> Result<EventRecord, ValidationError> {
        if !carries_cue(&self.event_type) {
            return Ok(EventRecord {
                event_value: value_text(&self.event_value),
                date_time: self.date_time,
                time_stamp_ms: self.time_stamp_ms,
                trial_row_id: self.trial_row_id,
                event_type: self.event_type,
                cue_pos_x: CUE_SENTINEL,
                cue_pos_y: CUE_SENTINEL,
                cue_vy: CUE_SENTINEL,
                cue_target_offset: CUE_SENTINEL,
            });
        }

        let cue: CueSample =
            serde_json::from_value(self.event_value).map_err(|e| ValidationError::Cue {
                event_type: self.event_type.clone(),
                message: e.to_string(),
            })?;
        // Stored as a hit flag: 1 when the cue was caught.
        let hit = if cue.missed { "0" } else { "1" };
        Ok(EventRecord {
            date_time: self.date_time,
            time_stamp_ms: self.time_stamp_ms,
            trial_row_id: self.trial_row_id,
            event_type: self.event_type,
            event_value: Some(hit.to_string()),
            cue_pos_x: cue.value,
            cue_pos_y: cue.top,
            cue_vy: cue.velocity,
            cue_target_offset: cue.target_offset,
        })
    }
}

#[derive(Deserialize)]
struct InputWire {
    #[serde(deserialize_with = "scalar_text")]
    date_time: String,
    time_stamp_ms: f64,
    event_type: String,
    #[serde(default)]
    event_value: Value,
}

impl InputWire {
    fn into_record(self) -> InputRecord {
        InputRecord {
            event_value: value_text(&self.event_value),
            date_time: self.date_time,
            time_stamp_ms: self.time_stamp_ms,
            event_type: self.event_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_ui_events_carry_no_cue() {
        assert!(!carries_cue("dialog_response"));
        assert!(!carries_cue("speed_change"));
        assert!(!carries_cue("pause"));
        assert!(carries_cue("cue-tracking"));
        assert!(carries_cue("cue"));
    }

    #[test]
    fn test_plain_event_keeps_value_and_sentinels() {
        let row = json!({
            "type": "event",
            "date_time": "2024-05-01 10:00:00",
            "time_stamp_ms": 1500,
            "trial_row_id": 3,
            "event_type": "speed_change",
            "event_value": "faster"
        });

        let UploadRow::Event(rec) = UploadRow::from_json(&row).unwrap() else {
            panic!("expected event row");
        };
        assert_eq!(
            rec,
            EventRecord {
                date_time: "2024-05-01 10:00:00".into(),
                time_stamp_ms: 1500.0,
                trial_row_id: 3,
                event_type: "speed_change".into(),
                event_value: Some("faster".into()),
                cue_pos_x: -1.0,
                cue_pos_y: -1.0,
                cue_vy: -1.0,
                cue_target_offset: -1.0,
            }
        );
    }

    #[test]
    fn test_cue_event_decomposes_sample() {
        let row = json!({
            "type": "event",
            "date_time": "2024-05-01 10:00:01",
            "time_stamp_ms": 1600.5,
            "trial_row_id": 4,
            "event_type": "cue-tracking",
            "event_value": {
                "missed": false,
                "value": 120.0,
                "top": 33.5,
                "velocity": 2.25,
                "target_offset": -4.0
            }
        });

        let UploadRow::Event(rec) = UploadRow::from_json(&row).unwrap() else {
            panic!("expected event row");
        };
        assert_eq!(rec.event_value.as_deref(), Some("1"));
        assert_eq!(rec.cue_pos_x, 120.0);
        assert_eq!(rec.cue_pos_y, 33.5);
        assert_eq!(rec.cue_vy, 2.25);
        assert_eq!(rec.cue_target_offset, -4.0);
    }

    #[test]
    fn test_missed_cue_stores_zero() {
        let row = json!({
            "type": "event",
            "date_time": "t",
            "time_stamp_ms": 1,
            "trial_row_id": 1,
            "event_type": "cue-tracking",
            "event_value": {"missed": true, "value": 12.5, "top": 80, "velocity": 2, "target_offset": 7}
        });
        let UploadRow::Event(rec) = UploadRow::from_json(&row).unwrap() else {
            panic!("expected event row");
        };
        assert_eq!(rec.event_value.as_deref(), Some("0"));
        assert_eq!(rec.cue_pos_x, 12.5);
        assert_eq!(rec.cue_pos_y, 80.0);
        assert_eq!(rec.cue_vy, 2.0);
        assert_eq!(rec.cue_target_offset, 7.0);
    }

    #[test]
    fn test_cue_event_without_cue_object_is_rejected() {
        let row = json!({
            "type": "event",
            "date_time": "t",
            "time_stamp_ms": 1,
            "trial_row_id": 1,
            "event_type": "cue-tracking",
            "event_value": "oops"
        });
        let err = UploadRow::from_json(&row).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Cue { ref event_type, .. } if event_type == "cue-tracking"
        ));
    }

    #[test]
    fn test_event_requires_event_type() {
        let row = json!({
            "type": "event",
            "date_time": "t",
            "time_stamp_ms": 1,
            "trial_row_id": 1,
            "event_value": "x"
        });
        let err = UploadRow::from_json(&row).unwrap_err();
        assert!(err.to_string().contains("event_type"), "{err}");
    }

    #[test]
    fn test_input_row_stores_value_directly() {
        let row = json!({
            "type": "input",
            "date_time": "2024-05-01 10:00:02",
            "time_stamp_ms": 1700,
            "event_type": "keydown",
            "event_value": {"key": "ArrowUp"}
        });
        assert_eq!(
            UploadRow::from_json(&row).unwrap(),
            UploadRow::Input(InputRecord {
                date_time: "2024-05-01 10:00:02".into(),
                time_stamp_ms: 1700.0,
                event_type: "keydown".into(),
                event_value: Some(r#"{"key":"ArrowUp"}"#.into()),
            })
        );
    }

    #[test]
    fn test_unknown_row_type_is_rejected() {
        let row = json!({"type": "heartbeat", "date_time": "t"});
        assert_eq!(
            UploadRow::from_json(&row).unwrap_err(),
            ValidationError::UnknownRowType("heartbeat".into())
        );

        let row = json!({"type": 7});
        assert_eq!(
            UploadRow::from_json(&row).unwrap_err(),
            ValidationError::UnknownRowType("7".into())
        );
    }

    #[test]
    fn test_missing_row_type_is_rejected() {
        assert_eq!(
            UploadRow::from_json(&json!({"event_type": "pause"})).unwrap_err(),
            ValidationError::MissingRowType
        );
        assert_eq!(
            UploadRow::from_json(&json!("event")).unwrap_err(),
            ValidationError::MissingRowType
        );
    }
}
