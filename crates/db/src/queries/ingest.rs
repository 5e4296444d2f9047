// crates/db/src/queries/ingest.rs
//! Upload ingestion: one client batch → one transaction.
//!
//! Rows are decoded and inserted in order. The first row that fails to decode
//! or insert aborts the batch; the transaction is dropped (rolled back) and the
//! row is handed back to the caller untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{Row, SqliteConnection};
use tracing::{info, warn};
use webdasher_core::{EventRecord, InputRecord, UploadRow};

use super::sessions::fetch_status;
use crate::{Database, DbError, DbResult, RowError};

/// Number of records written by one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub events: usize,
    pub inputs: usize,
}

/// A stored `event_log` row.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLogRow {
    pub session_id: i64,
    pub participant_id: String,
    pub record: EventRecord,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for EventLogRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            participant_id: row.try_get("participant_id")?,
            record: EventRecord {
                date_time: row.try_get("date_time")?,
                time_stamp_ms: row.try_get("time_stamp_ms")?,
                trial_row_id: row.try_get("trial_row_id")?,
                event_type: row.try_get("event_type")?,
                event_value: row.try_get("event_value")?,
                cue_pos_x: row.try_get("cue_pos_x")?,
                cue_pos_y: row.try_get("cue_pos_y")?,
                cue_vy: row.try_get("cue_vy")?,
                cue_target_offset: row.try_get("cue_target_offset")?,
            },
        })
    }
}

/// A stored `input_log` row.
#[derive(Debug, Clone, PartialEq)]
pub struct InputLogRow {
    pub session_id: i64,
    pub participant_id: String,
    pub record: InputRecord,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for InputLogRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            participant_id: row.try_get("participant_id")?,
            record: InputRecord {
                date_time: row.try_get("date_time")?,
                time_stamp_ms: row.try_get("time_stamp_ms")?,
                event_type: row.try_get("event_type")?,
                event_value: row.try_get("event_value")?,
            },
        })
    }
}

async fn insert_event(
    conn: &mut SqliteConnection,
    session_id: i64,
    participant_id: &str,
    event: &EventRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO event_log (
            session_id, participant_id, date_time, time_stamp_ms, trial_row_id,
            event_type, event_value, cue_pos_x, cue_pos_y, cue_vy, cue_target_offset
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(session_id)
    .bind(participant_id)
    .bind(&event.date_time)
    .bind(event.time_stamp_ms)
    .bind(event.trial_row_id)
    .bind(&event.event_type)
    .bind(&event.event_value)
    .bind(event.cue_pos_x)
    .bind(event.cue_pos_y)
    .bind(event.cue_vy)
    .bind(event.cue_target_offset)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_input(
    conn: &mut SqliteConnection,
    session_id: i64,
    participant_id: &str,
    input: &InputRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO input_log (
            session_id, participant_id, date_time, time_stamp_ms, event_type, event_value
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(session_id)
    .bind(participant_id)
    .bind(&input.date_time)
    .bind(input.time_stamp_ms)
    .bind(&input.event_type)
    .bind(&input.event_value)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

impl Database {
    /// Store a batch of client rows for `session_id`, all or nothing.
    pub async fn ingest_batch(
        &self,
        session_id: i64,
        participant_id: &str,
        rows: &[Value],
    ) -> DbResult<IngestSummary> {
        self.ingest_batch_at(session_id, participant_id, rows, Utc::now())
            .await
    }

    /// [`Database::ingest_batch`] with the grace period measured against `now`.
    pub async fn ingest_batch_at(
        &self,
        session_id: i64,
        participant_id: &str,
        rows: &[Value],
        now: DateTime<Utc>,
    ) -> DbResult<IngestSummary> {
        // Write lock up front: upgrading a read snapshot under WAL fails
        // with SQLITE_BUSY_SNAPSHOT instead of waiting.
        let mut tx = self.pool().begin_with("BEGIN IMMEDIATE").await?;

        let status = fetch_status(&mut tx, session_id, now).await?;
        if !status.accepts_uploads() {
            let seconds_since_finish = status.seconds_since_finish.unwrap_or_default();
            warn!(session_id, seconds_since_finish, "Upload to closed session");
            return Err(DbError::SessionClosed {
                session_id,
                seconds_since_finish,
            });
        }

        let mut summary = IngestSummary::default();
        for (index, raw) in rows.iter().enumerate() {
            let reject = |source: RowError| {
                warn!(session_id, index, error = %source, row = %raw, "Upload row rejected");
                DbError::RowRejected {
                    index,
                    row: raw.clone(),
                    source,
                }
            };

            match UploadRow::from_json(raw).map_err(|e| reject(e.into()))? {
                UploadRow::Event(event) => {
                    insert_event(&mut tx, session_id, participant_id, &event)
                        .await
                        .map_err(|e| reject(e.into()))?;
                    summary.events += 1;
                }
                UploadRow::Input(input) => {
                    insert_input(&mut tx, session_id, participant_id, &input)
                        .await
                        .map_err(|e| reject(e.into()))?;
                    summary.inputs += 1;
                }
            }
        }

        tx.commit().await?;
        info!(
            session_id,
            events = summary.events,
            inputs = summary.inputs,
            "Upload batch stored"
        );
        Ok(summary)
    }

    /// All event rows of a session in insertion order.
    pub async fn list_events(&self, session_id: i64) -> DbResult<Vec<EventLogRow>> {
        let rows: Vec<EventLogRow> = sqlx::query_as(
            r#"
            SELECT session_id, participant_id, date_time, time_stamp_ms, trial_row_id,
                   event_type, event_value, cue_pos_x, cue_pos_y, cue_vy, cue_target_offset
            FROM event_log
            WHERE session_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// All input rows of a session in insertion order.
    pub async fn list_inputs(&self, session_id: i64) -> DbResult<Vec<InputLogRow>> {
        let rows: Vec<InputLogRow> = sqlx::query_as(
            r#"
            SELECT session_id, participant_id, date_time, time_stamp_ms, event_type, event_value
            FROM input_log
            WHERE session_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
