// crates/db/src/queries/sessions.rs
//! Session store: create, look up and finish experiment sessions.
//!
//! A session is `Open` until `finish_session` stamps `finish_time` and
//! `finish_tag` together; after that both are immutable.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqliteConnection};
use tracing::{info, warn};
use uuid::Uuid;
use webdasher_core::NewSession;

use crate::{Database, DbError, DbResult};

/// How long after finishing a session still accepts uploads. Covers the last
/// batch racing the finish call from the browser.
pub const FINISH_GRACE_SECS: i64 = 60;

/// A stored session row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: i64,
    pub scenario: i64,
    pub scenario_name: String,
    pub participant_id: String,
    pub start_time: i64,
    pub finish_time: Option<i64>,
    pub finish_tag: Option<String>,
    pub browser_info: Option<String>,
    pub machine_info: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for Session {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            scenario: row.try_get("scenario")?,
            scenario_name: row.try_get("scenario_name")?,
            participant_id: row.try_get("participant_id")?,
            start_time: row.try_get("start_time")?,
            finish_time: row.try_get("finish_time")?,
            finish_tag: row.try_get("finish_tag")?,
            browser_info: row.try_get("browser_info")?,
            machine_info: row.try_get("machine_info")?,
        })
    }
}

/// Lifecycle state of a session as seen by the finish and upload paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub id: i64,
    pub finish_tag: Option<String>,
    /// `None` while the session is open.
    pub seconds_since_finish: Option<i64>,
}

impl SessionStatus {
    pub fn is_finished(&self) -> bool {
        self.finish_tag.is_some()
    }

    /// Open sessions, and sessions finished at most [`FINISH_GRACE_SECS`] ago.
    pub fn accepts_uploads(&self) -> bool {
        match self.seconds_since_finish {
            None => true,
            Some(dt) => dt <= FINISH_GRACE_SECS,
        }
    }
}

/// Load the lifecycle state of `id` on an existing connection or transaction.
pub(crate) async fn fetch_status(
    conn: &mut SqliteConnection,
    id: i64,
    now: DateTime<Utc>,
) -> DbResult<SessionStatus> {
    let row: Option<(i64, Option<String>, Option<i64>)> =
        sqlx::query_as("SELECT id, finish_tag, finish_time FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    let (id, finish_tag, finish_time) = row.ok_or(DbError::SessionNotFound(id))?;
    Ok(SessionStatus {
        id,
        finish_tag,
        seconds_since_finish: finish_time.map(|t| now.timestamp() - t),
    })
}

/// Completion code handed to the participant: the session id plus a random suffix.
fn finish_tag_for(id: i64) -> String {
    format!("{id}-{}", Uuid::new_v4().simple())
}

impl Database {
    /// Insert a new open session and return its generated id.
    pub async fn create_session(&self, session: &NewSession) -> DbResult<i64> {
        self.create_session_at(session, Utc::now()).await
    }

    /// [`Database::create_session`] with an explicit start time.
    pub async fn create_session_at(
        &self,
        session: &NewSession,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let mut tx = self.pool().begin_with("BEGIN IMMEDIATE").await?;
        let result = sqlx::query(
            r#"
            INSERT INTO sessions
                (scenario, scenario_name, participant_id, start_time, browser_info, machine_info)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(session.scenario)
        .bind(&session.scenario_name)
        .bind(&session.participant_id)
        .bind(now.timestamp())
        .bind(&session.browser_info)
        .bind(&session.machine_info)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let id = result.last_insert_rowid();
        info!(
            session_id = id,
            participant_id = %session.participant_id,
            scenario = session.scenario,
            "Session created"
        );
        Ok(id)
    }

    /// Fetch the lifecycle state of a session.
    pub async fn lookup_session(&self, id: i64) -> DbResult<SessionStatus> {
        self.lookup_session_at(id, Utc::now()).await
    }

    /// [`Database::lookup_session`] measured against an explicit clock.
    pub async fn lookup_session_at(&self, id: i64, now: DateTime<Utc>) -> DbResult<SessionStatus> {
        let mut conn = self.pool().acquire().await?;
        fetch_status(&mut conn, id, now).await
    }

    /// Fetch the full session row.
    pub async fn get_session(&self, id: i64) -> DbResult<Session> {
        let session: Option<Session> = sqlx::query_as(
            r#"
            SELECT id, scenario, scenario_name, participant_id, start_time,
                   finish_time, finish_tag, browser_info, machine_info
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        session.ok_or(DbError::SessionNotFound(id))
    }

    /// Mark a session finished and return its completion code.
    ///
    /// Fails with [`DbError::AlreadyFinished`] if a code was issued before; the
    /// original code is left untouched.
    pub async fn finish_session(&self, id: i64) -> DbResult<String> {
        self.finish_session_at(id, Utc::now()).await
    }

    /// [`Database::finish_session`] with an explicit finish time.
    pub async fn finish_session_at(&self, id: i64, now: DateTime<Utc>) -> DbResult<String> {
        // Concurrent finishers queue on the write lock, so the loser reads the
        // winner's tag.
        let mut tx = self.pool().begin_with("BEGIN IMMEDIATE").await?;

        let status = fetch_status(&mut tx, id, now).await?;
        if status.is_finished() {
            warn!(session_id = id, "Session already finished");
            return Err(DbError::AlreadyFinished(id));
        }

        let tag = finish_tag_for(id);
        let result = sqlx::query(
            r#"
            UPDATE sessions SET finish_time = ?1, finish_tag = ?2
            WHERE id = ?3 AND finish_tag IS NULL
            "#,
        )
        .bind(now.timestamp())
        .bind(&tag)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Another request finished it between our read and write.
        if result.rows_affected() == 0 {
            warn!(session_id = id, "Session finished concurrently");
            return Err(DbError::AlreadyFinished(id));
        }

        tx.commit().await?;
        info!(session_id = id, finish_tag = %tag, "Session finished");
        Ok(tag)
    }
}
