/// Inline SQL migrations for the webdasher schema.
///
/// Applied in order and tracked by index in `_migrations`, so entries must only
/// ever be appended.
pub const MIGRATIONS: &[&str] = &[
    // sessions
    r#"
CREATE TABLE IF NOT EXISTS sessions (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    scenario       INTEGER NOT NULL,
    scenario_name  TEXT NOT NULL,
    participant_id TEXT NOT NULL,
    start_time     INTEGER NOT NULL,
    finish_time    INTEGER,
    finish_tag     TEXT UNIQUE,
    browser_info   TEXT,
    machine_info   TEXT,
    CHECK ((finish_time IS NULL) = (finish_tag IS NULL))
);
"#,
    // event log (cue-tracking samples and UI events)
    r#"
CREATE TABLE IF NOT EXISTS event_log (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id        INTEGER NOT NULL REFERENCES sessions(id),
    participant_id    TEXT NOT NULL,
    date_time         TEXT NOT NULL,
    time_stamp_ms     REAL NOT NULL,
    trial_row_id      INTEGER NOT NULL,
    event_type        TEXT NOT NULL,
    event_value       TEXT,
    cue_pos_x         REAL NOT NULL DEFAULT -1,
    cue_pos_y         REAL NOT NULL DEFAULT -1,
    cue_vy            REAL NOT NULL DEFAULT -1,
    cue_target_offset REAL NOT NULL DEFAULT -1
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_event_log_session ON event_log(session_id);"#,
    // input log (raw keyboard/mouse samples)
    r#"
CREATE TABLE IF NOT EXISTS input_log (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id     INTEGER NOT NULL REFERENCES sessions(id),
    participant_id TEXT NOT NULL,
    date_time      TEXT NOT NULL,
    time_stamp_ms  REAL NOT NULL,
    event_type     TEXT NOT NULL,
    event_value    TEXT
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_input_log_session ON input_log(session_id);"#,
    // a finished session's finish fields are write-once
    r#"
CREATE TRIGGER IF NOT EXISTS trg_sessions_finish_once
BEFORE UPDATE OF finish_time, finish_tag ON sessions
WHEN OLD.finish_tag IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'session already finished');
END;
"#,
];
