// crates/db/src/queries/mod.rs
// Session lifecycle and upload ingestion for the webdasher SQLite database.

pub mod ingest;
pub mod sessions;
