//! Default storage locations.
//!
//! Single source of truth for where the server keeps its database and error log
//! when nothing is configured explicitly.

use std::path::PathBuf;

/// App cache root: `~/Library/Caches/webdasher/` (macOS) or `~/.cache/webdasher/` (Linux).
pub fn app_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("webdasher"))
}

/// SQLite database file: `<app_cache_dir>/webdasher.db`.
pub fn db_path() -> Option<PathBuf> {
    app_cache_dir().map(|d| d.join("webdasher.db"))
}

/// Error log sink shared by every endpoint.
pub fn default_error_log() -> PathBuf {
    PathBuf::from("/var/tmp/webdasher_errors.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_cache_dir() {
        let dir = app_cache_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().to_string_lossy().contains("webdasher"));
    }

    #[test]
    fn test_db_path() {
        let path = db_path().unwrap();
        assert!(path.to_string_lossy().ends_with("webdasher.db"));
    }

    #[test]
    fn test_default_error_log() {
        assert!(default_error_log().ends_with("webdasher_errors.log"));
    }
}
