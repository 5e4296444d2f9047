// crates/server/src/config.rs
//! Process configuration: command-line flags with environment fallbacks.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use webdasher_core::paths;
use webdasher_db::{default_db_path, DbResult};

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 47900;

/// Default request body limit. Upload batches from long trials run to a few MB.
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "webdasher",
    version,
    about = "Session and event collection backend for browser experiments"
)]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "WEBDASHER_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "WEBDASHER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file. Defaults to `<cache dir>/webdasher/webdasher.db`.
    #[arg(long = "db", env = "WEBDASHER_DB")]
    pub db_path: Option<PathBuf>,

    /// File that receives every warning and error.
    #[arg(long, env = "WEBDASHER_ERROR_LOG", default_value_os_t = paths::default_error_log())]
    pub error_log: PathBuf,

    /// Maximum accepted request body, in bytes.
    #[arg(long, env = "WEBDASHER_MAX_BODY_BYTES", default_value_t = DEFAULT_BODY_LIMIT)]
    pub max_body_bytes: usize,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The configured database path, or the default location.
    pub fn resolve_db_path(&self) -> DbResult<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }
}
