// crates/server/src/logging.rs
//! Tracing setup: compact console output plus a plain-text error log file.

use std::io;
use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Console filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn,webdasher=info,webdasher_server=info,webdasher_db=info";

/// Build the subscriber without installing it.
///
/// Console output follows `console_filter`; WARN and above additionally go to
/// `error_log`, appended. Keep the returned guard alive or buffered lines are
/// lost.
pub fn build_subscriber(
    console_filter: EnvFilter,
    error_log: &Path,
) -> io::Result<(impl Subscriber + Send + Sync + 'static, WorkerGuard)> {
    let dir = match error_log.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = error_log.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("error log path has no file name: {}", error_log.display()),
        )
    })?;
    std::fs::create_dir_all(dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, file_name,
    ));

    let subscriber = tracing_subscriber::registry()
        .with(fmt::layer().compact().with_filter(console_filter))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(LevelFilter::WARN),
        );
    Ok((subscriber, guard))
}

/// Install the global subscriber for the server process.
pub fn init(error_log: &Path) -> anyhow::Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let (subscriber, guard) = build_subscriber(filter, error_log)?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}
