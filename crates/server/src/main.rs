// crates/server/src/main.rs
//! webdasher server binary.
//!
//! Opens the datastore, installs logging and serves the experiment endpoints
//! until interrupted.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use webdasher_db::Database;
use webdasher_server::{create_app_full, logging, Config};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // Held for the life of the process so the error log is flushed on exit.
    let _log_guard = logging::init(&config.error_log)?;

    let db_path = config.resolve_db_path()?;
    let db = Database::new(&db_path).await?;

    let app = create_app_full(db, config.max_body_bytes);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        db = %db_path.display(),
        error_log = %config.error_log.display(),
        "webdasher v{} listening",
        env!("CARGO_PKG_VERSION")
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
