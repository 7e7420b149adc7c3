//! Enroll server entry point.
//!
//! Loads configuration, seeds the roster store from the activity catalog,
//! and serves the HTTP API until `Ctrl-C`.

use std::sync::Arc;

use anyhow::Context;
use enroll_server::{AppConfig, AppState, start_server};
use enroll_store::RosterStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the catalog cannot seed
/// the store, or the server fails to bind.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("enroll-server starting");

    let AppConfig {
        server,
        service,
        activities,
    } = AppConfig::load().context("failed to load configuration")?;
    info!(
        host = server.host,
        port = server.port,
        activities = activities.len(),
        require_email_shape = service.require_email_shape,
        "configuration loaded"
    );

    let store = RosterStore::new(activities).context("invalid activity catalog")?;
    info!(
        activities = store.len(),
        enrolled = store.snapshot().total_enrolled(),
        "roster store seeded"
    );

    let state = Arc::new(AppState::new(Arc::new(store), &service));

    start_server(&server, state)
        .await
        .context("enroll server failed")?;

    Ok(())
}
