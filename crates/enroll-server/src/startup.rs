//! Background startup helper for embedding the server in another binary.
//!
//! [`spawn_server`] binds eagerly, so an unusable address is reported to
//! the caller instead of being logged from a background task, then serves
//! on a spawned Tokio task.
//!
//! # Usage
//!
//! ```rust,ignore
//! use enroll_server::startup::spawn_server;
//!
//! let handle = spawn_server(&config.server, state).await?;
//! tracing::info!(addr = %handle.local_addr, "API ready");
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A server running on a background task.
#[derive(Debug)]
pub struct ServerHandle {
    /// The address actually bound (resolves port `0`).
    pub local_addr: SocketAddr,
    /// The serving task. Abort it to stop the server.
    pub task: JoinHandle<()>,
}

/// Bind the configured address and serve on a background Tokio task.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the listener cannot bind.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<ServerHandle, StartupError> {
    let listener = server::bind(config).await?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    let task = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!(error = %e, "Enroll server exited with error");
        }
    });

    tracing::info!(%local_addr, "Enroll server spawned on background task");

    Ok(ServerHandle { local_addr, task })
}
