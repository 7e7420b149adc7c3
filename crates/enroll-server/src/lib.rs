//! Registration service and HTTP API for the Enroll roster store.
//!
//! This crate provides:
//!
//! - **[`RegistrationService`]**, which validates requests, makes one
//!   [`RosterStore`](enroll_store::RosterStore) call per request, and maps
//!   the outcome to a [`ResponseEnvelope`]
//! - **REST endpoints** for listing rosters and for signing up and
//!   withdrawing participants
//! - **`WebSocket` endpoint** (`/ws/rosters`) that streams a roster
//!   snapshot followed by every change, via [`tokio::sync::broadcast`]
//! - **Configuration** loaded from YAML with environment overrides
//!
//! # Architecture
//!
//! Handlers never touch the store directly. Rosters are read from the
//! store's published snapshot, so listing never waits on a writer.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod service;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use config::{AppConfig, ConfigError, ServiceConfig};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use service::{ErrorKind, RegistrationService, ResponseEnvelope, ServiceError, StatusClass};
pub use state::AppState;
