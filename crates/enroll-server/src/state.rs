//! Shared application state for the Enroll API server.
//!
//! [`AppState`] wraps the [`RegistrationService`], which owns the roster
//! store handle and the roster event channel. Handlers receive it as
//! `State<Arc<AppState>>`.

use std::sync::Arc;

use enroll_store::RosterStore;
use enroll_types::RosterEvent;
use tokio::sync::broadcast;

use crate::config::ServiceConfig;
use crate::service::RegistrationService;

/// Shared state handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The request-facing registration layer.
    pub service: RegistrationService,
}

impl AppState {
    /// Build state over an already seeded store.
    pub fn new(store: Arc<RosterStore>, config: &ServiceConfig) -> Self {
        Self {
            service: RegistrationService::new(store, config),
        }
    }

    /// Subscribe to roster events.
    ///
    /// A subscriber that falls more than `event_buffer` events behind
    /// receives [`broadcast::error::RecvError::Lagged`] and skips ahead.
    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.service.subscribe()
    }
}
