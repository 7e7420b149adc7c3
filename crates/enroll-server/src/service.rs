//! The registration service: request validation and outcome mapping.
//!
//! [`RegistrationService`] sits between the transport and the
//! [`RosterStore`]. It rejects malformed input before the store is touched,
//! makes exactly one store call per request, and maps the outcome onto the
//! fixed [`ResponseEnvelope`] contract. It enforces no business rule of
//! its own; capacity and uniqueness live in the store.
//!
//! | Outcome | [`ErrorKind`] | [`StatusClass`] |
//! |---------|---------------|-----------------|
//! | registered / unregistered | -- | `Success` |
//! | unknown activity | `ActivityNotFound` | `NotFound` |
//! | withdrawal of a non-member | `NotRegistered` | `NotFound` |
//! | duplicate enrollment | `AlreadyRegistered` | `ClientError` |
//! | activity full | `CapacityExceeded` | `ClientError` |
//! | blank or malformed input | `InvalidInput` | `ClientError` |

use std::sync::Arc;

use enroll_store::{RosterStore, StoreError};
use enroll_types::{Occupancy, ParticipantId, RosterEvent, RosterEventKind, RosterSnapshot};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, trace};
use validator::ValidateEmail;

use crate::config::ServiceConfig;

/// Transport-independent class of an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The request was applied.
    Success,
    /// The named activity or enrollment does not exist.
    NotFound,
    /// The request conflicts with current state or is malformed.
    ClientError,
}

/// Client-facing error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No activity has the requested name.
    ActivityNotFound,
    /// The participant is already enrolled.
    AlreadyRegistered,
    /// The activity is full.
    CapacityExceeded,
    /// The participant is not enrolled.
    NotRegistered,
    /// The request was rejected before reaching the store.
    InvalidInput,
}

impl ErrorKind {
    /// The status class a transport binding must preserve.
    pub const fn class(self) -> StatusClass {
        match self {
            Self::ActivityNotFound | Self::NotRegistered => StatusClass::NotFound,
            Self::AlreadyRegistered | Self::CapacityExceeded | Self::InvalidInput => {
                StatusClass::ClientError
            }
        }
    }
}

/// A request the service could not carry out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Blank activity name or blank/malformed participant identifier.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The store rejected the mutation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// The client-facing kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Store(StoreError::ActivityNotFound { .. }) => ErrorKind::ActivityNotFound,
            Self::Store(StoreError::AlreadyRegistered { .. }) => ErrorKind::AlreadyRegistered,
            Self::Store(StoreError::CapacityExceeded { .. }) => ErrorKind::CapacityExceeded,
            Self::Store(StoreError::NotRegistered { .. }) => ErrorKind::NotRegistered,
        }
    }

    /// The message shown to clients.
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidInput(reason) => reason.clone(),
            Self::Store(StoreError::ActivityNotFound { .. }) => String::from("Activity not found"),
            Self::Store(StoreError::AlreadyRegistered { .. }) => {
                String::from("Student is already signed up for this activity")
            }
            Self::Store(StoreError::CapacityExceeded { .. }) => String::from("Activity is full"),
            Self::Store(StoreError::NotRegistered { .. }) => {
                String::from("Student is not signed up for this activity")
            }
        }
    }
}

/// The fixed response contract of every register/unregister request.
///
/// Serializes as `{"message": ...}` on success and
/// `{"error_kind": ..., "message": ...}` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    /// The mutation was applied.
    Success {
        /// Human-readable confirmation naming participant and activity.
        message: String,
    },
    /// The request was rejected.
    Failure {
        /// Which rule rejected it.
        error_kind: ErrorKind,
        /// Human-readable explanation.
        message: String,
    },
}

impl ResponseEnvelope {
    /// The status class of this outcome.
    pub const fn status_class(&self) -> StatusClass {
        match self {
            Self::Success { .. } => StatusClass::Success,
            Self::Failure { error_kind, .. } => error_kind.class(),
        }
    }

    /// Whether the request was applied.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The error kind, if the request was rejected.
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error_kind, .. } => Some(*error_kind),
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message } | Self::Failure { message, .. } => message,
        }
    }
}

impl From<Result<String, ServiceError>> for ResponseEnvelope {
    fn from(result: Result<String, ServiceError>) -> Self {
        match result {
            Ok(message) => Self::Success { message },
            Err(e) => Self::Failure {
                error_kind: e.kind(),
                message: e.client_message(),
            },
        }
    }
}

/// Request-facing layer over the roster store.
///
/// Holds call access to the store and the sender side of the roster event
/// channel. Cloning is cheap and every clone publishes to the same
/// subscribers.
#[derive(Debug, Clone)]
pub struct RegistrationService {
    store: Arc<RosterStore>,
    events: broadcast::Sender<RosterEvent>,
    require_email_shape: bool,
}

impl RegistrationService {
    /// Create a service over `store`.
    pub fn new(store: Arc<RosterStore>, config: &ServiceConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            store,
            events,
            require_email_shape: config.require_email_shape,
        }
    }

    /// Subscribe to roster events published after each successful mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.events.subscribe()
    }

    /// Current rosters of every activity.
    pub fn handle_list(&self) -> RosterSnapshot {
        self.store.snapshot()
    }

    /// Enroll a participant; see [`register`](Self::register).
    pub fn handle_register(&self, activity: &str, raw_participant: &str) -> ResponseEnvelope {
        self.register(activity, raw_participant).into()
    }

    /// Withdraw a participant; see [`unregister`](Self::unregister).
    pub fn handle_unregister(&self, activity: &str, raw_participant: &str) -> ResponseEnvelope {
        self.unregister(activity, raw_participant).into()
    }

    /// Validate and enroll, returning the confirmation message.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidInput`] before any store call, otherwise the
    /// store's rejection.
    pub fn register(&self, activity: &str, raw_participant: &str) -> Result<String, ServiceError> {
        let participant = self.validate(activity, raw_participant)?;
        let occupancy = self
            .store
            .register(activity, &participant)
            .inspect_err(|e| debug!(error = %e, "Registration rejected"))?;

        let message = format!("Signed up {participant} for {activity}");
        self.publish(RosterEventKind::Registered, activity, participant, occupancy);
        Ok(message)
    }

    /// Validate and withdraw, returning the confirmation message.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidInput`] before any store call, otherwise the
    /// store's rejection.
    pub fn unregister(
        &self,
        activity: &str,
        raw_participant: &str,
    ) -> Result<String, ServiceError> {
        let participant = self.validate(activity, raw_participant)?;
        let occupancy = self
            .store
            .unregister(activity, &participant)
            .inspect_err(|e| debug!(error = %e, "Withdrawal rejected"))?;

        let message = format!("Unregistered {participant} from {activity}");
        self.publish(RosterEventKind::Unregistered, activity, participant, occupancy);
        Ok(message)
    }

    fn validate(&self, activity: &str, raw_participant: &str) -> Result<ParticipantId, ServiceError> {
        if activity.trim().is_empty() {
            debug!("Rejected request with blank activity name");
            return Err(ServiceError::InvalidInput(String::from(
                "Activity name must not be empty",
            )));
        }

        let participant = raw_participant.trim().to_owned();
        if participant.is_empty() {
            debug!(activity, "Rejected request with blank email");
            return Err(ServiceError::InvalidInput(String::from(
                "Email must not be empty",
            )));
        }
        if self.require_email_shape && !participant.validate_email() {
            debug!(activity, participant, "Rejected malformed email");
            return Err(ServiceError::InvalidInput(format!(
                "{participant} is not a valid email address"
            )));
        }

        Ok(ParticipantId::from(participant))
    }

    fn publish(
        &self,
        kind: RosterEventKind,
        activity: &str,
        participant: ParticipantId,
        occupancy: Occupancy,
    ) {
        let event = RosterEvent::now(kind, activity, participant, occupancy);
        // send fails only when nobody is subscribed.
        let receivers = self.events.send(event).unwrap_or(0);
        trace!(receivers, "Roster event published");
    }
}
