//! Error types for the `enroll-store` crate.
//!
//! [`StoreError`] is the outcome of a rejected mutation: every variant is a
//! durable fact about roster state, not a transient fault, so none of them
//! is worth retrying. [`SeedError`] rejects an initial catalog that would
//! start the store in violation of its invariants.

use enroll_types::ParticipantId;

/// A register or unregister request that the store refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No activity has the given name.
    #[error("activity not found: {activity}")]
    ActivityNotFound {
        /// The requested activity name.
        activity: String,
    },

    /// The participant is already enrolled in the activity.
    #[error("{participant} is already registered for {activity}")]
    AlreadyRegistered {
        /// The activity.
        activity: String,
        /// The participant.
        participant: ParticipantId,
    },

    /// The activity has no free slot.
    #[error("{activity} is at capacity ({capacity})")]
    CapacityExceeded {
        /// The full activity.
        activity: String,
        /// Its maximum capacity.
        capacity: usize,
    },

    /// The participant is not enrolled in the activity.
    #[error("{participant} is not registered for {activity}")]
    NotRegistered {
        /// The activity.
        activity: String,
        /// The participant.
        participant: ParticipantId,
    },
}

/// An initial activity catalog that cannot seed a store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    /// An activity has an empty (or all-whitespace) name.
    #[error("activity name must not be empty")]
    EmptyName,

    /// Two activities share a name.
    #[error("duplicate activity: {0}")]
    DuplicateActivity(String),

    /// An activity was declared with zero capacity.
    #[error("activity {0} must have a positive capacity")]
    ZeroCapacity(String),

    /// A seed participant is blank or carries surrounding whitespace.
    ///
    /// Requests are trimmed before they reach the store, so such an entry
    /// could never be withdrawn.
    #[error("seed participant \"{participant}\" for {activity} is blank or untrimmed")]
    MalformedParticipant {
        /// The activity.
        activity: String,
        /// The rejected identifier, as written.
        participant: ParticipantId,
    },

    /// A seed participant is listed twice for one activity.
    #[error("{participant} is listed twice for {activity}")]
    DuplicateParticipant {
        /// The activity.
        activity: String,
        /// The repeated participant.
        participant: ParticipantId,
    },

    /// More seed participants than the activity can hold.
    #[error("{activity} seeds {seeded} participants but holds {capacity}")]
    OverCapacity {
        /// The activity.
        activity: String,
        /// Its maximum capacity.
        capacity: usize,
        /// Number of seed participants.
        seeded: usize,
    },
}
