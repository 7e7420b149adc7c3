//! Roster change notifications.
//!
//! One [`RosterEvent`] is emitted per successful register or unregister.
//! Clients that hold a roster view can apply events instead of refetching
//! the whole roster after every change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ParticipantId;
use crate::roster::Occupancy;

/// Which mutation produced a [`RosterEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RosterEventKind {
    /// A participant joined the activity.
    Registered,
    /// A participant left the activity.
    Unregistered,
}

/// A committed change to one activity's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RosterEvent {
    /// The mutation that was applied.
    pub kind: RosterEventKind,
    /// Name of the affected activity.
    pub activity: String,
    /// The participant who joined or left.
    pub participant: ParticipantId,
    /// Participants enrolled right after the change.
    pub enrolled: usize,
    /// Capacity of the activity.
    pub capacity: usize,
    /// Wall-clock time the change was observed by the service.
    pub at: DateTime<Utc>,
}

impl RosterEvent {
    /// Build an event stamped with the current time.
    pub fn now(
        kind: RosterEventKind,
        activity: impl Into<String>,
        participant: ParticipantId,
        occupancy: Occupancy,
    ) -> Self {
        Self {
            kind,
            activity: activity.into(),
            participant,
            enrolled: occupancy.enrolled,
            capacity: occupancy.capacity,
            at: Utc::now(),
        }
    }
}
