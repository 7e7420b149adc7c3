//! Activity definitions, committed rosters, and point-in-time snapshots.
//!
//! An [`ActivitySpec`] is the seed definition read from configuration. The
//! store turns each spec into an [`ActivityRoster`], its committed state
//! for one activity, and publishes all rosters together. Readers receive
//! a [`RosterSnapshot`]: a shared, immutable view of one committed state.

use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use ts_rs::TS;

use crate::ids::ParticipantId;

/// Seed definition of an activity, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySpec {
    /// Unique human-readable name; the activity's key.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Free-text meeting schedule.
    #[serde(default)]
    pub schedule: String,
    /// Maximum number of participants. Must be positive.
    pub max_participants: usize,
    /// Participants enrolled at startup, in display order.
    #[serde(default)]
    pub participants: Vec<ParticipantId>,
}

impl ActivitySpec {
    /// Create a spec with no description, schedule, or seed participants.
    pub fn new(name: impl Into<String>, max_participants: usize) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            schedule: String::new(),
            max_participants,
            participants: Vec::new(),
        }
    }
}

/// Enrollment count paired with capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Occupancy {
    /// Participants currently enrolled.
    pub enrolled: usize,
    /// Maximum participants allowed.
    pub capacity: usize,
}

/// Committed state of a single activity.
///
/// Values of this type are never mutated in place once published. The
/// store derives a new roster with [`with_participant`] or
/// [`without_participant`] and swaps it in; those builders do not check
/// capacity or membership, the store does.
///
/// [`with_participant`]: ActivityRoster::with_participant
/// [`without_participant`]: ActivityRoster::without_participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRoster {
    /// Unique activity name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Free-text meeting schedule.
    pub schedule: String,
    /// Maximum number of participants.
    pub capacity: usize,
    /// Enrolled participants in insertion order.
    pub participants: Vec<ParticipantId>,
}

impl ActivityRoster {
    /// Number of enrolled participants.
    pub fn enrolled(&self) -> usize {
        self.participants.len()
    }

    /// Free slots left before the activity is full.
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.enrolled())
    }

    /// Whether no further participant can be admitted.
    pub fn is_full(&self) -> bool {
        self.enrolled() >= self.capacity
    }

    /// Whether `participant` is enrolled (byte-exact comparison).
    pub fn contains(&self, participant: &str) -> bool {
        self.participants.iter().any(|p| p.as_str() == participant)
    }

    /// Current enrollment against capacity.
    pub fn occupancy(&self) -> Occupancy {
        Occupancy {
            enrolled: self.enrolled(),
            capacity: self.capacity,
        }
    }

    /// Copy of this roster with `participant` appended.
    #[must_use]
    pub fn with_participant(&self, participant: ParticipantId) -> Self {
        let mut next = self.clone();
        next.participants.push(participant);
        next
    }

    /// Copy of this roster without `participant`; the order of the
    /// remaining members is preserved.
    #[must_use]
    pub fn without_participant(&self, participant: &str) -> Self {
        let mut next = self.clone();
        next.participants.retain(|p| p.as_str() != participant);
        next
    }
}

impl From<ActivitySpec> for ActivityRoster {
    fn from(spec: ActivitySpec) -> Self {
        Self {
            name: spec.name,
            description: spec.description,
            schedule: spec.schedule,
            capacity: spec.max_participants,
            participants: spec.participants,
        }
    }
}

/// Immutable point-in-time view of every activity roster.
///
/// Cloning is cheap: all clones share the same committed state. Serializes
/// as a JSON object keyed by activity name, in declaration order:
///
/// ```json
/// { "Chess Club": { "description": "...", "schedule": "...",
///                   "max_participants": 12, "participants": ["a@x.com"] } }
/// ```
#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    activities: Arc<Vec<Arc<ActivityRoster>>>,
}

impl RosterSnapshot {
    /// Wrap a committed roster state.
    pub const fn new(activities: Arc<Vec<Arc<ActivityRoster>>>) -> Self {
        Self { activities }
    }

    /// Iterate over all activities in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ActivityRoster> {
        self.activities.iter().map(|roster| &**roster)
    }

    /// Look up one activity by exact name.
    pub fn get(&self, name: &str) -> Option<&ActivityRoster> {
        self.iter().find(|roster| roster.name == name)
    }

    /// Number of activities.
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// Whether the snapshot holds no activities.
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Sum of enrollments across all activities.
    pub fn total_enrolled(&self) -> usize {
        self.iter().map(ActivityRoster::enrolled).sum()
    }
}

/// Borrowed wire shape of one activity inside a serialized snapshot.
#[derive(Serialize)]
struct ActivityView<'a> {
    description: &'a str,
    schedule: &'a str,
    max_participants: usize,
    participants: &'a [ParticipantId],
}

impl Serialize for RosterSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for roster in self.iter() {
            map.serialize_entry(
                &roster.name,
                &ActivityView {
                    description: &roster.description,
                    schedule: &roster.schedule,
                    max_participants: roster.capacity,
                    participants: &roster.participants,
                },
            )?;
        }
        map.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn chess_club() -> ActivityRoster {
        ActivityRoster {
            name: String::from("Chess Club"),
            description: String::from("Learn strategies and compete in chess tournaments"),
            schedule: String::from("Fridays, 3:30 PM - 5:00 PM"),
            capacity: 2,
            participants: vec![ParticipantId::from("a@x.com")],
        }
    }

    #[test]
    fn occupancy_tracks_members() {
        let roster = chess_club();
        assert_eq!(roster.enrolled(), 1);
        assert_eq!(roster.remaining(), 1);
        assert!(!roster.is_full());

        let full = roster.with_participant(ParticipantId::from("b@x.com"));
        assert!(full.is_full());
        assert_eq!(full.remaining(), 0);
        assert_eq!(
            full.occupancy(),
            Occupancy {
                enrolled: 2,
                capacity: 2
            }
        );
    }

    #[test]
    fn builders_leave_the_original_untouched() {
        let roster = chess_club();
        let grown = roster.with_participant(ParticipantId::from("b@x.com"));
        let shrunk = grown.without_participant("a@x.com");

        assert_eq!(roster.participants, vec![ParticipantId::from("a@x.com")]);
        assert_eq!(grown.enrolled(), 2);
        assert_eq!(shrunk.participants, vec![ParticipantId::from("b@x.com")]);
    }

    #[test]
    fn contains_is_case_sensitive() {
        let roster = chess_club();
        assert!(roster.contains("a@x.com"));
        assert!(!roster.contains("A@x.com"));
    }

    #[test]
    fn spec_deserializes_with_defaults() {
        let spec: ActivitySpec =
            serde_json::from_str(r#"{"name": "Art Club", "max_participants": 15}"#).unwrap();
        assert_eq!(spec, ActivitySpec::new("Art Club", 15));

        let roster = ActivityRoster::from(spec);
        assert_eq!(roster.capacity, 15);
        assert!(roster.participants.is_empty());
    }

    #[test]
    fn snapshot_serializes_keyed_by_name_in_order() {
        let mut second = chess_club();
        second.name = String::from("Art Club");
        let snapshot =
            RosterSnapshot::new(Arc::new(vec![Arc::new(chess_club()), Arc::new(second)]));

        let json = serde_json::to_string(&snapshot).unwrap();
        let chess_at = json.find("Chess Club").unwrap();
        let art_at = json.find("Art Club").unwrap();
        assert!(chess_at < art_at);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["Chess Club"]["max_participants"], 2);
        assert_eq!(value["Chess Club"]["participants"][0], "a@x.com");
        assert_eq!(
            value["Chess Club"]["schedule"],
            "Fridays, 3:30 PM - 5:00 PM"
        );
    }

    #[test]
    fn snapshot_lookup_and_totals() {
        let snapshot = RosterSnapshot::new(Arc::new(vec![Arc::new(chess_club())]));
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.total_enrolled(), 1);
        assert!(snapshot.get("Chess Club").is_some());
        assert!(snapshot.get("chess club").is_none());
    }
}
