//! The authoritative roster store.
//!
//! # Concurrency
//!
//! Committed state is a vector of per-activity rosters published through an
//! [`ArcSwap`]. Readers load the current pointer and never wait on writers.
//! Each activity has its own write lock; a writer holds it for the whole
//! check-and-mutate, so two mutations of the same activity never overlap.
//! Writers of different activities run in parallel and publish with
//! compare-and-swap. A failed swap only means another activity committed
//! first; the writer rebuilds from the newer state. Its own roster cannot
//! have changed in between because the activity lock is still held.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use enroll_types::{ActivityRoster, ActivitySpec, Occupancy, ParticipantId, RosterSnapshot};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{SeedError, StoreError};

/// Rosters in declaration order; the index of an activity is its slot.
type Committed = Vec<Arc<ActivityRoster>>;

/// Sole owner of activity and participant state.
///
/// The set of activities is fixed at construction. Participants are
/// added and removed only through [`register`](Self::register) and
/// [`unregister`](Self::unregister); every observable state satisfies
/// `enrolled <= capacity` and holds each participant at most once per
/// activity.
#[derive(Debug)]
pub struct RosterStore {
    /// Activity name to slot index.
    slots: HashMap<String, usize>,
    /// One write lock per slot.
    write_locks: Vec<Mutex<()>>,
    /// Currently published rosters.
    committed: ArcSwap<Committed>,
}

impl RosterStore {
    /// Build a store from an activity catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`SeedError`] if a name is empty or repeated, a capacity is
    /// zero, a seed participant is blank or untrimmed, or seed participants
    /// repeat or exceed capacity.
    pub fn new<I>(catalog: I) -> Result<Self, SeedError>
    where
        I: IntoIterator<Item = ActivitySpec>,
    {
        let mut slots = HashMap::new();
        let mut rosters: Committed = Vec::new();

        for spec in catalog {
            validate_spec(&spec)?;
            if slots.contains_key(&spec.name) {
                return Err(SeedError::DuplicateActivity(spec.name));
            }
            slots.insert(spec.name.clone(), rosters.len());
            rosters.push(Arc::new(ActivityRoster::from(spec)));
        }

        let write_locks = rosters.iter().map(|_| Mutex::new(())).collect();

        debug!(activities = rosters.len(), "Roster store seeded");

        Ok(Self {
            slots,
            write_locks,
            committed: ArcSwap::from_pointee(rosters),
        })
    }

    /// Enroll `participant` in `activity`.
    ///
    /// Existence, membership, and capacity are checked against the same
    /// state the enrollment is applied to, in that order: an enrolled
    /// participant of a full activity gets [`StoreError::AlreadyRegistered`].
    ///
    /// # Errors
    ///
    /// [`StoreError::ActivityNotFound`], [`StoreError::AlreadyRegistered`],
    /// or [`StoreError::CapacityExceeded`].
    pub fn register(
        &self,
        activity: &str,
        participant: &ParticipantId,
    ) -> Result<Occupancy, StoreError> {
        let occupancy = self.commit(activity, |roster| {
            if roster.contains(participant.as_str()) {
                return Err(StoreError::AlreadyRegistered {
                    activity: roster.name.clone(),
                    participant: participant.clone(),
                });
            }
            if roster.is_full() {
                return Err(StoreError::CapacityExceeded {
                    activity: roster.name.clone(),
                    capacity: roster.capacity,
                });
            }
            Ok(roster.with_participant(participant.clone()))
        })?;

        debug!(
            activity,
            participant = %participant,
            enrolled = occupancy.enrolled,
            capacity = occupancy.capacity,
            "Participant registered"
        );

        Ok(occupancy)
    }

    /// Withdraw `participant` from `activity`.
    ///
    /// Removing an already-removed participant is reported, not ignored.
    ///
    /// # Errors
    ///
    /// [`StoreError::ActivityNotFound`] or [`StoreError::NotRegistered`].
    pub fn unregister(
        &self,
        activity: &str,
        participant: &ParticipantId,
    ) -> Result<Occupancy, StoreError> {
        let occupancy = self.commit(activity, |roster| {
            if !roster.contains(participant.as_str()) {
                return Err(StoreError::NotRegistered {
                    activity: roster.name.clone(),
                    participant: participant.clone(),
                });
            }
            Ok(roster.without_participant(participant.as_str()))
        })?;

        debug!(
            activity,
            participant = %participant,
            enrolled = occupancy.enrolled,
            capacity = occupancy.capacity,
            "Participant unregistered"
        );

        Ok(occupancy)
    }

    /// Point-in-time copy of every roster.
    ///
    /// Never blocks and never observes a partially applied mutation.
    pub fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot::new(self.committed.load_full())
    }

    /// Whether an activity with this exact name exists.
    pub fn contains_activity(&self, activity: &str) -> bool {
        self.slots.contains_key(activity)
    }

    /// Number of activities.
    pub fn len(&self) -> usize {
        self.write_locks.len()
    }

    /// Whether the store was seeded with no activities.
    pub fn is_empty(&self) -> bool {
        self.write_locks.is_empty()
    }

    /// Apply `apply` to one activity's roster as a single atomic unit.
    ///
    /// `apply` may run more than once if other activities commit
    /// concurrently; it must be a pure function of the roster it is given.
    fn commit<F>(&self, activity: &str, apply: F) -> Result<Occupancy, StoreError>
    where
        F: Fn(&ActivityRoster) -> Result<ActivityRoster, StoreError>,
    {
        let not_found = || StoreError::ActivityNotFound {
            activity: activity.to_owned(),
        };

        let slot = *self.slots.get(activity).ok_or_else(not_found)?;
        let _writer = self.write_locks.get(slot).ok_or_else(not_found)?.lock();

        loop {
            let current = self.committed.load();
            let roster: &ActivityRoster = current.get(slot).ok_or_else(not_found)?;
            let updated = apply(roster)?;
            let occupancy = updated.occupancy();

            let mut next: Committed = (**current).clone();
            if let Some(entry) = next.get_mut(slot) {
                *entry = Arc::new(updated);
            }

            let previous = self.committed.compare_and_swap(&*current, Arc::new(next));
            if Arc::ptr_eq(&*previous, &*current) {
                return Ok(occupancy);
            }
        }
    }
}

fn validate_spec(spec: &ActivitySpec) -> Result<(), SeedError> {
    if spec.name.trim().is_empty() {
        return Err(SeedError::EmptyName);
    }
    if spec.max_participants == 0 {
        return Err(SeedError::ZeroCapacity(spec.name.clone()));
    }

    let mut seen = HashSet::new();
    for participant in &spec.participants {
        let raw = participant.as_str();
        if raw.is_empty() || raw.trim() != raw {
            return Err(SeedError::MalformedParticipant {
                activity: spec.name.clone(),
                participant: participant.clone(),
            });
        }
        if !seen.insert(participant.as_str()) {
            return Err(SeedError::DuplicateParticipant {
                activity: spec.name.clone(),
                participant: participant.clone(),
            });
        }
    }

    if spec.participants.len() > spec.max_participants {
        return Err(SeedError::OverCapacity {
            activity: spec.name.clone(),
            capacity: spec.max_participants,
            seeded: spec.participants.len(),
        });
    }

    Ok(())
}
