//! Shared type definitions for the Enroll registration service.
//!
//! Everything that crosses a crate boundary lives here: participant
//! identifiers, activity definitions and committed rosters, the immutable
//! [`RosterSnapshot`] served to readers, and the [`RosterEvent`] published
//! after each successful mutation. Event and identifier types flow to
//! `TypeScript` via `ts-rs` for the browser client.
//!
//! # Modules
//!
//! - [`ids`] -- The case-sensitive [`ParticipantId`] wrapper
//! - [`roster`] -- Activity definitions, committed rosters, and snapshots
//! - [`events`] -- Change notifications emitted after each mutation

pub mod events;
pub mod ids;
pub mod roster;

// Re-export all public types at crate root for convenience.
pub use events::{RosterEvent, RosterEventKind};
pub use ids::ParticipantId;
pub use roster::{ActivityRoster, ActivitySpec, Occupancy, RosterSnapshot};
