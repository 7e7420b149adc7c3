//! Authoritative roster store for the Enroll registration service.
//!
//! [`RosterStore`] owns every activity and its participants. It is the only
//! component that mutates roster state, and it guarantees two invariants at
//! every observable instant:
//!
//! - **Capacity**: no activity holds more participants than its capacity.
//! - **Uniqueness**: no participant appears twice in one activity.
//!
//! `register` and `unregister` are single atomic check-and-mutate units;
//! `snapshot` returns an immutable view of one committed state and never
//! waits on writers.
//!
//! # Usage
//!
//! ```
//! use enroll_store::{RosterStore, StoreError};
//! use enroll_types::{ActivitySpec, ParticipantId};
//!
//! let store = RosterStore::new([ActivitySpec::new("Chess Club", 1)]).ok();
//! let store = store.as_ref();
//! let ana = ParticipantId::from("ana@school.edu");
//! let bo = ParticipantId::from("bo@school.edu");
//!
//! assert!(store.is_some_and(|s| s.register("Chess Club", &ana).is_ok()));
//! assert!(store.is_some_and(|s| matches!(
//!     s.register("Chess Club", &bo),
//!     Err(StoreError::CapacityExceeded { .. })
//! )));
//! ```

pub mod error;
pub mod store;

// Re-export primary types at crate root.
pub use error::{SeedError, StoreError};
pub use store::RosterStore;
