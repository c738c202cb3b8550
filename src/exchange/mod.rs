//! Gift exchange domain: events, participants, households, draws and
//! per-viewer results.
//!
//! # Architecture
//!
//! ```text
//! validation  (command input → records)
//! household   (participant list → households)
//! draw        (participant list → ResultSet, written through StoreClient)
//! visibility  (ResultSet + viewer → visible assignments)
//! ```
//!
//! Everything except [`AssignmentEngine`] is a pure function of its input.
//!
//! # Types
//!
//! - [`Event`]: an exchange, open or closed
//! - [`Participant`]: one registered gift giver/receiver
//! - [`Household`]: participants sharing a phone (derived, never stored)
//! - [`Assignment`]: one giver → receiver pair
//! - [`ResultSet`]: all assignments of one draw

pub mod draw;
mod error;
pub mod household;
pub mod types;
pub mod validation;
pub mod visibility;

pub use draw::{close_cycle, draw_assignments, AssignmentEngine, MIN_PARTICIPANTS};
pub use error::{ErrorKind, ExchangeError, Result};
pub use household::{find_household, group_households, household_key, Household, NO_CONTACT_KEY};
pub use types::{
    digits_only, Assignment, Event, EventCode, EventStatus, EventUpdate, Identity, Participant,
    ParticipantRecord, ResultSet,
};
pub use validation::ParticipantForm;
pub use visibility::{Viewer, VisibilityResolver, MIN_CONTACT_MATCH_DIGITS};
