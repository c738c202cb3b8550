//! Gift Exchange Core Library
//!
//! Core functionality for blind gift exchanges: participants register in
//! households, an organizer runs a draw that pairs every giver with a
//! receiver in one closed cycle, and each session sees only the
//! assignments it is entitled to.
//!
//! # Modules
//!
//! - [`exchange`]: domain types, validation, household grouping, the draw
//!   and result visibility
//! - [`store`]: document store backends and push subscriptions
//! - [`live`]: reactive per-event view derived from the subscriptions
//! - [`api`]: the command surface used by a session

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod exchange;
pub mod identity;
pub mod live;
pub mod notify;
pub mod session;
pub mod store;

pub use api::ExchangeCore;
pub use config::ExchangeConfig;
pub use exchange::{
    Assignment, ErrorKind, Event, EventCode, EventStatus, ExchangeError, Household, Identity,
    Participant, ParticipantForm, ResultSet, Viewer, VisibilityResolver,
};
pub use identity::{AnonymousIdentityProvider, IdentityProvider};
pub use live::{EventSnapshot, LiveEvent, ResultsState};
pub use notify::{DeepLinkChannel, MessageChannel, ShareMessage};
pub use session::{SessionState, SessionStore};
pub use store::{DocumentStore, MemoryStore, SqliteStore, StoreClient, StoreError};
