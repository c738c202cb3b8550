//! Document store adapter.
//!
//! Every event owns three documents:
//!
//! ```text
//! events/{code}                  Event (create, partial update)
//! events/{code}/list/{id}        Participant (create, delete)
//! events/{code}/meta/results     ResultSet as {data: "<json>"} (full replace)
//! ```
//!
//! # Architecture
//!
//! ```text
//! StoreClient (push notifications)
//!     └── dyn DocumentStore
//!             ├── MemoryStore
//!             └── SqliteStore
//! ```
//!
//! Backends only move documents. [`StoreClient`] publishes a fresh snapshot
//! to every subscriber of a document after each successful write; a failed
//! write publishes nothing.

mod client;
mod error;
mod feed;
mod memory;
mod sqlite;

pub use client::StoreClient;
pub use error::{StoreError, StoreResult};
pub use feed::Subscription;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::exchange::{Event, EventCode, EventUpdate, Participant, ParticipantRecord, ResultSet};

/// Key-value document storage for events.
///
/// Implementations must be safe to share between sessions. Writes are
/// last-write-wins; no locking across documents is provided.
pub trait DocumentStore: Send + Sync {
    /// Reads `events/{code}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get_event(&self, code: &EventCode) -> StoreResult<Option<Event>>;

    /// Writes `events/{code}`, replacing any existing document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put_event(&self, code: &EventCode, event: &Event) -> StoreResult<()>;

    /// Applies a partial update to `events/{code}` and returns the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingDocument`] if the event does not exist.
    fn update_event(&self, code: &EventCode, update: &EventUpdate) -> StoreResult<Event>;

    /// Reads every document under `events/{code}/list`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn list_participants(&self, code: &EventCode) -> StoreResult<Vec<Participant>>;

    /// Creates a participant document and returns it with its new id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn insert_participant(
        &self,
        code: &EventCode,
        record: ParticipantRecord,
    ) -> StoreResult<Participant>;

    /// Deletes `events/{code}/list/{id}`. Deleting a missing id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn delete_participant(&self, code: &EventCode, id: &str) -> StoreResult<()>;

    /// Reads `events/{code}/meta/results`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored data is corrupt.
    fn get_results(&self, code: &EventCode) -> StoreResult<Option<ResultSet>>;

    /// Replaces `events/{code}/meta/results` in a single write.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put_results(&self, code: &EventCode, results: &ResultSet) -> StoreResult<()>;
}
