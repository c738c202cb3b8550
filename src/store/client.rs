//! Store client with push notifications.

use std::sync::Arc;

use log::debug;

use super::error::StoreResult;
use super::feed::{Feeds, Subscription};
use super::memory::MemoryStore;
use super::DocumentStore;
use crate::exchange::{Event, EventCode, EventUpdate, Participant, ParticipantRecord, ResultSet};

/// Shared handle to the document store.
///
/// Constructed once per process and handed to every component that reads
/// or writes event documents. Every successful write is followed by a push
/// of the affected document to its subscribers. Pushes re-read the document
/// under the feed lock, so the last push always carries the stored state
/// even when concurrent writers publish out of order.
pub struct StoreClient {
    backend: Arc<dyn DocumentStore>,
    events: Feeds<Option<Event>>,
    participants: Feeds<Vec<Participant>>,
    results: Feeds<Option<ResultSet>>,
}

impl StoreClient {
    /// Creates a client over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self {
            backend,
            events: Feeds::new("event"),
            participants: Feeds::new("participants"),
            results: Feeds::new("results"),
        }
    }

    /// Creates a client over a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    // ==================== Reads ====================

    /// Reads the event document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn get_event(&self, code: &EventCode) -> StoreResult<Option<Event>> {
        self.backend.get_event(code)
    }

    /// Reads the participant list.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn list_participants(&self, code: &EventCode) -> StoreResult<Vec<Participant>> {
        self.backend.list_participants(code)
    }

    /// Reads the result set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn get_results(&self, code: &EventCode) -> StoreResult<Option<ResultSet>> {
        self.backend.get_results(code)
    }

    // ==================== Writes ====================

    /// Creates (or overwrites) the event document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails; nothing is pushed then.
    pub fn create_event(&self, code: &EventCode, event: &Event) -> StoreResult<()> {
        self.backend.put_event(code, event)?;
        self.events.publish(code, || self.backend.get_event(code));
        Ok(())
    }

    /// Partially updates the event document.
    ///
    /// # Errors
    ///
    /// Returns an error if the event does not exist or the backend fails.
    pub fn update_event(&self, code: &EventCode, update: &EventUpdate) -> StoreResult<Event> {
        let event = self.backend.update_event(code, update)?;
        self.events.publish(code, || self.backend.get_event(code));
        Ok(event)
    }

    /// Adds a participant.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn insert_participant(
        &self,
        code: &EventCode,
        record: ParticipantRecord,
    ) -> StoreResult<Participant> {
        let participant = self.backend.insert_participant(code, record)?;
        self.participants
            .publish(code, || self.backend.list_participants(code));
        Ok(participant)
    }

    /// Removes a participant.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn delete_participant(&self, code: &EventCode, id: &str) -> StoreResult<()> {
        self.backend.delete_participant(code, id)?;
        self.participants
            .publish(code, || self.backend.list_participants(code));
        Ok(())
    }

    /// Replaces the result set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn put_results(&self, code: &EventCode, results: &ResultSet) -> StoreResult<()> {
        self.backend.put_results(code, results)?;
        debug!(
            "event=results_written module=store code={code} assignments={}",
            results.len()
        );
        self.results.publish(code, || self.backend.get_results(code));
        Ok(())
    }

    // ==================== Subscriptions ====================

    /// Subscribes to `events/{code}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the first snapshot cannot be read.
    pub fn subscribe_event(&self, code: &EventCode) -> StoreResult<Subscription<Option<Event>>> {
        self.events.subscribe(code, || self.backend.get_event(code))
    }

    /// Subscribes to `events/{code}/list`.
    ///
    /// # Errors
    ///
    /// Returns an error if the first snapshot cannot be read.
    pub fn subscribe_participants(
        &self,
        code: &EventCode,
    ) -> StoreResult<Subscription<Vec<Participant>>> {
        self.participants
            .subscribe(code, || self.backend.list_participants(code))
    }

    /// Subscribes to `events/{code}/meta/results`.
    ///
    /// # Errors
    ///
    /// Returns an error if the first snapshot cannot be read.
    pub fn subscribe_results(
        &self,
        code: &EventCode,
    ) -> StoreResult<Subscription<Option<ResultSet>>> {
        self.results.subscribe(code, || self.backend.get_results(code))
    }

    /// Number of live subscriptions across the documents of `code`.
    #[must_use]
    pub fn subscriber_count(&self, code: &EventCode) -> usize {
        self.events.subscriber_count(code)
            + self.participants.subscriber_count(code)
            + self.results.subscriber_count(code)
    }
}
