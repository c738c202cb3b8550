//! In-process document store.

// Each operation holds the lock for its whole read-modify-write.
#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use rand::distributions::Alphanumeric;
use rand::Rng;

use super::error::{StoreError, StoreResult};
use super::DocumentStore;
use crate::exchange::{Event, EventCode, EventUpdate, Participant, ParticipantRecord, ResultSet};

/// Length of generated participant ids.
const PARTICIPANT_ID_LEN: usize = 20;

#[derive(Default)]
struct Documents {
    events: HashMap<EventCode, Event>,
    lists: HashMap<EventCode, Vec<Participant>>,
    // Stored encoded, as the `data` field of the results document.
    results: HashMap<EventCode, String>,
}

/// Document store kept in process memory.
///
/// Participants are listed in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<Documents>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Documents>> {
        self.docs
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire store lock: {e}")))
    }
}

fn new_participant_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PARTICIPANT_ID_LEN)
        .map(char::from)
        .collect()
}

impl DocumentStore for MemoryStore {
    fn get_event(&self, code: &EventCode) -> StoreResult<Option<Event>> {
        Ok(self.lock()?.events.get(code).cloned())
    }

    fn put_event(&self, code: &EventCode, event: &Event) -> StoreResult<()> {
        self.lock()?.events.insert(code.clone(), event.clone());
        Ok(())
    }

    fn update_event(&self, code: &EventCode, update: &EventUpdate) -> StoreResult<Event> {
        let mut docs = self.lock()?;
        let event = docs
            .events
            .get_mut(code)
            .ok_or_else(|| StoreError::MissingDocument(format!("events/{code}")))?;
        update.apply_to(event);
        Ok(event.clone())
    }

    fn list_participants(&self, code: &EventCode) -> StoreResult<Vec<Participant>> {
        Ok(self.lock()?.lists.get(code).cloned().unwrap_or_default())
    }

    fn insert_participant(
        &self,
        code: &EventCode,
        record: ParticipantRecord,
    ) -> StoreResult<Participant> {
        let participant = record.with_id(new_participant_id());
        self.lock()?
            .lists
            .entry(code.clone())
            .or_default()
            .push(participant.clone());
        Ok(participant)
    }

    fn delete_participant(&self, code: &EventCode, id: &str) -> StoreResult<()> {
        if let Some(list) = self.lock()?.lists.get_mut(code) {
            list.retain(|p| p.id != id);
        }
        Ok(())
    }

    fn get_results(&self, code: &EventCode) -> StoreResult<Option<ResultSet>> {
        let docs = self.lock()?;
        docs.results
            .get(code)
            .map(|data| ResultSet::decode(data).map_err(StoreError::from))
            .transpose()
    }

    fn put_results(&self, code: &EventCode, results: &ResultSet) -> StoreResult<()> {
        let data = results.encode()?;
        self.lock()?.results.insert(code.clone(), data);
        Ok(())
    }
}
