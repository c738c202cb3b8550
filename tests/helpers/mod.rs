//! Shared helpers for integration tests.
//!
//! Each [`session`] call simulates a separate device: its own identity and
//! its own data directory, sharing one [`StoreClient`].

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

use gift_exchange_core::exchange::{EventUpdate, ParticipantRecord};
use gift_exchange_core::store::StoreResult;
use gift_exchange_core::{
    AnonymousIdentityProvider, DocumentStore, Event, EventCode, ExchangeConfig, ExchangeCore,
    Identity, MemoryStore, Participant, ResultSet, StoreClient, StoreError,
};
use tempfile::TempDir;

/// A signed-in session and the directory holding its local state.
pub struct Session {
    pub core: ExchangeCore<AnonymousIdentityProvider>,
    pub dir: TempDir,
}

/// Opens a signed-in session on `store`.
pub fn session(store: &Arc<StoreClient>) -> Session {
    let dir = tempfile::tempdir().unwrap();
    let mut core = ExchangeCore::new(
        Arc::clone(store),
        AnonymousIdentityProvider::new(),
        dir.path(),
        ExchangeConfig::new(),
    )
    .unwrap();
    core.sign_in().unwrap();
    Session { core, dir }
}

/// Builds a participant without going through a store.
pub fn participant(id: &str, phone: &str, created_at: i64) -> Participant {
    Participant {
        id: id.to_string(),
        name: format!("Person {id}"),
        phone: phone.to_string(),
        wishlist: "socks".to_string(),
        manager: Identity::new(format!("manager-{id}")),
        created_at,
    }
}

/// Memory store whose status updates can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_status: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_status_updates(&self, fail: bool) {
        self.fail_status.store(fail, Ordering::SeqCst);
    }
}

impl DocumentStore for FlakyStore {
    fn get_event(&self, code: &EventCode) -> StoreResult<Option<Event>> {
        self.inner.get_event(code)
    }

    fn put_event(&self, code: &EventCode, event: &Event) -> StoreResult<()> {
        self.inner.put_event(code, event)
    }

    fn update_event(&self, code: &EventCode, update: &EventUpdate) -> StoreResult<Event> {
        if update.status.is_some() && self.fail_status.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("status write rejected".to_string()));
        }
        self.inner.update_event(code, update)
    }

    fn list_participants(&self, code: &EventCode) -> StoreResult<Vec<Participant>> {
        self.inner.list_participants(code)
    }

    fn insert_participant(
        &self,
        code: &EventCode,
        record: ParticipantRecord,
    ) -> StoreResult<Participant> {
        self.inner.insert_participant(code, record)
    }

    fn delete_participant(&self, code: &EventCode, id: &str) -> StoreResult<()> {
        self.inner.delete_participant(code, id)
    }

    fn get_results(&self, code: &EventCode) -> StoreResult<Option<ResultSet>> {
        self.inner.get_results(code)
    }

    fn put_results(&self, code: &EventCode, results: &ResultSet) -> StoreResult<()> {
        self.inner.put_results(code, results)
    }
}

/// Memory store that holds every rename between its write and its return.
///
/// The writer waits on `gate` twice after the rename is stored: once to
/// signal that the write landed and once to be released.
pub struct PausingStore {
    inner: MemoryStore,
    gate: Arc<Barrier>,
}

impl PausingStore {
    pub fn new(gate: Arc<Barrier>) -> Self {
        Self {
            inner: MemoryStore::new(),
            gate,
        }
    }
}

impl DocumentStore for PausingStore {
    fn get_event(&self, code: &EventCode) -> StoreResult<Option<Event>> {
        self.inner.get_event(code)
    }

    fn put_event(&self, code: &EventCode, event: &Event) -> StoreResult<()> {
        self.inner.put_event(code, event)
    }

    fn update_event(&self, code: &EventCode, update: &EventUpdate) -> StoreResult<Event> {
        let event = self.inner.update_event(code, update)?;
        if update.name.is_some() {
            self.gate.wait();
            self.gate.wait();
        }
        Ok(event)
    }

    fn list_participants(&self, code: &EventCode) -> StoreResult<Vec<Participant>> {
        self.inner.list_participants(code)
    }

    fn insert_participant(
        &self,
        code: &EventCode,
        record: ParticipantRecord,
    ) -> StoreResult<Participant> {
        self.inner.insert_participant(code, record)
    }

    fn delete_participant(&self, code: &EventCode, id: &str) -> StoreResult<()> {
        self.inner.delete_participant(code, id)
    }

    fn get_results(&self, code: &EventCode) -> StoreResult<Option<ResultSet>> {
        self.inner.get_results(code)
    }

    fn put_results(&self, code: &EventCode, results: &ResultSet) -> StoreResult<()> {
        self.inner.put_results(code, results)
    }
}
