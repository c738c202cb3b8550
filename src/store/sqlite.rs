//! `SQLite` document store.
//!
//! Each document kind gets its own table. The results document keeps the
//! encoded assignment list in a single `data` column so a draw is stored
//! (and replaced) by one statement.

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use super::error::{StoreError, StoreResult};
use super::DocumentStore;
use crate::exchange::{
    Event, EventCode, EventStatus, EventUpdate, Identity, Participant, ParticipantRecord,
    ResultSet,
};

/// `SQLite`-based document store.
///
/// Thread-safe wrapper around a `SQLite` connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Creates an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire database lock: {e}")))
    }

    fn initialize_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            -- events/{code}
            CREATE TABLE IF NOT EXISTS events (
                code TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                budget TEXT NOT NULL,
                admin TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open'
            );

            -- events/{code}/list/{id}
            CREATE TABLE IF NOT EXISTS participants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_code TEXT NOT NULL,
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                likes TEXT NOT NULL,
                manager TEXT NOT NULL,
                created_at INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS participants_by_event ON participants(event_code);

            -- events/{code}/meta/results
            CREATE TABLE IF NOT EXISTS results (
                event_code TEXT PRIMARY KEY,
                data TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }
}

fn read_event(conn: &Connection, code: &EventCode) -> StoreResult<Option<Event>> {
    let row = conn
        .query_row(
            "SELECT name, budget, admin, status FROM events WHERE code = ?1",
            params![code.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(name, budget, admin, status)| {
        let status = EventStatus::parse(&status)
            .ok_or_else(|| StoreError::InvalidData(format!("Invalid event status: {status}")))?;
        Ok(Event {
            name,
            budget,
            admin: Identity::new(admin),
            status,
        })
    })
    .transpose()
}

fn write_event(conn: &Connection, code: &EventCode, event: &Event) -> StoreResult<()> {
    conn.execute(
        r"
        INSERT INTO events (code, name, budget, admin, status)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(code) DO UPDATE SET
            name = excluded.name,
            budget = excluded.budget,
            admin = excluded.admin,
            status = excluded.status
        ",
        params![
            code.as_str(),
            &event.name,
            &event.budget,
            event.admin.as_str(),
            event.status.as_str(),
        ],
    )?;
    Ok(())
}

impl DocumentStore for SqliteStore {
    fn get_event(&self, code: &EventCode) -> StoreResult<Option<Event>> {
        let conn = self.lock()?;
        read_event(&conn, code)
    }

    fn put_event(&self, code: &EventCode, event: &Event) -> StoreResult<()> {
        let conn = self.lock()?;
        write_event(&conn, code, event)
    }

    fn update_event(&self, code: &EventCode, update: &EventUpdate) -> StoreResult<Event> {
        let conn = self.lock()?;
        let mut event = read_event(&conn, code)?
            .ok_or_else(|| StoreError::MissingDocument(format!("events/{code}")))?;
        update.apply_to(&mut event);
        write_event(&conn, code, &event)?;
        Ok(event)
    }

    fn list_participants(&self, code: &EventCode) -> StoreResult<Vec<Participant>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r"
            SELECT id, name, phone, likes, manager, created_at
            FROM participants
            WHERE event_code = ?1
            ORDER BY id
            ",
        )?;

        let participants = stmt
            .query_map(params![code.as_str()], |row| {
                Ok(Participant {
                    id: row.get::<_, i64>(0)?.to_string(),
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    wishlist: row.get(3)?,
                    manager: Identity::new(row.get::<_, String>(4)?),
                    created_at: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(participants)
    }

    fn insert_participant(
        &self,
        code: &EventCode,
        record: ParticipantRecord,
    ) -> StoreResult<Participant> {
        let conn = self.lock()?;

        conn.execute(
            r"
            INSERT INTO participants (event_code, name, phone, likes, manager, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                code.as_str(),
                &record.name,
                &record.phone,
                &record.wishlist,
                record.manager.as_str(),
                record.created_at,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Ok(record.with_id(id.to_string()))
    }

    fn delete_participant(&self, code: &EventCode, id: &str) -> StoreResult<()> {
        // Ids minted by this store are integers; anything else cannot exist.
        let Ok(row_id) = id.parse::<i64>() else {
            return Ok(());
        };

        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM participants WHERE event_code = ?1 AND id = ?2",
            params![code.as_str(), row_id],
        )?;
        Ok(())
    }

    fn get_results(&self, code: &EventCode) -> StoreResult<Option<ResultSet>> {
        let conn = self.lock()?;

        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM results WHERE event_code = ?1",
                params![code.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|data| ResultSet::decode(&data).map_err(StoreError::from))
            .transpose()
    }

    fn put_results(&self, code: &EventCode, results: &ResultSet) -> StoreResult<()> {
        let data = results.encode()?;
        let conn = self.lock()?;

        conn.execute(
            r"
            INSERT INTO results (event_code, data) VALUES (?1, ?2)
            ON CONFLICT(event_code) DO UPDATE SET data = excluded.data
            ",
            params![code.as_str(), &data],
        )?;

        Ok(())
    }
}
