//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database. The gate hands it
//! values; no SQL lives outside this module.

use crate::{
    error::GateResult,
    event::{EventLogEntry, GateEvent},
    types::Tick,
};
mod state;
use rusqlite::{params, Connection, OptionalExtension};

pub struct GateStore {
    conn: Connection,
    /// Backing file; `None` when the store lives in memory.
    path: Option<String>,
}

impl GateStore {
    /// Open (or create) a session database file.
    pub fn open(path: &str) -> GateResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::configure(conn, Some(path.to_string()))
    }

    /// Open an in-memory database (used in tests and throwaway runs).
    pub fn in_memory() -> GateResult<Self> {
        Self::configure(Connection::open_in_memory()?, None)
    }

    fn configure(conn: Connection, path: Option<String>) -> GateResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GateResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_gate_state.sql"))?;
        Ok(())
    }

    // ── Session ────────────────────────────────────────────────────

    /// Register a session. Re-registering an existing id is a no-op.
    pub fn insert_session(&self, session_id: &str, version: &str) -> GateResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO session (session_id, version, created_at) VALUES (?1, ?2, ?3)",
            params![session_id, version, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    pub fn session_exists(&self, session_id: &str) -> GateResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM session WHERE session_id = ?1",
                params![session_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    // ── Event log ──────────────────────────────────────────────────

    pub fn append_event(&self, session_id: &str, event: &GateEvent) -> GateResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, tick, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session_id,
                event.tick() as i64,
                event.type_name(),
                serde_json::to_string(event)?,
            ],
        )?;
        Ok(())
    }

    pub fn append_events(&self, session_id: &str, events: &[GateEvent]) -> GateResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        for event in events {
            self.append_event(session_id, event)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn events_for_tick(&self, session_id: &str, tick: Tick) -> GateResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, tick, event_type, payload
             FROM event_log WHERE session_id = ?1 AND tick = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id, tick as i64], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    session_id: row.get(1)?,
                    tick: row.get::<_, i64>(2)? as u64,
                    event_type: row.get(3)?,
                    payload: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, session_id: &str, event_type: &str) -> GateResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE session_id = ?1 AND event_type = ?2",
            params![session_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
