//! Store methods for the gate's durable state: pause records, override
//! flags, configuration and the clock.
//!
//! Loading is tolerant by contract. Every row is read as a dynamic value;
//! a row that does not parse is logged and skipped, a missing value takes
//! its default, and one bad row never fails the whole load.

use crate::{
    clock::WorldClock,
    config::GateConfig,
    error::GateResult,
    ledger::{PauseRecord, TimeLedger},
    overrides::{OverrideKey, OverrideStore},
    types::{Tick, UnitId},
};
use rusqlite::{params, types::Value};
use serde_json::{Map, Value as Json};

use super::GateStore;

/// Settings key written by older sessions for `auto_gate_sub_layers`.
const LEGACY_SUB_LAYER_KEY: &str = "pause_sub_layers_when_away";

impl GateStore {
    // ── Pause records ─────────────────────────────────────────────

    pub fn save_ledger(&self, session_id: &str, ledger: &TimeLedger) -> GateResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM pause_record WHERE session_id = ?1", params![session_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO pause_record
                    (session_id, unit_id, is_suspended, suspended_since, cumulative_suspended)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (unit_id, record) in ledger.iter() {
                stmt.execute(params![
                    session_id,
                    unit_id,
                    record.is_suspended,
                    record.suspended_since.map(|t| t as i64),
                    record.cumulative_suspended as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_ledger(&self, session_id: &str) -> GateResult<TimeLedger> {
        let mut stmt = self.conn.prepare(
            "SELECT unit_id, is_suspended, suspended_since, cumulative_suspended
             FROM pause_record WHERE session_id = ?1",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok([row.get::<_, Value>(0)?, row.get(1)?, row.get(2)?, row.get(3)?])
        })?;

        let mut ledger = TimeLedger::new();
        for row in rows {
            match row.map(|values| parse_pause_record(&values)) {
                Ok(Some((unit_id, record))) => ledger.insert(unit_id, record),
                Ok(None) => log::warn!("session {session_id}: skipping unreadable pause record"),
                Err(e) => log::warn!("session {session_id}: skipping pause record: {e}"),
            }
        }
        Ok(ledger)
    }

    // ── Overrides ─────────────────────────────────────────────────

    pub fn save_overrides(&self, session_id: &str, overrides: &OverrideStore) -> GateResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM override_state WHERE session_id = ?1", params![session_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO override_state (session_id, scope, key, forced_paused, reinstated)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (key, paused) in overrides.iter() {
                let (scope, id) = key.to_parts();
                stmt.execute(params![session_id, scope, id, paused, overrides.is_reinstated(key)])?;
            }
        }
        tx.execute(
            "UPDATE session SET overrides_suppressed = ?2 WHERE session_id = ?1",
            params![session_id, overrides.is_suppressed()],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_overrides(&self, session_id: &str) -> GateResult<OverrideStore> {
        let mut stmt = self.conn.prepare(
            "SELECT scope, key, forced_paused, reinstated
             FROM override_state WHERE session_id = ?1",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok([row.get::<_, Value>(0)?, row.get(1)?, row.get(2)?, row.get(3)?])
        })?;

        let mut overrides = OverrideStore::new();
        let mut reinstated = Vec::new();
        for row in rows {
            let parsed = row.map(|[scope, key, paused, again]| {
                let key = match &scope {
                    Value::Text(scope) => OverrideKey::from_parts(scope, as_i64(&key)?),
                    _ => None,
                }?;
                Some((key, as_bool(&paused)?, as_bool(&again).unwrap_or(false)))
            });
            match parsed {
                Ok(Some((key, paused, again))) => {
                    overrides.set(key, paused);
                    if again {
                        reinstated.push(key);
                    }
                }
                Ok(None) => log::warn!("session {session_id}: skipping unreadable override"),
                Err(e) => log::warn!("session {session_id}: skipping override: {e}"),
            }
        }

        let suppressed = self
            .session_value(session_id, "overrides_suppressed")?
            .and_then(|v| as_bool(&v))
            .unwrap_or(false);
        overrides.restore_suppression(suppressed, reinstated);
        Ok(overrides)
    }

    // ── Configuration ─────────────────────────────────────────────

    pub fn save_config(&self, session_id: &str, config: &GateConfig) -> GateResult<()> {
        let Json::Object(fields) = serde_json::to_value(config)? else {
            return Err(anyhow::anyhow!("configuration did not serialize to an object").into());
        };
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM gate_setting WHERE session_id = ?1", params![session_id])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO gate_setting (session_id, key, value) VALUES (?1, ?2, ?3)")?;
            for (key, value) in fields {
                stmt.execute(params![session_id, key, to_sql_value(&value)])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_config(&self, session_id: &str) -> GateResult<GateConfig> {
        let Json::Object(mut fields) = serde_json::to_value(GateConfig::default())? else {
            return Ok(GateConfig::default());
        };

        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM gate_setting WHERE session_id = ?1")?;
        let rows: Vec<(String, Value)> = stmt
            .query_map(params![session_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .filter_map(|row| match row {
                Ok(pair) => Some(pair),
                Err(e) => {
                    log::warn!("session {session_id}: skipping setting: {e}");
                    None
                }
            })
            .collect();

        let has_current_key = rows.iter().any(|(k, _)| k == "auto_gate_sub_layers");
        for (key, value) in rows {
            let key = if key == LEGACY_SUB_LAYER_KEY && !has_current_key {
                "auto_gate_sub_layers".to_string()
            } else {
                key
            };
            match coerce_setting(&fields, &key, &value) {
                Some(json) => {
                    fields.insert(key, json);
                }
                None => log::warn!("session {session_id}: ignoring setting '{key}' = {value:?}"),
            }
        }

        match serde_json::from_value::<GateConfig>(Json::Object(fields)) {
            Ok(config) => Ok(config.normalized()),
            Err(e) => {
                log::warn!("session {session_id}: settings unreadable ({e}); using defaults");
                Ok(GateConfig::default())
            }
        }
    }

    // ── Clock ─────────────────────────────────────────────────────

    pub fn save_clock(&self, session_id: &str, clock: &WorldClock) -> GateResult<()> {
        self.conn.execute(
            "UPDATE session SET current_tick = ?2, game_start_abs_tick = ?3, saved_at = ?4
             WHERE session_id = ?1",
            params![
                session_id,
                clock.current_tick as i64,
                clock.game_start_abs_tick as i64,
                chrono::Utc::now().timestamp(),
            ],
        )?;
        Ok(())
    }

    pub fn load_clock(&self, session_id: &str) -> GateResult<WorldClock> {
        let tick = |column: &str| -> GateResult<Tick> {
            Ok(self
                .session_value(session_id, column)?
                .and_then(|v| as_tick(&v))
                .unwrap_or(0))
        };
        Ok(WorldClock {
            current_tick:        tick("current_tick")?,
            game_start_abs_tick: tick("game_start_abs_tick")?,
        })
    }

    fn session_value(&self, session_id: &str, column: &str) -> GateResult<Option<Value>> {
        // Column names come from this module only.
        let sql = format!("SELECT {column} FROM session WHERE session_id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![session_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get::<_, Value>(0)?)),
            None => Ok(None),
        }
    }
}

// ── Value parsing ─────────────────────────────────────────────────────

fn parse_pause_record([unit_id, suspended, since, cumulative]: &[Value; 4]) -> Option<(UnitId, PauseRecord)> {
    let record = PauseRecord {
        is_suspended:         or_default(suspended, as_bool)?,
        suspended_since:      match since {
            Value::Null => None,
            other => Some(as_tick(other)?),
        },
        cumulative_suspended: or_default(cumulative, as_tick)?,
    };
    Some((as_i64(unit_id)?, record))
}

/// NULL reads as the default; anything else must parse.
fn or_default<T: Default>(value: &Value, parse: fn(&Value) -> Option<T>) -> Option<T> {
    match value {
        Value::Null => Some(T::default()),
        other => parse(other),
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Real(f) if f.fract() == 0.0 => Some(*f as i64),
        Value::Text(t) => t.trim().parse().ok(),
        _ => None,
    }
}

fn as_tick(value: &Value) -> Option<Tick> {
    as_i64(value).and_then(|i| Tick::try_from(i).ok())
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Integer(0) => Some(false),
        Value::Integer(1) => Some(true),
        Value::Text(t) => match t.trim().to_ascii_lowercase().as_str() {
            "true" | "1"  => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_sql_value(json: &Json) -> Value {
    match json {
        Json::Bool(b) => Value::Integer(i64::from(*b)),
        Json::Number(n) => n.as_i64().map(Value::Integer).unwrap_or_else(|| Value::Text(n.to_string())),
        Json::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

/// Convert a stored setting to JSON of the same shape as its default.
/// Unknown keys and mistyped values yield `None`.
fn coerce_setting(defaults: &Map<String, Json>, key: &str, value: &Value) -> Option<Json> {
    match defaults.get(key)? {
        Json::Bool(_)   => as_bool(value).map(Json::Bool),
        Json::Number(_) => as_tick(value).map(Json::from),
        _ => None,
    }
}
