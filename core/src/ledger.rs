//! Time ledger: per-unit suspended-duration bookkeeping.
//!
//! INVARIANTS:
//!   - `suspended_since` is set iff the unit is currently suspended.
//!   - `cumulative_suspended` only grows, and only when an interval
//!     closes.
//!
//! A record is created the first time a unit is classified and is never
//! deleted. Records for destroyed units are harmless.

use crate::types::{Tick, UnitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PauseRecord {
    pub is_suspended:         bool,
    pub suspended_since:      Option<Tick>,
    pub cumulative_suspended: Tick,
}

impl PauseRecord {
    /// Suspended ticks as of `now`, counting the open interval.
    pub fn suspended_total(&self, now: Tick) -> Tick {
        let open = self
            .suspended_since
            .map(|since| now.saturating_sub(since))
            .unwrap_or(0);
        self.cumulative_suspended.saturating_add(open)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeLedger {
    records: BTreeMap<UnitId, PauseRecord>,
}

impl TimeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, unit_id: UnitId) -> Option<&PauseRecord> {
        self.records.get(&unit_id)
    }

    /// The record for `unit_id`, created on first use.
    pub fn touch(&mut self, unit_id: UnitId) -> &mut PauseRecord {
        self.records.entry(unit_id).or_default()
    }

    pub fn is_suspended(&self, unit_id: UnitId) -> bool {
        self.records.get(&unit_id).is_some_and(|r| r.is_suspended)
    }

    /// Open a suspend interval at `tick`. Returns false, without touching
    /// the stamp, if an interval is already open.
    pub fn open_interval(&mut self, unit_id: UnitId, tick: Tick) -> bool {
        let record = self.touch(unit_id);
        let was_open = record.is_suspended && record.suspended_since.is_some();
        record.is_suspended = true;
        if record.suspended_since.is_none() {
            record.suspended_since = Some(tick);
        }
        !was_open
    }

    /// Close the open interval at `tick`, adding its length to the
    /// cumulative total. Returns the closed length, or `None` if the
    /// unit was not suspended.
    pub fn close_interval(&mut self, unit_id: UnitId, tick: Tick) -> Option<Tick> {
        let record = self.records.get_mut(&unit_id)?;
        if !record.is_suspended && record.suspended_since.is_none() {
            return None;
        }
        let duration = match record.suspended_since.take() {
            Some(since) => tick.saturating_sub(since),
            None => {
                log::warn!("unit {unit_id} marked suspended without a start tick; counting 0 ticks");
                0
            }
        };
        record.is_suspended = false;
        record.cumulative_suspended = record.cumulative_suspended.saturating_add(duration);
        Some(duration)
    }

    /// Total suspended ticks for a unit as of `now`.
    pub fn suspended_total(&self, unit_id: UnitId, now: Tick) -> Tick {
        self.records
            .get(&unit_id)
            .map(|r| r.suspended_total(now))
            .unwrap_or(0)
    }

    /// Global elapsed ticks net of suspension.
    pub fn effective_ticks(&self, unit_id: UnitId, now: Tick) -> Tick {
        now.saturating_sub(self.suspended_total(unit_id, now))
    }

    /// Units whose record says they are suspended, ascending.
    pub fn suspended_units(&self) -> Vec<UnitId> {
        self.records
            .iter()
            .filter(|(_, r)| r.is_suspended)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &PauseRecord)> {
        self.records.iter().map(|(id, r)| (*id, r))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Install a record verbatim (used when loading a session). Records
    /// that break the since/suspended invariant are repaired.
    pub fn insert(&mut self, unit_id: UnitId, mut record: PauseRecord) {
        if record.suspended_since.is_some() && !record.is_suspended {
            record.is_suspended = true;
        }
        self.records.insert(unit_id, record);
    }
}
