//! Per-tick cache of the gate decision.
//!
//! Actor-advancement loops ask `is_active` once per actor per tick, so
//! the decision chain runs once per unit per tick and every query after
//! that is a map lookup. Unknown units read as Active.

use crate::types::{Tick, UnitId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct TickCache {
    stamped: Option<Tick>,
    active:  HashMap<UnitId, bool>,
}

impl TickCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the snapshot stale. The next `is_fresh` check fails.
    pub fn invalidate(&mut self) {
        self.stamped = None;
    }

    pub fn is_fresh(&self, tick: Tick) -> bool {
        self.stamped == Some(tick)
    }

    pub fn stamped_tick(&self) -> Option<Tick> {
        self.stamped
    }

    /// Replace the snapshot with freshly computed values for `tick`.
    pub fn repopulate(&mut self, tick: Tick, values: impl IntoIterator<Item = (UnitId, bool)>) {
        self.active.clear();
        self.active.extend(values);
        self.stamped = Some(tick);
    }

    pub fn is_active(&self, unit_id: UnitId) -> bool {
        match self.active.get(&unit_id) {
            Some(active) => *active,
            None => {
                log::trace!("tick cache miss for unit {unit_id}; failing open");
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
