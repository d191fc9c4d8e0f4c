//! Transition manager: applies a desired classification exactly once
//! per change.
//!
//! The ledger's `is_suspended` flag is durable; `scheduled_out` is the
//! set of units this manager has actually removed from the host
//! scheduler since the session started. The two diverge after a load
//! (ledger says suspended, host is running everything), and reconcile
//! closes that gap without double-counting time.

use crate::{
    event::GateEvent,
    host::SchedulerBinding,
    ledger::TimeLedger,
    types::{Classification, Tick, Unit, UnitId, UnitKind},
};
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct TransitionManager {
    scheduled_out: BTreeSet<UnitId>,
}

impl TransitionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the host scheduler currently has this unit removed.
    pub fn is_scheduled_out(&self, unit_id: UnitId) -> bool {
        self.scheduled_out.contains(&unit_id)
    }

    pub fn scheduled_out(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.scheduled_out.iter().copied()
    }

    /// Bring `unit` to `desired` at `tick`. No-op (and no ledger write)
    /// when it is already there.
    pub fn reconcile(
        &mut self,
        unit: &Unit,
        desired: Classification,
        tick: Tick,
        ledger: &mut TimeLedger,
        scheduler: &mut dyn SchedulerBinding,
    ) -> Option<GateEvent> {
        match desired {
            Classification::Suspended => self.suspend(unit.id, unit.kind, tick, ledger, scheduler),
            Classification::Active    => {
                ledger.touch(unit.id);
                self.resume(unit.id, unit.kind, tick, ledger, scheduler)
            }
        }
    }

    /// Resume every suspended unit, whether suspended by this manager or
    /// carried over from a loaded session. Returns one event per live
    /// unit; units `kind_of` no longer knows are forgotten silently.
    pub fn force_resume_all(
        &mut self,
        tick: Tick,
        ledger: &mut TimeLedger,
        scheduler: &mut dyn SchedulerBinding,
        kind_of: impl Fn(UnitId) -> Option<UnitKind>,
    ) -> Vec<GateEvent> {
        let mut targets: BTreeSet<UnitId> = ledger.suspended_units().into_iter().collect();
        targets.extend(self.scheduled_out.iter().copied());

        targets
            .into_iter()
            .filter_map(|id| match kind_of(id) {
                Some(kind) => self.resume(id, kind, tick, ledger, scheduler),
                None => {
                    self.forget(id, tick, ledger);
                    None
                }
            })
            .collect()
    }

    /// Drop units missing from `live` and close their open intervals.
    /// The host is not called; a destroyed unit has nothing to resume.
    /// Returns how many units were dropped.
    pub fn prune(&mut self, live: &[Unit], tick: Tick, ledger: &mut TimeLedger) -> usize {
        let live: BTreeSet<UnitId> = live.iter().map(|u| u.id).collect();
        let mut gone: BTreeSet<UnitId> = ledger.suspended_units().into_iter().collect();
        gone.extend(self.scheduled_out.iter().copied());
        gone.retain(|id| !live.contains(id));

        for &id in &gone {
            self.forget(id, tick, ledger);
        }
        gone.len()
    }

    fn forget(&mut self, unit_id: UnitId, tick: Tick, ledger: &mut TimeLedger) {
        self.scheduled_out.remove(&unit_id);
        ledger.close_interval(unit_id, tick);
        log::debug!("tick={tick} unit {unit_id} is gone; dropped from gating");
    }

    fn suspend(
        &mut self,
        unit_id: UnitId,
        kind: UnitKind,
        tick: Tick,
        ledger: &mut TimeLedger,
        scheduler: &mut dyn SchedulerBinding,
    ) -> Option<GateEvent> {
        let stamped = ledger.open_interval(unit_id, tick);
        let removed = self.scheduled_out.insert(unit_id);
        if removed {
            scheduler.suspend(unit_id);
        }
        if !(stamped || removed) {
            return None;
        }
        log::debug!("tick={tick} unit {unit_id} ({kind:?}) suspended");
        Some(GateEvent::UnitSuspended { tick, unit_id, kind })
    }

    fn resume(
        &mut self,
        unit_id: UnitId,
        kind: UnitKind,
        tick: Tick,
        ledger: &mut TimeLedger,
        scheduler: &mut dyn SchedulerBinding,
    ) -> Option<GateEvent> {
        let restored = self.scheduled_out.remove(&unit_id);
        if restored {
            scheduler.resume(unit_id);
        }
        let closed = ledger.close_interval(unit_id, tick);
        if !restored && closed.is_none() {
            return None;
        }
        let suspended_for = closed.unwrap_or(0);
        log::debug!("tick={tick} unit {unit_id} ({kind:?}) resumed after {suspended_for} ticks");
        Some(GateEvent::UnitResumed { tick, unit_id, kind, suspended_for })
    }
}
