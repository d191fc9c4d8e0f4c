//! The simulation gate.
//!
//! PER-TICK ORDER (fixed, never reordered):
//!   1. Mirror the host's global tick into the clock.
//!   2. Invalidate the tick cache.
//!   3. If a sweep is due, re-resolve the hierarchy and reconcile every
//!      live unit (scheduler side effects happen here). A sweep is due
//!      once per `sweep_interval` boundary crossed, so a host that skips
//!      ticks still gets one per interval.
//!   4. Repopulate the tick cache, so every `is_active` call this tick
//!      sees the state step 3 produced.
//!
//! RULES:
//!   - Nothing here fails. Unknown units read as Active, stale links
//!     count as absent, inconsistent ledger entries contribute nothing.
//!   - The ledger and override store are the only durable state.
//!   - Every mutating entry point returns the events it produced.

use crate::{
    aspect::Aspect,
    cache::TickCache,
    clock::{CalendarDate, WorldClock},
    config::GateConfig,
    decision::{decide, DecisionContext},
    error::{GateError, GateResult},
    event::GateEvent,
    hierarchy::{self, Grouping},
    host::{Counterparts, SchedulerBinding, UnitRegistry},
    ledger::TimeLedger,
    overrides::{OverrideKey, OverrideStore},
    store::GateStore,
    transition::TransitionManager,
    types::{CaravanId, Classification, LocationKey, ObserverFocus, Tick, Unit, UnitId, UnitKind},
};

/// Seasonal queries within this many ticks of "now" are treated as
/// queries about the present.
pub const SEASONAL_NOW_WINDOW: Tick = 5_000;

pub struct SimulationGate {
    config:       GateConfig,
    clock:        WorldClock,
    observer:     Option<ObserverFocus>,
    ledger:       TimeLedger,
    overrides:    OverrideStore,
    transitions:  TransitionManager,
    cache:        TickCache,
    grouping:     Grouping,
    /// Grouping must be re-resolved before the next decision.
    stale:        bool,
    last_sweep:   Option<Tick>,
    counterparts: Counterparts,
}

impl SimulationGate {
    pub fn new(config: GateConfig, counterparts: Counterparts) -> Self {
        Self {
            config:         config.normalized(),
            clock:          WorldClock::default(),
            observer:       None,
            ledger:         TimeLedger::new(),
            overrides:      OverrideStore::new(),
            transitions:    TransitionManager::new(),
            cache:          TickCache::new(),
            grouping:       Grouping::default(),
            stale:          true,
            last_sweep:     None,
            counterparts,
        }
    }

    pub fn with_clock(mut self, clock: WorldClock) -> Self {
        self.clock = clock;
        self
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn config(&self) -> &GateConfig { &self.config }
    pub fn clock(&self) -> &WorldClock { &self.clock }
    pub fn current_tick(&self) -> Tick { self.clock.current_tick }
    pub fn observer(&self) -> Option<ObserverFocus> { self.observer }
    pub fn ledger(&self) -> &TimeLedger { &self.ledger }
    pub fn overrides(&self) -> &OverrideStore { &self.overrides }
    pub fn counterparts(&self) -> &Counterparts { &self.counterparts }

    /// Whether the host scheduler has this unit removed right now.
    pub fn is_scheduled_out(&self, unit_id: UnitId) -> bool {
        self.transitions.is_scheduled_out(unit_id)
    }

    // ── Tick loop ──────────────────────────────────────────────────

    /// Run once per global tick, before any actor advances.
    pub fn on_tick(
        &mut self,
        tick: Tick,
        registry: &dyn UnitRegistry,
        scheduler: &mut dyn SchedulerBinding,
    ) -> Vec<GateEvent> {
        let previous = self.clock.current_tick;
        self.clock.advance_to(tick);
        self.cache.invalidate();

        let mut events = Vec::new();
        if self.sweep_due(previous) {
            events = self.sweep(registry, scheduler);
        }

        self.refresh_cache(registry);
        events
    }

    /// Re-resolve the hierarchy and reconcile every live unit.
    pub fn sweep(
        &mut self,
        registry: &dyn UnitRegistry,
        scheduler: &mut dyn SchedulerBinding,
    ) -> Vec<GateEvent> {
        let tick = self.clock.current_tick;
        self.last_sweep = Some(tick);
        self.stale = true;
        let units = registry.units();
        self.transitions.prune(&units, tick, &mut self.ledger);
        let (mut events, active, suspended) = self.reconcile_units(&units, registry, scheduler);

        log::debug!("tick={tick} sweep: {active} active, {suspended} suspended");
        events.push(GateEvent::SweepCompleted { tick, active, suspended });
        events
    }

    // ── Write paths ────────────────────────────────────────────────

    /// Move the observer to `unit_id` (or nowhere). Reconciles every
    /// unit immediately and invalidates the tick cache.
    pub fn set_observer(
        &mut self,
        unit_id: Option<UnitId>,
        registry: &dyn UnitRegistry,
        scheduler: &mut dyn SchedulerBinding,
    ) -> Vec<GateEvent> {
        let focus = unit_id.and_then(|id| {
            let unit = registry.unit(id);
            if unit.is_none() {
                log::warn!("observer moved to unknown unit {id}; treating as unfocused");
            }
            unit.map(|u| ObserverFocus::on(&u))
        });
        if focus == self.observer {
            return vec![];
        }

        let tick = self.clock.current_tick;
        let from = self.observer.map(|o| o.unit_id);
        let to = focus.map(|o| o.unit_id);
        log::info!("tick={tick} observer moved {from:?} -> {to:?}");

        self.observer = focus;
        self.stale = true;
        self.cache.invalidate();

        let mut events = vec![GateEvent::ObserverMoved { tick, from, to }];
        let units = registry.units();
        events.extend(self.reconcile_units(&units, registry, scheduler).0);
        events
    }

    /// Write a user override for the unit (or its root) and reconcile
    /// that one unit. The tick cache is left alone until the next tick.
    pub fn set_override(
        &mut self,
        unit_id: UnitId,
        paused: bool,
        registry: &dyn UnitRegistry,
        scheduler: &mut dyn SchedulerBinding,
    ) -> Vec<GateEvent> {
        let Some(unit) = registry.unit(unit_id) else {
            log::warn!("override for unknown unit {unit_id}; storing by unit id only");
            self.overrides.set(OverrideKey::Unit(unit_id), paused);
            return vec![];
        };

        let key = OverrideKey::for_unit(&unit);
        self.overrides.set(key, paused);

        let units = registry.units();
        self.ensure_grouping(registry, &units);
        let outcome = {
            let ctx = self.decision_context(registry);
            decide(&unit, &ctx)
        };

        let tick = self.clock.current_tick;
        let mut events = vec![GateEvent::OverrideSet { tick, unit_id, key, paused, outcome }];
        events.extend(
            self.transitions
                .reconcile(&unit, outcome, tick, &mut self.ledger, scheduler),
        );
        events
    }

    /// Replace the configuration. Turning automatic control off anywhere
    /// force-resumes every suspended unit and suppresses override flags;
    /// turning it back on lifts the suppression. Every unit is then
    /// reconciled against the new configuration.
    pub fn update_config(
        &mut self,
        next: GateConfig,
        registry: &dyn UnitRegistry,
        scheduler: &mut dyn SchedulerBinding,
    ) -> Vec<GateEvent> {
        let next = next.normalized();
        if next == self.config {
            return vec![];
        }

        let tick = self.clock.current_tick;
        let mut events = Vec::new();

        if self.config.disables_gating(&next) {
            events.extend(self.force_resume_all(registry, scheduler));
        } else if self.config.enables_gating(&next) {
            log::info!("tick={tick} automatic gating re-enabled; overrides back in effect");
            self.overrides.lift_suppression();
        }

        self.config = next;
        self.stale = true;
        self.cache.invalidate();

        let units = registry.units();
        events.extend(self.reconcile_units(&units, registry, scheduler).0);
        events
    }

    /// Resume every suspended unit, closing its ledger interval, and
    /// suppress the effect of all override flags without deleting them.
    pub fn force_resume_all(
        &mut self,
        registry: &dyn UnitRegistry,
        scheduler: &mut dyn SchedulerBinding,
    ) -> Vec<GateEvent> {
        let tick = self.clock.current_tick;
        let mut events = self.transitions.force_resume_all(
            tick,
            &mut self.ledger,
            scheduler,
            |id| registry.unit(id).map(|u| u.kind),
        );
        self.overrides.suppress_all();
        self.cache.invalidate();

        let count = events.len();
        log::info!("tick={tick} force-resumed {count} units; overrides suppressed");
        events.push(GateEvent::ForceResumed { tick, count });
        events
    }

    // ── Read paths ─────────────────────────────────────────────────

    /// Go/no-go for a unit on the current tick. Computed at most once per
    /// tick for all units; unknown units read as Active.
    pub fn is_active(&mut self, registry: &dyn UnitRegistry, unit_id: UnitId) -> bool {
        self.refresh_cache(registry);
        self.cache.is_active(unit_id)
    }

    /// Cached answer without refreshing. Use only after `on_tick`.
    pub fn is_active_cached(&self, unit_id: UnitId) -> bool {
        self.cache.is_active(unit_id)
    }

    /// Whether `aspect` of `unit_id` advances this tick.
    pub fn should_advance(&mut self, registry: &dyn UnitRegistry, unit_id: UnitId, aspect: Aspect) -> bool {
        if !aspect.is_gated(&self.config) {
            return true;
        }
        self.is_active(registry, unit_id)
    }

    /// Whether an incident aimed at `target` may fire. World-level
    /// incidents (no target) always fire.
    pub fn allow_incident(&mut self, registry: &dyn UnitRegistry, target: Option<UnitId>) -> bool {
        match target {
            Some(unit_id) => self.should_advance(registry, unit_id, Aspect::Weather),
            None => true,
        }
    }

    /// Whether an incident queue holding incidents aimed at `targets`
    /// should tick. It holds back only when every queued incident is
    /// aimed at a suspended unit.
    pub fn should_tick_incident_queue(&mut self, registry: &dyn UnitRegistry, targets: &[Option<UnitId>]) -> bool {
        if targets.is_empty() || !Aspect::Weather.is_gated(&self.config) {
            return true;
        }
        targets.iter().any(|target| self.allow_incident(registry, *target))
    }

    /// Fresh (uncached) classification of one unit.
    pub fn classify(&mut self, registry: &dyn UnitRegistry, unit_id: UnitId) -> Option<Classification> {
        let unit = registry.unit(unit_id)?;
        let units = registry.units();
        self.ensure_grouping(registry, &units);
        let ctx = self.decision_context(registry);
        Some(decide(&unit, &ctx))
    }

    /// The hierarchy as of the last resolution pass.
    pub fn grouping(&mut self, registry: &dyn UnitRegistry) -> &Grouping {
        let units = registry.units();
        self.ensure_grouping(registry, &units);
        &self.grouping
    }

    // ── Caravans ───────────────────────────────────────────────────

    /// Pause or release a caravan. Writing the flag it already has is a
    /// no-op.
    pub fn set_caravan_paused(&mut self, caravan_id: CaravanId, paused: bool) -> Vec<GateEvent> {
        let key = OverrideKey::Caravan(caravan_id);
        if self.overrides.stored(key).unwrap_or(false) == paused {
            return vec![];
        }
        self.overrides.set(key, paused);

        let tick = self.clock.current_tick;
        log::info!("tick={tick} caravan {caravan_id} paused={paused}");
        vec![GateEvent::CaravanPaused { tick, caravan_id, paused }]
    }

    /// Whether a caravan's world tick runs. Unknown caravans run.
    pub fn should_simulate_caravan(&self, caravan_id: CaravanId) -> bool {
        if !self.config.enabled {
            return true;
        }
        !self.overrides.stored(OverrideKey::Caravan(caravan_id)).unwrap_or(false)
    }

    /// The host's "resting" answer for a caravan. A paused caravan
    /// always rests, so it neither moves nor eats.
    pub fn caravan_resting(&self, caravan_id: CaravanId, night_resting: bool) -> bool {
        night_resting || !self.should_simulate_caravan(caravan_id)
    }

    // ── Local time ─────────────────────────────────────────────────

    /// Global ticks elapsed for this unit, net of suspension. Equals the
    /// global tick when local time is disabled.
    pub fn global_ticks_effective(&self, unit_id: UnitId) -> Tick {
        let now = self.clock.current_tick;
        if !self.config.local_time {
            return now;
        }
        self.ledger.effective_ticks(unit_id, now)
    }

    pub fn local_ticks_abs(&self, unit_id: UnitId) -> Tick {
        self.clock.to_abs(self.global_ticks_effective(unit_id))
    }

    /// Absolute time of the most advanced observer-owned unit, for
    /// calendar queries that are not about any one unit.
    pub fn world_ticks_abs(&self, registry: &dyn UnitRegistry) -> Tick {
        if !self.config.local_time {
            return self.clock.ticks_abs();
        }
        registry
            .units()
            .iter()
            .filter(|u| contributes_to_world_time(u, registry))
            .map(|u| self.local_ticks_abs(u.id))
            .max()
            .unwrap_or_else(|| self.clock.ticks_abs())
    }

    /// Calendar date for a unit, or for the world when `unit_id` is None.
    pub fn calendar_date(&self, registry: &dyn UnitRegistry, unit_id: Option<UnitId>) -> CalendarDate {
        let abs = match unit_id {
            Some(id) => self.local_ticks_abs(id),
            None     => self.world_ticks_abs(registry),
        };
        CalendarDate::from_abs_ticks(abs)
    }

    /// Adjust a seasonal lookup for `location`. A query about the present
    /// for a tile hosting a live unit is shifted back by that unit's
    /// suspended time; any other query passes through.
    pub fn seasonal_tick_for(&self, registry: &dyn UnitRegistry, location: LocationKey, abs_tick: Tick) -> Tick {
        if !self.config.local_time || self.clock.ticks_abs().abs_diff(abs_tick) >= SEASONAL_NOW_WINDOW {
            return abs_tick;
        }
        let Some(unit) = registry
            .units()
            .into_iter()
            .filter(|u| u.location_key == location)
            .min_by_key(|u| u.id)
        else {
            return abs_tick;
        };
        abs_tick.saturating_sub(self.ledger.suspended_total(unit.id, self.clock.current_tick))
    }

    // ── Persistence ────────────────────────────────────────────────

    /// Persist the durable state under `session_id`.
    pub fn save(&self, store: &GateStore, session_id: &str) -> GateResult<()> {
        store.save_clock(session_id, &self.clock)?;
        store.save_config(session_id, &self.config)?;
        store.save_ledger(session_id, &self.ledger)?;
        store.save_overrides(session_id, &self.overrides)?;
        log::debug!(
            "session {session_id} saved: {} pause records, {} overrides",
            self.ledger.len(),
            self.overrides.len()
        );
        Ok(())
    }

    /// Rebuild a gate from a saved session. The host scheduler is assumed
    /// fresh: units recorded as suspended are removed again on the first
    /// reconcile, without their suspend intervals being restarted.
    pub fn restore(store: &GateStore, session_id: &str, counterparts: Counterparts) -> GateResult<Self> {
        if !store.session_exists(session_id)? {
            return Err(GateError::SessionNotInitialized { session_id: session_id.to_string() });
        }
        let config = store.load_config(session_id)?;
        let clock = store.load_clock(session_id)?;
        let mut gate = Self::new(config, counterparts).with_clock(clock);
        gate.ledger = store.load_ledger(session_id)?;
        gate.overrides = store.load_overrides(session_id)?;
        Ok(gate)
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Whether the clock crossed a sweep boundary since `previous` (or
    /// since the last sweep, once one has run).
    fn sweep_due(&self, previous: Tick) -> bool {
        let interval = self.config.sweep_interval;
        let now = self.clock.current_tick;
        match self.last_sweep {
            Some(last) => now / interval > last / interval,
            None => now.is_multiple_of(interval) || now / interval > previous / interval,
        }
    }

    fn ensure_grouping(&mut self, registry: &dyn UnitRegistry, units: &[Unit]) {
        if self.stale || !self.grouping.covers(units) {
            self.grouping = hierarchy::resolve(units, registry, &self.counterparts);
            self.stale = false;
        }
    }

    fn decision_context<'a>(&'a self, registry: &'a dyn UnitRegistry) -> DecisionContext<'a> {
        DecisionContext::new(self.observer, &self.grouping, &self.overrides, &self.config, registry)
    }

    fn refresh_cache(&mut self, registry: &dyn UnitRegistry) {
        let tick = self.clock.current_tick;
        if self.cache.is_fresh(tick) {
            return;
        }
        let units = registry.units();
        self.ensure_grouping(registry, &units);
        let values: Vec<(UnitId, bool)> = {
            let ctx = self.decision_context(registry);
            units.iter().map(|u| (u.id, decide(u, &ctx).is_active())).collect()
        };
        self.cache.repopulate(tick, values);
    }

    /// Decide and apply for each unit. Returns (events, active, suspended).
    fn reconcile_units(
        &mut self,
        units: &[Unit],
        registry: &dyn UnitRegistry,
        scheduler: &mut dyn SchedulerBinding,
    ) -> (Vec<GateEvent>, usize, usize) {
        self.ensure_grouping(registry, units);
        let desired: Vec<Classification> = {
            let ctx = self.decision_context(registry);
            units.iter().map(|u| decide(u, &ctx)).collect()
        };

        let tick = self.clock.current_tick;
        let mut events = Vec::new();
        for (unit, classification) in units.iter().zip(&desired) {
            events.extend(
                self.transitions
                    .reconcile(unit, *classification, tick, &mut self.ledger, scheduler),
            );
        }

        let active = desired.iter().filter(|c| c.is_active()).count();
        (events, active, desired.len() - active)
    }
}

/// Owned units, and sub-layers of owned sources, drive world time.
fn contributes_to_world_time(unit: &Unit, registry: &dyn UnitRegistry) -> bool {
    if unit.owner_is_observer {
        return true;
    }
    unit.kind == UnitKind::SubLayer
        && registry
            .source_of(unit.id)
            .and_then(|id| registry.unit(id))
            .is_some_and(|source| source.owner_is_observer)
}
