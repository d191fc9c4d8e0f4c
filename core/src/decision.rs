//! Gate decision function: Active or Suspended for one unit.
//!
//! Rules, evaluated in order:
//!   0. Gate disabled: every unit is Active.
//!   1. The unit the observer occupies is Active.
//!   2. Excluded units, and units whose category has auto-gating off,
//!      follow their override flag (category default when unset).
//!   3. Sync mode (sub-layer auto-gate plus sync): a sub-layer mirrors its source; any other
//!      grouped unit is Active iff the observer is inside one of its
//!      linked sub-layers.
//!   4. Auto-gate without sync: Active only at the exact unit, so
//!      anything that reached this rule is Suspended.
//!
//! The function is pure given its inputs.

use crate::{
    config::{GateConfig, SubLayerMode},
    hierarchy::Grouping,
    host::UnitRegistry,
    overrides::{OverrideKey, OverrideStore},
    types::{Classification, ObserverFocus, Unit, UnitId, UnitKind},
};

/// Everything `decide` reads, gathered once per resolution pass.
pub struct DecisionContext<'a> {
    pub observer:        Option<ObserverFocus>,
    /// Live source of the sub-layer the observer is inside, if any.
    pub observed_source: Option<UnitId>,
    pub grouping:        &'a Grouping,
    pub overrides:       &'a OverrideStore,
    pub config:          &'a GateConfig,
    pub registry:        &'a dyn UnitRegistry,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        observer:  Option<ObserverFocus>,
        grouping:  &'a Grouping,
        overrides: &'a OverrideStore,
        config:    &'a GateConfig,
        registry:  &'a dyn UnitRegistry,
    ) -> Self {
        let observed_source = observer
            .and_then(|o| registry.unit(o.unit_id))
            .filter(|u| u.kind == UnitKind::SubLayer)
            .and_then(|u| live_source(&u, registry))
            .map(|source| source.id);
        Self {
            observer,
            observed_source,
            grouping,
            overrides,
            config,
            registry,
        }
    }

    /// Whether the observer currently occupies `unit`.
    pub fn occupies(&self, unit: &Unit) -> bool {
        self.observer
            .is_some_and(|o| o.unit_id == unit.id || o.location_key == unit.location_key)
    }
}

pub fn decide(unit: &Unit, ctx: &DecisionContext<'_>) -> Classification {
    if !ctx.config.enabled {
        return Classification::Active;
    }

    // Rule 1
    if ctx.occupies(unit) {
        return Classification::Active;
    }

    let category = unit.category();

    // Rules 2 and 5
    if ctx.grouping.is_excluded(unit) || !ctx.config.auto_gate(category) {
        let key = OverrideKey::for_unit(unit);
        let paused = ctx.overrides.forced_paused(key, ctx.config.default_paused(category));
        return Classification::from_paused(paused);
    }

    // Rule 3
    if ctx.config.sub_layer_mode() == SubLayerMode::Sync {
        let active = match unit.kind {
            UnitKind::SubLayer => live_source(unit, ctx.registry)
                .is_some_and(|source| decide(&source, ctx).is_active()),
            _ => ctx.observed_source == Some(unit.id),
        };
        return Classification::from_paused(!active);
    }

    // Rule 4
    Classification::Suspended
}

/// The live source of a sub-layer. A source that is itself a sub-layer
/// is ignored so the recursion in `decide` stays one level deep.
fn live_source(unit: &Unit, registry: &dyn UnitRegistry) -> Option<Unit> {
    registry
        .source_of(unit.id)
        .and_then(|id| registry.unit(id))
        .filter(|source| source.kind != UnitKind::SubLayer)
}
