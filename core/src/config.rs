//! Gate configuration: a small set of named toggles.
//!
//! RULE: The gate reads configuration once per resolution pass and never
//! mutates it. Writers (settings screens, the runner, tests) replace it
//! through `SimulationGate::update_config`.

use crate::types::{Category, Tick};
use serde::{Deserialize, Serialize};

/// Default cadence of the coarse reconciliation sweep, in global ticks.
pub const DEFAULT_SWEEP_INTERVAL: Tick = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    /// Master switch. When off, every unit is simulated.
    pub enabled: bool,
    pub auto_gate_settlements: bool,
    #[serde(alias = "pause_sub_layers_when_away")]
    pub auto_gate_sub_layers: bool,
    pub sync_sub_layers: bool,
    pub local_time: bool,
    pub default_settlement_paused: bool,
    pub default_sub_layer_paused: bool,
    pub sweep_interval: Tick,

    // Fine-grained aspect toggles. A disabled toggle lets that aspect
    // run on suspended units too.
    pub pause_jobs: bool,
    pub pause_health: bool,
    pub pause_weather: bool,
    pub pause_mental_state: bool,
    pub pause_ageing: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled:                   true,
            auto_gate_settlements:     true,
            auto_gate_sub_layers:      true,
            sync_sub_layers:           false,
            local_time:                false,
            default_settlement_paused: false,
            default_sub_layer_paused:  false,
            sweep_interval:            DEFAULT_SWEEP_INTERVAL,
            pause_jobs:                true,
            pause_health:              true,
            pause_weather:             true,
            pause_mental_state:        true,
            pause_ageing:              true,
        }
    }
}

/// The mutually exclusive sub-layer policies a settings screen offers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubLayerMode {
    /// No automatic gating of sub-layers.
    Off,
    /// Auto-gate; a sub-layer runs only while the observer is inside it.
    Strict,
    /// Auto-gate; a sub-layer mirrors its source unit.
    Sync,
}

impl GateConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GateConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config.normalized())
    }

    /// Config for unit tests: auto-gate on everywhere, sync off, local
    /// time on so the ledger accessors are observable.
    pub fn default_test() -> Self {
        Self { local_time: true, ..Self::default() }
    }

    /// Clamp values a hand-edited file could get wrong.
    pub fn normalized(mut self) -> Self {
        if self.sweep_interval == 0 {
            log::warn!("sweep_interval of 0 is invalid; using {DEFAULT_SWEEP_INTERVAL}");
            self.sweep_interval = DEFAULT_SWEEP_INTERVAL;
        }
        self
    }

    pub fn auto_gate(&self, category: Category) -> bool {
        match category {
            Category::Settlement => self.auto_gate_settlements,
            Category::SubLayer   => self.auto_gate_sub_layers,
        }
    }

    pub fn default_paused(&self, category: Category) -> bool {
        match category {
            Category::Settlement => self.default_settlement_paused,
            Category::SubLayer   => self.default_sub_layer_paused,
        }
    }

    /// Whether any category is under automatic control.
    pub fn any_auto_gate(&self) -> bool {
        self.auto_gate_settlements || self.auto_gate_sub_layers
    }

    pub fn sub_layer_mode(&self) -> SubLayerMode {
        // Sync without auto-gating has no effect on sub-layers.
        match (self.auto_gate_sub_layers, self.sync_sub_layers) {
            (false, _)    => SubLayerMode::Off,
            (true, true)  => SubLayerMode::Sync,
            (true, false) => SubLayerMode::Strict,
        }
    }

    pub fn set_sub_layer_mode(&mut self, mode: SubLayerMode) {
        let (auto, sync) = match mode {
            SubLayerMode::Off    => (false, false),
            SubLayerMode::Strict => (true, false),
            SubLayerMode::Sync   => (true, true),
        };
        self.auto_gate_sub_layers = auto;
        self.sync_sub_layers = sync;
    }

    /// True when moving from `self` to `next` turns automatic control
    /// off somewhere (or disables the gate outright). Such a change
    /// force-resumes every suspended unit.
    pub fn disables_gating(&self, next: &GateConfig) -> bool {
        (self.enabled && !next.enabled)
            || (self.auto_gate_settlements && !next.auto_gate_settlements)
            || (self.auto_gate_sub_layers && !next.auto_gate_sub_layers)
    }

    /// True when moving from `self` to `next` turns automatic control
    /// back on somewhere.
    pub fn enables_gating(&self, next: &GateConfig) -> bool {
        (!self.enabled && next.enabled && next.any_auto_gate())
            || (!self.auto_gate_settlements && next.auto_gate_settlements)
            || (!self.auto_gate_sub_layers && next.auto_gate_sub_layers)
    }
}
