//! tickgate: selective simulation gating for tick-driven hosts.
//!
//! Decides, per global tick, which simulation units advance and which
//! stay suspended, and keeps per-unit time honest across suspensions.

pub mod aspect;
pub mod cache;
pub mod clock;
pub mod config;
pub mod decision;
pub mod error;
pub mod event;
pub mod gate;
pub mod hierarchy;
pub mod host;
pub mod ledger;
pub mod overrides;
pub mod store;
pub mod transition;
pub mod types;
pub mod world;

pub use gate::SimulationGate;
