//! `sim` — Deterministic event simulator: particles, candidate tracks, event logs.

pub mod event;
pub mod particle_gen;
pub mod scenarios;

pub use event::{load_events, save_events, Event, EventLog};
pub use particle_gen::{EventGenerator, GenParams};
pub use scenarios::{Scenario, ScenarioKind};
