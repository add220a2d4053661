//! `sim` — Headless race driving: track layouts, autopilot, scenarios, replay.

pub mod driver;
pub mod layout;
pub mod replay;
pub mod runner;
pub mod scenarios;

pub use driver::{Autopilot, DriverConfig};
pub use layout::TrackLayout;
pub use replay::{load_replay, replay, save_replay, ReplayLog, ReplayReport};
pub use runner::{run, RunResult};
pub use scenarios::{Scenario, ScenarioKind};
