//! Scenario definitions.
//!
//! Each scenario is a named track layout, race configuration and autopilot.
//! All scenarios are deterministic given the same seed.

use crate::{
    driver::{Autopilot, DriverConfig},
    layout::TrackLayout,
};
use race_core::{CaptureOrder, SimConfig, Simulation, TrackError};
use serde::{Deserialize, Serialize};

/// Which pre-defined scenario to load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// Full 3-lap race on the circuit, driver makes occasional mistakes
    Circuit,
    /// 3 laps on the flat oval
    Oval,
    /// Single clean lap on the oval, checkpoints in order
    Sprint,
}

/// A fully configured race.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub layout: TrackLayout,
    pub config: SimConfig,
    pub driver: DriverConfig,
    /// Hard stop if the race has not finished by then
    pub max_ticks: u64,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        let mut scenario = match kind {
            ScenarioKind::Circuit => Self::circuit(seed),
            ScenarioKind::Oval => Self::oval(seed),
            ScenarioKind::Sprint => Self::sprint(seed),
        };
        scenario.config.camera.seed = seed;
        scenario
    }

    /// Replace the race configuration, keeping the scenario's seed.
    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self.config.camera.seed = self.seed;
        self
    }

    pub fn simulation(&self) -> Result<Simulation, TrackError> {
        Simulation::from_points(self.layout.points(), self.config.clone())
    }

    pub fn autopilot(&self) -> Autopilot {
        Autopilot::new(self.driver.clone(), self.seed)
    }

    fn circuit(seed: u64) -> Self {
        Self {
            name: "circuit".into(),
            seed,
            layout: TrackLayout::Circuit,
            config: SimConfig::default(),
            driver: DriverConfig {
                mistake_rate: 0.005,
                ..Default::default()
            },
            max_ticks: 15_000,
        }
    }

    fn oval(seed: u64) -> Self {
        Self {
            name: "oval".into(),
            seed,
            layout: TrackLayout::Oval,
            config: SimConfig::default(),
            driver: DriverConfig {
                mistake_rate: 0.002,
                ..Default::default()
            },
            max_ticks: 12_000,
        }
    }

    fn sprint(seed: u64) -> Self {
        let mut config = SimConfig::default();
        config.lap.total_laps = 1;
        config.lap.capture_order = CaptureOrder::Sequential;
        Self {
            name: "sprint".into(),
            seed,
            layout: TrackLayout::Oval,
            config,
            driver: DriverConfig::default(),
            max_ticks: 5_000,
        }
    }
}
