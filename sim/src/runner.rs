//! Headless race runner: drives a scenario with its autopilot until the race
//! finishes or the tick limit is hit.

use crate::{replay::ReplayLog, scenarios::Scenario};
use race_core::{RaceMetrics, RacePhase};
use serde::Serialize;

/// Summary of one run.
#[derive(Clone, Debug, Serialize)]
pub struct RunResult {
    pub scenario: String,
    pub seed: u64,
    pub ticks: u64,
    pub phase: RacePhase,
    pub metrics: RaceMetrics,
    #[serde(skip)]
    pub replay: Option<ReplayLog>,
}

/// Run `scenario` to completion. With `record`, every tick's controls and
/// vehicle snapshot are kept for replay.
pub fn run(scenario: &Scenario, record: bool) -> anyhow::Result<RunResult> {
    let mut sim = scenario.simulation()?;
    let mut pilot = scenario.autopilot();
    let mut metrics = RaceMetrics::default();
    let mut log = record.then(|| {
        ReplayLog::new(
            scenario.name.clone(),
            scenario.seed,
            scenario.layout,
            scenario.config.clone(),
        )
    });

    tracing::info!(scenario = %scenario.name, seed = scenario.seed, "run start");

    while sim.tick() < scenario.max_ticks {
        let controls = pilot.controls(sim.track(), sim.vehicle());
        let Some(out) = sim.step(&controls) else {
            break;
        };
        metrics.record(&out);
        if let Some(log) = log.as_mut() {
            log.push(controls, &out);
        }
    }

    tracing::info!(
        scenario = %scenario.name,
        ticks = sim.tick(),
        laps = metrics.laps_completed(),
        phase = ?sim.phase(),
        "run end"
    );

    Ok(RunResult {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        ticks: sim.tick(),
        phase: sim.phase(),
        metrics,
        replay: log,
    })
}
