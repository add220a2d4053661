//! Replay: record the per-tick controls of a run, save/load them as JSON, and
//! re-simulate to check the run reproduces.

use crate::layout::TrackLayout;
use anyhow::Context;
use race_core::{
    ControlSignal, RaceMetrics, SimConfig, Simulation, TickOutput, Vec3,
};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A full recorded run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayLog {
    pub scenario_name: String,
    pub seed: u64,
    pub layout: TrackLayout,
    pub config: SimConfig,
    /// Controls fed on each advanced tick, in order
    pub controls: Vec<ControlSignal>,
    /// Vehicle snapshot after each advanced tick
    pub frames: Vec<ReplayFrame>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub tick: u64,
    pub time: f64,
    pub position: Vec3,
    pub yaw: f64,
    pub speed: f64,
    pub collided: bool,
}

impl ReplayFrame {
    pub fn from_output(out: &TickOutput) -> Self {
        Self {
            tick: out.tick,
            time: out.time,
            position: out.vehicle.position,
            yaw: out.vehicle.yaw,
            speed: out.vehicle.speed(),
            collided: out.collided,
        }
    }
}

impl ReplayLog {
    pub fn new(scenario_name: impl Into<String>, seed: u64, layout: TrackLayout, config: SimConfig) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            seed,
            layout,
            config,
            controls: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Append one advanced tick.
    pub fn push(&mut self, controls: ControlSignal, out: &TickOutput) {
        self.controls.push(controls);
        self.frames.push(ReplayFrame::from_output(out));
    }
}

/// Outcome of re-simulating a log.
#[derive(Clone, Debug, Serialize)]
pub struct ReplayReport {
    /// Ticks re-simulated
    pub ticks: u64,
    /// Largest position mismatch against the recorded frames
    pub max_position_error: f64,
    /// First tick whose mismatch exceeded the tolerance
    pub first_divergence: Option<u64>,
    pub metrics: RaceMetrics,
}

impl ReplayReport {
    pub fn reproduced(&self) -> bool {
        self.first_divergence.is_none()
    }
}

/// Re-simulate `log` from its layout and configuration and compare each
/// tick against the recorded frame.
pub fn replay(log: &ReplayLog, tolerance: f64) -> anyhow::Result<ReplayReport> {
    let mut sim = Simulation::from_points(log.layout.points(), log.config.clone())
        .context("replay track rejected")?;
    let mut report = ReplayReport {
        ticks: 0,
        max_position_error: 0.0,
        first_divergence: None,
        metrics: RaceMetrics::default(),
    };

    for (controls, frame) in log.controls.iter().zip(&log.frames) {
        let Some(out) = sim.step(controls) else {
            tracing::warn!(tick = frame.tick, "replay ended before the log");
            report.first_divergence.get_or_insert(frame.tick);
            break;
        };
        report.ticks += 1;
        report.metrics.record(&out);
        let err = (out.vehicle.position - frame.position).norm();
        report.max_position_error = report.max_position_error.max(err);
        if err > tolerance && report.first_divergence.is_none() {
            tracing::warn!(tick = out.tick, err, "replay diverged");
            report.first_divergence = Some(out.tick);
        }
    }
    Ok(report)
}

/// Save a replay log to a JSON file.
pub fn save_replay(log: &ReplayLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, log)?;
    Ok(())
}

/// Load a replay log from a JSON file.
pub fn load_replay(path: &Path) -> anyhow::Result<ReplayLog> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let log: ReplayLog = serde_json::from_reader(reader)?;
    Ok(log)
}
