//! Race metrics: lap times, collisions, speed statistics.

use crate::{lap::RaceEvent, simulation::TickOutput};
use serde::{Deserialize, Serialize};

/// Accumulated statistics over a run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RaceMetrics {
    /// Ticks recorded
    pub ticks: u64,
    /// Completed lap durations (s)
    pub lap_times: Vec<f64>,
    /// Checkpoint captures across all laps
    pub checkpoints_passed: u64,
    /// Ticks with at least one barrier contact
    pub collision_ticks: u64,
    /// Highest |v| seen (units per tick)
    pub top_speed: f64,
    /// Sum of |v| over all ticks (for the mean)
    pub sum_speed: f64,
    /// Set once the race finishes
    pub total_time: Option<f64>,
}

impl RaceMetrics {
    /// Accumulate one tick.
    pub fn record(&mut self, out: &TickOutput) {
        self.ticks += 1;
        let speed = out.vehicle.speed();
        self.sum_speed += speed;
        self.top_speed = self.top_speed.max(speed);
        if out.collided {
            self.collision_ticks += 1;
        }
        for event in &out.events {
            match *event {
                RaceEvent::CheckpointPassed { .. } => self.checkpoints_passed += 1,
                RaceEvent::LapCompleted { duration, .. } => self.lap_times.push(duration),
                RaceEvent::RaceFinished { total_time } => self.total_time = Some(total_time),
            }
        }
    }

    pub fn laps_completed(&self) -> usize {
        self.lap_times.len()
    }

    pub fn best_lap(&self) -> Option<f64> {
        self.lap_times.iter().copied().reduce(f64::min)
    }

    pub fn mean_speed(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        self.sum_speed / self.ticks as f64
    }

    /// Fraction of ticks spent touching a barrier.
    pub fn collision_rate(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        self.collision_ticks as f64 / self.ticks as f64
    }

    pub fn is_finished(&self) -> bool {
        self.total_time.is_some()
    }
}
