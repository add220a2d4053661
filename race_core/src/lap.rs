//! Lap progression: checkpoint capture, finish-line detection, lap timing.
//!
//! # Policy
//! - **Capture**: each tick at most one checkpoint moves `Unpassed → Passed`,
//!   the first one (in index order) within the capture radius.
//!   With [`CaptureOrder::Sequential`] only the lowest-index unpassed
//!   checkpoint is eligible.
//! - **Lap**: vehicle within the capture radius of the finish line while
//!   every checkpoint is passed. The lap time is recorded, checkpoints reset
//!   and the lap counter advances.
//! - **Finish**: once the counter exceeds the configured total the race is
//!   finished and timing stops; later updates emit nothing.

use crate::{track::TrackGeometry, types::Vec3};
use serde::{Deserialize, Serialize};

/// Which checkpoints may be captured on a given tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureOrder {
    /// Any unpassed checkpoint in range
    #[default]
    Any,
    /// Only the next checkpoint in index order
    Sequential,
}

/// Configuration for lap progression.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LapConfig {
    pub total_laps: u32,
    /// Checkpoint/finish detection radius (world units)
    pub capture_radius: f64,
    pub capture_order: CaptureOrder,
    /// Delay before a captured checkpoint's highlight should revert (s)
    pub flash_duration: f64,
}

impl Default for LapConfig {
    fn default() -> Self {
        Self {
            total_laps: 3,
            capture_radius: 5.0,
            capture_order: CaptureOrder::Any,
            flash_duration: 1.0,
        }
    }
}

/// Presentation hint: highlight checkpoint `checkpoint_index` until
/// `revert_at` (simulation seconds).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointFlash {
    pub checkpoint_index: usize,
    pub revert_at: f64,
}

/// Progression events emitted by [`LapProgressionTracker::update`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum RaceEvent {
    CheckpointPassed { index: usize, flash: CheckpointFlash },
    /// `lap` is the number of the lap just completed (1-based)
    LapCompleted { lap: u32, duration: f64 },
    RaceFinished { total_time: f64 },
}

/// Timing record for one race.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LapSession {
    /// 1-based; exceeds `total_laps` once the race is finished
    pub current_lap: u32,
    pub total_laps: u32,
    /// Completed lap durations in order (s)
    pub lap_times: Vec<f64>,
    pub lap_start: f64,
    pub race_start: f64,
    pub finished_at: Option<f64>,
}

impl LapSession {
    pub fn new(total_laps: u32, now: f64) -> Self {
        Self {
            current_lap: 1,
            total_laps,
            lap_times: Vec::new(),
            lap_start: now,
            race_start: now,
            finished_at: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Time into the current lap. Once finished, frozen at the final
    /// lap's duration.
    pub fn current_lap_time(&self, now: f64) -> f64 {
        match self.finished_at {
            Some(_) => self.lap_times.last().copied().unwrap_or(0.0),
            None => now - self.lap_start,
        }
    }

    /// Total race time, frozen once finished.
    pub fn elapsed(&self, now: f64) -> f64 {
        self.finished_at.unwrap_or(now) - self.race_start
    }

    pub fn best_lap(&self) -> Option<f64> {
        self.lap_times.iter().copied().reduce(f64::min)
    }
}

/// Checkpoint/finish state machine.
#[derive(Clone, Debug)]
pub struct LapProgressionTracker {
    pub config: LapConfig,
    session: LapSession,
}

impl LapProgressionTracker {
    pub fn new(config: LapConfig, now: f64) -> Self {
        let session = LapSession::new(config.total_laps, now);
        Self { config, session }
    }

    pub fn session(&self) -> &LapSession {
        &self.session
    }

    /// Start a fresh session and clear every checkpoint.
    pub fn restart(&mut self, track: &mut TrackGeometry, now: f64) {
        track.reset_checkpoints();
        self.session = LapSession::new(self.config.total_laps, now);
    }

    /// Index of the checkpoint captured at `position` this tick, if any.
    fn capture_candidate(&self, track: &TrackGeometry, position: &Vec3) -> Option<usize> {
        let r = self.config.capture_radius;
        let mut unpassed = track.checkpoints().iter().filter(|cp| !cp.is_passed());
        match self.config.capture_order {
            CaptureOrder::Any => unpassed
                .find(|cp| (cp.position - position).norm() < r)
                .map(|cp| cp.index),
            CaptureOrder::Sequential => unpassed
                .next()
                .filter(|cp| (cp.position - position).norm() < r)
                .map(|cp| cp.index),
        }
    }

    /// Run one tick of progression for the vehicle at `position`.
    pub fn update(&mut self, track: &mut TrackGeometry, position: &Vec3, now: f64) -> Vec<RaceEvent> {
        let mut events = Vec::new();
        if self.session.is_finished() {
            return events;
        }

        if let Some(index) = self.capture_candidate(track, position) {
            track.mark_passed(index);
            tracing::debug!(index, passed = track.passed_count(), "checkpoint passed");
            events.push(RaceEvent::CheckpointPassed {
                index,
                flash: CheckpointFlash {
                    checkpoint_index: index,
                    revert_at: now + self.config.flash_duration,
                },
            });
        }

        let at_finish = (track.finish_line() - position).norm() < self.config.capture_radius;
        if at_finish && track.all_checkpoints_passed() {
            self.complete_lap(track, now, &mut events);
        }

        events
    }

    fn complete_lap(&mut self, track: &mut TrackGeometry, now: f64, events: &mut Vec<RaceEvent>) {
        let s = &mut self.session;
        let duration = now - s.lap_start;
        let lap = s.current_lap;
        s.lap_times.push(duration);
        track.reset_checkpoints();
        s.current_lap += 1;
        tracing::info!(lap, duration, "lap completed");
        events.push(RaceEvent::LapCompleted { lap, duration });

        if s.current_lap > s.total_laps {
            s.finished_at = Some(now);
            let total_time = now - s.race_start;
            tracing::info!(total_time, laps = s.lap_times.len(), "race finished");
            events.push(RaceEvent::RaceFinished { total_time });
        } else {
            s.lap_start = now;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::tests::ring;
    use approx::assert_abs_diff_eq;

    fn setup(total_laps: u32, order: CaptureOrder) -> (TrackGeometry, LapProgressionTracker) {
        let track = TrackGeometry::new(ring(32, 40.0), 8.0, 8).unwrap();
        let cfg = LapConfig {
            total_laps,
            capture_order: order,
            ..Default::default()
        };
        (track, LapProgressionTracker::new(cfg, 0.0))
    }

    fn cp_pos(track: &TrackGeometry, i: usize) -> Vec3 {
        track.checkpoints()[i].position + Vec3::new(0.0, 0.5, 1.0)
    }

    fn laps_in(events: &[RaceEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, RaceEvent::LapCompleted { .. }))
            .count()
    }

    #[test]
    fn out_of_order_visits_complete_one_lap() {
        let (mut track, mut lap) = setup(3, CaptureOrder::Any);
        let mut t = 0.0;
        let mut all = Vec::new();
        for i in [5, 2, 7, 0, 3, 6, 1, 4] {
            t += 1.0;
            let p = cp_pos(&track, i);
            let ev = lap.update(&mut track, &p, t);
            assert!(matches!(ev[0], RaceEvent::CheckpointPassed { index, .. } if index == i));
            all.extend(ev);
        }
        assert_eq!(laps_in(&all), 0, "checkpoint 0 visit alone must not finish");
        assert!(track.all_checkpoints_passed());

        t += 1.0;
        let finish = track.finish_line();
        let ev = lap.update(&mut track, &finish, t);
        assert_eq!(laps_in(&ev), 1);
        assert_eq!(track.passed_count(), 0, "all checkpoints reset after lap");
        assert_eq!(lap.session().current_lap, 2);
        assert_abs_diff_eq!(lap.session().lap_times[0], 9.0, epsilon = 1e-12);

        // Lingering on the line only recaptures checkpoint 0.
        let ev = lap.update(&mut track, &finish, t + 1.0);
        assert_eq!(laps_in(&ev), 0);
        assert_eq!(track.passed_count(), 1);
    }

    #[test]
    fn one_capture_per_tick() {
        let (mut track, mut lap) = setup(3, CaptureOrder::Any);
        let p = cp_pos(&track, 3);
        let ev = lap.update(&mut track, &p, 1.0);
        assert_eq!(ev.len(), 1);
        let ev = lap.update(&mut track, &p, 2.0);
        assert!(ev.is_empty(), "passed checkpoint is not recaptured");
    }

    #[test]
    fn sequential_order_rejects_skips() {
        let (mut track, mut lap) = setup(3, CaptureOrder::Sequential);
        let p = cp_pos(&track, 2);
        assert!(lap.update(&mut track, &p, 1.0).is_empty());
        let p0 = cp_pos(&track, 0);
        assert_eq!(lap.update(&mut track, &p0, 2.0).len(), 1);
        let p1 = cp_pos(&track, 1);
        assert_eq!(lap.update(&mut track, &p1, 3.0).len(), 1);
    }

    #[test]
    fn race_finishes_after_total_laps() {
        let (mut track, mut lap) = setup(2, CaptureOrder::Any);
        let mut t = 0.0;
        let mut prev_lap = lap.session().current_lap;
        let mut finished = None;
        for _ in 0..2 {
            for i in 1..8 {
                t += 1.0;
                let p = cp_pos(&track, i);
                lap.update(&mut track, &p, t);
            }
            // Touching the line captures checkpoint 0 and completes the lap
            // in the same tick.
            assert_abs_diff_eq!(lap.session().current_lap_time(t + 0.5), 7.5, epsilon = 1e-12);
            t += 1.0;
            let finish = track.finish_line();
            for e in lap.update(&mut track, &finish, t) {
                if let RaceEvent::RaceFinished { total_time } = e {
                    finished = Some(total_time);
                }
            }
            assert_eq!(lap.session().current_lap, prev_lap + 1);
            prev_lap = lap.session().current_lap;
        }
        assert_eq!(finished, Some(t));
        assert!(lap.session().is_finished());
        assert_eq!(lap.session().lap_times.len(), 2);
        assert_abs_diff_eq!(lap.session().elapsed(t + 50.0), t, epsilon = 1e-12);
        assert_abs_diff_eq!(lap.session().current_lap_time(t + 50.0), 8.0, epsilon = 1e-12);

        // Nothing happens after the race is over.
        let p = cp_pos(&track, 4);
        assert!(lap.update(&mut track, &p, t + 1.0).is_empty());
    }

    #[test]
    fn flash_descriptor_reverts_after_duration() {
        let (mut track, mut lap) = setup(3, CaptureOrder::Any);
        let p = cp_pos(&track, 6);
        let ev = lap.update(&mut track, &p, 10.0);
        match ev[0] {
            RaceEvent::CheckpointPassed { flash, .. } => {
                assert_eq!(flash.checkpoint_index, 6);
                assert_abs_diff_eq!(flash.revert_at, 11.0, epsilon = 1e-12);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
