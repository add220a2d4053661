//! Scripted camera transitions: eased interpolation over wall-clock time.

use crate::types::{lerp_vec, Vec3};
use std::time::{Duration, Instant};

/// Cubic ease-in-out on [0, 1].
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// One in-flight transition from a start pose to an explicit target pose.
#[derive(Clone, Debug)]
pub struct CameraTransition {
    pub from_position: Vec3,
    pub from_look_at: Vec3,
    pub to_position: Vec3,
    pub to_look_at: Vec3,
    pub duration: Duration,
    pub started_at: Instant,
}

impl CameraTransition {
    /// Linear progress in [0, 1]; a zero duration is immediately complete.
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Eased `(position, look_at)` at `now`, plus the linear progress.
    pub fn sample(&self, now: Instant) -> (Vec3, Vec3, f64) {
        let p = self.progress(now);
        let e = ease_in_out_cubic(p);
        (
            lerp_vec(&self.from_position, &self.to_position, e),
            lerp_vec(&self.from_look_at, &self.to_look_at, e),
            p,
        )
    }
}
