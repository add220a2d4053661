//! Autopilot: pure-pursuit steering along the track centreline.
//!
//! Each tick the driver projects the vehicle onto the centreline segment
//! leaving its nearest point, walks `look_ahead` units further along the
//! ring and steers toward that point. Heading errors inside the deadband
//! hold the wheel straight; large errors at speed brake instead of
//! accelerating. A seeded "mistake" occasionally lifts off the throttle for
//! a few ticks so that runs with different seeds differ.

use race_core::{
    types::{wrap_angle, Vec3},
    ControlSignal, TrackGeometry, VehicleState,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Distance along the centreline to the pursuit point (world units)
    pub look_ahead: f64,
    /// Heading error treated as straight ahead (rad)
    pub steer_deadband: f64,
    /// Heading error above which the driver brakes (rad)
    pub brake_angle: f64,
    /// No braking below this speed (units per tick)
    pub brake_min_speed: f64,
    /// Per-tick probability of starting a throttle lift
    pub mistake_rate: f64,
    /// Length of a throttle lift (ticks)
    pub mistake_ticks: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            look_ahead: 8.0,
            steer_deadband: 0.05,
            brake_angle: 0.6,
            brake_min_speed: 0.15,
            mistake_rate: 0.0,
            mistake_ticks: 20,
        }
    }
}

/// Seeded autopilot.
#[derive(Clone, Debug)]
pub struct Autopilot {
    pub config: DriverConfig,
    rng: ChaCha8Rng,
    lift_remaining: u32,
}

impl Autopilot {
    pub fn new(config: DriverConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            lift_remaining: 0,
        }
    }

    /// Controls for this tick.
    pub fn controls(&mut self, track: &TrackGeometry, vehicle: &VehicleState) -> ControlSignal {
        let cfg = &self.config;
        let target = pursuit_point(track, &vehicle.position, cfg.look_ahead);
        let to_target = target - vehicle.position;
        let desired_yaw = to_target.x.atan2(to_target.z);
        let err = wrap_angle(desired_yaw - vehicle.yaw);

        let braking = err.abs() > cfg.brake_angle && vehicle.speed() > cfg.brake_min_speed;

        if self.lift_remaining > 0 {
            self.lift_remaining -= 1;
        } else if cfg.mistake_rate > 0.0 && self.rng.gen::<f64>() < cfg.mistake_rate {
            self.lift_remaining = cfg.mistake_ticks;
        }
        let lifting = self.lift_remaining > 0;

        ControlSignal {
            throttle: !braking && !lifting,
            brake: braking,
            steer_left: err > cfg.steer_deadband,
            steer_right: err < -cfg.steer_deadband,
            handbrake: false,
        }
    }
}

/// Point `look_ahead` units along the centreline from the vehicle's
/// projection onto the segment leaving its nearest point.
pub fn pursuit_point(track: &TrackGeometry, position: &Vec3, look_ahead: f64) -> Vec3 {
    let pts = track.points();
    let n = pts.len();
    let mut seg = track.nearest_point(position);

    let a = pts[seg].position;
    let b = pts[(seg + 1) % n].position;
    let ab = b - a;
    let t = if ab.norm_squared() > 0.0 {
        ((position - a).dot(&ab) / ab.norm_squared()).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut current = a + ab * t;
    let mut remaining = look_ahead;

    for _ in 0..n {
        let next = pts[(seg + 1) % n].position;
        let span = (next - current).norm();
        if remaining <= span {
            if span == 0.0 {
                return current;
            }
            return current + (next - current) * (remaining / span);
        }
        remaining -= span;
        current = next;
        seg = (seg + 1) % n;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TrackLayout;
    use approx::assert_abs_diff_eq;

    fn oval() -> TrackGeometry {
        TrackGeometry::new(TrackLayout::Oval.points(), 8.0, 8).unwrap()
    }

    #[test]
    fn pursuit_point_stays_on_centreline_ahead() {
        let track = oval();
        let p0 = track.points()[0].position;
        let target = pursuit_point(&track, &p0, 4.0);
        // First segment is ~7.8 long, so the target is inside it.
        assert_abs_diff_eq!((target - p0).norm(), 4.0, epsilon = 1e-9);
        assert!(target.z > 0.0, "ahead in index order");

        let far = pursuit_point(&track, &p0, 12.0);
        let p1 = track.points()[1].position;
        assert!((far - p1).norm() < 12.0);
        assert!(far.z > p1.z);
    }

    #[test]
    fn steers_toward_the_ring() {
        let track = oval();
        let mut pilot = Autopilot::new(DriverConfig::default(), 1);
        // At point 0 but facing away from the direction of travel.
        let v = VehicleState::at_rest(track.points()[0].position, std::f64::consts::PI);
        let c = pilot.controls(&track, &v);
        assert!(c.steer_left ^ c.steer_right);
        assert!(!c.brake, "too slow to brake");

        let v = VehicleState::at_rest(track.points()[0].position, track.start_yaw());
        let c = pilot.controls(&track, &v);
        assert!(c.throttle);
    }

    #[test]
    fn mistakes_lift_throttle() {
        let track = oval();
        let cfg = DriverConfig {
            mistake_rate: 1.0,
            mistake_ticks: 3,
            ..Default::default()
        };
        let mut pilot = Autopilot::new(cfg, 9);
        let v = VehicleState::at_rest(track.points()[0].position, track.start_yaw());
        for _ in 0..3 {
            assert!(!pilot.controls(&track, &v).throttle);
        }
    }
}
