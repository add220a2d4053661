//! Track geometry: centreline ring, derived barriers, checkpoints, finish line.
//!
//! # Layout rules
//! - Points form a closed ring; segment `i` runs from point `i` to point
//!   `(i + 1) % n`.
//! - Each point gets two barrier colliders, one either side of the segment
//!   direction, `width / 2 + BARRIER_MARGIN` from the centreline and
//!   `BARRIER_LIFT` above it.
//! - Checkpoint `k` of `m` sits on point `floor(k / m * n)`.
//! - The finish line sits on point 0.

use crate::{
    error::TrackError,
    types::{normalize_or_zero, Vec3},
};
use serde::{Deserialize, Serialize};

/// Distance beyond the track edge at which barriers stand.
pub const BARRIER_MARGIN: f64 = 2.0;
/// Barrier centre height above the track surface.
pub const BARRIER_LIFT: f64 = 1.0;
/// Spawn height above point 0.
pub const START_LIFT: f64 = 1.0;

/// One centreline sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub position: Vec3,
    /// Heading angle assigned by the generator (radians)
    pub heading: f64,
}

impl TrackPoint {
    pub fn new(x: f64, y: f64, z: f64, heading: f64) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            heading,
        }
    }
}

/// Which side of the centreline a barrier stands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarrierSide {
    Outer,
    Inner,
}

/// Static point collider with an effective radius applied by the detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarrierCollider {
    pub position: Vec3,
    pub side: BarrierSide,
    /// Index of the centreline point this barrier was derived from
    pub point_index: usize,
}

/// Lifecycle of a checkpoint within one lap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointState {
    /// Not yet visited this lap
    #[default]
    Unpassed,
    /// Visited; stays passed until the lap completes
    Passed,
}

/// A lap checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub index: usize,
    pub position: Vec3,
    pub state: CheckpointState,
}

impl Checkpoint {
    pub fn is_passed(&self) -> bool {
        self.state == CheckpointState::Passed
    }
}

/// Built once from a generator's centreline; only checkpoint states change
/// afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackGeometry {
    points: Vec<TrackPoint>,
    width: f64,
    barriers: Vec<BarrierCollider>,
    checkpoints: Vec<Checkpoint>,
    finish_line: Vec3,
}

impl TrackGeometry {
    /// Build the geometry and derive barriers, checkpoints and finish line.
    pub fn new(
        points: Vec<TrackPoint>,
        width: f64,
        checkpoint_count: usize,
    ) -> Result<Self, TrackError> {
        if points.len() < 2 {
            return Err(TrackError::TooFewPoints(points.len()));
        }
        if checkpoint_count == 0 {
            return Err(TrackError::NoCheckpoints);
        }
        if !width.is_finite() || width <= 0.0 {
            return Err(TrackError::InvalidWidth(width));
        }

        let n = points.len();
        let offset = width / 2.0 + BARRIER_MARGIN;
        let mut barriers = Vec::with_capacity(n * 2);
        for (i, current) in points.iter().enumerate() {
            let next = &points[(i + 1) % n];
            let dir = normalize_or_zero(&(next.position - current.position));
            let perpendicular = Vec3::new(-dir.z, 0.0, dir.x);
            for (side, sign) in [(BarrierSide::Outer, 1.0), (BarrierSide::Inner, -1.0)] {
                let mut position = current.position + perpendicular * (offset * sign);
                position.y = current.position.y + BARRIER_LIFT;
                barriers.push(BarrierCollider {
                    position,
                    side,
                    point_index: i,
                });
            }
        }

        let checkpoints = (0..checkpoint_count)
            .map(|k| {
                let point_index = (k * n) / checkpoint_count;
                Checkpoint {
                    index: k,
                    position: points[point_index].position,
                    state: CheckpointState::Unpassed,
                }
            })
            .collect();

        let finish_line = points[0].position;

        Ok(Self {
            points,
            width,
            barriers,
            checkpoints,
            finish_line,
        })
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn barriers(&self) -> &[BarrierCollider] {
        &self.barriers
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn finish_line(&self) -> Vec3 {
        self.finish_line
    }

    /// Mark checkpoint `index` as passed. Returns false if it was already
    /// passed or does not exist.
    pub fn mark_passed(&mut self, index: usize) -> bool {
        match self.checkpoints.get_mut(index) {
            Some(cp) if !cp.is_passed() => {
                cp.state = CheckpointState::Passed;
                true
            }
            _ => false,
        }
    }

    /// Return every checkpoint to `Unpassed`. Idempotent.
    pub fn reset_checkpoints(&mut self) {
        for cp in &mut self.checkpoints {
            cp.state = CheckpointState::Unpassed;
        }
    }

    pub fn all_checkpoints_passed(&self) -> bool {
        self.checkpoints.iter().all(Checkpoint::is_passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checkpoints.iter().filter(|c| c.is_passed()).count()
    }

    /// Spawn position: point 0 lifted by `START_LIFT`.
    pub fn start_position(&self) -> Vec3 {
        self.points[0].position + Vec3::new(0.0, START_LIFT, 0.0)
    }

    /// Spawn yaw: facing from point 0 toward point 1 in the ground plane.
    pub fn start_yaw(&self) -> f64 {
        let d = self.points[1].position - self.points[0].position;
        let flat = normalize_or_zero(&Vec3::new(d.x, 0.0, d.z));
        flat.x.atan2(flat.z)
    }

    /// Index of the centreline point closest to `position`.
    pub fn nearest_point(&self, position: &Vec3) -> usize {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, (p.position - position).norm_squared()))
            .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
            .0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Flat ring of `n` points at `radius`.
    pub(crate) fn ring(n: usize, radius: f64) -> Vec<TrackPoint> {
        (0..n)
            .map(|i| {
                let a = i as f64 / n as f64 * std::f64::consts::TAU;
                TrackPoint::new(a.cos() * radius, 0.0, a.sin() * radius, a)
            })
            .collect()
    }

    #[test]
    fn rejects_degenerate_tracks() {
        assert_eq!(
            TrackGeometry::new(ring(1, 10.0), 8.0, 4).unwrap_err(),
            TrackError::TooFewPoints(1)
        );
        assert_eq!(
            TrackGeometry::new(ring(8, 10.0), 8.0, 0).unwrap_err(),
            TrackError::NoCheckpoints
        );
        assert!(matches!(
            TrackGeometry::new(ring(8, 10.0), 0.0, 2),
            Err(TrackError::InvalidWidth(_))
        ));
    }

    #[test]
    fn derives_two_barriers_per_point() {
        let track = TrackGeometry::new(ring(32, 40.0), 8.0, 8).unwrap();
        assert_eq!(track.barriers().len(), 64);
        // Every barrier sits width/2 + margin from its point in the ground plane.
        for b in track.barriers() {
            let p = track.points()[b.point_index].position;
            let d = Vec3::new(b.position.x - p.x, 0.0, b.position.z - p.z).norm();
            assert_abs_diff_eq!(d, 6.0, epsilon = 1e-9);
            assert_abs_diff_eq!(b.position.y, p.y + BARRIER_LIFT, epsilon = 1e-12);
        }
    }

    #[test]
    fn checkpoints_spread_over_ring() {
        let pts = ring(32, 40.0);
        let track = TrackGeometry::new(pts.clone(), 8.0, 8).unwrap();
        assert_eq!(track.checkpoints().len(), 8);
        assert_eq!(track.checkpoints()[1].position, pts[4].position);
        assert_eq!(track.finish_line(), pts[0].position);
    }

    #[test]
    fn reset_checkpoints_is_idempotent() {
        let mut track = TrackGeometry::new(ring(16, 20.0), 8.0, 4).unwrap();
        assert!(track.mark_passed(2));
        assert!(!track.mark_passed(2), "second capture is a no-op");
        track.reset_checkpoints();
        let once = track.checkpoints().to_vec();
        track.reset_checkpoints();
        assert_eq!(track.checkpoints(), &once[..]);
        assert_eq!(track.passed_count(), 0);
    }

    #[test]
    fn start_pose_faces_next_point() {
        let track = TrackGeometry::new(ring(4, 10.0), 8.0, 1).unwrap();
        // point 0 = (10,0,0), point 1 = (0,0,10): direction (-1, 0, 1)/√2
        let yaw = track.start_yaw();
        let f = crate::types::forward_from_yaw(yaw);
        assert_abs_diff_eq!(f.x, -std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-9);
        assert_abs_diff_eq!(f.z, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-9);
        assert_abs_diff_eq!(track.start_position().y, START_LIFT, epsilon = 1e-12);
    }
}
