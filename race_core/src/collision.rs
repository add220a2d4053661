//! Barrier contact detection.
//!
//! Every barrier is a point with a shared effective radius. Each barrier in
//! range contributes its own contact, applied in barrier order; there is no
//! manifold merging and no priority between simultaneous contacts.

use crate::{
    track::BarrierCollider,
    types::{normalize_or_zero, Vec3},
    vehicle::{VehicleDynamics, VehicleState},
};
use serde::{Deserialize, Serialize};

/// Configuration for barrier contact tests.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Effective barrier radius (world units)
    pub barrier_radius: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            barrier_radius: 2.0,
        }
    }
}

/// A single barrier contact found this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Index into the barrier slice
    pub barrier_idx: usize,
    /// Unit vector from barrier to vehicle (zero if coincident)
    pub normal: Vec3,
    pub distance: f64,
}

/// Tests the vehicle against static barrier colliders.
#[derive(Clone, Debug, Default)]
pub struct CollisionDetector {
    pub config: CollisionConfig,
}

impl CollisionDetector {
    pub fn new(config: CollisionConfig) -> Self {
        Self { config }
    }

    /// All barriers strictly within the effective radius of `position`.
    pub fn contacts(&self, position: &Vec3, barriers: &[BarrierCollider]) -> Vec<Contact> {
        let radius = self.config.barrier_radius;
        barriers
            .iter()
            .enumerate()
            .filter_map(|(barrier_idx, b)| {
                let offset = position - b.position;
                let distance = offset.norm();
                (distance < radius).then(|| Contact {
                    barrier_idx,
                    normal: normalize_or_zero(&offset),
                    distance,
                })
            })
            .collect()
    }

    /// Apply the collision response once per contact. Returns true if any
    /// barrier was touched.
    pub fn resolve(
        &self,
        dynamics: &VehicleDynamics,
        state: &mut VehicleState,
        barriers: &[BarrierCollider],
    ) -> bool {
        let contacts = self.contacts(&state.position, barriers);
        for c in &contacts {
            tracing::debug!(barrier = c.barrier_idx, distance = c.distance, "barrier contact");
            dynamics.collision_response(state, &c.normal);
        }
        !contacts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
