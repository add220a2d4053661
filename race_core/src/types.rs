//! Fundamental types used across the entire workspace.

use nalgebra::{Rotation3, Vector3};

// ---------------------------------------------------------------------------
// Scalar type: f64 throughout, world units per tick for velocities.
// ---------------------------------------------------------------------------

/// World-space 3-vector (x right, y up, z forward at yaw 0).
pub type Vec3 = Vector3<f64>;

/// Squared-length threshold below which a vector counts as zero.
const NORMALIZE_EPS: f64 = 1e-12;

/// Unit vector in the direction of `v`, or the zero vector when `v` has
/// (near) zero length.
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    let n2 = v.norm_squared();
    if n2 > NORMALIZE_EPS {
        v / n2.sqrt()
    } else {
        Vec3::zeros()
    }
}

/// Rotate `v` about the +Y axis by `yaw` radians.
///
/// At yaw 0 the vehicle faces +Z; positive yaw turns +Z toward +X.
pub fn rotate_yaw(v: &Vec3, yaw: f64) -> Vec3 {
    Rotation3::from_axis_angle(&Vector3::y_axis(), yaw) * v
}

/// Unit forward vector for a heading of `yaw`.
pub fn forward_from_yaw(yaw: f64) -> Vec3 {
    rotate_yaw(&Vec3::z(), yaw)
}

/// Linear interpolation between two vectors, `t` in [0, 1].
pub fn lerp_vec(a: &Vec3, b: &Vec3, t: f64) -> Vec3 {
    a + (b - a) * t
}

/// Linear interpolation between two scalars.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Wrap an angle into (−π, π].
pub fn wrap_angle(a: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let w = (a + std::f64::consts::PI).rem_euclid(tau) - std::f64::consts::PI;
    if w <= -std::f64::consts::PI {
        w + tau
    } else {
        w
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
