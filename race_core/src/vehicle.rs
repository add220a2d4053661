//! Arcade vehicle dynamics: steering, throttle/brake, friction, speed cap,
//! ground clamp and collision bounce.
//!
//! # Integration
//! Single explicit Euler step per tick with dt fixed at 1, so every constant
//! below is "per tick" and physics magnitude is tied to the tick rate.
//!
//! ## Per-tick order
//! 1. speed factor `clamp(1 − 0.4·|v|/v_max, 0.6, 1)`
//! 2. steer angle moves 15 % of the way toward ±max (or 0)
//! 3. yaw += steer · turn rate
//! 4. throttle / brake along forward, handbrake damping
//! 5. friction
//! 6. speed cap
//! 7. gravity or ground clamp
//! 8. position += velocity

use crate::{
    input::ControlSignal,
    types::{forward_from_yaw, lerp, Vec3},
};
use serde::{Deserialize, Serialize};

/// Minimum speed below which the vehicle pivots at half turn rate.
const PIVOT_SPEED: f64 = 0.01;
/// Fraction of the remaining steer gap closed per tick.
const STEER_SMOOTHING: f64 = 0.15;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Tuning constants for the vehicle. Units are world units and ticks.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleParams {
    /// Velocity added per tick while throttle is held
    pub acceleration: f64,
    /// Hard cap on |velocity|
    pub max_speed: f64,
    /// Velocity added against forward per tick while braking
    pub brake_force: f64,
    /// Velocity multiplier applied every tick (< 1)
    pub friction: f64,
    /// Base yaw rate multiplier
    pub turn_speed: f64,
    /// Velocity multiplier while the handbrake is held (< 1)
    pub handbrake_damping: f64,
    /// Height of the flat ground plane
    pub ground_height: f64,
    /// Vertical velocity added per tick while airborne
    pub gravity: f64,
    /// Vertical velocity set by a jump
    pub jump_impulse: f64,
    /// Steering angle limit (radians)
    pub max_steer_angle: f64,
    /// Fixed push along the contact normal on every collision
    pub bounce_push: f64,
    /// Multiple of the inward velocity component removed on collision
    pub bounce_restitution: f64,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            acceleration: 0.012,
            max_speed: 0.8,
            brake_force: 0.015,
            friction: 0.94,
            turn_speed: 0.06,
            handbrake_damping: 0.8,
            ground_height: 0.5,
            gravity: -0.02,
            jump_impulse: 0.3,
            max_steer_angle: 0.5,
            bounce_push: 0.1,
            bounce_restitution: 1.5,
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Kinematic state of the vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: Vec3,
    /// Heading about +Y (radians)
    pub yaw: f64,
    /// World units per tick
    pub velocity: Vec3,
    /// Yaw change applied on the last tick
    pub angular_velocity: f64,
    pub steer_angle: f64,
    pub grounded: bool,
}

impl VehicleState {
    /// Stationary vehicle at `position` facing `yaw`.
    pub fn at_rest(position: Vec3, yaw: f64) -> Self {
        Self {
            position,
            yaw,
            velocity: Vec3::zeros(),
            angular_velocity: 0.0,
            steer_angle: 0.0,
            grounded: true,
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Display speed in km/h-style units (|v| · 150, rounded).
    pub fn display_speed(&self) -> u32 {
        (self.speed() * 150.0).round() as u32
    }

    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::at_rest(Vec3::zeros(), 0.0)
    }
}

// ---------------------------------------------------------------------------
// Dynamics
// ---------------------------------------------------------------------------

/// Integrates control input into a `VehicleState`.
#[derive(Clone, Debug, Default)]
pub struct VehicleDynamics {
    pub params: VehicleParams,
}

impl VehicleDynamics {
    pub fn new(params: VehicleParams) -> Self {
        Self { params }
    }

    /// Advance `state` by one tick under `controls`.
    pub fn step(&self, state: &mut VehicleState, controls: &ControlSignal) {
        let p = &self.params;
        let speed = state.speed();

        // 1. Turning is damped at speed, never below 60 %.
        let speed_factor = (1.0 - (speed / p.max_speed) * 0.4).clamp(0.6, 1.0);

        // 2. Right overrides left when both are held.
        let mut target_steer = 0.0;
        if controls.steer_left {
            target_steer = p.max_steer_angle;
        }
        if controls.steer_right {
            target_steer = -p.max_steer_angle;
        }
        state.steer_angle = lerp(state.steer_angle, target_steer, STEER_SMOOTHING)
            .clamp(-p.max_steer_angle, p.max_steer_angle);

        // 3. Stationary pivot allowed at half rate.
        let turn_rate = if speed > PIVOT_SPEED {
            p.turn_speed * speed_factor
        } else {
            p.turn_speed * 0.5
        };
        state.angular_velocity = state.steer_angle * turn_rate;
        state.yaw += state.angular_velocity;

        // 4. Drive forces along the new heading.
        let forward = forward_from_yaw(state.yaw);
        if controls.throttle {
            state.velocity += forward * p.acceleration;
        }
        if controls.brake {
            state.velocity -= forward * p.brake_force;
        }
        if controls.handbrake {
            state.velocity *= p.handbrake_damping;
        }

        // 5.
        state.velocity *= p.friction;

        // 6.
        self.limit_speed(state);

        // 7. Only a launched vehicle may rise off the ground.
        if state.position.y > p.ground_height || (!state.grounded && state.velocity.y > 0.0) {
            state.velocity.y += p.gravity;
            state.grounded = false;
            self.limit_speed(state);
        } else {
            state.position.y = p.ground_height;
            state.velocity.y = 0.0;
            state.grounded = true;
        }

        // 8.
        state.position += state.velocity;
    }

    /// Rescale velocity to `max_speed` if it exceeds it, keeping direction.
    pub fn limit_speed(&self, state: &mut VehicleState) {
        let speed = state.speed();
        if speed > self.params.max_speed {
            state.velocity *= self.params.max_speed / speed;
        }
    }

    /// Launch the vehicle if it is on the ground. Returns whether it jumped.
    pub fn jump(&self, state: &mut VehicleState) -> bool {
        if !state.grounded {
            return false;
        }
        state.velocity.y = self.params.jump_impulse;
        state.grounded = false;
        true
    }

    /// Arcade bounce off a surface with outward unit normal `normal`.
    ///
    /// The inward component is removed 1.5 times over (reflected at half
    /// strength) and a fixed push is always added along the normal, so a
    /// contact can add kinetic energy.
    pub fn collision_response(&self, state: &mut VehicleState, normal: &Vec3) {
        let dot = state.velocity.dot(normal);
        if dot < 0.0 {
            state.velocity -= normal * (dot * self.params.bounce_restitution);
        }
        state.velocity += normal * self.params.bounce_push;
    }

    /// Fresh state at a spawn pose. A spawn above the ground starts airborne.
    pub fn spawn(&self, position: Vec3, yaw: f64) -> VehicleState {
        let mut state = VehicleState::at_rest(position, yaw);
        state.grounded = position.y <= self.params.ground_height;
        state
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
