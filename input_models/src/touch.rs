//! Touch controls: accelerate/brake/handbrake buttons and a drag steering pad.

use crate::InputDevice;
use race_core::ControlSignal;
use serde::{Deserialize, Serialize};

/// Steering pad deflection below which no steering is applied.
pub const STEER_DEADZONE: f64 = 0.1;

/// Latest touch state. Steering is a normalised pad deflection in [−1, 1],
/// positive to the left.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TouchControls {
    accelerate: bool,
    brake: bool,
    handbrake: bool,
    steer: f64,
}

impl TouchControls {
    pub fn set_accelerate(&mut self, held: bool) {
        self.accelerate = held;
    }

    pub fn set_brake(&mut self, held: bool) {
        self.brake = held;
    }

    pub fn set_handbrake(&mut self, held: bool) {
        self.handbrake = held;
    }

    /// Update the steering pad from a drag offset relative to the pad
    /// centre. The knob is limited to `max_distance` from the centre and
    /// only its horizontal component steers.
    pub fn drag_steering(&mut self, dx: f64, dy: f64, max_distance: f64) {
        if max_distance <= 0.0 {
            self.steer = 0.0;
            return;
        }
        let distance = dx.hypot(dy);
        let knob_x = if distance > max_distance {
            dx * max_distance / distance
        } else {
            dx
        };
        self.steer = (knob_x / max_distance).clamp(-1.0, 1.0);
    }

    /// Finger lifted: the pad recentres.
    pub fn release_steering(&mut self) {
        self.steer = 0.0;
    }

    pub fn steer(&self) -> f64 {
        self.steer
    }
}

impl InputDevice for TouchControls {
    fn poll(&self) -> ControlSignal {
        ControlSignal {
            throttle: self.accelerate,
            brake: self.brake,
            steer_left: self.steer > STEER_DEADZONE,
            steer_right: self.steer < -STEER_DEADZONE,
            handbrake: self.handbrake,
        }
    }

    fn name(&self) -> &'static str {
        "touch"
    }
}
