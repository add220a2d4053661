//! Per-tick control signal and the primary/fallback device policy.

use serde::{Deserialize, Serialize};

/// Device-agnostic driver controls for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSignal {
    pub throttle: bool,
    pub brake: bool,
    pub steer_left: bool,
    pub steer_right: bool,
    pub handbrake: bool,
}

impl ControlSignal {
    /// No controls held.
    pub const IDLE: ControlSignal = ControlSignal {
        throttle: false,
        brake: false,
        steer_left: false,
        steer_right: false,
        handbrake: false,
    };

    /// True if every signal is released.
    pub fn is_idle(&self) -> bool {
        !(self.throttle || self.brake || self.steer_left || self.steer_right || self.handbrake)
    }

    /// Pick the signal that drives this tick.
    ///
    /// The fallback is only consulted when the primary is entirely idle;
    /// the two are never merged axis by axis.
    pub fn resolve(primary: ControlSignal, fallback: Option<ControlSignal>) -> ControlSignal {
        match fallback {
            Some(fb) if primary.is_idle() => fb,
            _ => primary,
        }
    }
}
