//! `input_models` — Input devices that produce per-tick control signals.
//!
//! # Devices
//! - [`keyboard`] — Held-key set with WASD/arrow mapping and command keys
//! - [`touch`]    — On-screen pedals and a drag steering pad
//!
//! The keyboard is the primary device and the touch pad the fallback; see
//! [`poll_controls`].

pub mod keyboard;
pub mod touch;

pub use keyboard::{Key, KeyCommand, KeyEvent, Keyboard};
pub use touch::TouchControls;

use race_core::ControlSignal;

/// A source of driver controls sampled once per tick.
pub trait InputDevice {
    /// Current control state.
    fn poll(&self) -> ControlSignal;
    /// Short human-readable device name.
    fn name(&self) -> &'static str;
}

/// Sample the primary device, falling back to the secondary only when the
/// primary is completely idle.
pub fn poll_controls(primary: &dyn InputDevice, fallback: Option<&dyn InputDevice>) -> ControlSignal {
    ControlSignal::resolve(primary.poll(), fallback.map(|d| d.poll()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_used_only_when_keyboard_idle() {
        let mut kb = Keyboard::default();
        let mut pad = TouchControls::default();
        pad.set_brake(true);

        let fallback: &dyn InputDevice = &pad;
        let c = poll_controls(&kb, Some(fallback));
        assert!(c.brake);

        kb.press(Key::D);
        let c = poll_controls(&kb, Some(fallback));
        assert!(c.steer_right);
        assert!(!c.brake, "touch input is not merged with keyboard");
    }
}
