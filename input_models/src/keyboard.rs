//! Keyboard: tracks held keys and maps them to controls and commands.
//!
//! # Mapping
//! | Control     | Keys          |
//! |-------------|---------------|
//! | throttle    | W, ArrowUp    |
//! | brake       | S, ArrowDown  |
//! | steer left  | A, ArrowLeft  |
//! | steer right | D, ArrowRight |
//! | handbrake   | Space         |
//!
//! P/Escape toggle pause, R resets the vehicle, C cycles the camera mode.

use crate::InputDevice;
use race_core::{ControlSignal, RacePhase, Simulation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    P,
    R,
    C,
    Escape,
}

/// One-shot actions triggered on key press rather than while held.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCommand {
    TogglePause,
    ResetVehicle,
    CycleCamera,
}

impl KeyCommand {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::P | Key::Escape => Some(KeyCommand::TogglePause),
            Key::R => Some(KeyCommand::ResetVehicle),
            Key::C => Some(KeyCommand::CycleCamera),
            _ => None,
        }
    }

    /// Apply to a running simulation. Reset and camera cycling only act
    /// while racing. Returns whether anything changed.
    pub fn apply(self, sim: &mut Simulation) -> bool {
        match (self, sim.phase()) {
            (KeyCommand::TogglePause, RacePhase::Racing) => sim.pause(),
            (KeyCommand::TogglePause, RacePhase::Paused) => sim.resume(),
            (KeyCommand::ResetVehicle, RacePhase::Racing) => {
                sim.reset_vehicle();
                true
            }
            (KeyCommand::CycleCamera, RacePhase::Racing) => {
                sim.camera_mut().cycle_mode();
                true
            }
            _ => false,
        }
    }
}

/// A timed key transition, e.g. from a recorded or hand-written script.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Frame on which the transition happens
    pub frame: u64,
    pub key: Key,
    pub pressed: bool,
}

/// Set of currently held keys.
#[derive(Clone, Debug, Default)]
pub struct Keyboard {
    held: HashSet<Key>,
}

impl Keyboard {
    /// Record a key press. Returns the command it triggers, if any, on the
    /// initial press only (auto-repeat is ignored).
    pub fn press(&mut self, key: Key) -> Option<KeyCommand> {
        if self.held.insert(key) {
            KeyCommand::from_key(key)
        } else {
            None
        }
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    /// Apply a scripted transition, returning any command it triggers.
    pub fn apply(&mut self, event: &KeyEvent) -> Option<KeyCommand> {
        if event.pressed {
            self.press(event.key)
        } else {
            self.release(event.key);
            None
        }
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn any(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.held.contains(k))
    }
}

impl InputDevice for Keyboard {
    fn poll(&self) -> ControlSignal {
        ControlSignal {
            throttle: self.any(&[Key::W, Key::ArrowUp]),
            brake: self.any(&[Key::S, Key::ArrowDown]),
            steer_left: self.any(&[Key::A, Key::ArrowLeft]),
            steer_right: self.any(&[Key::D, Key::ArrowRight]),
            handbrake: self.is_held(Key::Space),
        }
    }

    fn name(&self) -> &'static str {
        "keyboard"
    }
}
