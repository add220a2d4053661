//! `race_core` — Tick-driven arcade race simulation.
//!
//! # Module layout
//! - [`types`]      — Vector alias and small math helpers
//! - [`error`]      — Track construction errors
//! - [`input`]      — Control signal and primary/fallback input policy
//! - [`track`]      — Track geometry, barriers, checkpoints, finish line
//! - [`vehicle`]    — Vehicle state and arcade dynamics
//! - [`collision`]  — Barrier contact detection and response
//! - [`lap`]        — Checkpoint capture, lap timing, race completion
//! - [`camera`]     — Chase camera modes, smoothing and shake
//! - [`transition`] — Eased scripted camera moves
//! - [`simulation`] — Per-tick orchestrator owning all of the above
//! - [`metrics`]    — Lap times, collisions, speed statistics

pub mod camera;
pub mod collision;
pub mod error;
pub mod input;
pub mod lap;
pub mod metrics;
pub mod simulation;
pub mod track;
pub mod transition;
pub mod types;
pub mod vehicle;

pub use camera::{CameraConfig, CameraMode, CameraPose, CameraTarget, ChaseCameraController};
pub use collision::{CollisionConfig, CollisionDetector};
pub use error::TrackError;
pub use input::ControlSignal;
pub use lap::{CaptureOrder, LapConfig, LapProgressionTracker, RaceEvent};
pub use metrics::RaceMetrics;
pub use simulation::{RacePhase, SimConfig, Simulation, TickOutput};
pub use track::{TrackGeometry, TrackPoint};
pub use types::Vec3;
pub use vehicle::{VehicleDynamics, VehicleParams, VehicleState};
