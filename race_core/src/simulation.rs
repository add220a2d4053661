//! Simulation context: owns the track, the vehicle and the four components,
//! and runs them in a fixed order once per tick.
//!
//! # Tick order
//! 1. Vehicle dynamics under the tick's controls
//! 2. Barrier collisions (speed cap re-applied, camera shake on contact)
//! 3. Lap progression at the post-collision position
//! 4. Chase camera follows the final vehicle state, unless a scripted shot
//!    is easing it, in which case the shot advances instead
//!
//! Ticks only advance while the race phase is [`RacePhase::Racing`]. The
//! race opens in follow mode; finishing starts the victory shot, which the
//! frontend keeps easing with [`Simulation::advance_camera`].

use crate::{
    camera::{CameraConfig, CameraMode, CameraPose, CameraTarget, ChaseCameraController},
    collision::{CollisionConfig, CollisionDetector},
    error::TrackError,
    input::ControlSignal,
    lap::{LapConfig, LapProgressionTracker, RaceEvent},
    track::{TrackGeometry, TrackPoint},
    vehicle::{VehicleDynamics, VehicleParams, VehicleState},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Everything needed to configure one race.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub vehicle: VehicleParams,
    pub collision: CollisionConfig,
    pub lap: LapConfig,
    pub camera: CameraConfig,
    /// Simulated seconds per tick, used for lap timing
    pub tick_seconds: f64,
    /// Shake intensity requested on any barrier contact
    pub collision_shake: f64,
    pub checkpoint_count: usize,
    pub track_width: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            vehicle: VehicleParams::default(),
            collision: CollisionConfig::default(),
            lap: LapConfig::default(),
            camera: CameraConfig::default(),
            tick_seconds: 1.0 / 60.0,
            collision_shake: 0.5,
            checkpoint_count: 8,
            track_width: 8.0,
        }
    }
}

/// Coarse race lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    #[default]
    Racing,
    /// Ticks are ignored until resumed
    Paused,
    /// All laps done; terminal until restart
    Finished,
}

/// Result of one advanced tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    /// 1-based tick counter since race start
    pub tick: u64,
    /// Simulated time at the end of the tick (s)
    pub time: f64,
    pub vehicle: VehicleState,
    pub collided: bool,
    pub events: Vec<RaceEvent>,
    /// `None` while the camera has no target bound
    pub camera: Option<CameraPose>,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// One vehicle on one track.
#[derive(Clone, Debug)]
pub struct Simulation {
    config: SimConfig,
    track: TrackGeometry,
    vehicle: VehicleState,
    dynamics: VehicleDynamics,
    detector: CollisionDetector,
    laps: LapProgressionTracker,
    camera: ChaseCameraController,
    camera_bound: bool,
    phase: RacePhase,
    tick: u64,
}

impl Simulation {
    pub fn new(track: TrackGeometry, config: SimConfig) -> Self {
        let dynamics = VehicleDynamics::new(config.vehicle.clone());
        let vehicle = dynamics.spawn(track.start_position(), track.start_yaw());
        let camera = ChaseCameraController::new(config.camera.clone());
        Self {
            track,
            vehicle,
            dynamics,
            detector: CollisionDetector::new(config.collision.clone()),
            laps: LapProgressionTracker::new(config.lap.clone(), 0.0),
            camera,
            camera_bound: true,
            phase: RacePhase::Racing,
            tick: 0,
            config,
        }
    }

    /// Build the track from a centreline using the configured width and
    /// checkpoint count.
    pub fn from_points(points: Vec<TrackPoint>, config: SimConfig) -> Result<Self, TrackError> {
        let track = TrackGeometry::new(points, config.track_width, config.checkpoint_count)?;
        Ok(Self::new(track, config))
    }

    /// Advance one tick. Returns `None` without touching any state unless
    /// the race is running.
    pub fn step(&mut self, controls: &ControlSignal) -> Option<TickOutput> {
        self.step_at(controls, Instant::now())
    }

    /// [`Simulation::step`] with an explicit wall clock for scripted camera
    /// shots.
    pub fn step_at(&mut self, controls: &ControlSignal, wall: Instant) -> Option<TickOutput> {
        if self.phase != RacePhase::Racing {
            return None;
        }
        self.tick += 1;
        let now = self.now();

        self.dynamics.step(&mut self.vehicle, controls);

        let collided = self
            .detector
            .resolve(&self.dynamics, &mut self.vehicle, self.track.barriers());
        if collided {
            self.dynamics.limit_speed(&mut self.vehicle);
            self.camera.shake(self.config.collision_shake);
        }

        let events = self
            .laps
            .update(&mut self.track, &self.vehicle.position, now);
        let finished = events
            .iter()
            .any(|e| matches!(e, RaceEvent::RaceFinished { .. }));

        let camera = if self.camera.is_transitioning() {
            self.camera.advance_transition(wall);
            Some(self.camera.pose())
        } else {
            let target = self
                .camera_bound
                .then(|| CameraTarget::from_vehicle(&self.vehicle, self.dynamics.params.max_speed));
            self.camera.update(target.as_ref())
        };

        if finished {
            self.phase = RacePhase::Finished;
            self.camera.victory_shot(&self.vehicle.position, wall);
        }

        Some(TickOutput {
            tick: self.tick,
            time: now,
            vehicle: self.vehicle,
            collided,
            events,
            camera,
        })
    }

    /// Returns false if the race was not running.
    pub fn pause(&mut self) -> bool {
        if self.phase != RacePhase::Racing {
            return false;
        }
        tracing::info!(tick = self.tick, "race paused");
        self.phase = RacePhase::Paused;
        true
    }

    /// Returns false if the race was not paused.
    pub fn resume(&mut self) -> bool {
        if self.phase != RacePhase::Paused {
            return false;
        }
        tracing::info!(tick = self.tick, "race resumed");
        self.phase = RacePhase::Racing;
        true
    }

    /// Put the vehicle back on the start pose at rest. Lap progress and
    /// timing are kept.
    pub fn reset_vehicle(&mut self) {
        tracing::info!(tick = self.tick, "vehicle reset");
        self.vehicle = self
            .dynamics
            .spawn(self.track.start_position(), self.track.start_yaw());
    }

    /// Start the race over from tick zero.
    pub fn restart(&mut self) {
        tracing::info!("race restart");
        self.tick = 0;
        self.phase = RacePhase::Racing;
        self.laps.restart(&mut self.track, 0.0);
        self.reset_vehicle();
        self.camera.reset();
        self.camera.switch_mode(CameraMode::Follow);
    }

    /// Opt-in opening shot: cinematic mode, eased toward the vehicle's
    /// front quarter.
    pub fn race_start_shot(&mut self, wall: Instant) {
        self.camera.race_start_shot(&self.vehicle.position, wall);
    }

    /// Ease a running scripted shot to `wall`, in any phase. Returns the
    /// shot's progress, or `None` when no shot is running.
    pub fn advance_camera(&mut self, wall: Instant) -> Option<f64> {
        self.camera.advance_transition(wall)
    }

    pub fn jump(&mut self) -> bool {
        self.dynamics.jump(&mut self.vehicle)
    }

    /// Bind or unbind the vehicle as the camera target.
    pub fn bind_camera(&mut self, bound: bool) {
        self.camera_bound = bound;
    }

    /// Simulated seconds since race start.
    pub fn now(&self) -> f64 {
        self.tick as f64 * self.config.tick_seconds
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn track(&self) -> &TrackGeometry {
        &self.track
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    /// Direct access for tools and tests that need to place the vehicle.
    pub fn vehicle_mut(&mut self) -> &mut VehicleState {
        &mut self.vehicle
    }

    pub fn dynamics(&self) -> &VehicleDynamics {
        &self.dynamics
    }

    pub fn laps(&self) -> &LapProgressionTracker {
        &self.laps
    }

    pub fn camera(&self) -> &ChaseCameraController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut ChaseCameraController {
        &mut self.camera
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
