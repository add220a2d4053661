//! Chase camera: per-mode ideal pose, shake, and decoupled smoothing of
//! position and look direction.
//!
//! # Per-tick steps
//! 1. Compute the ideal position/look-at for the active [`CameraMode`].
//! 2. While shake intensity exceeds `shake_epsilon`, jitter the ideal
//!    position by up to ±intensity/2 per axis and decay the intensity.
//! 3. Move the camera `position_lerp` of the way toward the (jittered) ideal.
//! 4. Blend the previous unit look direction toward the ideal one by
//!    `rotation_lerp`, then rebuild the look-at point `look_distance` ahead.
//! 5. Advance the mode timer.
//!
//! Position and rotation use separate rates so the view does not swim when
//! the look target swings faster than the body follows.

use crate::{
    transition::CameraTransition,
    types::{lerp_vec, normalize_or_zero, rotate_yaw, Vec3},
    vehicle::VehicleState,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Camera behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraMode {
    /// Behind the vehicle, pulled back with speed
    #[default]
    Follow,
    /// Slow orbit with a bobbing height
    Cinematic,
    /// High above and slightly behind
    Overhead,
}

impl CameraMode {
    pub const ALL: [CameraMode; 3] = [CameraMode::Follow, CameraMode::Cinematic, CameraMode::Overhead];

    /// Next mode in the Follow → Cinematic → Overhead cycle.
    pub fn next(self) -> Self {
        match self {
            CameraMode::Follow => CameraMode::Cinematic,
            CameraMode::Cinematic => CameraMode::Overhead,
            CameraMode::Overhead => CameraMode::Follow,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Camera tuning constants.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub follow_distance: f64,
    pub follow_height: f64,
    /// Look-at point height above the vehicle
    pub look_at_height: f64,
    /// Extra follow distance at full speed
    pub speed_distance_gain: f64,
    /// Extra follow height at full speed
    pub speed_height_gain: f64,
    /// Lateral banking offset amplitude
    pub bank_amplitude: f64,
    /// Angular velocity multiplier inside the banking sine
    pub bank_gain: f64,
    pub cinematic_radius: f64,
    pub cinematic_height: f64,
    /// Orbit angle per second of mode time
    pub cinematic_orbit_rate: f64,
    pub cinematic_bob_amplitude: f64,
    pub cinematic_bob_rate: f64,
    pub overhead_height: f64,
    pub overhead_back: f64,
    /// Fraction of the gap to the ideal position closed per tick
    pub position_lerp: f64,
    /// Fraction of the gap to the ideal look direction closed per tick
    pub rotation_lerp: f64,
    /// Distance ahead of the camera at which the look-at point is rebuilt
    pub look_distance: f64,
    pub shake_decay: f64,
    pub shake_epsilon: f64,
    /// Mode timer increment per tick (s)
    pub mode_timer_step: f64,
    /// Length of the eased race-start and victory moves (ms)
    pub shot_duration_ms: u64,
    /// Seed for shake jitter
    pub seed: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            follow_distance: 15.0,
            follow_height: 8.0,
            look_at_height: 2.0,
            speed_distance_gain: 5.0,
            speed_height_gain: 2.0,
            bank_amplitude: 2.0,
            bank_gain: 10.0,
            cinematic_radius: 20.0,
            cinematic_height: 12.0,
            cinematic_orbit_rate: 0.5,
            cinematic_bob_amplitude: 3.0,
            cinematic_bob_rate: 2.0,
            overhead_height: 25.0,
            overhead_back: 5.0,
            position_lerp: 0.05,
            rotation_lerp: 0.08,
            look_distance: 100.0,
            shake_decay: 0.9,
            shake_epsilon: 0.01,
            mode_timer_step: 0.016,
            shot_duration_ms: 2000,
            seed: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// What the camera needs to know about the vehicle it chases.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTarget {
    pub position: Vec3,
    pub yaw: f64,
    /// |v| / max speed, clamped to [0, 1]
    pub speed_fraction: f64,
    pub angular_velocity: f64,
}

impl CameraTarget {
    pub fn from_vehicle(state: &VehicleState, max_speed: f64) -> Self {
        let speed_fraction = if max_speed > 0.0 {
            (state.speed() / max_speed).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            position: state.position,
            yaw: state.yaw,
            speed_fraction,
            angular_velocity: state.angular_velocity,
        }
    }
}

/// Camera output for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

/// Full controller state, readable between ticks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub mode: CameraMode,
    /// Seconds since `mode` was selected
    pub mode_timer: f64,
    pub position: Vec3,
    pub look_at: Vec3,
    /// Unit view direction
    pub look_dir: Vec3,
    pub ideal_position: Vec3,
    pub ideal_look_at: Vec3,
    pub shake_intensity: f64,
}

/// Snapshot for debug overlays.
#[derive(Clone, Debug, Serialize)]
pub struct CameraDebugInfo {
    pub mode: CameraMode,
    pub position: Vec3,
    pub look_at: Vec3,
    pub follow_distance: f64,
    pub follow_height: f64,
}

// ---------------------------------------------------------------------------
// Ideal pose, one function per mode
// ---------------------------------------------------------------------------

fn follow_pose(cfg: &CameraConfig, target: &CameraTarget, _timer: f64) -> (Vec3, Vec3) {
    let s = target.speed_fraction;
    let distance = cfg.follow_distance + s * cfg.speed_distance_gain;
    let height = cfg.follow_height + s * cfg.speed_height_gain;
    let behind = rotate_yaw(&Vec3::new(0.0, 0.0, -distance), target.yaw);
    let bank = rotate_yaw(&Vec3::x(), target.yaw)
        * ((target.angular_velocity * cfg.bank_gain).sin() * cfg.bank_amplitude);
    let position = target.position + behind + bank + Vec3::new(0.0, height, 0.0);
    let look_at = target.position + Vec3::new(0.0, cfg.look_at_height, 0.0);
    (position, look_at)
}

fn cinematic_pose(cfg: &CameraConfig, target: &CameraTarget, timer: f64) -> (Vec3, Vec3) {
    let angle = timer * cfg.cinematic_orbit_rate + target.yaw;
    let bob = (timer * cfg.cinematic_bob_rate).sin() * cfg.cinematic_bob_amplitude;
    let position = target.position
        + Vec3::new(
            angle.cos() * cfg.cinematic_radius,
            cfg.cinematic_height + bob,
            angle.sin() * cfg.cinematic_radius,
        );
    let look_at = target.position + Vec3::new(0.0, cfg.look_at_height, 0.0);
    (position, look_at)
}

/// Fixed world offset: the view does not turn with the vehicle.
fn overhead_pose(cfg: &CameraConfig, target: &CameraTarget, _timer: f64) -> (Vec3, Vec3) {
    let position = target.position + Vec3::new(0.0, cfg.overhead_height, -cfg.overhead_back);
    (position, target.position)
}

type PoseFn = fn(&CameraConfig, &CameraTarget, f64) -> (Vec3, Vec3);

fn pose_fn(mode: CameraMode) -> PoseFn {
    match mode {
        CameraMode::Follow => follow_pose,
        CameraMode::Cinematic => cinematic_pose,
        CameraMode::Overhead => overhead_pose,
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Smoothed chase camera.
#[derive(Clone, Debug)]
pub struct ChaseCameraController {
    pub config: CameraConfig,
    state: CameraState,
    rng: ChaCha8Rng,
    transition: Option<CameraTransition>,
}

impl ChaseCameraController {
    pub fn new(config: CameraConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let start = Vec3::new(0.0, config.follow_height, config.follow_distance);
        let state = CameraState {
            mode: CameraMode::Follow,
            mode_timer: 0.0,
            position: start,
            look_at: Vec3::zeros(),
            look_dir: normalize_or_zero(&-start),
            ideal_position: start,
            ideal_look_at: Vec3::zeros(),
            shake_intensity: 0.0,
        };
        Self {
            config,
            state,
            rng,
            transition: None,
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn mode(&self) -> CameraMode {
        self.state.mode
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.state.position,
            look_at: self.state.look_at,
        }
    }

    /// Put the camera back at its default spot looking at the origin.
    /// Keeps the mode; cancels shake and any transition.
    pub fn reset(&mut self) {
        let start = Vec3::new(0.0, self.config.follow_height, self.config.follow_distance);
        self.place(start, Vec3::zeros());
        self.state.ideal_position = start;
        self.state.ideal_look_at = Vec3::zeros();
        self.state.shake_intensity = 0.0;
        self.transition = None;
    }

    /// Select a mode and restart the mode timer.
    pub fn switch_mode(&mut self, mode: CameraMode) {
        tracing::info!(?mode, "camera mode");
        self.state.mode = mode;
        self.state.mode_timer = 0.0;
    }

    /// Advance to the next mode in the cycle and return it.
    pub fn cycle_mode(&mut self) -> CameraMode {
        let next = self.state.mode.next();
        self.switch_mode(next);
        next
    }

    /// Raise shake intensity to at least `intensity`.
    pub fn shake(&mut self, intensity: f64) {
        self.state.shake_intensity = self.state.shake_intensity.max(intensity);
    }

    /// One tick of camera motion. Does nothing and returns `None` when no
    /// target is bound.
    pub fn update(&mut self, target: Option<&CameraTarget>) -> Option<CameraPose> {
        let target = target?;
        let cfg = &self.config;
        let s = &mut self.state;

        let (ideal_position, ideal_look_at) = pose_fn(s.mode)(cfg, target, s.mode_timer);
        s.ideal_position = ideal_position;
        s.ideal_look_at = ideal_look_at;

        let mut goal = ideal_position;
        if s.shake_intensity > cfg.shake_epsilon {
            let k = s.shake_intensity;
            goal += Vec3::new(
                (self.rng.gen::<f64>() - 0.5) * k,
                (self.rng.gen::<f64>() - 0.5) * k,
                (self.rng.gen::<f64>() - 0.5) * k,
            );
            s.shake_intensity *= cfg.shake_decay;
        }

        s.position = lerp_vec(&s.position, &goal, cfg.position_lerp);

        let ideal_dir = normalize_or_zero(&(ideal_look_at - s.position));
        let blended = normalize_or_zero(&lerp_vec(&s.look_dir, &ideal_dir, cfg.rotation_lerp));
        // Opposite directions cancel out; snap to the ideal in that case.
        s.look_dir = if blended == Vec3::zeros() { ideal_dir } else { blended };
        s.look_at = s.position + s.look_dir * cfg.look_distance;

        s.mode_timer += cfg.mode_timer_step;

        Some(self.pose())
    }

    /// Begin an eased move to an explicit pose over `duration`. Replaces any
    /// transition already running.
    pub fn start_transition(&mut self, to_position: Vec3, to_look_at: Vec3, duration: Duration, now: Instant) {
        self.transition = Some(CameraTransition {
            from_position: self.state.position,
            from_look_at: self.state.look_at,
            to_position,
            to_look_at,
            duration,
            started_at: now,
        });
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Apply the running transition at `now`. Returns its linear progress,
    /// or `None` if none is running. The transition ends itself at 1.0.
    pub fn advance_transition(&mut self, now: Instant) -> Option<f64> {
        let (position, look_at, progress) = self.transition.as_ref()?.sample(now);
        self.place(position, look_at);
        if progress >= 1.0 {
            self.transition = None;
        }
        Some(progress)
    }

    /// Dramatic opening angle: cinematic mode, easing to a spot off the
    /// front quarter.
    pub fn race_start_shot(&mut self, target: &Vec3, now: Instant) {
        self.scripted_shot(target, Vec3::new(-20.0, 10.0, 15.0), now);
    }

    /// Finish-line angle: cinematic mode, easing to a spot off the rear
    /// quarter.
    pub fn victory_shot(&mut self, target: &Vec3, now: Instant) {
        self.scripted_shot(target, Vec3::new(15.0, 8.0, -10.0), now);
    }

    fn scripted_shot(&mut self, target: &Vec3, offset: Vec3, now: Instant) {
        tracing::debug!(?offset, "scripted camera shot");
        self.state.mode = CameraMode::Cinematic;
        self.state.mode_timer = 0.0;
        let duration = Duration::from_millis(self.config.shot_duration_ms);
        self.start_transition(target + offset, *target, duration, now);
    }

    pub fn debug_info(&self) -> CameraDebugInfo {
        CameraDebugInfo {
            mode: self.state.mode,
            position: self.state.position,
            look_at: self.state.look_at,
            follow_distance: self.config.follow_distance,
            follow_height: self.config.follow_height,
        }
    }

    /// Hard-set the camera pose.
    fn place(&mut self, position: Vec3, look_at: Vec3) {
        self.state.position = position;
        self.state.look_at = look_at;
        let dir = normalize_or_zero(&(look_at - position));
        if dir != Vec3::zeros() {
            self.state.look_dir = dir;
        }
    }
}

impl Default for ChaseCameraController {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn target_at(x: f64, z: f64, yaw: f64) -> CameraTarget {
        CameraTarget {
            position: Vec3::new(x, 0.5, z),
            yaw,
            speed_fraction: 0.0,
            angular_velocity: 0.0,
        }
    }

    #[test]
    fn update_without_target_is_noop() {
        let mut cam = ChaseCameraController::default();
        let before = cam.state().clone();
        assert!(cam.update(None).is_none());
        assert_eq!(cam.state(), &before);
    }

    #[test]
    fn follow_ideal_sits_behind_and_above() {
        let mut cam = ChaseCameraController::default();
        let t = target_at(0.0, 0.0, 0.0);
        cam.update(Some(&t));
        let ideal = cam.state().ideal_position;
        assert_abs_diff_eq!(ideal.z, -15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ideal.y, 0.5 + 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ideal.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cam.state().ideal_look_at.y, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn follow_pulls_back_with_speed() {
        let cfg = CameraConfig::default();
        let slow = target_at(0.0, 0.0, 0.0);
        let fast = CameraTarget {
            speed_fraction: 1.0,
            ..slow
        };
        let (p_slow, _) = follow_pose(&cfg, &slow, 0.0);
        let (p_fast, _) = follow_pose(&cfg, &fast, 0.0);
        assert_abs_diff_eq!(p_fast.z, p_slow.z - 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p_fast.y, p_slow.y + 2.0, epsilon = 1e-9);
    }

    #[test]
    fn position_moves_a_fixed_fraction_toward_ideal() {
        let mut cam = ChaseCameraController::default();
        let t = target_at(30.0, 30.0, 1.0);
        for _ in 0..50 {
            let before = cam.state().position;
            cam.update(Some(&t));
            let s = cam.state();
            let gap = (s.ideal_position - before).norm();
            let step = (s.position - before).norm();
            assert_abs_diff_eq!(step, gap * 0.05, epsilon = 1e-9);
        }
    }

    #[test]
    fn switching_to_overhead_resets_timer_and_formula() {
        let mut cam = ChaseCameraController::default();
        let t = target_at(5.0, -3.0, 0.0);
        for _ in 0..10 {
            cam.update(Some(&t));
        }
        assert!(cam.state().mode_timer > 0.0);

        cam.switch_mode(CameraMode::Overhead);
        assert_eq!(cam.state().mode_timer, 0.0);

        cam.update(Some(&t));
        let ideal = cam.state().ideal_position;
        assert_abs_diff_eq!(ideal.x, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ideal.y, 0.5 + 25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ideal.z, -3.0 - 5.0, epsilon = 1e-9);
        assert_eq!(cam.state().ideal_look_at, t.position);
        assert_abs_diff_eq!(cam.state().mode_timer, 0.016, epsilon = 1e-12);
    }

    #[test]
    fn overhead_offset_ignores_heading() {
        let cfg = CameraConfig::default();
        for yaw in [0.0, std::f64::consts::FRAC_PI_2, 2.5] {
            let t = target_at(5.0, -3.0, yaw);
            let (p, look) = overhead_pose(&cfg, &t, 0.0);
            assert_abs_diff_eq!(p.x, 5.0, epsilon = 1e-12);
            assert_abs_diff_eq!(p.y, 25.5, epsilon = 1e-12);
            assert_abs_diff_eq!(p.z, -8.0, epsilon = 1e-12);
            assert_eq!(look, t.position);
        }
    }

    #[test]
    fn cinematic_orbits_with_mode_timer() {
        let cfg = CameraConfig::default();
        let t = target_at(0.0, 0.0, 0.0);
        let (p0, _) = cinematic_pose(&cfg, &t, 0.0);
        assert_abs_diff_eq!(p0.x, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p0.y, 12.5, epsilon = 1e-9);
        let timer = std::f64::consts::PI; // angle = π/2, bob = sin(2π) = 0
        let (p1, _) = cinematic_pose(&cfg, &t, timer);
        assert_abs_diff_eq!(p1.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p1.z, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn cycle_visits_all_modes() {
        let mut cam = ChaseCameraController::default();
        assert_eq!(cam.cycle_mode(), CameraMode::Cinematic);
        assert_eq!(cam.cycle_mode(), CameraMode::Overhead);
        assert_eq!(cam.cycle_mode(), CameraMode::Follow);
    }

    #[test]
    fn shake_only_raises_and_decays() {
        let mut cam = ChaseCameraController::default();
        cam.shake(0.5);
        cam.shake(0.2);
        assert_abs_diff_eq!(cam.state().shake_intensity, 0.5);
        let t = target_at(0.0, 0.0, 0.0);
        cam.update(Some(&t));
        assert_abs_diff_eq!(cam.state().shake_intensity, 0.45, epsilon = 1e-12);
        for _ in 0..100 {
            cam.update(Some(&t));
        }
        let settled = cam.state().shake_intensity;
        assert!(settled <= 0.01);
        cam.update(Some(&t));
        assert_eq!(cam.state().shake_intensity, settled, "no decay below epsilon");
    }

    #[test]
    fn look_direction_stays_unit_length() {
        let mut cam = ChaseCameraController::default();
        let mut t = target_at(0.0, 0.0, 0.0);
        for i in 0..120 {
            t.yaw = i as f64 * 0.05;
            t.position.x = i as f64 * 0.3;
            cam.update(Some(&t));
            assert_abs_diff_eq!(cam.state().look_dir.norm(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn transition_eases_and_terminates() {
        let mut cam = ChaseCameraController::default();
        let start = cam.state().position;
        let goal = Vec3::new(50.0, 20.0, 0.0);
        let t0 = Instant::now();
        cam.start_transition(goal, Vec3::zeros(), Duration::from_secs(2), t0);

        let p = cam.advance_transition(t0 + Duration::from_secs(1)).unwrap();
        assert_abs_diff_eq!(p, 0.5, epsilon = 1e-9);
        let mid = (start + goal) / 2.0;
        assert_abs_diff_eq!((cam.state().position - mid).norm(), 0.0, epsilon = 1e-9);

        let p = cam.advance_transition(t0 + Duration::from_secs(3)).unwrap();
        assert_eq!(p, 1.0);
        assert_abs_diff_eq!((cam.state().position - goal).norm(), 0.0, epsilon = 1e-9);
        assert!(!cam.is_transitioning());
        assert!(cam.advance_transition(t0 + Duration::from_secs(4)).is_none());
    }

    #[test]
    fn new_transition_overrides_running_one() {
        let mut cam = ChaseCameraController::default();
        let t0 = Instant::now();
        cam.start_transition(Vec3::new(100.0, 0.0, 0.0), Vec3::zeros(), Duration::from_secs(10), t0);
        cam.advance_transition(t0 + Duration::from_secs(1));
        let second = Vec3::new(0.0, 40.0, 0.0);
        cam.start_transition(second, Vec3::zeros(), Duration::from_secs(1), t0 + Duration::from_secs(1));
        cam.advance_transition(t0 + Duration::from_secs(5));
        assert_abs_diff_eq!((cam.state().position - second).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn victory_shot_eases_into_rear_quarter() {
        let mut cam = ChaseCameraController::default();
        let car = Vec3::new(10.0, 0.5, 10.0);
        let start = cam.state().position;
        let t0 = Instant::now();
        cam.victory_shot(&car, t0);
        assert_eq!(cam.mode(), CameraMode::Cinematic);
        assert_eq!(cam.state().mode_timer, 0.0);
        assert!(cam.is_transitioning());
        assert_eq!(cam.state().position, start, "no jump cut");

        let p = cam.advance_transition(t0 + Duration::from_millis(500)).unwrap();
        assert_abs_diff_eq!(p, 0.25, epsilon = 1e-9);
        let goal = car + Vec3::new(15.0, 8.0, -10.0);
        let quarter = start + (goal - start) * 0.0625;
        assert_abs_diff_eq!((cam.state().position - quarter).norm(), 0.0, epsilon = 1e-9);

        assert_eq!(cam.advance_transition(t0 + Duration::from_secs(2)), Some(1.0));
        assert_abs_diff_eq!((cam.state().position - goal).norm(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!((cam.state().look_at - car).norm(), 0.0, epsilon = 1e-9);
        assert!(!cam.is_transitioning());
    }

    #[test]
    fn race_start_shot_uses_configured_duration() {
        let cfg = CameraConfig {
            shot_duration_ms: 400,
            ..Default::default()
        };
        let mut cam = ChaseCameraController::new(cfg);
        let t0 = Instant::now();
        cam.race_start_shot(&Vec3::zeros(), t0);
        let p = cam.advance_transition(t0 + Duration::from_millis(200)).unwrap();
        assert_abs_diff_eq!(p, 0.5, epsilon = 1e-9);
        cam.advance_transition(t0 + Duration::from_millis(400));
        assert_abs_diff_eq!(
            (cam.state().position - Vec3::new(-20.0, 10.0, 15.0)).norm(),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn reset_restores_default_spot() {
        let mut cam = ChaseCameraController::default();
        cam.victory_shot(&Vec3::new(10.0, 0.0, 10.0), Instant::now());
        assert_eq!(cam.mode(), CameraMode::Cinematic);
        cam.reset();
        assert!(!cam.is_transitioning());
        assert_eq!(cam.state().position, Vec3::new(0.0, 8.0, 15.0));
        assert_eq!(cam.state().look_at, Vec3::zeros());
    }
}
