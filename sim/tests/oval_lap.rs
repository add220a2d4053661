use race_core::RacePhase;
use sim::{load_replay, replay, run, save_replay, Scenario, ScenarioKind};

#[test]
fn sprint_autopilot_completes_one_lap() {
    let scenario = Scenario::build(ScenarioKind::Sprint, 3);
    let result = run(&scenario, false).unwrap();

    assert_eq!(result.phase, RacePhase::Finished);
    assert_eq!(result.metrics.laps_completed(), 1);
    assert!(result.ticks < scenario.max_ticks);
    assert!(result.metrics.top_speed <= scenario.config.vehicle.max_speed + 1e-12);
    // 8 checkpoints, plus checkpoint 0 again as the line is crossed.
    assert!(result.metrics.checkpoints_passed >= 8);
    let lap = result.metrics.lap_times[0];
    assert_eq!(result.metrics.total_time, Some(lap));
}

#[test]
fn oval_runs_are_deterministic_per_seed() {
    let a = run(&Scenario::build(ScenarioKind::Oval, 11), false).unwrap();
    let b = run(&Scenario::build(ScenarioKind::Oval, 11), false).unwrap();
    assert_eq!(a.ticks, b.ticks);
    assert_eq!(a.metrics.lap_times, b.metrics.lap_times);
    assert_eq!(a.phase, RacePhase::Finished);
    assert_eq!(a.metrics.laps_completed(), 3);
}

#[test]
fn circuit_keeps_speed_and_steer_bounded() {
    let scenario = Scenario::build(ScenarioKind::Circuit, 5);
    let mut sim = scenario.simulation().unwrap();
    let mut pilot = scenario.autopilot();
    let max_speed = scenario.config.vehicle.max_speed;
    let max_steer = scenario.config.vehicle.max_steer_angle;

    for _ in 0..3000 {
        let controls = pilot.controls(sim.track(), sim.vehicle());
        let Some(out) = sim.step(&controls) else {
            break;
        };
        assert!(out.vehicle.speed() <= max_speed + 1e-12, "tick {}", out.tick);
        assert!(out.vehicle.steer_angle.abs() <= max_steer);
        assert!(out.camera.is_some());
    }
}

#[test]
fn recorded_run_replays_exactly() {
    let scenario = Scenario::build(ScenarioKind::Sprint, 8);
    let result = run(&scenario, true).unwrap();
    let log = result.replay.unwrap();
    assert_eq!(log.controls.len() as u64, result.ticks);

    let report = replay(&log, 0.0).unwrap();
    assert!(report.reproduced());
    assert_eq!(report.max_position_error, 0.0);
    assert_eq!(report.metrics.lap_times, result.metrics.lap_times);
}

#[test]
fn replay_survives_json_round_trip() {
    let scenario = Scenario::build(ScenarioKind::Sprint, 21);
    let log = run(&scenario, true).unwrap().replay.unwrap();

    let path = std::env::temp_dir().join(format!("polyrace_replay_{}.json", std::process::id()));
    save_replay(&log, &path).unwrap();
    let loaded = load_replay(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.frames.len(), log.frames.len());
    let report = replay(&loaded, 1e-6).unwrap();
    assert!(report.reproduced(), "diverged at {:?}", report.first_divergence);
}
