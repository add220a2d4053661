//! `polyrace` CLI: headless scenario runs, replay checks, seed sweeps and
//! scripted keyboard drives.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use input_models::{poll_controls, KeyEvent, Keyboard};
use race_core::{RaceMetrics, SimConfig, Simulation};
use rayon::prelude::*;
use sim::replay::{load_replay, replay, save_replay};
use sim::scenarios::{Scenario, ScenarioKind};
use sim::TrackLayout;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "polyrace", about = "Arcade race simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named scenario with the autopilot and output metrics.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// JSON file overriding race configuration fields
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the full replay log
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },
    /// Re-simulate a recorded replay and report divergence.
    Replay {
        /// Path to replay JSON file
        input: PathBuf,
        /// Largest accepted position mismatch per tick
        #[arg(long, default_value_t = 1e-6)]
        tolerance: f64,
        /// Output the report to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run one scenario across many seeds in parallel.
    Sweep {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Number of seeds to run
        #[arg(long, default_value_t = 16)]
        runs: u64,
        /// First seed; the others follow consecutively
        #[arg(long, default_value_t = 0)]
        first_seed: u64,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Drive a track from a scripted list of key events.
    Drive {
        /// JSON array of `{ "frame", "key", "pressed" }` events
        script: PathBuf,
        #[arg(long, value_enum, default_value = "circuit")]
        layout: TrackLayout,
        /// Frames to run (paused frames included)
        #[arg(long, default_value_t = 3600)]
        frames: u64,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            config,
            output,
            save_replay: save_path,
        } => {
            run_scenario(scenario, seed, config.as_deref(), output.as_deref(), save_path.as_deref())?;
        }
        Commands::Replay {
            input,
            tolerance,
            output,
        } => {
            run_replay(&input, tolerance, output.as_deref())?;
        }
        Commands::Sweep {
            scenario,
            runs,
            first_seed,
            config,
            output,
        } => {
            run_sweep(scenario, first_seed, runs, config.as_deref(), output.as_deref())?;
        }
        Commands::Drive {
            script,
            layout,
            frames,
            config,
            output,
        } => {
            run_drive(&script, layout, frames, config.as_deref(), output.as_deref())?;
        }
    }

    Ok(())
}

/// Defaults, overridden by whatever fields the file names.
fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

fn build_scenario(kind: ScenarioKind, seed: u64, config_path: Option<&Path>) -> Result<Scenario> {
    let scenario = Scenario::build(kind, seed);
    Ok(match config_path {
        Some(_) => scenario.with_config(load_config(config_path)?),
        None => scenario,
    })
}

fn metrics_json(m: &RaceMetrics) -> serde_json::Value {
    serde_json::json!({
        "laps_completed": m.laps_completed(),
        "lap_times_s": m.lap_times,
        "best_lap_s": m.best_lap(),
        "total_time_s": m.total_time,
        "checkpoints_passed": m.checkpoints_passed,
        "collision_ticks": m.collision_ticks,
        "collision_rate": m.collision_rate(),
        "top_speed": m.top_speed,
        "mean_speed": m.mean_speed(),
    })
}

fn write_json(path: &Path, json: &serde_json::Value) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(json)?)?;
    println!("Metrics saved to {}", path.display());
    Ok(())
}

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    config_path: Option<&Path>,
    output_path: Option<&Path>,
    replay_path: Option<&Path>,
) -> Result<()> {
    let scenario = build_scenario(kind, seed, config_path)?;
    println!(
        "Running scenario '{}' (seed={}, laps={}, max_ticks={})...",
        scenario.name, seed, scenario.config.lap.total_laps, scenario.max_ticks
    );

    let start = std::time::Instant::now();
    let result = sim::run(&scenario, replay_path.is_some())?;
    let elapsed = start.elapsed();

    let m = &result.metrics;
    println!(
        "Done: {} ticks, phase={:?}, {} laps, elapsed={:.2}s",
        result.ticks,
        result.phase,
        m.laps_completed(),
        elapsed.as_secs_f64(),
    );
    for (i, t) in m.lap_times.iter().enumerate() {
        println!("  lap {}: {:.2}s", i + 1, t);
    }
    if let Some(best) = m.best_lap() {
        println!("Best lap {:.2}s, {} collision ticks", best, m.collision_ticks);
    }

    if let (Some(rpath), Some(log)) = (replay_path, result.replay.as_ref()) {
        save_replay(log, rpath)?;
        println!("Replay saved to {}", rpath.display());
    }

    if let Some(opath) = output_path {
        let json = serde_json::json!({
            "scenario": scenario.name,
            "seed": seed,
            "elapsed_s": elapsed.as_secs_f64(),
            "ticks": result.ticks,
            "phase": format!("{:?}", result.phase),
            "metrics": metrics_json(m),
        });
        write_json(opath, &json)?;
    }

    Ok(())
}

fn run_replay(input: &Path, tolerance: f64, output_path: Option<&Path>) -> Result<()> {
    let log = load_replay(input)?;
    println!(
        "Replaying '{}' (seed={}, {} ticks)...",
        log.scenario_name,
        log.seed,
        log.controls.len()
    );

    let start = std::time::Instant::now();
    let report = replay(&log, tolerance)?;
    let elapsed = start.elapsed();

    match report.first_divergence {
        None => println!(
            "Replay reproduced: {} ticks, max error {:.3e}, elapsed={:.2}s",
            report.ticks,
            report.max_position_error,
            elapsed.as_secs_f64()
        ),
        Some(tick) => println!(
            "Replay diverged at tick {} (max error {:.3e})",
            tick, report.max_position_error
        ),
    }

    if let Some(opath) = output_path {
        let json = serde_json::json!({
            "scenario": log.scenario_name,
            "seed": log.seed,
            "ticks": report.ticks,
            "reproduced": report.reproduced(),
            "first_divergence": report.first_divergence,
            "max_position_error": report.max_position_error,
            "metrics": metrics_json(&report.metrics),
        });
        write_json(opath, &json)?;
    }

    Ok(())
}

fn run_sweep(
    kind: ScenarioKind,
    first_seed: u64,
    runs: u64,
    config_path: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    println!("Sweeping {:?} over {} seeds from {}...", kind, runs, first_seed);

    let start = std::time::Instant::now();
    let results = (first_seed..first_seed + runs)
        .into_par_iter()
        .map(|seed| {
            let scenario = match config_path {
                Some(_) => Scenario::build(kind, seed).with_config(config.clone()),
                None => Scenario::build(kind, seed),
            };
            sim::run(&scenario, false)
        })
        .collect::<Result<Vec<_>>>()?;
    let elapsed = start.elapsed();

    let finished: Vec<_> = results.iter().filter(|r| r.metrics.is_finished()).collect();
    let best = results
        .iter()
        .filter_map(|r| r.metrics.best_lap().map(|t| (r.seed, t)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    let mean_total = if finished.is_empty() {
        None
    } else {
        let sum: f64 = finished.iter().filter_map(|r| r.metrics.total_time).sum();
        Some(sum / finished.len() as f64)
    };

    println!(
        "Done: {}/{} finished, elapsed={:.2}s",
        finished.len(),
        results.len(),
        elapsed.as_secs_f64()
    );
    if let Some((seed, t)) = best {
        println!("Fastest lap {:.2}s (seed {})", t, seed);
    }
    if let Some(mean) = mean_total {
        println!("Mean race time {:.2}s", mean);
    }

    if let Some(opath) = output_path {
        let per_seed: Vec<_> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "seed": r.seed,
                    "ticks": r.ticks,
                    "phase": format!("{:?}", r.phase),
                    "metrics": metrics_json(&r.metrics),
                })
            })
            .collect();
        let json = serde_json::json!({
            "scenario": format!("{:?}", kind),
            "runs": results.len(),
            "finished": finished.len(),
            "mean_total_time_s": mean_total,
            "elapsed_s": elapsed.as_secs_f64(),
            "results": per_seed,
        });
        write_json(opath, &json)?;
    }

    Ok(())
}

fn run_drive(
    script_path: &Path,
    layout: TrackLayout,
    frames: u64,
    config_path: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<()> {
    let text = std::fs::read_to_string(script_path)
        .with_context(|| format!("reading {}", script_path.display()))?;
    let mut events: Vec<KeyEvent> = serde_json::from_str(&text)?;
    events.sort_by_key(|e| e.frame);

    let config = load_config(config_path)?;
    let mut sim = Simulation::from_points(layout.points(), config)?;
    let mut keyboard = Keyboard::default();
    let mut metrics = RaceMetrics::default();
    let mut pending = events.iter().peekable();

    println!("Driving {:?} for {} frames ({} key events)...", layout, frames, events.len());

    for frame in 0..frames {
        while let Some(event) = pending.next_if(|e| e.frame <= frame) {
            if let Some(cmd) = keyboard.apply(event) {
                cmd.apply(&mut sim);
            }
        }
        let controls = poll_controls(&keyboard, None);
        if let Some(out) = sim.step(&controls) {
            metrics.record(&out);
            if out.vehicle.display_speed() > 0 && out.tick % 60 == 0 {
                tracing::debug!(tick = out.tick, speed = out.vehicle.display_speed(), "speed");
            }
        } else {
            // Victory shot keeps easing while stopped.
            sim.advance_camera(std::time::Instant::now());
        }
    }

    println!(
        "Done: {} ticks simulated, phase={:?}, lap {} of {}",
        sim.tick(),
        sim.phase(),
        sim.laps().session().current_lap.min(sim.laps().session().total_laps),
        sim.laps().session().total_laps
    );

    if let Some(opath) = output_path {
        let json = serde_json::json!({
            "layout": format!("{:?}", layout),
            "frames": frames,
            "ticks": sim.tick(),
            "phase": format!("{:?}", sim.phase()),
            "camera": sim.camera().debug_info(),
            "metrics": metrics_json(&metrics),
        });
        write_json(opath, &json)?;
    }

    Ok(())
}
