//! Indoor Air Pollution Visualizer Headless Harness
//!
//! Drives the simulation core at a fixed frame rate with a seeded RNG and
//! checks its behaviour against the closed-form model. Runs entirely
//! in-process, with no window and no real clock.
//!
//! Usage:
//!   cargo run -p airsim-simtest
//!   cargo run -p airsim-simtest -- --settings Setting_values.text --seconds 120
//!   cargo run -p airsim-simtest -- --config sim.json --json frame.json --verbose
//!
//! Set `RUST_LOG=debug` for core logging.

use std::path::{Path, PathBuf};

use airsim_logic::concentration::{concentration_at, steady_state, RunState};
use airsim_logic::config::{validate_config, SimConfig};
use airsim_logic::geometry::Axis;
use airsim_logic::openings::OpeningKind;
use airsim_logic::render::RenderFrame;
use airsim_logic::settings::{load_settings, parse_settings, save_settings, RoomSettings};
use airsim_logic::simulation::{Readouts, SimulationCore};
use anyhow::Context;
use clap::{ArgAction, Parser};
use serde::Serialize;

const FRAME_SECONDS: f32 = 1.0 / 60.0;
const DEFAULT_SECONDS: f32 = 60.0;
const DEFAULT_SEED: u64 = 42;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

#[derive(Parser, Debug)]
#[command(name = "airsim-simtest", version, about = "Headless validation of the air pollution simulation core")]
struct Opts {
    /// Room settings file (key:value). Defaults are used when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// JSON `SimConfig` override
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the final frame and readouts as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write the room settings back out in key:value form
    #[arg(long)]
    write_settings: Option<PathBuf>,

    /// Real seconds to simulate (default: 60, minimum 1)
    #[arg(long)]
    seconds: Option<f32>,

    /// Particle RNG seed (default: 42)
    #[arg(long)]
    seed: Option<u64>,

    /// Print every check, not just failures
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SimConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading config {}", p.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", p.display()))
        }
        None => Ok(SimConfig::default()),
    }
}

#[derive(Serialize)]
struct Report<'a> {
    settings: RoomSettings,
    readouts: Readouts,
    frame: &'a RenderFrame,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Opts::parse();
    let verbose = args.verbose;
    println!("=== Air Pollution Simulation Harness ===\n");

    let config = load_config(args.config.as_deref())?;
    let seconds = args.seconds.unwrap_or(DEFAULT_SECONDS).max(1.0);
    let seed = args.seed.unwrap_or(DEFAULT_SEED);

    let mut results = Vec::new();

    // 1. Config validation
    results.extend(validate_configuration(&config));

    // 2. Settings file
    let (settings, settings_results) = validate_settings(args.settings.as_deref(), verbose);
    results.extend(settings_results);

    // 3. Concentration against the closed form
    results.extend(validate_concentration(&config, &settings, seconds, seed, verbose));

    // 4. Particle population
    results.extend(validate_particles(&config, &settings, seed));

    // 5. Geometry and openings
    let mut sim = SimulationCore::seeded(config.clone(), seed);
    sim.load_settings(&settings);
    results.extend(validate_geometry(&mut sim));

    // 6. Run-state rules
    results.extend(validate_run_states(&config, seed));

    // ── Outputs ──
    if let Some(path) = &args.json {
        sim.start();
        for _ in 0..(seconds / FRAME_SECONDS) as usize {
            sim.advance(FRAME_SECONDS);
        }
        let report = Report {
            settings: sim.room_settings(),
            readouts: sim.readouts(),
            frame: sim.frame(),
        };
        let json = serde_json::to_string_pretty(&report).context("serializing frame")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("wrote final frame to {}", path.display());
    }
    if let Some(path) = &args.write_settings {
        save_settings(path, &settings).with_context(|| format!("writing {}", path.display()))?;
        log::info!("wrote settings to {}", path.display());
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn validate_configuration(config: &SimConfig) -> Vec<TestResult> {
    println!("--- Config ---");
    let errors = validate_config(config);
    vec![TestResult {
        name: "config_valid".into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!(
                "{} particles, focal {}, extent {}",
                config.max_particles, config.focal_length, config.view_extent
            )
        } else {
            format!("{:?}", errors)
        },
    }]
}

// ── 2. Settings ─────────────────────────────────────────────────────────

fn validate_settings(path: Option<&Path>, verbose: bool) -> (RoomSettings, Vec<TestResult>) {
    println!("--- Settings ---");
    let mut results = Vec::new();

    let settings = match path {
        None => RoomSettings::default(),
        Some(p) => match load_settings(p) {
            Ok((settings, issues)) => {
                if verbose {
                    for issue in &issues {
                        println!("    {}", issue);
                    }
                }
                results.push(TestResult {
                    name: "settings_parsed".into(),
                    passed: true,
                    detail: format!("{} ({} issues recovered)", p.display(), issues.len()),
                });
                settings
            }
            Err(e) => {
                results.push(TestResult {
                    name: "settings_parsed".into(),
                    passed: false,
                    detail: format!("{}: {}", p.display(), e),
                });
                RoomSettings::default()
            }
        },
    };

    let (round_trip, issues) = parse_settings(&settings.to_text());
    results.push(TestResult {
        name: "settings_round_trip".into(),
        passed: round_trip == settings && issues.is_empty(),
        detail: settings.to_text().replace('\n', " "),
    });

    (settings, results)
}

// ── 3. Concentration ────────────────────────────────────────────────────

fn validate_concentration(
    config: &SimConfig,
    settings: &RoomSettings,
    seconds: f32,
    seed: u64,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Concentration ---");
    let mut results = Vec::new();

    let mut sim = SimulationCore::seeded(config.clone(), seed);
    sim.load_settings(settings);
    let p = sim.parameters();

    sim.start();
    let frames = (seconds / FRAME_SECONDS).round() as usize;
    let mut worst_error = 0.0f32; // relative to max(|C|, 1)
    let mut max_ticks_per_frame = 0;
    let mut negative = false;
    for frame in 0..frames {
        let report = sim.advance(FRAME_SECONDS);
        max_ticks_per_frame = max_ticks_per_frame.max(report.ticks);
        let expected = concentration_at(p.c0, p.s, p.k, p.v, sim.time_minutes());
        let error = (sim.concentration() - expected).abs() / expected.abs().max(1.0);
        worst_error = worst_error.max(error);
        negative |= sim.concentration() < 0.0;
        if verbose && frame % (frames / 10).max(1) == 0 {
            println!(
                "    t={:>4.0} min  C={:.3}",
                sim.time_minutes(),
                sim.concentration()
            );
        }
    }

    results.push(TestResult {
        name: "conc_matches_closed_form".into(),
        passed: worst_error < 1e-3,
        detail: format!("worst deviation {:.2e}", worst_error),
    });

    // Frame accumulation drifts by at most one tick over the run.
    let elapsed = sim.time_minutes();
    results.push(TestResult {
        name: "conc_one_minute_per_second".into(),
        passed: (elapsed - seconds.floor()).abs() <= 1.0 && max_ticks_per_frame <= 1,
        detail: format!("{} s real -> {} min simulated", seconds, elapsed),
    });

    results.push(TestResult {
        name: "conc_non_negative".into(),
        passed: !negative,
        detail: "C(t) >= 0 on every frame".into(),
    });

    // Long frame: catches up without losing minutes.
    sim.advance(10_000.0);
    let term = steady_state(p.s, p.k, p.v);
    let settled = (sim.concentration() - term).abs() <= term.abs() * 1e-3 + 1e-3;
    results.push(TestResult {
        name: "conc_reaches_steady_state".into(),
        passed: settled,
        detail: format!(
            "C={:.3} vs S/(KV)={:.3} (S={} K={} V={:.2})",
            sim.concentration(),
            term,
            p.s,
            p.k,
            p.v
        ),
    });

    results
}

// ── 4. Particles ────────────────────────────────────────────────────────

fn validate_particles(config: &SimConfig, settings: &RoomSettings, seed: u64) -> Vec<TestResult> {
    println!("--- Particles ---");
    let mut results = Vec::new();

    let mut sim = SimulationCore::seeded(config.clone(), seed);
    sim.load_settings(settings);

    let mut max_spawn = 0;
    let mut max_retire = 0;
    let mut max_len = 0;
    let mut out_of_room = 0;
    let frames = (20.0 / FRAME_SECONDS) as usize;
    for frame in 0..frames {
        if frame == frames / 2 {
            sim.start();
        }
        let report = sim.advance(FRAME_SECONDS);
        max_spawn = max_spawn.max(report.particles.spawned);
        max_retire = max_retire.max(report.particles.retired);
        max_len = max_len.max(sim.particles().len());
        out_of_room += sim
            .particles()
            .particles()
            .iter()
            .filter(|p| {
                Axis::ALL
                    .into_iter()
                    .any(|a| p.position.component(a).abs() > 0.5 + 1e-4)
            })
            .count();
    }

    results.push(TestResult {
        name: "particles_rate_limited".into(),
        passed: max_spawn <= config.particles_per_frame_adjust
            && max_retire <= config.particles_per_frame_adjust,
        detail: format!("max {} spawned, {} retired per frame", max_spawn, max_retire),
    });
    results.push(TestResult {
        name: "particles_capped".into(),
        passed: max_len <= config.max_particles,
        detail: format!("peak {} of {}", max_len, config.max_particles),
    });
    results.push(TestResult {
        name: "particles_inside_room".into(),
        passed: out_of_room == 0,
        detail: format!("{} particle-frames outside the cuboid", out_of_room),
    });

    let sprites_ok = sim.frame().particles.iter().all(|s| {
        s.scale >= 0.2 && s.scale <= 1.0 && s.color == settings.pollutant.tint()
    });
    results.push(TestResult {
        name: "particles_sprites".into(),
        passed: sprites_ok && sim.frame().particles.len() == sim.particles().len(),
        detail: format!(
            "{} sprites, target {}",
            sim.frame().particles.len(),
            sim.particles().target_count()
        ),
    });

    results
}

// ── 5. Geometry ─────────────────────────────────────────────────────────

fn validate_geometry(sim: &mut SimulationCore) -> Vec<TestResult> {
    println!("--- Geometry ---");
    let mut results = Vec::new();

    let catalog = sim.catalog().clone();
    let mut pinned = true;
    catalog.for_each_opening(|kind, def| {
        let expected = match kind {
            OpeningKind::Passage => Axis::Z,
            OpeningKind::Window => Axis::X,
        };
        pinned &= def.pinned_axis() == Some(expected);
    });
    results.push(TestResult {
        name: "geometry_openings_on_walls".into(),
        passed: pinned,
        detail: format!(
            "{} passages, {} windows",
            catalog.passage_count(),
            catalog.window_count()
        ),
    });

    // Full orbit: every projected vertex stays finite.
    let mut finite = true;
    let mut rebuilds = 0;
    let step_pixels = std::f32::consts::TAU / 72.0 / sim.config().drag_sensitivity;
    for _ in 0..72 {
        sim.orbit(step_pixels);
        let report = sim.advance(FRAME_SECONDS);
        rebuilds += usize::from(report.geometry_rebuilt);
        let frame = sim.frame();
        finite &= frame.edges.len() == 12
            && frame.openings.len() == usize::from(catalog.count(OpeningKind::Passage))
                + usize::from(catalog.count(OpeningKind::Window))
            && frame
                .edges
                .iter()
                .chain(frame.openings.iter().flat_map(|o| o.segments.iter()))
                .all(|s| {
                    s.start.x.is_finite()
                        && s.start.y.is_finite()
                        && s.end.x.is_finite()
                        && s.end.y.is_finite()
                });
    }
    results.push(TestResult {
        name: "geometry_orbit_finite".into(),
        passed: finite,
        detail: "12 edges and all outlines finite over a full turn".into(),
    });
    results.push(TestResult {
        name: "geometry_reprojected_on_change".into(),
        passed: rebuilds == 72 && !sim.advance(FRAME_SECONDS).geometry_rebuilt,
        detail: format!("{} rebuilds for 72 rotations", rebuilds),
    });

    results
}

// ── 6. Run states ───────────────────────────────────────────────────────

fn validate_run_states(config: &SimConfig, seed: u64) -> Vec<TestResult> {
    println!("--- Run states ---");
    let mut results = Vec::new();
    let mut sim = SimulationCore::seeded(config.clone(), seed);

    let negative = sim.set_user_parameters(-5.0, 1.0, 0.0);
    results.push(TestResult {
        name: "state_c0_clamped".into(),
        passed: negative.c0 == Some(0.0) && negative.c0_corrected && negative.k_floored,
        detail: format!("{:?}", negative),
    });

    sim.set_user_parameters(100.0, 0.0, 0.1);
    sim.start();
    for _ in 0..(10.0 / FRAME_SECONDS).round() as usize {
        sim.advance(FRAME_SECONDS);
    }
    let locked = sim.set_user_parameters(1.0, 50.0, 0.9);
    let decay = concentration_at(100.0, 0.0, 0.1, sim.volume(), sim.time_minutes());
    results.push(TestResult {
        name: "state_running_locks_inputs".into(),
        passed: locked.c0.is_none()
            && !locked.kinetics_applied
            && (sim.concentration() - decay).abs() < 1e-3,
        detail: format!("t={} C={:.3}", sim.time_minutes(), sim.concentration()),
    });

    sim.stop();
    let t = sim.time_minutes();
    sim.advance(5.0);
    results.push(TestResult {
        name: "state_paused_frozen".into(),
        passed: sim.run_state() == RunState::Paused && sim.time_minutes() == t,
        detail: format!("paused at t={}", t),
    });

    sim.reset_state();
    results.push(TestResult {
        name: "state_reset".into(),
        passed: sim.run_state() == RunState::Idle
            && sim.time_minutes() == 0.0
            && sim.concentration() == 100.0
            && sim.particles().is_empty(),
        detail: format!("{:?}", sim.readouts()),
    });

    results
}
