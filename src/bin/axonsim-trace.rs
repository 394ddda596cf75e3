//! axonsim-trace - Headless membrane trace
//!
//! Runs the axon model for a fixed number of ticks and prints a CSV trace.
//!
//! # Usage
//!
//! ```bash
//! # 1200 ticks at the default frame rate, stimulus at t = 0
//! axonsim-trace
//!
//! # Custom config, longer run, stimulus after 5 ms
//! axonsim-trace --config axon.json --steps 3000 --stimulus-at 0.005
//!
//! # Record, then replay the recording and check it matches the live run
//! axonsim-trace --record
//! ```
//!
//! Set `RUST_LOG=debug` for mode transitions and action potential arrival.
//!
//! # Exit Codes
//!
//! - 0: Trace written (and playback matched, with `--record`)
//! - 1: Playback diverged from the recorded run
//! - 2: Invalid arguments or config error

use anyhow::{bail, Context};
use axonsim::{AxonSimulation, IonType, MembraneSide, OverflowPolicy, SimConfig};
use std::process::ExitCode;

/// Largest voltage mismatch tolerated between live and replayed runs (mV)
const PLAYBACK_TOLERANCE: f32 = 1e-4;

struct Options {
    config: Option<String>,
    steps: usize,
    dt: Option<f64>,
    stimulus_at: Option<f64>,
    record: bool,
}

enum Outcome {
    Matched,
    Diverged,
}

fn main() -> ExitCode {
    env_logger::init();

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Error: {:#}\n", e);
            print_help();
            return ExitCode::from(2);
        }
    };

    match run(&options) {
        Ok(Outcome::Matched) => ExitCode::SUCCESS,
        Ok(Outcome::Diverged) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<Options>> {
    let mut options = Options {
        config: None,
        steps: 1200,
        dt: None,
        stimulus_at: Some(0.0),
        record: false,
    };

    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .with_context(|| format!("{} requires a value", name))
        };
        match arg.as_str() {
            "-c" | "--config" => options.config = Some(value("--config")?),
            "-n" | "--steps" => {
                options.steps = value("--steps")?
                    .parse()
                    .context("--steps must be a non-negative integer")?
            }
            "--dt" => {
                let dt: f64 = value("--dt")?.parse().context("--dt must be a number")?;
                if dt <= 0.0 {
                    bail!("--dt must be positive");
                }
                options.dt = Some(dt);
            }
            "-s" | "--stimulus-at" => {
                options.stimulus_at = Some(
                    value("--stimulus-at")?
                        .parse()
                        .context("--stimulus-at must be a number of seconds")?,
                )
            }
            "--no-stimulus" => options.stimulus_at = None,
            "-r" | "--record" => options.record = true,
            "-h" | "--help" => return Ok(None),
            other => bail!("Unknown option: {}", other),
        }
    }
    Ok(Some(options))
}

fn run(options: &Options) -> anyhow::Result<Outcome> {
    let config = match &options.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    let dt = options.dt.unwrap_or(config.frame_dt);
    let mut sim = AxonSimulation::new(config).context("Failed to build simulation")?;

    if options.record {
        sim.set_mode_record();
    }

    println!("time,voltage,m3h,n4,na_in,na_out,k_in,k_out,transient");
    let mut voltages = Vec::with_capacity(options.steps);
    let mut stimulated = false;
    for _ in 0..options.steps {
        if let Some(at) = options.stimulus_at {
            if !stimulated && sim.time() >= at {
                stimulated = sim.stimulate();
            }
        }
        sim.step(dt);
        voltages.push(sim.membrane_voltage());
        print_row(&sim);
    }

    if !options.record {
        return Ok(Outcome::Matched);
    }

    if sim.history_len() < voltages.len() {
        log::warn!("Recording filled before the run ended, verifying recorded points only");
    }
    verify_playback(&mut sim, dt, &voltages)
}

fn print_row(sim: &AxonSimulation) {
    let integrator = sim.model().integrator();
    println!(
        "{:.7},{:.4},{:.6},{:.6},{:.2},{:.2},{:.2},{:.2},{}",
        sim.time(),
        sim.membrane_voltage(),
        integrator.m3h(),
        integrator.n4(),
        sim.concentration(IonType::Sodium, MembraneSide::Interior),
        sim.concentration(IonType::Sodium, MembraneSide::Exterior),
        sim.concentration(IonType::Potassium, MembraneSide::Interior),
        sim.concentration(IonType::Potassium, MembraneSide::Exterior),
        sim.particles().len(),
    );
}

/// Replay the recording and compare it against the live voltages
fn verify_playback(sim: &mut AxonSimulation, dt: f64, live: &[f32]) -> anyhow::Result<Outcome> {
    let recorded = sim.history_len();
    if recorded == 0 {
        eprintln!("Nothing recorded");
        return Ok(Outcome::Matched);
    }

    // Evicting keeps the newest points, stopping keeps the oldest
    let skip = match sim.model().config().recording.overflow_policy {
        OverflowPolicy::EvictOldest => live.len().saturating_sub(recorded),
        OverflowPolicy::StopRecording => 0,
    };

    sim.rewind().context("Failed to rewind")?;
    let mut worst = 0.0_f32;
    for (i, expected) in live.iter().skip(skip).take(recorded).enumerate() {
        if i > 0 {
            sim.step(dt);
        }
        worst = worst.max((sim.membrane_voltage() - expected).abs());
    }

    eprintln!(
        "Playback of {} points: max voltage deviation {:.2e} mV",
        recorded, worst
    );
    if worst <= PLAYBACK_TOLERANCE {
        Ok(Outcome::Matched)
    } else {
        Ok(Outcome::Diverged)
    }
}

fn print_help() {
    eprintln!("axonsim-trace - Run the axon membrane model and print a CSV trace");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    axonsim-trace [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config <PATH>        JSON config (missing fields take defaults)");
    eprintln!("    -n, --steps <N>            Number of ticks [default: 1200]");
    eprintln!("        --dt <SECONDS>         Tick length [default: config frame_dt]");
    eprintln!("    -s, --stimulus-at <SECS>   Stimulate once this time is reached [default: 0]");
    eprintln!("        --no-stimulus          Never stimulate");
    eprintln!("    -r, --record               Record, then verify a playback pass");
    eprintln!("    -h, --help                 Print this help message");
    eprintln!();
    eprintln!("EXIT CODES:");
    eprintln!("    0    Trace written (playback matched with --record)");
    eprintln!("    1    Playback diverged from the recorded run");
    eprintln!("    2    Invalid arguments or config error");
}
