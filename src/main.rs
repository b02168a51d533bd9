use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drone_sim::io::{csv, json, FlightSummary};
use drone_sim::sim::Sample;
use drone_sim::tuning::GainSearch;
use drone_sim::{Gains, Settings};

#[derive(Parser)]
#[command(name = "drone-sim")]
#[command(about = "Quadrotor simulator with a Lyapunov-based controller and gain search")]
#[command(version)]
struct Cli {
    /// JSON settings file; missing fields take defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fly the closed loop and print a flight summary
    Fly {
        /// Simulated seconds
        #[arg(short, long, default_value_t = 10.0)]
        duration: f64,

        /// Start position x,y,z
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [2.0, 3.0, -1.5])]
        start: Vec<f64>,

        /// Write the flight record as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the flight summary as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Search controller gains against the training scenario
    Train {
        #[arg(short, long)]
        trials: Option<usize>,

        #[arg(short, long)]
        seed: Option<u64>,

        /// Write the training report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::from_json_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };

    match cli.command {
        Some(Commands::Fly { duration, start, csv: csv_out, json: json_out }) => {
            fly(&settings, duration, &start, csv_out.as_ref(), json_out.as_ref())
        }
        Some(Commands::Train { trials, seed, json: json_out }) => {
            train(&settings, trials, seed, json_out.as_ref())
        }
        None => fly(&settings, 10.0, &[2.0, 3.0, -1.5], None, None),
    }
}

fn fly(
    settings: &Settings,
    duration: f64,
    start: &[f64],
    csv_path: Option<&PathBuf>,
    json_path: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let mut sim = settings.build_loop();
    let [x, y, z] = <[f64; 3]>::try_from(start).context("--start needs exactly three values")?;
    sim.reset_to(nalgebra::Vector3::new(x, y, z));
    let samples = sim.run_for(duration);

    let target = sim.controller().target_position();
    let gains = sim.controller().gains();
    let search = &settings.search;
    let summary = FlightSummary::from_samples(&samples, &target, search.settle_threshold, search.settle_window)
        .context("flight produced no samples")?;

    print_flight(&gains, &summary, &samples);
    for event in sim.events() {
        println!("  EVENT     t={:>6.2}s   {:?}", event.time, event.kind);
    }

    if let Some(path) = csv_path {
        csv::write_trajectory_file(path, &samples)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("  Trajectory written to {}", path.display());
    }
    if let Some(path) = json_path {
        json::write_flight_summary_file(path, &gains, &summary)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("  Summary written to {}", path.display());
    }
    Ok(())
}

fn train(
    settings: &Settings,
    trials: Option<usize>,
    seed: Option<u64>,
    json_path: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let mut config = settings.search;
    if let Some(trials) = trials {
        config.trials = trials;
    }
    if seed.is_some() {
        config.seed = seed;
    }

    let mut sim = settings.build_loop();
    let mut search = GainSearch::new(config).context("invalid search settings")?;

    println!();
    println!("  {:>5}  {:>10}  {}", "trial", "score", "gains (kp_pos kd_pos ki_pos kp_rot kd_rot ki_rot)");
    println!("  {}", "─".repeat(72));
    let outcome = search.run(&mut sim, |r| {
        let g = r.gains.to_array();
        println!(
            "  {:>5}  {:>10.4}  {:>6.2} {:>6.2} {:>6.2} {:>6.2} {:>6.2} {:>6.2}",
            r.iteration, r.score, g[0], g[1], g[2], g[3], g[4], g[5]
        );
    })?;

    println!();
    println!("  Best score: {:.4}{}", outcome.best_score, if outcome.completed { "" } else { " (cancelled)" });
    print_gains(&outcome.best_gains);

    if let Some(path) = json_path {
        json::write_training_report_file(path, &outcome)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("  Report written to {}", path.display());
    }
    Ok(())
}

fn print_gains(g: &Gains) {
    println!(
        "  Position:  kp={:>6.3}  kd={:>6.3}  ki={:>6.3}",
        g.kp_pos, g.kd_pos, g.ki_pos
    );
    println!(
        "  Rotation:  kp={:>6.3}  kd={:>6.3}  ki={:>6.3}",
        g.kp_rot, g.kd_rot, g.ki_rot
    );
}

fn print_flight(gains: &Gains, summary: &FlightSummary, samples: &[Sample]) {
    println!();
    println!("====================================================================");
    println!("  QUADROTOR FLIGHT");
    println!("====================================================================");
    println!();
    println!("  Gains");
    println!("  ──────────────────────────────────────────────────────────────────");
    print_gains(gains);
    println!();

    println!("  Performance Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Flight time:     {:>8.2} s", summary.flight_time);
    println!("  Peak V:          {:>8.4}", summary.peak_lyapunov);
    println!("  Final V:         {:>8.4}", summary.final_lyapunov);
    println!("  Final error:     {:>8.4} m", summary.final_position_error);
    match summary.settle_time {
        Some(t) => println!("  Settled at:      {:>8.2} s", t),
        None => println!("  Settled at:         never"),
    }
    println!("  Max tilt:        {:>8.2} deg", summary.max_tilt_deg);
    println!("  Max speed:       {:>8.3} m/s", summary.max_speed);
    println!();

    // -----------------------------------------------------------------------
    // Trajectory table (sampled)
    // -----------------------------------------------------------------------
    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>8}  {:>8}  {:>8}  {:>9}  {:>8}",
        "t (s)", "x (m)", "y (m)", "z (m)", "V", "tilt(°)"
    );
    println!("  {}", "─".repeat(60));

    let sample_interval = (samples.len() / 20).max(1);
    for (i, s) in samples.iter().enumerate() {
        if i % sample_interval != 0 && i + 1 != samples.len() {
            continue;
        }
        let p = s.state.position;
        println!(
            "  {:>7.2}  {:>8.3}  {:>8.3}  {:>8.3}  {:>9.4}  {:>8.2}",
            s.time,
            p.x,
            p.y,
            p.z,
            s.lyapunov.unwrap_or(0.0),
            s.state.tilt().to_degrees()
        );
    }

    println!();
    println!("  Simulation: {} steps", samples.len());
    println!("====================================================================");
    println!();
}
