//! Cadence CLI
//!
//! Run demo animations in real time or step them deterministically.

use anyhow::{Context, Result};
use cadence_animation::{Action, ActionScheduler, IntervalClock, UnboundedFn};
use clap::{Parser, Subcommand};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod demo;

use config::CadenceConfig;
use demo::{Spinner, Tween};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cadence animation scheduler CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (cadence.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run tweens against a real-time clock
    Run {
        /// Number of tweens
        #[arg(short = 'n', long, default_value = "3")]
        count: usize,

        /// Duration of the first tween in seconds; each next one runs half as long again
        #[arg(short, long, default_value = "1.0")]
        duration: f64,

        /// Also run an unbounded spinner that stops itself after this many seconds
        #[arg(long)]
        spin: Option<f64>,

        /// Pause for this many seconds halfway through the first tween
        #[arg(long)]
        pause: Option<f64>,

        /// Give up after this many seconds of wall-clock time
        #[arg(long)]
        limit: Option<f64>,
    },

    /// Step tweens with a fixed delta and print their progress
    Simulate {
        /// Number of tweens
        #[arg(short = 'n', long, default_value = "3")]
        count: usize,

        /// Duration of the first tween in seconds; each next one runs half as long again
        #[arg(short, long, default_value = "1.0")]
        duration: f64,

        /// Seconds per step
        #[arg(long, default_value = "0.1")]
        dt: f64,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = CadenceConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            count,
            duration,
            spin,
            pause,
            limit,
        } => cmd_run(&config, count, duration, spin, pause, limit),

        Commands::Simulate {
            count,
            duration,
            dt,
        } => cmd_simulate(count, duration, dt),

        Commands::Config => cmd_config(&config),
    }
}

fn tween_duration(base: f64, index: usize) -> f64 {
    base * (1.0 + 0.5 * index as f64)
}

fn cmd_run(
    config: &CadenceConfig,
    count: usize,
    duration: f64,
    spin: Option<f64>,
    pause: Option<f64>,
    limit: Option<f64>,
) -> Result<()> {
    let spin = spin.map(|secs| seconds("spin", secs)).transpose()?;
    let pause = pause.map(|secs| seconds("pause", secs)).transpose()?;
    let limit = limit.map(|secs| seconds("limit", secs)).transpose()?;

    let clock = IntervalClock::new(config.clock);
    let scheduler = ActionScheduler::with_clock(clock.clone());

    info!("Running {} tweens at {}fps", count, config.clock.target_fps);

    let mut first_progress = None;
    for index in 0..count {
        let (tween, progress) = Tween::new(format!("tween-{index}"), tween_duration(duration, index));
        let action = Action::bounded(tween)
            .with_context(|| format!("Invalid duration for tween-{index}"))?;
        scheduler.run(action);
        first_progress.get_or_insert(progress);
    }

    if let Some(stop_after) = spin {
        Spinner::spawn(scheduler.handle(), stop_after.as_secs_f64());
    }

    // One wall-clock budget shared by every run of the clock
    let deadline = limit.map(|limit| Instant::now() + limit);
    let remaining = || deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()));

    if let (Some(pause), Some(progress)) = (pause, first_progress) {
        // Pause once the first tween is halfway, from inside its own tick
        let handle = scheduler.handle();
        let paused = Rc::new(Cell::new(false));
        let paused_clone = Rc::clone(&paused);
        let watcher = UnboundedFn::new(move |_| {
            if progress.get() >= 0.5 && !paused_clone.replace(true) {
                handle.pause();
            }
        });
        let watcher_id = scheduler.run(Action::unbounded(watcher));

        let ticks = clock.run(remaining());
        scheduler.remove(watcher_id, false);
        if paused.get() {
            info!("Paused after {} ticks, waiting {:.2}s", ticks, pause.as_secs_f64());
            std::thread::sleep(pause);
            scheduler.resume();
        }
    }

    let ticks = clock.run(remaining());
    info!(
        "Clock stopped after {} ticks ({} still running)",
        ticks,
        scheduler.num_running_animations()
    );

    Ok(())
}

/// Parse a non-negative, finite number of seconds
fn seconds(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).with_context(|| {
        format!("Invalid --{name} '{secs}': must be a non-negative number of seconds")
    })
}

fn cmd_simulate(count: usize, duration: f64, dt: f64) -> Result<()> {
    if !(dt.is_finite() && dt > 0.0) {
        anyhow::bail!("Invalid step '{}': must be a positive number of seconds", dt);
    }

    let scheduler = ActionScheduler::new();
    let mut tweens = Vec::with_capacity(count);
    for index in 0..count {
        let name = format!("tween-{index}");
        let (tween, progress) = Tween::new(name.clone(), tween_duration(duration, index));
        let action =
            Action::bounded(tween).with_context(|| format!("Invalid duration for {name}"))?;
        scheduler.run(action);
        tweens.push((name, progress));
    }

    let mut time = 0.0;
    while scheduler.num_running_animations() > 0 {
        scheduler.step(dt);
        time += dt;

        let columns: Vec<String> = tweens
            .iter()
            .map(|(name, progress)| format!("{name} {}", bar(progress.get())))
            .collect();
        println!("t={:>7.3}  {}", time, columns.join("  "));
    }

    info!("All tweens finished after {:.3}s", time);
    Ok(())
}

fn cmd_config(config: &CadenceConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

fn bar(progress: f64) -> String {
    const WIDTH: usize = 10;
    let filled = ((progress.clamp(0.0, 1.0) * WIDTH as f64).round() as usize).min(WIDTH);
    format!(
        "[{}{}] {:.2}",
        "#".repeat(filled),
        ".".repeat(WIDTH - filled),
        progress
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar() {
        assert_eq!(bar(0.0), "[..........] 0.00");
        assert_eq!(bar(0.5), "[#####.....] 0.50");
        assert_eq!(bar(1.0), "[##########] 1.00");
    }

    #[test]
    fn test_tween_durations_grow() {
        assert_eq!(tween_duration(1.0, 0), 1.0);
        assert_eq!(tween_duration(1.0, 1), 1.5);
        assert_eq!(tween_duration(2.0, 2), 4.0);
    }

    #[test]
    fn test_simulate_rejects_bad_step() {
        assert!(cmd_simulate(1, 1.0, 0.0).is_err());
        assert!(cmd_simulate(1, 0.0, 0.1).is_err());
    }

    #[test]
    fn test_run_rejects_bad_seconds() {
        let config = CadenceConfig::default();
        assert!(cmd_run(&config, 1, 0.1, None, None, Some(-1.0)).is_err());
        assert!(cmd_run(&config, 1, 0.1, None, Some(-0.5), None).is_err());
        assert!(cmd_run(&config, 1, 0.1, Some(f64::NAN), None, None).is_err());
        assert!(cmd_run(&config, 1, 0.1, Some(f64::INFINITY), None, None).is_err());
    }

    #[test]
    fn test_seconds() {
        assert_eq!(seconds("limit", 1.5).unwrap(), Duration::from_millis(1500));
        assert_eq!(seconds("pause", 0.0).unwrap(), Duration::ZERO);
        assert!(seconds("spin", f64::NAN).is_err());
        assert!(seconds("spin", -0.1).is_err());
    }

    #[test]
    fn test_run_shares_one_deadline() {
        let config = CadenceConfig::default();
        let start = Instant::now();
        // A long tween with a pause: both clock runs must fit in one limit
        cmd_run(&config, 1, 60.0, None, Some(0.0), Some(0.3)).unwrap();
        assert!(start.elapsed() < Duration::from_millis(550));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["cadence", "simulate", "-n", "2", "--dt", "0.25"]).unwrap();
        match cli.command {
            Commands::Simulate { count, dt, .. } => {
                assert_eq!(count, 2);
                assert_eq!(dt, 0.25);
            }
            _ => panic!("expected simulate"),
        }
    }
}
