//! slonk-telemetry CLI
//!
//! Event extraction and sensor windowing for test-stand sessions.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use slonk_telemetry::{
    config::Config,
    core::{windowed_slice, Event, LowPassFilter, TimeSeries, Window},
    session::SessionDir,
    VERSION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slonk-telemetry")]
#[command(version = VERSION)]
#[command(about = "Event extraction and sensor windowing for test-stand sessions", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract events from the session console log into events.csv
    Events {
        /// Session directory
        dir: PathBuf,
    },

    /// Select configured sensor columns from raw.csv into data.csv
    Data {
        /// Session directory
        dir: PathBuf,
    },

    /// Extract a window of one channel after an event
    Window {
        /// Session directory
        dir: PathBuf,

        /// Index of the event in events.csv
        #[arg(long, short)]
        event: usize,

        /// Channel index or display name
        #[arg(long, short)]
        channel: String,

        /// Window length in seconds (defaults to the configured duration)
        #[arg(long, short)]
        duration: Option<f64>,

        /// Smooth the window with the configured lowpass filter
        #[arg(long)]
        filter: bool,
    },

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Events { dir } => cmd_events(&config, &dir),
        Commands::Data { dir } => cmd_data(&config, &dir),
        Commands::Window {
            dir,
            event,
            channel,
            duration,
            filter,
        } => cmd_window(
            &config,
            &dir,
            event,
            &channel,
            duration.unwrap_or(config.window_duration_secs),
            filter,
        ),
        Commands::Config => cmd_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Config::load().context("loading configuration"),
    }
}

fn cmd_events(config: &Config, dir: &Path) -> Result<()> {
    let session = SessionDir::new(dir);
    let events = session
        .process_events(&config.drivers)
        .with_context(|| format!("processing events in {}", dir.display()))?;

    println!("{:>4}  {:>7}  {:>7}  {:<16}  info", "#", "elapsed", "delta", "type");
    for (index, event) in events.iter().enumerate() {
        print_event(index, event);
    }
    Ok(())
}

fn print_event(index: usize, event: &Event) {
    println!(
        "{:>4}  {:>7}  {:>7}  {:<16}  {}",
        index,
        event.elapsed,
        event.delta.as_deref().unwrap_or("-"),
        event.kind,
        event.info
    );
}

fn cmd_data(config: &Config, dir: &Path) -> Result<()> {
    if config.sensors.is_empty() {
        tracing::warn!("No sensors configured; only the timestamp column will be kept");
    }

    let session = SessionDir::new(dir);
    let series = session
        .process_data(&config.sensors)
        .with_context(|| format!("processing sensor data in {}", dir.display()))?;

    println!("Samples: {}", series.len());
    for (index, label) in series.labels().iter().enumerate() {
        println!("  [{index}] {label}");
    }
    Ok(())
}

fn resolve_channel(series: &TimeSeries, channel: &str) -> Result<usize> {
    if let Ok(index) = channel.parse::<usize>() {
        return Ok(index);
    }
    series
        .channel_index(channel)
        .with_context(|| format!("no channel named '{channel}' (have: {:?})", series.labels()))
}

fn cmd_window(
    config: &Config,
    dir: &Path,
    event_index: usize,
    channel: &str,
    duration: f64,
    filter: bool,
) -> Result<()> {
    let session = SessionDir::new(dir);
    let events = session
        .import_events()
        .with_context(|| format!("reading events in {}", dir.display()))?;
    let series = session
        .import_data(&events)
        .with_context(|| format!("reading sensor data in {}", dir.display()))?;

    let Some(event) = events.get(event_index) else {
        bail!(
            "event index {event_index} out of range ({} events)",
            events.len()
        );
    };
    let channel = resolve_channel(&series, channel)?;

    let raw = windowed_slice(&series, event, duration, channel)?;
    println!(
        "Event {event_index}: {} at {} ({} samples over {duration}s)",
        event.kind,
        event.elapsed,
        raw.len()
    );
    print_summary("raw", &raw);

    let filtered = if filter {
        let lpf = LowPassFilter::new(config.filter.clone())?;
        let smoothed = lpf.trim_boundary(&lpf.apply_window(&raw));
        if smoothed.is_empty() && !raw.is_empty() {
            tracing::warn!(
                "Window of {} samples is too short for a {}-tap filter",
                raw.len(),
                lpf.spec().tap_length
            );
        }
        print_summary("filtered", &smoothed);
        Some(smoothed)
    } else {
        None
    };

    let output = serde_json::json!({
        "event": event,
        "channel": series.labels().get(channel),
        "raw": raw,
        "filtered": filtered,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_summary(name: &str, window: &Window) {
    match window.summary() {
        Some(s) => println!(
            "  {name}: min {:.3}, max {:.3}, mean {:.3}, std {:.3}",
            s.min, s.max, s.mean, s.std_dev
        ),
        None => println!("  {name}: empty window"),
    }
}

fn cmd_config(config: &Config) -> Result<()> {
    println!("Configuration file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
