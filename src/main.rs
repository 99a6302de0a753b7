//! hello-sensing CLI
//!
//! Accelerometer logging and offline sliding-window feature extraction.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use hello_sensing::{
    collector::{Collector, IioAccelerometer, ReplaySource, SampleSource, IIO_DEVICES_ROOT},
    config::{Config, WindowConfig},
    core, VERSION,
};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hello-sensing")]
#[command(version = VERSION)]
#[command(
    about = "Accelerometer logging and windowed feature extraction",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Defaults to `extract` reading stdin and writing stdout
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute windowed features from a `timestamp,x,y,z` sample log
    Extract(ExtractArgs),

    /// Record accelerometer samples into a new session directory
    Collect(CollectArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

#[derive(Args, Default)]
struct ExtractArgs {
    /// Sample log to read (defaults to stdin)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Feature file to write (defaults to stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Samples per window
    #[arg(long)]
    window_size: Option<usize>,

    /// Samples shared by consecutive windows (defaults to half a window)
    #[arg(long)]
    overlap: Option<usize>,
}

#[derive(Args)]
struct CollectArgs {
    /// IIO device directory (auto-detected under /sys/bus/iio/devices if not given)
    #[arg(long, conflicts_with = "replay")]
    device: Option<PathBuf>,

    /// Re-record samples from an existing sample log instead of a sensor
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Directory under which the session directory is created
    #[arg(long, short)]
    output_dir: Option<PathBuf>,

    /// Stop after this many seconds (runs until Ctrl+C otherwise)
    #[arg(long)]
    duration: Option<u64>,

    /// Pause between sensor reads in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,
}

#[derive(Args)]
struct ConfigArgs {
    /// Write the effective configuration to the config file
    #[arg(long)]
    init: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        None => cmd_extract(cli.config.as_deref(), ExtractArgs::default()),
        Some(Commands::Extract(args)) => cmd_extract(cli.config.as_deref(), args),
        Some(Commands::Collect(args)) => cmd_collect(cli.config.as_deref(), args),
        Some(Commands::Config(args)) => cmd_config(cli.config.as_deref(), args),
    };

    if let Err(e) = result {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = path.map_or_else(Config::config_path, Path::to_path_buf);
    Config::load_from(&path).with_context(|| format!("Could not load {}", path.display()))
}

fn cmd_extract(config_path: Option<&Path>, args: ExtractArgs) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let window = match (args.window_size, args.overlap) {
        (Some(size), overlap) => WindowConfig {
            size,
            overlap: overlap.unwrap_or(size / 2),
        },
        (None, Some(overlap)) => WindowConfig {
            overlap,
            ..config.window
        },
        (None, None) => config.window,
    };

    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("Could not open {}", path.display()))?,
        ),
        None => Box::new(std::io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Could not create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };

    let summary = core::run(input, output, &window).context("Couldn't calculate features")?;

    tracing::info!(
        samples = summary.samples_read,
        rows = summary.rows_written,
        "Finished writing features."
    );
    Ok(())
}

fn cmd_collect(config_path: Option<&Path>, args: CollectArgs) -> anyhow::Result<()> {
    let mut settings = load_config(config_path)?.collector;
    if let Some(dir) = args.output_dir {
        settings.data_path = dir;
    }

    let source: Box<dyn SampleSource + Send> = if let Some(log) = &args.replay {
        // Replays are copied as fast as the disk allows unless told otherwise.
        settings.poll_interval_ms = args.poll_interval_ms.unwrap_or(0);
        let replay = ReplaySource::open(log)
            .with_context(|| format!("Could not open {}", log.display()))?;
        Box::new(replay)
    } else {
        if let Some(ms) = args.poll_interval_ms {
            settings.poll_interval_ms = ms;
        }
        let accel = match &args.device {
            Some(device) => IioAccelerometer::open(device),
            None => IioAccelerometer::discover(Path::new(IIO_DEVICES_ROOT)),
        }
        .context("Could not open accelerometer")?;
        tracing::info!(
            "Using accelerometer {} at {}",
            accel.name(),
            accel.device().display()
        );
        Box::new(accel)
    };

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let mut collector = Collector::new(settings);
    let session_dir = collector.start(source)?;
    tracing::info!("Press Ctrl+C to stop");

    let deadline = args.duration.map(|secs| Instant::now() + Duration::from_secs(secs));
    while running.load(Ordering::SeqCst) && collector.is_running() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        thread::sleep(Duration::from_millis(100));
    }

    let result = collector.stop();
    tracing::info!("{}", collector.report().summary());
    result.context("Collection stopped with an error")?;

    tracing::info!("Samples saved under {}", session_dir.display());
    Ok(())
}

fn cmd_config(config_path: Option<&Path>, args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let path = config_path.map_or_else(Config::config_path, Path::to_path_buf);

    if args.init {
        config
            .save_to(&path)
            .with_context(|| format!("Could not write {}", path.display()))?;
        tracing::info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
