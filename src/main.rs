//! Command-line entry point: load settings, open the pulse generator and run
//! the configured experiment, or the two-LED demonstration when none is set.

use anyhow::{Context, Result};
use clap::Parser;
use pulse_light::{
    config::Settings, experiment::run_plan, LightController, MockTransport, SerialTransport,
    Transport,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Drive a serial LED pulse generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// serial port of the pulse generator
    #[arg(short, long)]
    port: Option<String>,

    /// baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// log every exchanged command
    #[arg(short, long)]
    debug: bool,

    /// talk to an in-memory device instead of the serial port
    #[arg(long)]
    dry_run: bool,

    /// reset the device before configuring it
    #[arg(long)]
    reset: bool,

    /// block until the experiment is over
    #[arg(short, long)]
    wait: bool,

    /// enable debug messages
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut settings = match &args.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::load().context("Failed to load settings")?,
    };

    if let Some(port) = args.port {
        settings.serial.port = port;
    }
    if let Some(baud) = args.baud {
        settings.serial.baud_rate = baud;
    }
    settings.serial.debug |= args.debug;
    settings.validate()?;

    let transport: Box<dyn Transport> = if args.dry_run {
        warn!("Dry run: no commands reach the device");
        Box::new(MockTransport::new())
    } else {
        Box::new(SerialTransport::open(&settings.serial).with_context(|| {
            format!("Failed to open serial port '{}'", settings.serial.port)
        })?)
    };

    let mut leds = LightController::new(transport)
        .with_poll_interval(Duration::from_millis(settings.controller.poll_interval_ms));
    leds.set_debug(settings.serial.debug);

    if args.reset {
        leds.reset()?;
    }

    let mut plan = settings.experiment_or_demo();
    plan.wait |= args.wait;

    if settings.experiment.is_none() {
        info!("No experiment configured, running the demonstration sequence");
    }

    run_plan(&mut leds, &plan).context("Experiment failed")?;
    info!("Done");
    Ok(())
}
