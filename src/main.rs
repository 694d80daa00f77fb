//! Kavach - obstacle avoidance controller
//!
//! ```bash
//! kavach                          # kavach.toml if present, else defaults
//! kavach --config car.toml --mode monitor
//! RUST_LOG=kavach=debug kavach --max-ticks 200 --seed 7
//! ```

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kavach::devices::create_device;
use kavach::{ControlMode, DeviceLoop, KavachConfig, KavachError, Result};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (default: ./kavach.toml when present)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the control mode
    #[arg(short, long, value_enum)]
    mode: Option<ControlMode>,

    /// Stop after this many ticks (default: run until Ctrl-C)
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Override the simulation seed (0 = random)
    #[arg(long)]
    seed: Option<u64>,
}

/// Load the configuration and describe where it came from.
fn load_config(args: &Args) -> Result<(KavachConfig, String)> {
    let (mut config, source) = match &args.config {
        Some(path) => (KavachConfig::load(Path::new(path))?, path.clone()),
        None if Path::new("kavach.toml").exists() => (
            KavachConfig::load(Path::new("kavach.toml"))?,
            "kavach.toml".to_string(),
        ),
        None => (KavachConfig::default(), "defaults".to_string()),
    };

    if let Some(mode) = args.mode {
        config.control.mode = mode;
    }
    if let Some(seed) = args.seed {
        config.device.simulation.random_seed = seed;
    }
    Ok((config, source))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let (config, source) = load_config(&args)?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("kavach={}", config.logging.level))),
        )
        .init();

    info!("Kavach v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", source);
    info!(
        "Device: {} ({})",
        config.device.name, config.device.device_type
    );
    let device = create_device(&config)?;
    let mut control = DeviceLoop::from_device(&config, device)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| KavachError::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    info!("Running. Press Ctrl-C to stop.");
    let ticks = control.run(&running, args.max_ticks)?;

    info!("Kavach stopped after {} ticks", ticks);
    Ok(())
}
