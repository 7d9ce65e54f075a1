//! # Quadruped Drive Control Unit
//!
//! Runs the drive core at a fixed rate against the simulated actuator
//! buses and orientation sensor. Loads an optional TOML configuration,
//! performs RT setup, optionally starts homing, and enters the cycle loop
//! until the tick budget is spent or SIGINT arrives.

use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;

use clap::Parser;
use quad_common::bus::BusId;
use quad_control_unit::DriveSystem;
use quad_control_unit::config::{ControlUnitConfig, load_config};
use quad_control_unit::cycle::{CycleRunner, rt_setup};
use quad_hal::{SimulatedBus, SimulatedImu};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Quadruped drive control loop
#[derive(Parser, Debug)]
#[command(name = "quad_control_unit")]
#[command(version)]
#[command(about = "Fixed-rate motor control loop for a twelve-actuator quadruped")]
struct Args {
    /// Path to the control unit configuration TOML. Defaults are used if omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured tick rate [Hz].
    #[arg(long)]
    rate_hz: Option<u32>,

    /// Stop after this many ticks (runs until SIGINT otherwise).
    #[arg(long)]
    ticks: Option<u64>,

    /// Begin homing before the first tick.
    #[arg(long)]
    home: bool,

    /// CPU core to pin the loop thread to.
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority.
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level, includes status lines).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("Quad drive control unit v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Quad drive control unit shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            load_config(path)?
        }
        None => ControlUnitConfig::default(),
    };
    if let Some(rate_hz) = args.rate_hz {
        config.cycle.rate_hz = rate_hz;
    }
    config.validate()?;
    info!(
        "Config OK: rate={}Hz, max_current={}A, fault_current={}A",
        config.cycle.rate_hz, config.drive.limits.max_current, config.drive.limits.fault_current
    );

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let mut drive = DriveSystem::new(
        &config.drive,
        SimulatedBus::new(BusId::Front),
        SimulatedBus::new(BusId::Rear),
        SimulatedImu::new(),
    );
    if args.home {
        drive.begin_homing();
    }

    let mut runner = CycleRunner::new(drive, &config.cycle);
    if let Some(ticks) = args.ticks {
        runner = runner.with_tick_budget(ticks);
    }

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    runner.run()?;

    if let Some(fault) = runner.drive.last_fault() {
        info!("Last fault: {fault}");
    }
    info!("Final mode: {:?}", runner.drive.control_mode());
    Ok(())
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
