// LineWatch Runner - Tick driver for the LineWatch engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # LineWatch Runner
//!
//! Drives the LineWatch engine on an external timer and exports its state
//! as Prometheus metrics (textfile collector format) and JSON line reports.
//!
//! ## Usage
//!
//! ```bash
//! # One simulated minute per second on every line
//! linewatch-runner --speed 60 --json
//!
//! # Equipment mode on two lines, metrics for node_exporter
//! linewatch-runner --lines line1,line4 --mode equipment \
//!     --metrics-path /var/lib/node_exporter/linewatch.prom
//! ```

mod metrics;
mod runner;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use linewatch::{AdapterMode, LineId};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use runner::{Runner, RunnerConfig, RunnerError};

/// LineWatch tick driver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file (command-line flags override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lines to tick, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    lines: Option<Vec<LineId>>,

    /// Data source (simulated, equipment)
    #[arg(short, long)]
    mode: Option<AdapterMode>,

    /// Real time between ticks in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Clock speed multiplier (1.0 = real-time)
    #[arg(short, long)]
    speed: Option<f64>,

    /// Stop after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Write Prometheus metrics to this file after every tick
    #[arg(long)]
    metrics_path: Option<PathBuf>,

    /// Print one JSON report per line and tick
    #[arg(long)]
    json: bool,

    /// Sample resource utilization and export bottlenecks
    #[arg(long)]
    bottlenecks: bool,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> Result<RunnerConfig, RunnerError> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::from_file(path)?,
            None => RunnerConfig::default(),
        };

        if let Some(lines) = self.lines {
            config = config.with_lines(lines);
        }
        if let Some(mode) = self.mode {
            config = config.with_mode(mode);
        }
        if let Some(ms) = self.interval_ms {
            config = config.with_tick_interval_ms(ms);
        }
        if let Some(speed) = self.speed {
            config = config.with_speed(speed);
        }
        if let Some(max) = self.max_ticks {
            config = config.with_max_ticks(max);
        }
        if let Some(path) = self.metrics_path {
            config = config.with_metrics_path(path);
        }
        if self.json {
            config = config.with_json_reports(true);
        }
        if self.bottlenecks {
            config = config.with_bottlenecks(true);
        }
        if let Some(seed) = self.seed {
            let engine = config.engine.clone().with_seed(seed);
            config = config.with_engine(engine);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("LineWatch Runner v{}", env!("CARGO_PKG_VERSION"));

    let runner = match args.into_config().and_then(Runner::new) {
        Ok(runner) => Arc::new(runner),
        Err(e) => {
            error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    // Stop on Ctrl-C
    let stopper = Arc::clone(&runner);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted, stopping after current tick");
                stopper.stop();
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });

    if let Err(e) = runner.run().await {
        error!("Runner failed: {}", e);
        std::process::exit(1);
    }

    let ticks = runner
        .state()
        .ticks
        .load(std::sync::atomic::Ordering::SeqCst);
    info!("Stopped after {} ticks", ticks);
}
