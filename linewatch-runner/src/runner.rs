// LineWatch Runner - Tick loop
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! External timer driving engine ticks.
//!
//! Every interval the runner ticks each configured line, refreshes the
//! Prometheus gauges, optionally writes them to a textfile-collector path
//! and emits one JSON report per line on stdout.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use linewatch::analytics::RESOURCES;
use linewatch::{
    AdapterMode, AppContext, EngineConfig, HealthMonitor, Kpi, KpiStatus, LineId, LinewatchError,
    Timestamp,
};
use serde::{Deserialize, Serialize};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::metrics::{
    encode_metrics, update_adapter_status, update_bottlenecks, update_component_risk,
    update_engine_metrics, update_failure_probability, update_snapshot_metrics, CLOCK_SPEED,
};

/// Fastest accepted clock speed multiplier.
pub const MAX_SPEED: f64 = 1_000_000.0;

/// Longest accepted real tick interval (one day).
pub const MAX_TICK_INTERVAL_MS: u64 = 86_400_000;

/// Configuration for the tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Lines to tick.
    pub lines: Vec<LineId>,
    /// Data source for every line.
    pub mode: AdapterMode,
    /// Real time between ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Simulated clock speed multiplier (1.0 = real-time, 60.0 = a minute per second).
    pub speed: f64,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Prometheus textfile-collector output path.
    pub metrics_path: Option<PathBuf>,
    /// Emit JSON line reports on stdout.
    pub json_reports: bool,
    /// Sample resource utilization and export bottlenecks.
    pub sample_bottlenecks: bool,
    /// Engine configuration.
    pub engine: EngineConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            lines: LineId::ALL.to_vec(),
            mode: AdapterMode::Simulated,
            tick_interval_ms: 1_000,
            speed: 1.0,
            max_ticks: None,
            metrics_path: None,
            json_reports: false,
            sample_bottlenecks: false,
            engine: EngineConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RunnerError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Tick only these lines.
    pub fn with_lines(mut self, lines: Vec<LineId>) -> Self {
        self.lines = lines;
        self
    }

    /// Use a data source.
    pub fn with_mode(mut self, mode: AdapterMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the real tick interval.
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Set the clock speed multiplier.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Stop after a number of ticks.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Write metrics to a file after every tick.
    pub fn with_metrics_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    /// Emit JSON reports.
    pub fn with_json_reports(mut self, enabled: bool) -> Self {
        self.json_reports = enabled;
        self
    }

    /// Enable or disable bottleneck sampling.
    pub fn with_bottlenecks(mut self, enabled: bool) -> Self {
        self.sample_bottlenecks = enabled;
        self
    }

    /// Use an engine configuration.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.lines.is_empty() {
            return Err(RunnerError::Config("no lines configured".to_string()));
        }
        if self.tick_interval_ms == 0 || self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(RunnerError::Config(format!(
                "tick interval must be within 1..={} ms, got {}",
                MAX_TICK_INTERVAL_MS, self.tick_interval_ms
            )));
        }
        if !(self.speed.is_finite() && self.speed > 0.0 && self.speed <= MAX_SPEED) {
            return Err(RunnerError::Config(format!(
                "clock speed must be within (0, {}], got {}",
                MAX_SPEED, self.speed
            )));
        }
        self.engine.validate()?;
        Ok(())
    }

    /// Simulated milliseconds advanced per tick. Bounded by `validate`.
    pub fn simulated_step_ms(&self) -> i64 {
        (self.tick_interval_ms as f64 * self.speed) as i64
    }
}

/// Shared state of the tick loop.
#[derive(Debug, Default)]
pub struct RunnerState {
    /// Completed ticks.
    pub ticks: AtomicU64,
    /// Whether the loop is running.
    pub running: AtomicBool,
}

/// One line's outcome for one tick, emitted as a JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineReport {
    pub tick: u64,
    pub time: Timestamp,
    pub line: LineId,
    pub mode: AdapterMode,
    pub cold_start: bool,
    pub refreshed: Vec<Kpi>,
    pub failed: Vec<Kpi>,
    pub connected: bool,
    pub failure_probability: f64,
    pub critical_kpis: Vec<Kpi>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_component: Option<String>,
}

/// Drives the engine on a timer.
#[derive(Debug)]
pub struct Runner {
    config: RunnerConfig,
    ctx: Arc<AppContext>,
    state: Arc<RunnerState>,
    start: Timestamp,
}

impl Runner {
    /// Create a runner starting its simulated clock now.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        Self::starting_at(config, Utc::now())
    }

    /// Create a runner with an explicit simulated start time.
    pub fn starting_at(config: RunnerConfig, start: Timestamp) -> Result<Self, RunnerError> {
        config.validate()?;
        let ctx = AppContext::new(config.engine.clone()).with_default_mode(config.mode);
        CLOCK_SPEED.set(config.speed);
        Ok(Self {
            config,
            ctx: Arc::new(ctx),
            state: Arc::new(RunnerState::default()),
            start,
        })
    }

    /// Get the loop state.
    pub fn state(&self) -> Arc<RunnerState> {
        Arc::clone(&self.state)
    }

    /// Get the engine context.
    pub fn context(&self) -> Arc<AppContext> {
        Arc::clone(&self.ctx)
    }

    /// Simulated time of a tick.
    pub fn simulated_time(&self, tick: u64) -> Result<Timestamp, RunnerError> {
        i64::try_from(tick)
            .ok()
            .and_then(|n| self.config.simulated_step_ms().checked_mul(n))
            .and_then(chrono::Duration::try_milliseconds)
            .and_then(|offset| self.start.checked_add_signed(offset))
            .ok_or(RunnerError::ClockOverflow { tick })
    }

    /// Adapter health graded on the simulated clock of a tick.
    pub fn health_at_tick(&self, tick: u64) -> Result<HealthMonitor, RunnerError> {
        Ok(self.ctx.health_at(self.simulated_time(tick)?))
    }

    /// Run one tick over every configured line.
    pub fn run_once(&self, tick: u64) -> Result<Vec<LineReport>, RunnerError> {
        let now = self.simulated_time(tick)?;
        let mut reports = Vec::with_capacity(self.config.lines.len());

        for &line in &self.config.lines {
            let (snapshot, report) = self.ctx.tick_with_report(line, self.config.mode, now);
            if !report.failed.is_empty() {
                warn!("{}: {} KPI reads failed", line, report.failed.len());
            }

            let probability = self.ctx.failure_probability(&snapshot);
            let ranking = self.ctx.get_component_risk_ranking(&snapshot, line);
            let critical_kpis = self
                .ctx
                .get_insights(&snapshot)
                .into_iter()
                .filter(|i| i.status == KpiStatus::Critical)
                .map(|i| i.kpi)
                .collect();

            update_snapshot_metrics(&snapshot, now);
            update_failure_probability(line, probability);
            update_component_risk(line, &ranking);
            update_adapter_status(&self.ctx.get_adapter_status(line, self.config.mode));

            reports.push(LineReport {
                tick,
                time: now,
                line,
                mode: self.config.mode,
                cold_start: report.cold_start,
                refreshed: report.refreshed,
                failed: report.failed,
                connected: report.connected,
                failure_probability: probability,
                critical_kpis,
                top_component: ranking.first().map(|p| p.component.clone()),
            });
        }

        if self.config.sample_bottlenecks {
            let utilization = self.ctx.sample_utilization();
            let bottlenecks = self.ctx.get_bottlenecks(&utilization);
            update_bottlenecks(&RESOURCES, &bottlenecks);
        }

        update_engine_metrics(&self.ctx.metrics());
        if let Some(path) = &self.config.metrics_path {
            write_metrics(path)?;
        }

        self.state.ticks.fetch_add(1, Ordering::SeqCst);
        Ok(reports)
    }

    /// Run the tick loop until stopped or `max_ticks` is reached.
    pub async fn run(&self) -> Result<(), RunnerError> {
        self.state.running.store(true, Ordering::SeqCst);
        info!(
            "Starting tick loop: {} lines, mode={}, interval={}ms, speed={}",
            self.config.lines.len(),
            self.config.mode,
            self.config.tick_interval_ms,
            self.config.speed
        );

        let mut timer = interval(Duration::from_millis(self.config.tick_interval_ms));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut tick = 0u64;
        loop {
            timer.tick().await;

            if !self.state.running.load(Ordering::SeqCst) {
                break;
            }
            if self.config.max_ticks.is_some_and(|max| tick >= max) {
                info!("Reached {} ticks, stopping", tick);
                break;
            }

            let reports = self.run_once(tick)?;
            if self.config.json_reports {
                for report in &reports {
                    println!("{}", serde_json::to_string(report)?);
                }
            }
            debug!("Tick {} done", tick);
            tick += 1;
        }

        self.state.running.store(false, Ordering::SeqCst);
        info!("{}", self.health_at_tick(tick.saturating_sub(1))?.report());
        Ok(())
    }

    /// Stop the loop after the current tick.
    pub fn stop(&self) {
        self.state.running.store(false, Ordering::SeqCst);
    }
}

/// Write metrics atomically so a collector never reads a partial file.
pub fn write_metrics(path: &Path) -> Result<(), RunnerError> {
    let text = encode_metrics()?;
    let tmp = path.with_extension("prom.tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Runner errors.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Simulated clock overflow at tick {tick}")]
    ClockOverflow { tick: u64 },

    #[error("Engine error: {0}")]
    Engine(#[from] LinewatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Metrics encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use linewatch::HealthStatus;
    use tempfile::{tempdir, NamedTempFile};

    fn start() -> Timestamp {
        Utc.timestamp_opt(1_706_781_600, 0).unwrap()
    }

    fn test_config() -> RunnerConfig {
        RunnerConfig::default()
            .with_lines(vec![LineId::Line1, LineId::Line2])
            .with_bottlenecks(false)
            .with_engine(EngineConfig::default().with_seed(5))
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RunnerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        assert!(RunnerConfig::default().with_lines(vec![]).validate().is_err());
        assert!(RunnerConfig::default().with_tick_interval_ms(0).validate().is_err());
        assert!(RunnerConfig::default().with_speed(0.0).validate().is_err());
        assert!(RunnerConfig::default().with_speed(f64::NAN).validate().is_err());
        assert!(RunnerConfig::default().with_speed(1e300).validate().is_err());
        assert!(RunnerConfig::default()
            .with_tick_interval_ms(MAX_TICK_INTERVAL_MS + 1)
            .validate()
            .is_err());
        assert!(RunnerConfig::default()
            .with_speed(MAX_SPEED)
            .with_tick_interval_ms(MAX_TICK_INTERVAL_MS)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let file = NamedTempFile::new().unwrap();
        let json = r#"{ "lines": ["line3"], "mode": "equipment", "speed": 30.0, "engine": { "seed": 9 } }"#;
        fs::write(file.path(), json).unwrap();

        let config = RunnerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.lines, vec![LineId::Line3]);
        assert_eq!(config.mode, AdapterMode::Equipment);
        assert_eq!(config.speed, 30.0);
        assert_eq!(config.engine.seed, Some(9));
        assert_eq!(config.tick_interval_ms, 1_000);
    }

    #[test]
    fn test_simulated_clock() {
        let runner = Runner::starting_at(test_config().with_speed(60.0), start()).unwrap();
        // 1 s interval at 60x advances one minute per tick
        assert_eq!(runner.simulated_time(0).unwrap(), start());
        assert_eq!(
            runner.simulated_time(3).unwrap(),
            start() + chrono::Duration::minutes(3)
        );
    }

    #[test]
    fn test_simulated_clock_past_i32_ticks() {
        let runner = Runner::starting_at(test_config(), start()).unwrap();
        assert_eq!(
            runner.simulated_time(3_000_000_000).unwrap(),
            start() + chrono::Duration::seconds(3_000_000_000)
        );
    }

    #[test]
    fn test_simulated_clock_overflow_is_an_error() {
        let config = test_config()
            .with_speed(MAX_SPEED)
            .with_tick_interval_ms(MAX_TICK_INTERVAL_MS);
        let runner = Runner::starting_at(config, start()).unwrap();

        assert!(runner.simulated_time(1).is_ok());
        assert!(matches!(
            runner.simulated_time(1_000_000),
            Err(RunnerError::ClockOverflow { tick: 1_000_000 })
        ));
        assert!(matches!(
            runner.simulated_time(u64::MAX),
            Err(RunnerError::ClockOverflow { .. })
        ));
        assert!(runner.run_once(u64::MAX).is_err());
    }

    #[test]
    fn test_health_graded_on_simulated_clock() {
        // One simulated hour per tick
        let runner = Runner::starting_at(test_config().with_speed(3_600.0), start()).unwrap();
        runner.run_once(0).unwrap();
        runner.run_once(1).unwrap();

        let health = runner.health_at_tick(1).unwrap();
        assert_eq!(health.status(), HealthStatus::Healthy);
        assert_eq!(health.healthy_count(), 2);

        // Two simulated hours without reads
        assert_eq!(
            runner.health_at_tick(3).unwrap().status(),
            HealthStatus::Degraded
        );
    }

    #[test]
    fn test_run_once_reports_every_line() {
        let runner = Runner::starting_at(test_config().with_speed(30.0), start()).unwrap();

        let first = runner.run_once(0).unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|r| r.cold_start && r.refreshed.is_empty()));
        assert!(first.iter().all(|r| (0.0..=100.0).contains(&r.failure_probability)));
        assert!(first.iter().all(|r| r.top_component.is_some()));

        // 30 s later OEE is due on both lines
        let second = runner.run_once(1).unwrap();
        assert!(second.iter().all(|r| r.refreshed.contains(&Kpi::Oee)));
        assert_eq!(runner.state().ticks.load(Ordering::SeqCst), 2);
        assert_eq!(runner.context().metrics().ticks, 4);
    }

    #[test]
    fn test_metrics_file_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("linewatch.prom");
        let runner = Runner::starting_at(test_config().with_metrics_path(&path), start()).unwrap();

        runner.run_once(0).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("linewatch_kpi_value"));
        assert!(text.contains("linewatch_component_risk_percent"));
        assert!(!dir.path().join("linewatch.prom.tmp").exists());
    }

    #[test]
    fn test_report_serializes() {
        let runner = Runner::starting_at(test_config(), start()).unwrap();
        let reports = runner.run_once(0).unwrap();
        let json = serde_json::to_string(&reports[0]).unwrap();
        assert!(json.contains("\"line\":\"line1\""));
        assert!(json.contains("\"cold_start\":true"));

        let back: LineReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reports[0]);
    }

    #[tokio::test]
    async fn test_run_stops_at_max_ticks() {
        let runner = Runner::starting_at(
            test_config().with_tick_interval_ms(1).with_max_ticks(5),
            start(),
        )
        .unwrap();

        runner.run().await.unwrap();
        let state = runner.state();
        assert_eq!(state.ticks.load(Ordering::SeqCst), 5);
        assert!(!state.running.load(Ordering::SeqCst));
    }
}
