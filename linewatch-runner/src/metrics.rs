// LineWatch Runner - Prometheus metrics definitions
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Prometheus metrics for LineWatch monitoring.
//!
//! This module defines all Prometheus gauges exported by the runner and
//! provides functions to update them from engine snapshots and counters.

use lazy_static::lazy_static;
use linewatch::{AdapterStatus, Bottleneck, EngineMetrics, FailurePrediction, LineId, Snapshot};
use prometheus::{register_gauge, register_gauge_vec, Encoder, Gauge, GaugeVec, TextEncoder};

use crate::runner::RunnerError;

lazy_static! {
    // ============================================================
    // Line Metrics
    // ============================================================

    /// Current KPI value (labeled by line and KPI name).
    pub static ref KPI_VALUE: GaugeVec = register_gauge_vec!(
        "linewatch_kpi_value",
        "Current KPI value",
        &["line", "kpi"]
    ).unwrap();

    /// Seconds since the KPI was last refreshed.
    pub static ref KPI_AGE_SECONDS: GaugeVec = register_gauge_vec!(
        "linewatch_kpi_age_seconds",
        "Seconds since the KPI was last refreshed",
        &["line", "kpi"]
    ).unwrap();

    /// Aggregate failure probability per line (0-100).
    pub static ref FAILURE_PROBABILITY: GaugeVec = register_gauge_vec!(
        "linewatch_failure_probability_percent",
        "Aggregate failure probability per line (0-100)",
        &["line"]
    ).unwrap();

    /// Per-component failure risk (0-100).
    pub static ref COMPONENT_RISK: GaugeVec = register_gauge_vec!(
        "linewatch_component_risk_percent",
        "Per-component failure risk (0-100)",
        &["line", "component"]
    ).unwrap();

    /// Adapter connectivity (1 = connected, 0 = disconnected).
    pub static ref ADAPTER_CONNECTED: GaugeVec = register_gauge_vec!(
        "linewatch_adapter_connected",
        "Adapter connectivity (1=connected, 0=disconnected)",
        &["line", "mode"]
    ).unwrap();

    /// Projected bottleneck severity per resource (0-100).
    pub static ref BOTTLENECK_SEVERITY: GaugeVec = register_gauge_vec!(
        "linewatch_bottleneck_severity",
        "Projected bottleneck severity per resource (0-100)",
        &["resource"]
    ).unwrap();

    // ============================================================
    // Engine Counters
    // ============================================================

    /// Ticks executed by the engine.
    pub static ref TICKS_TOTAL: Gauge = register_gauge!(
        "linewatch_ticks_total",
        "Ticks executed by the engine"
    ).unwrap();

    /// Lines cold-started.
    pub static ref COLD_STARTS_TOTAL: Gauge = register_gauge!(
        "linewatch_cold_starts_total",
        "Lines cold-started"
    ).unwrap();

    /// Adapter reads attempted.
    pub static ref READS_TOTAL: Gauge = register_gauge!(
        "linewatch_reads_total",
        "Adapter reads attempted"
    ).unwrap();

    /// Adapter reads that failed.
    pub static ref READ_FAILURES_TOTAL: Gauge = register_gauge!(
        "linewatch_read_failures_total",
        "Adapter reads that failed"
    ).unwrap();

    /// Ticks that found the adapter disconnected.
    pub static ref CONNECT_FAILURES_TOTAL: Gauge = register_gauge!(
        "linewatch_connect_failures_total",
        "Ticks that found the adapter disconnected"
    ).unwrap();

    // ============================================================
    // Runner Metrics
    // ============================================================

    /// Clock speed multiplier.
    pub static ref CLOCK_SPEED: Gauge = register_gauge!(
        "linewatch_runner_clock_speed",
        "Simulated clock speed multiplier"
    ).unwrap();
}

/// Update KPI gauges from a snapshot.
pub fn update_snapshot_metrics(snapshot: &Snapshot, now: linewatch::Timestamp) {
    let line = snapshot.line.as_str();
    for (kpi, reading) in snapshot.iter() {
        KPI_VALUE.with_label_values(&[line, kpi.name()]).set(reading.value);
        if let Some(age) = snapshot.age(kpi, now) {
            KPI_AGE_SECONDS
                .with_label_values(&[line, kpi.name()])
                .set(age.num_milliseconds() as f64 / 1000.0);
        }
    }
}

/// Update the failure probability of a line.
pub fn update_failure_probability(line: LineId, probability: f64) {
    FAILURE_PROBABILITY
        .with_label_values(&[line.as_str()])
        .set(probability);
}

/// Update per-component risk gauges.
pub fn update_component_risk(line: LineId, predictions: &[FailurePrediction]) {
    for p in predictions {
        COMPONENT_RISK
            .with_label_values(&[line.as_str(), p.component.as_str()])
            .set(p.risk_percent);
    }
}

/// Update adapter connectivity.
pub fn update_adapter_status(status: &AdapterStatus) {
    ADAPTER_CONNECTED
        .with_label_values(&[status.line.as_str(), status.mode.as_str()])
        .set(if status.is_connected() { 1.0 } else { 0.0 });
}

/// Update bottleneck severities. Resources below threshold read 0.
pub fn update_bottlenecks(resources: &[&str], bottlenecks: &[Bottleneck]) {
    for resource in resources {
        let severity = bottlenecks
            .iter()
            .find(|b| b.resource == *resource)
            .map(|b| b.severity)
            .unwrap_or(0.0);
        BOTTLENECK_SEVERITY.with_label_values(&[resource]).set(severity);
    }
}

/// Update engine counters.
pub fn update_engine_metrics(metrics: &EngineMetrics) {
    TICKS_TOTAL.set(metrics.ticks as f64);
    COLD_STARTS_TOTAL.set(metrics.cold_starts as f64);
    READS_TOTAL.set(metrics.reads as f64);
    READ_FAILURES_TOTAL.set(metrics.read_failures as f64);
    CONNECT_FAILURES_TOTAL.set(metrics.connect_failures as f64);
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> Result<String, RunnerError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use linewatch::analytics::project_bottlenecks;
    use linewatch::{AdapterMode, ConnectionState, Kpi};

    #[test]
    fn test_encode_metrics() {
        let now = Utc.timestamp_opt(1_706_781_600, 0).unwrap();
        let snapshot = Snapshot::from_values(LineId::Line1, [(Kpi::Oee, 84.5)], now);
        update_snapshot_metrics(&snapshot, now);
        update_failure_probability(LineId::Line1, 42.0);

        let output = encode_metrics().unwrap();
        assert!(output.contains("linewatch_kpi_value"));
        assert!(output.contains("kpi=\"OEE\""));
        assert!(output.contains("linewatch_failure_probability_percent"));
    }

    #[test]
    fn test_adapter_status_gauge() {
        let status = AdapterStatus {
            line: LineId::Line4,
            status: ConnectionState::Disconnected,
            mode: AdapterMode::Equipment,
            message: "OPC-UA to factory equipment".to_string(),
            last_update: None,
            last_reading: None,
        };
        update_adapter_status(&status);
        assert_eq!(
            ADAPTER_CONNECTED.with_label_values(&["line4", "equipment"]).get(),
            0.0
        );
    }

    #[test]
    fn test_bottleneck_gauges_reset_below_threshold() {
        let resources = ["Robots", "Personnel"];
        update_bottlenecks(&resources, &project_bottlenecks(&[90.0, 50.0], 0.0));
        assert_eq!(BOTTLENECK_SEVERITY.with_label_values(&["Robots"]).get(), 25.0);
        assert_eq!(BOTTLENECK_SEVERITY.with_label_values(&["Personnel"]).get(), 0.0);
    }

    #[test]
    fn test_engine_counters() {
        let metrics = EngineMetrics {
            ticks: 7,
            reads: 12,
            ..Default::default()
        };
        update_engine_metrics(&metrics);
        // Runner tests share these gauges, so only check they are exported
        let output = encode_metrics().unwrap();
        assert!(output.contains("linewatch_ticks_total"));
        assert!(output.contains("linewatch_reads_total"));
    }
}
