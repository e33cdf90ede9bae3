//! Engine counters
//!
//! This module keeps tick statistics: how many ticks ran, how many lines
//! were cold-started and how often adapter reads or connections failed.

use std::collections::BTreeMap;

use crate::catalog::Kpi;
use crate::scheduler::TickReport;

/// Tick statistics collector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineMetrics {
    /// Ticks executed
    pub ticks: u64,
    /// Ticks that initialized a line
    pub cold_starts: u64,
    /// Adapter reads attempted
    pub reads: u64,
    /// Adapter reads that failed
    pub read_failures: u64,
    /// Ticks that read from a disconnected adapter
    pub connect_failures: u64,
    /// Failures per KPI
    pub failures_by_kpi: BTreeMap<Kpi, u64>,
}

impl EngineMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a tick
    pub fn record_tick(&mut self, report: &TickReport) {
        self.ticks += 1;
        if report.cold_start {
            self.cold_starts += 1;
        }
        self.reads += report.reads() as u64;
        self.read_failures += report.failed.len() as u64;
        for kpi in &report.failed {
            *self.failures_by_kpi.entry(*kpi).or_insert(0) += 1;
        }
        if !report.connected && report.reads() > 0 {
            self.connect_failures += 1;
        }
    }

    /// Fraction of reads that succeeded (0.0 - 1.0)
    pub fn read_success_rate(&self) -> f64 {
        if self.reads == 0 {
            return 1.0;
        }
        (self.reads - self.read_failures) as f64 / self.reads as f64
    }

    /// KPI with the most failed reads
    pub fn most_failed_kpi(&self) -> Option<Kpi> {
        self.failures_by_kpi
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(kpi, _)| *kpi)
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a human-readable report
    pub fn report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== LineWatch Engine Metrics ===\n\n");

        report.push_str(&format!("Ticks: {}\n", self.ticks));
        report.push_str(&format!("Cold starts: {}\n", self.cold_starts));
        report.push_str(&format!("Reads: {}\n", self.reads));
        report.push_str(&format!("Read failures: {}\n", self.read_failures));
        report.push_str(&format!("Connect failures: {}\n", self.connect_failures));
        report.push_str(&format!(
            "Read success rate: {:.1}%\n",
            self.read_success_rate() * 100.0
        ));

        if !self.failures_by_kpi.is_empty() {
            report.push_str("\nFailures by KPI:\n");
            let mut failures: Vec<_> = self.failures_by_kpi.iter().collect();
            failures.sort_by(|a, b| b.1.cmp(a.1));
            for (kpi, count) in failures {
                report.push_str(&format!("  {}: {}\n", kpi, count));
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterMode;
    use crate::catalog::LineId;

    fn report(cold_start: bool, refreshed: Vec<Kpi>, failed: Vec<Kpi>, connected: bool) -> TickReport {
        TickReport {
            line: LineId::Line1,
            mode: AdapterMode::Equipment,
            cold_start,
            refreshed,
            failed,
            connected,
        }
    }

    #[test]
    fn test_record_tick() {
        let mut metrics = EngineMetrics::new();
        metrics.record_tick(&report(true, vec![], vec![], false));
        metrics.record_tick(&report(false, vec![Kpi::Oee, Kpi::Tvr], vec![], true));
        metrics.record_tick(&report(false, vec![], vec![Kpi::Oee, Kpi::PmRisk], false));

        assert_eq!(metrics.ticks, 3);
        assert_eq!(metrics.cold_starts, 1);
        assert_eq!(metrics.reads, 4);
        assert_eq!(metrics.read_failures, 2);
        // The cold start read nothing, so only the last tick counts
        assert_eq!(metrics.connect_failures, 1);
        assert!((metrics.read_success_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_most_failed_kpi() {
        let mut metrics = EngineMetrics::new();
        metrics.record_tick(&report(false, vec![], vec![Kpi::Oee, Kpi::Security], true));
        metrics.record_tick(&report(false, vec![], vec![Kpi::Security], true));

        assert_eq!(metrics.most_failed_kpi(), Some(Kpi::Security));
        assert_eq!(metrics.connect_failures, 0);
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = EngineMetrics::new();
        assert_eq!(metrics.read_success_rate(), 1.0);
        assert_eq!(metrics.most_failed_kpi(), None);
    }

    #[test]
    fn test_report_generation() {
        let mut metrics = EngineMetrics::new();
        metrics.record_tick(&report(false, vec![], vec![Kpi::BattEfficiency], false));

        let report = metrics.report();
        assert!(report.contains("Ticks: 1"));
        assert!(report.contains("Connect failures: 1"));
        assert!(report.contains("Batt Efficiency: 1"));
    }

    #[test]
    fn test_reset() {
        let mut metrics = EngineMetrics::new();
        metrics.record_tick(&report(true, vec![], vec![], true));
        metrics.reset();
        assert_eq!(metrics, EngineMetrics::default());
    }
}
