// LineWatch - Application context
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Application context
//!
//! Owns the adapter registry, the snapshot store and the engine counters, and
//! exposes the operations a presentation layer calls: snapshots, ticks,
//! adapter status, insights and the predictive analytics.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::adapter::{AdapterMode, AdapterStatus};
use crate::analytics::{
    self, Bottleneck, FailurePrediction, MaintenancePlan, MaintenanceSchedule, PerformanceForecast,
};
use crate::catalog::{Kpi, LineId};
use crate::classifier::{Classifier, Insight};
use crate::config::EngineConfig;
use crate::generator::{sample_utilization, ValueGenerator};
use crate::health::HealthMonitor;
use crate::metrics::EngineMetrics;
use crate::registry::AdapterRegistry;
use crate::scheduler::{TickReport, UpdateScheduler};
use crate::snapshot::{KpiStore, Snapshot, Timestamp};

/// Seed salt for the analytics random source
const ANALYTICS_SEED_SALT: u64 = 0x6c69_6e65_7761_7463;

/// Engine state shared by every caller
#[derive(Debug)]
pub struct AppContext {
    config: EngineConfig,
    default_mode: AdapterMode,
    registry: AdapterRegistry,
    store: KpiStore,
    scheduler: UpdateScheduler,
    classifier: Classifier,
    rng: Mutex<StdRng>,
    metrics: Mutex<EngineMetrics>,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AppContext {
    /// Create a context from an engine configuration
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ ANALYTICS_SEED_SALT),
            None => StdRng::from_entropy(),
        };
        Self {
            default_mode: AdapterMode::Simulated,
            registry: AdapterRegistry::new(config.clone()),
            store: KpiStore::new(),
            scheduler: UpdateScheduler::new(ValueGenerator::new(config.plant_offset())),
            classifier: Classifier::new(),
            rng: Mutex::new(rng),
            metrics: Mutex::new(EngineMetrics::new()),
            config,
        }
    }

    /// Use a different mode when `get_snapshot` cold-starts a line
    pub fn with_default_mode(mut self, mode: AdapterMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Use a custom classifier for insights
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mode used for cold starts from `get_snapshot`
    pub fn default_mode(&self) -> AdapterMode {
        self.default_mode
    }

    /// Adapter registry
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Latest snapshots
    pub fn store(&self) -> &KpiStore {
        &self.store
    }

    /// Current snapshot of a line, cold-starting it when unseen
    pub fn get_snapshot(&self, line: LineId) -> Arc<Snapshot> {
        self.get_snapshot_at(line, Utc::now())
    }

    /// Current snapshot of a line at a given time
    pub fn get_snapshot_at(&self, line: LineId, now: Timestamp) -> Arc<Snapshot> {
        match self.store.get(line) {
            Some(snapshot) => snapshot,
            None => self.tick(line, self.default_mode, now),
        }
    }

    /// Run one scheduler tick for a line and publish the result
    pub fn tick(&self, line: LineId, mode: AdapterMode, now: Timestamp) -> Arc<Snapshot> {
        self.tick_with_report(line, mode, now).0
    }

    /// Run one tick, returning what it did
    pub fn tick_with_report(
        &self,
        line: LineId,
        mode: AdapterMode,
        now: Timestamp,
    ) -> (Arc<Snapshot>, TickReport) {
        let adapter = self.registry.get_adapter(line, mode);
        let previous = self.store.get(line);

        let (snapshot, report) = {
            let mut adapter = adapter.lock().unwrap_or_else(PoisonError::into_inner);
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.scheduler
                .tick(previous.as_deref(), &mut **adapter, now, &mut *rng)
        };

        let published = self.store.publish(snapshot);
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_tick(&report);
        (published, report)
    }

    /// Connection status of the adapter for (line, mode)
    pub fn get_adapter_status(&self, line: LineId, mode: AdapterMode) -> AdapterStatus {
        let adapter = self.registry.get_adapter(line, mode);
        let status = adapter.lock().unwrap_or_else(PoisonError::into_inner).status();
        status
    }

    /// Graded KPIs, most urgent first
    pub fn get_insights(&self, snapshot: &Snapshot) -> Vec<Insight> {
        self.classifier.insights(snapshot)
    }

    /// Components ranked by descending failure risk
    pub fn get_component_risk_ranking(&self, snapshot: &Snapshot, line: LineId) -> Vec<FailurePrediction> {
        analytics::predict_component_failures(snapshot, line)
    }

    /// Resources projected above the bottleneck threshold
    pub fn get_bottlenecks(&self, utilizations: &[f64]) -> Vec<Bottleneck> {
        analytics::predict_bottlenecks(utilizations, &mut *self.lock_rng())
    }

    /// Sample a utilization vector for the standard resources
    pub fn sample_utilization(&self) -> Vec<f64> {
        sample_utilization(&mut *self.lock_rng())
    }

    /// Next-step projection of every KPI in a snapshot
    pub fn predict_trends(&self, snapshot: &Snapshot) -> BTreeMap<Kpi, f64> {
        analytics::predict_snapshot_trends(snapshot, &mut *self.lock_rng())
    }

    /// Aggregate failure probability (percent)
    pub fn failure_probability(&self, snapshot: &Snapshot) -> f64 {
        analytics::calculate_failure_probability(snapshot)
    }

    /// Cost analysis over a projected PM Risk series of `days` days
    pub fn maintenance_schedule(&self, snapshot: &Snapshot, days: usize) -> MaintenanceSchedule {
        let series = analytics::project_risk_series(snapshot, days, &mut *self.lock_rng());
        analytics::calculate_optimal_maintenance(snapshot, &series)
    }

    /// Component maintenance grouped by priority
    pub fn maintenance_plan(&self, snapshot: &Snapshot, line: LineId) -> MaintenancePlan {
        MaintenancePlan::from_predictions(&analytics::predict_component_failures(snapshot, line))
    }

    /// 24-hour forecast for a line
    pub fn performance_forecast(&self, snapshot: &Snapshot, line: LineId) -> PerformanceForecast {
        analytics::performance_forecast(snapshot, line)
    }

    /// Health of every registered adapter
    pub fn health(&self) -> HealthMonitor {
        self.health_at(Utc::now())
    }

    /// Health of every registered adapter at a given time
    pub fn health_at(&self, now: Timestamp) -> HealthMonitor {
        HealthMonitor::from_statuses(&self.registry.statuses(), now)
    }

    /// Copy of the engine counters
    pub fn metrics(&self) -> EngineMetrics {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn lock_rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KpiStatus;
    use crate::config::EquipmentConfig;
    use crate::health::HealthStatus;
    use crate::tls::TlsConfig;
    use chrono::TimeZone;

    fn t(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_706_781_600 + secs, 0).unwrap()
    }

    fn seeded() -> AppContext {
        AppContext::new(EngineConfig::default().with_seed(42))
    }

    /// Context whose equipment handshake always fails
    fn unreachable_equipment() -> AppContext {
        let equipment = EquipmentConfig::default().with_tls(TlsConfig::new());
        AppContext::new(EngineConfig::default().with_seed(42).with_equipment(equipment))
    }

    #[test]
    fn test_get_snapshot_cold_starts_once() {
        let ctx = seeded();
        let first = ctx.get_snapshot_at(LineId::Line1, t(0));
        assert!(first.is_complete());
        let again = ctx.get_snapshot_at(LineId::Line1, t(500));
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(ctx.metrics().cold_starts, 1);
    }

    #[test]
    fn test_tick_publishes() {
        let ctx = seeded();
        ctx.tick(LineId::Line2, AdapterMode::Simulated, t(0));
        let (snapshot, report) = ctx.tick_with_report(LineId::Line2, AdapterMode::Simulated, t(31));
        assert_eq!(report.refreshed, vec![Kpi::Oee]);
        assert_eq!(snapshot.last_updated(Kpi::Oee), Some(t(31)));
        assert_eq!(ctx.store().lines(), vec![LineId::Line2]);

        let metrics = ctx.metrics();
        assert_eq!(metrics.ticks, 2);
        assert_eq!(metrics.reads, 1);
    }

    #[test]
    fn test_seeded_contexts_agree() {
        let a = seeded();
        let b = seeded();
        for secs in [0, 100, 400, 1000] {
            a.tick(LineId::Line3, AdapterMode::Simulated, t(secs));
            b.tick(LineId::Line3, AdapterMode::Simulated, t(secs));
        }
        assert_eq!(
            *a.get_snapshot_at(LineId::Line3, t(1000)),
            *b.get_snapshot_at(LineId::Line3, t(1000))
        );
    }

    #[test]
    fn test_failed_handshake_holds_values() {
        let ctx = unreachable_equipment();
        ctx.tick(LineId::Line4, AdapterMode::Simulated, t(0));
        let (snapshot, report) = ctx.tick_with_report(LineId::Line4, AdapterMode::Equipment, t(100));
        assert!(report.refreshed.is_empty());
        assert!(!report.failed.is_empty());
        assert!(snapshot.is_complete());
        assert_eq!(ctx.metrics().connect_failures, 1);

        let status = ctx.get_adapter_status(LineId::Line4, AdapterMode::Equipment);
        assert!(!status.is_connected());
    }

    #[test]
    fn test_health_rollup() {
        let ctx = unreachable_equipment();
        assert_eq!(ctx.health_at(t(0)).status(), HealthStatus::Unknown);

        ctx.tick(LineId::Line1, AdapterMode::Simulated, t(0));
        assert_eq!(ctx.health_at(t(0)).status(), HealthStatus::Healthy);

        ctx.tick(LineId::Line1, AdapterMode::Equipment, t(100));
        assert_eq!(ctx.health_at(t(100)).status(), HealthStatus::Degraded);
    }

    #[test]
    fn test_equipment_stays_healthy_while_reading() {
        let ctx = seeded();
        for step in 0..=70 {
            let (_, report) = ctx.tick_with_report(LineId::Line1, AdapterMode::Equipment, t(step * 30));
            if step > 0 {
                assert!(report.connected);
                assert!(report.refreshed.contains(&Kpi::Oee));
            }
        }

        // Handshake at 30 s, more than 1800 s ago
        let status = ctx.get_adapter_status(LineId::Line1, AdapterMode::Equipment);
        assert_eq!(status.last_update, Some(t(30)));
        assert_eq!(status.last_reading, Some(t(2100)));

        let health = ctx.health_at(t(2100));
        assert_eq!(health.status(), HealthStatus::Healthy);

        // Reads stop, the link goes stale
        assert_eq!(ctx.health_at(t(4000)).status(), HealthStatus::Degraded);
    }

    #[test]
    fn test_equipment_readings_stay_in_bounds() {
        let ctx = seeded();
        ctx.tick(LineId::Line1, AdapterMode::Simulated, t(0));
        let (snapshot, report) = ctx.tick_with_report(LineId::Line1, AdapterMode::Equipment, t(2000));
        assert_eq!(report.refreshed.len(), Kpi::ALL.len());
        assert!(report.connected);
        for (kpi, reading) in snapshot.iter() {
            assert!(kpi.definition().in_bounds(reading.value), "{}", kpi);
        }
    }

    #[test]
    fn test_insights_and_analytics() {
        let ctx = seeded();
        let snap = Snapshot::from_values(
            LineId::Line2,
            [(Kpi::Oee, 88.0), (Kpi::PmRisk, 25.0), (Kpi::BattEfficiency, 93.0)],
            t(0),
        );

        let insights = ctx.get_insights(&snap);
        let oee = insights.iter().find(|i| i.kpi == Kpi::Oee).unwrap();
        assert_eq!(oee.status, KpiStatus::Excellent);

        let p = ctx.failure_probability(&snap);
        assert!((0.0..=100.0).contains(&p));

        let ranking = ctx.get_component_risk_ranking(&snap, LineId::Line2);
        assert!(ranking.windows(2).all(|w| w[0].risk_percent >= w[1].risk_percent));

        let schedule = ctx.maintenance_schedule(&snap, 7);
        assert_eq!(schedule.days.len(), 7);

        let plan = ctx.maintenance_plan(&snap, LineId::Line2);
        assert_eq!(
            plan.critical.len() + plan.warning.len() + plan.normal.len(),
            ranking.len()
        );

        let forecast = ctx.performance_forecast(&snap, LineId::Line2);
        assert_eq!(forecast.points.len(), 13);

        assert_eq!(ctx.predict_trends(&snap).len(), 3);
    }

    #[test]
    fn test_bottlenecks_and_utilization() {
        let ctx = seeded();
        let utilization = ctx.sample_utilization();
        assert_eq!(utilization.len(), 5);
        assert!(utilization.iter().all(|u| (60.0..=95.0).contains(u)));

        let bottlenecks = ctx.get_bottlenecks(&[90.0, 50.0, 88.0, 60.0, 95.0]);
        let indices: Vec<usize> = bottlenecks.iter().map(|b| b.index).collect();
        assert!(indices.contains(&0));
        assert!(indices.contains(&2));
        assert!(indices.contains(&4));
    }
}
