// LineWatch - Maintenance planning
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Maintenance window selection and component maintenance planning.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::components::FailurePrediction;
use super::trend::predict_kpi_trend;
use crate::catalog::Kpi;
use crate::snapshot::Snapshot;

/// Risk below which maintenance is cheapest.
pub const LOW_RISK_THRESHOLD: f64 = 40.0;
/// Risk below which maintenance is still planned work.
pub const MEDIUM_RISK_THRESHOLD: f64 = 70.0;
/// Maintenance cost at low risk.
pub const LOW_RISK_COST: f64 = 2000.0;
/// Maintenance cost at medium risk.
pub const MEDIUM_RISK_COST: f64 = 4000.0;
/// Maintenance cost at high risk (emergency repair).
pub const HIGH_RISK_COST: f64 = 12000.0;
/// Production loss per OEE point below 100.
pub const LOSS_PER_OEE_POINT: f64 = 100.0;
/// A window is optimal only below this risk.
pub const OPTIMAL_RISK_LIMIT: f64 = 50.0;
/// A window is optimal only below this production loss.
pub const OPTIMAL_LOSS_LIMIT: f64 = 3000.0;

/// Component risk above which maintenance is immediate.
pub const CRITICAL_COMPONENT_RISK: f64 = 50.0;
/// Component risk from which maintenance is due within 72 hours.
pub const WARNING_COMPONENT_RISK: f64 = 30.0;

/// Maintenance cost tier for a risk level.
pub fn maintenance_cost(risk: f64) -> f64 {
    if risk < LOW_RISK_THRESHOLD {
        LOW_RISK_COST
    } else if risk < MEDIUM_RISK_THRESHOLD {
        MEDIUM_RISK_COST
    } else {
        HIGH_RISK_COST
    }
}

/// Lost production while a line with this OEE is stopped.
pub fn production_loss(oee: f64) -> f64 {
    (100.0 - oee) * LOSS_PER_OEE_POINT
}

/// Cost breakdown of one candidate maintenance day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceDay {
    /// Day index in the risk series
    pub day: usize,
    /// Projected risk that day
    pub risk: f64,
    /// Maintenance cost tier
    pub maintenance_cost: f64,
    /// Opportunity cost
    pub production_loss: f64,
    /// Sum of both costs
    pub total_cost: f64,
    /// Whether the day is a recommended window
    pub optimal: bool,
}

/// Per-day maintenance cost analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceSchedule {
    pub days: Vec<MaintenanceDay>,
}

impl MaintenanceSchedule {
    /// Indices of the recommended days.
    pub fn optimal_windows(&self) -> Vec<usize> {
        self.days.iter().filter(|d| d.optimal).map(|d| d.day).collect()
    }

    /// Cheapest recommended day.
    pub fn best_window(&self) -> Option<&MaintenanceDay> {
        self.days
            .iter()
            .filter(|d| d.optimal)
            .min_by(|a, b| a.total_cost.total_cmp(&b.total_cost))
    }
}

/// Cost every day of a risk series and mark the optimal windows.
///
/// Production loss uses the snapshot's OEE, or the OEE target when the
/// snapshot has none.
pub fn calculate_optimal_maintenance(snapshot: &Snapshot, risk_series: &[f64]) -> MaintenanceSchedule {
    let oee = snapshot.value(Kpi::Oee).unwrap_or_else(|| Kpi::Oee.target());
    let loss = production_loss(oee);

    let days = risk_series
        .iter()
        .enumerate()
        .map(|(day, &risk)| {
            let cost = maintenance_cost(risk);
            MaintenanceDay {
                day,
                risk,
                maintenance_cost: cost,
                production_loss: loss,
                total_cost: cost + loss,
                optimal: risk < OPTIMAL_RISK_LIMIT && loss < OPTIMAL_LOSS_LIMIT,
            }
        })
        .collect();

    MaintenanceSchedule { days }
}

/// Project PM Risk day by day, starting from the snapshot value.
pub fn project_risk_series<R: Rng + ?Sized>(snapshot: &Snapshot, days: usize, rng: &mut R) -> Vec<f64> {
    let target = Kpi::PmRisk.target();
    let mut risk = snapshot.value(Kpi::PmRisk).unwrap_or(target);
    let mut series = Vec::with_capacity(days);
    for _ in 0..days {
        series.push(risk);
        risk = predict_kpi_trend(risk, target, rng);
    }
    series
}

/// Urgency of a component's maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenancePriority {
    /// Immediate action required
    Critical,
    /// Due within 72 hours
    Warning,
    /// Routine schedule
    Normal,
}

impl MaintenancePriority {
    /// Priority of a component risk level.
    pub fn from_risk(risk: f64) -> Self {
        if risk > CRITICAL_COMPONENT_RISK {
            MaintenancePriority::Critical
        } else if risk >= WARNING_COMPONENT_RISK {
            MaintenancePriority::Warning
        } else {
            MaintenancePriority::Normal
        }
    }

    /// When the action is due.
    pub fn action(&self) -> &'static str {
        match self {
            MaintenancePriority::Critical => "Immediate",
            MaintenancePriority::Warning => "Within 72 hours",
            MaintenancePriority::Normal => "Routine schedule",
        }
    }
}

/// Component predictions grouped by maintenance priority.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenancePlan {
    pub critical: Vec<FailurePrediction>,
    pub warning: Vec<FailurePrediction>,
    pub normal: Vec<FailurePrediction>,
}

impl MaintenancePlan {
    /// Group predictions, keeping their order within each group.
    pub fn from_predictions(predictions: &[FailurePrediction]) -> Self {
        let mut plan = Self::default();
        for p in predictions {
            match MaintenancePriority::from_risk(p.risk_percent) {
                MaintenancePriority::Critical => plan.critical.push(p.clone()),
                MaintenancePriority::Warning => plan.warning.push(p.clone()),
                MaintenancePriority::Normal => plan.normal.push(p.clone()),
            }
        }
        plan
    }

    /// Whether anything needs immediate action.
    pub fn has_critical(&self) -> bool {
        !self.critical.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LineId;
    use approx::assert_relative_eq;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snapshot(oee: f64) -> Snapshot {
        Snapshot::from_values(LineId::Line1, [(Kpi::Oee, oee), (Kpi::PmRisk, 35.0)], Utc::now())
    }

    fn prediction(name: &str, risk: f64) -> FailurePrediction {
        FailurePrediction {
            component: name.to_string(),
            risk_percent: risk,
            hours_to_failure: 10,
            recommendation: String::new(),
        }
    }

    #[test]
    fn test_cost_tiers() {
        assert_eq!(maintenance_cost(39.9), 2000.0);
        assert_eq!(maintenance_cost(40.0), 4000.0);
        assert_eq!(maintenance_cost(69.9), 4000.0);
        assert_eq!(maintenance_cost(70.0), 12000.0);
    }

    #[test]
    fn test_optimal_windows() {
        let schedule = calculate_optimal_maintenance(&snapshot(85.0), &[30.0, 55.0, 45.0, 80.0]);
        assert_eq!(schedule.optimal_windows(), vec![0, 2]);

        let day2 = &schedule.days[2];
        assert_relative_eq!(day2.production_loss, 1500.0);
        assert_relative_eq!(day2.total_cost, 5500.0);
        assert_eq!(schedule.best_window().unwrap().day, 0);
    }

    #[test]
    fn test_low_oee_blocks_every_window() {
        // Loss (100 - 65) × 100 = 3500 ≥ 3000
        let schedule = calculate_optimal_maintenance(&snapshot(65.0), &[10.0, 20.0]);
        assert!(schedule.optimal_windows().is_empty());
        assert!(schedule.best_window().is_none());
    }

    #[test]
    fn test_project_risk_series() {
        let series = project_risk_series(&snapshot(85.0), 7, &mut StdRng::seed_from_u64(5));
        assert_eq!(series.len(), 7);
        assert_eq!(series[0], 35.0);
        // PM Risk trend band is [0.7, 1.3] × 30
        assert!(series.iter().all(|r| *r >= 21.0 - 1e-9 && *r <= 39.0 + 1e-9));
    }

    #[test]
    fn test_plan_grouping() {
        let predictions = vec![
            prediction("A", 72.0),
            prediction("B", 50.0),
            prediction("C", 30.0),
            prediction("D", 29.9),
        ];
        let plan = MaintenancePlan::from_predictions(&predictions);
        assert_eq!(plan.critical.len(), 1);
        assert_eq!(plan.warning.len(), 2);
        assert_eq!(plan.normal.len(), 1);
        assert!(plan.has_critical());
        assert_eq!(MaintenancePriority::from_risk(50.1).action(), "Immediate");
    }
}
