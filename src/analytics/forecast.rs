// LineWatch - Performance forecast
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! 24-hour output, OEE and failure-risk forecast for a line.

use serde::{Deserialize, Serialize};

use super::failure::calculate_failure_probability;
use crate::catalog::{Kpi, LineId};
use crate::snapshot::Snapshot;

/// Forecast horizon in hours.
pub const FORECAST_HORIZON_HOURS: u32 = 24;
/// Hours between forecast points.
pub const FORECAST_STEP_HOURS: u32 = 2;
/// Hourly output retention.
pub const OUTPUT_DECAY: f64 = 0.98;
/// Hourly OEE retention.
pub const OEE_DECAY: f64 = 0.992;
/// Failure risk added per forecast hour.
pub const RISK_GROWTH_PER_HOUR: f64 = 3.0;
/// Risk above which a forecast point is critical.
pub const CRITICAL_FORECAST_RISK: f64 = 60.0;

/// Qualitative failure-risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// Band of a risk level: low below 30, high from 70.
    pub fn from_risk(risk: f64) -> Self {
        if risk < 30.0 {
            RiskBand::Low
        } else if risk < 70.0 {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }
}

/// One forecast point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Hours from now
    pub hour: u32,
    /// Units produced per hour
    pub units_produced: f64,
    /// Projected OEE
    pub oee: f64,
    /// Projected failure risk (percent)
    pub failure_risk: f64,
    /// Risk band
    pub band: RiskBand,
}

impl ForecastPoint {
    /// Whether the point is above the critical risk threshold.
    pub fn is_critical(&self) -> bool {
        self.failure_risk > CRITICAL_FORECAST_RISK
    }
}

/// Forecast for a line over the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceForecast {
    pub line: LineId,
    pub points: Vec<ForecastPoint>,
}

impl PerformanceForecast {
    /// Points where failure risk exceeds the critical threshold.
    pub fn critical_points(&self) -> Vec<&ForecastPoint> {
        self.points.iter().filter(|p| p.is_critical()).collect()
    }

    /// First hour at which the forecast turns critical.
    pub fn first_critical_hour(&self) -> Option<u32> {
        self.points.iter().find(|p| p.is_critical()).map(|p| p.hour)
    }
}

/// Forecast a line from its current snapshot.
///
/// Output decays from the line's nominal rate, OEE decays from its current
/// value (the target when absent) and failure risk grows linearly from the
/// aggregate failure probability.
pub fn performance_forecast(snapshot: &Snapshot, line: LineId) -> PerformanceForecast {
    let base_output = line.info().base_output_rate;
    let oee = snapshot.value(Kpi::Oee).unwrap_or_else(|| Kpi::Oee.target());
    let base_risk = calculate_failure_probability(snapshot);

    let points = (0..=FORECAST_HORIZON_HOURS)
        .step_by(FORECAST_STEP_HOURS as usize)
        .map(|hour| {
            let h = hour as f64;
            let failure_risk = (base_risk + RISK_GROWTH_PER_HOUR * h).min(100.0);
            ForecastPoint {
                hour,
                units_produced: base_output * OUTPUT_DECAY.powi(hour as i32),
                oee: oee * OEE_DECAY.powi(hour as i32),
                failure_risk,
                band: RiskBand::from_risk(failure_risk),
            }
        })
        .collect();

    PerformanceForecast { line, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Utc;

    #[test]
    fn test_forecast_shape() {
        let snap = Snapshot::from_values(LineId::Line1, [(Kpi::Oee, 85.0)], Utc::now());
        let forecast = performance_forecast(&snap, LineId::Line1);
        let hours: Vec<u32> = forecast.points.iter().map(|p| p.hour).collect();
        assert_eq!(hours, vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24]);

        let first = &forecast.points[0];
        assert_relative_eq!(first.units_produced, 120.0);
        assert_relative_eq!(first.oee, 85.0);

        let last = &forecast.points[12];
        assert_relative_eq!(last.units_produced, 120.0 * 0.98f64.powi(24), epsilon = 1e-9);
        assert_relative_eq!(last.oee, 85.0 * 0.992f64.powi(24), epsilon = 1e-9);
    }

    #[test]
    fn test_risk_growth_and_critical_points() {
        // PM Risk alone at 15 → base probability 50
        let snap = Snapshot::from_values(LineId::Line2, [(Kpi::PmRisk, 15.0)], Utc::now());
        let forecast = performance_forecast(&snap, LineId::Line2);

        assert_relative_eq!(forecast.points[0].failure_risk, 50.0, epsilon = 1e-9);
        assert_eq!(forecast.points[0].band, RiskBand::Medium);
        // 50 + 3h > 60 from h = 4
        assert_eq!(forecast.first_critical_hour(), Some(4));
        assert_eq!(forecast.critical_points().len(), 11);
        // Capped at 100
        assert_eq!(forecast.points[12].failure_risk, 100.0);
        assert_eq!(forecast.points[12].band, RiskBand::High);
    }

    #[test]
    fn test_risk_bands() {
        assert_eq!(RiskBand::from_risk(29.9), RiskBand::Low);
        assert_eq!(RiskBand::from_risk(30.0), RiskBand::Medium);
        assert_eq!(RiskBand::from_risk(69.9), RiskBand::Medium);
        assert_eq!(RiskBand::from_risk(70.0), RiskBand::High);
    }
}
