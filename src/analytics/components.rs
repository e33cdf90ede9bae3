// LineWatch - Component failure risk
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-component failure risk ranking.
//!
//! Each line has a fixed set of monitored components, each with a base
//! failure probability and a sensitivity to some KPIs. KPIs performing worse
//! than target raise the component's risk proportionally to its sensitivity.

use serde::{Deserialize, Serialize};

use crate::catalog::{Kpi, LineId};
use crate::snapshot::Snapshot;

/// Lowest reported component risk (percent).
pub const MIN_COMPONENT_RISK: f64 = 5.0;
/// Highest reported component risk (percent).
pub const MAX_COMPONENT_RISK: f64 = 99.9;
/// Hours of remaining life per point of risk headroom.
pub const HOURS_PER_RISK_POINT: f64 = 1.2;
/// Recommendation for components without a dedicated schedule.
pub const DEFAULT_RECOMMENDATION: &str = "Schedule maintenance check";

/// KPIs where a value above target is the bad direction.
const LOWER_IS_BETTER: [Kpi; 3] = [Kpi::PmRisk, Kpi::Co2PerKm, Kpi::Tvr];

/// A monitored component of a production line.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Component name
    pub name: &'static str,
    /// Failure probability with every KPI on target (0-1)
    pub base_failure_probability: f64,
    /// Sensitivity of the component to each KPI
    pub sensitivity: &'static [(Kpi, f64)],
}

impl Component {
    /// Maintenance schedule for this component.
    pub fn recommendation(&self) -> &'static str {
        recommendation_for(self.name)
    }

    /// Failure risk in percent for a snapshot.
    pub fn risk(&self, snapshot: &Snapshot) -> f64 {
        let base = self.base_failure_probability * 100.0;
        if self.sensitivity.is_empty() {
            return base;
        }

        let modifier: f64 = self
            .sensitivity
            .iter()
            .filter_map(|&(kpi, weight)| {
                snapshot
                    .value(kpi)
                    .map(|value| kpi_risk_contribution(kpi, value) * weight)
            })
            .sum();

        (base * (1.0 + modifier / 100.0)).clamp(MIN_COMPONENT_RISK, MAX_COMPONENT_RISK)
    }
}

/// Risk contribution of one KPI value, before sensitivity weighting.
///
/// Zero-target KPIs add 10 per unit. Otherwise the ratio to target counts
/// only in the bad direction: above target for PM Risk, CO2/km and TVR,
/// below target for every other KPI.
pub fn kpi_risk_contribution(kpi: Kpi, value: f64) -> f64 {
    let target = kpi.target();
    if target == 0.0 {
        return value * 10.0;
    }

    let ratio = value / target;
    if LOWER_IS_BETTER.contains(&kpi) {
        if ratio > 1.0 {
            ratio * 50.0
        } else {
            0.0
        }
    } else if ratio < 1.0 {
        50.0 * (1.0 - ratio)
    } else {
        0.0
    }
}

/// Predicted failure of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePrediction {
    /// Component name
    pub component: String,
    /// Failure risk in percent
    pub risk_percent: f64,
    /// Estimated hours until failure
    pub hours_to_failure: u32,
    /// Maintenance recommendation
    pub recommendation: String,
}

/// Estimated hours until failure for a risk level.
pub fn hours_to_failure(risk_percent: f64) -> u32 {
    ((100.0 - risk_percent) * HOURS_PER_RISK_POINT).max(1.0) as u32
}

/// Rank the components of a line by failure risk, highest first.
pub fn predict_component_failures(snapshot: &Snapshot, line: LineId) -> Vec<FailurePrediction> {
    let mut predictions: Vec<FailurePrediction> = components(line)
        .iter()
        .map(|component| {
            let risk = component.risk(snapshot);
            FailurePrediction {
                component: component.name.to_string(),
                risk_percent: risk,
                hours_to_failure: hours_to_failure(risk),
                recommendation: component.recommendation().to_string(),
            }
        })
        .collect();

    predictions.sort_by(|a, b| b.risk_percent.total_cmp(&a.risk_percent));
    predictions
}

/// Components monitored on a line.
pub fn components(line: LineId) -> &'static [Component] {
    match line {
        LineId::Line1 => &LINE1_COMPONENTS,
        LineId::Line2 => &LINE2_COMPONENTS,
        LineId::Line3 => &LINE3_COMPONENTS,
        LineId::Line4 => &LINE4_COMPONENTS,
    }
}

/// Maintenance schedule for a component name.
pub fn recommendation_for(component: &str) -> &'static str {
    RECOMMENDATIONS
        .iter()
        .find(|(name, _)| *name == component)
        .map(|(_, text)| *text)
        .unwrap_or(DEFAULT_RECOMMENDATION)
}

static LINE1_COMPONENTS: [Component; 5] = [
    Component {
        name: "Robotic Arms",
        base_failure_probability: 0.35,
        sensitivity: &[(Kpi::Oee, 0.7), (Kpi::PmRisk, 0.9), (Kpi::Tvr, 0.5)],
    },
    Component {
        name: "Conveyor System",
        base_failure_probability: 0.25,
        sensitivity: &[(Kpi::Oee, 0.8), (Kpi::PmRisk, 0.6), (Kpi::Tvr, 0.7)],
    },
    Component {
        name: "Control Electronics",
        base_failure_probability: 0.15,
        sensitivity: &[(Kpi::Oee, 0.3), (Kpi::PmRisk, 0.5), (Kpi::BattEfficiency, 0.6)],
    },
    Component {
        name: "Sensor Network",
        base_failure_probability: 0.10,
        sensitivity: &[(Kpi::Oee, 0.4), (Kpi::PmRisk, 0.3), (Kpi::Tvr, 0.8)],
    },
    Component {
        name: "Vision Systems",
        base_failure_probability: 0.15,
        sensitivity: &[(Kpi::Oee, 0.2), (Kpi::PmRisk, 0.4), (Kpi::Tvr, 0.3)],
    },
];

static LINE2_COMPONENTS: [Component; 5] = [
    Component {
        name: "Cell Assembly",
        base_failure_probability: 0.30,
        sensitivity: &[(Kpi::Oee, 0.6), (Kpi::PmRisk, 0.7), (Kpi::BattEfficiency, 0.9)],
    },
    Component {
        name: "Electrolyte Filling",
        base_failure_probability: 0.25,
        sensitivity: &[(Kpi::Oee, 0.5), (Kpi::PmRisk, 0.8), (Kpi::BattEfficiency, 0.7)],
    },
    Component {
        name: "Testing Station",
        base_failure_probability: 0.20,
        sensitivity: &[(Kpi::Oee, 0.3), (Kpi::PmRisk, 0.4), (Kpi::BattEfficiency, 0.5)],
    },
    Component {
        name: "Welding System",
        base_failure_probability: 0.15,
        sensitivity: &[(Kpi::Oee, 0.7), (Kpi::PmRisk, 0.6), (Kpi::BattEfficiency, 0.4)],
    },
    Component {
        name: "Quality Sensors",
        base_failure_probability: 0.10,
        sensitivity: &[(Kpi::Oee, 0.2), (Kpi::PmRisk, 0.3), (Kpi::Tvr, 0.6)],
    },
];

static LINE3_COMPONENTS: [Component; 5] = [
    Component {
        name: "Paint Sprayers",
        base_failure_probability: 0.40,
        sensitivity: &[(Kpi::Oee, 0.8), (Kpi::PmRisk, 0.9), (Kpi::Tvr, 0.4)],
    },
    Component {
        name: "Drying Chamber",
        base_failure_probability: 0.20,
        sensitivity: &[(Kpi::Oee, 0.5), (Kpi::PmRisk, 0.6), (Kpi::Tvr, 0.3)],
    },
    Component {
        name: "Ventilation",
        base_failure_probability: 0.15,
        sensitivity: &[(Kpi::Oee, 0.3), (Kpi::PmRisk, 0.7), (Kpi::Co2PerKm, 0.8)],
    },
    Component {
        name: "Mixing Systems",
        base_failure_probability: 0.15,
        sensitivity: &[(Kpi::Oee, 0.6), (Kpi::PmRisk, 0.5), (Kpi::Tvr, 0.7)],
    },
    Component {
        name: "Filter Units",
        base_failure_probability: 0.10,
        sensitivity: &[(Kpi::Oee, 0.2), (Kpi::PmRisk, 0.8), (Kpi::Co2PerKm, 0.9)],
    },
];

static LINE4_COMPONENTS: [Component; 5] = [
    Component {
        name: "Door Fitting",
        base_failure_probability: 0.20,
        sensitivity: &[(Kpi::Oee, 0.7), (Kpi::PmRisk, 0.5), (Kpi::Tvr, 0.4)],
    },
    Component {
        name: "Interior Assembly",
        base_failure_probability: 0.25,
        sensitivity: &[(Kpi::Oee, 0.6), (Kpi::PmRisk, 0.4), (Kpi::Tvr, 0.5)],
    },
    Component {
        name: "Electrical Systems",
        base_failure_probability: 0.30,
        sensitivity: &[(Kpi::Oee, 0.5), (Kpi::PmRisk, 0.7), (Kpi::BattEfficiency, 0.6)],
    },
    Component {
        name: "Quality Testing",
        base_failure_probability: 0.15,
        sensitivity: &[(Kpi::Oee, 0.3), (Kpi::PmRisk, 0.2), (Kpi::Tvr, 0.8)],
    },
    Component {
        name: "Packaging System",
        base_failure_probability: 0.10,
        sensitivity: &[(Kpi::Oee, 0.4), (Kpi::PmRisk, 0.3), (Kpi::Tvr, 0.2)],
    },
];

static RECOMMENDATIONS: [(&str, &str); 20] = [
    ("Robotic Arms", "Schedule calibration every 168 hours, full servicing every 720 hours"),
    ("Conveyor System", "Inspect belts weekly, lubricate bearings every 240 hours"),
    ("Control Electronics", "Diagnostic tests daily, thermal imaging monthly"),
    ("Sensor Network", "Calibration every 72 hours, replace sensors every 8,640 hours"),
    ("Vision Systems", "Clean lenses daily, calibration weekly"),
    ("Cell Assembly", "Check alignment daily, full service every 360 hours"),
    ("Electrolyte Filling", "Clean nozzles every 48 hours, pressure test weekly"),
    ("Testing Station", "Calibrate instruments daily, software update monthly"),
    ("Welding System", "Replace electrodes every 96 hours, clean/inspect daily"),
    ("Quality Sensors", "Calibration every 24 hours, validation tests weekly"),
    ("Paint Sprayers", "Clean nozzles after each shift, replace every 720 hours"),
    ("Drying Chamber", "Inspect heating elements weekly, clean interior daily"),
    ("Ventilation", "Replace filters weekly, inspect fans every 720 hours"),
    ("Mixing Systems", "Clean tanks daily, calibrate sensors every 168 hours"),
    ("Filter Units", "Replace primary filters every 72 hours, secondary monthly"),
    ("Door Fitting", "Calibrate alignment tools daily, inspect fixtures weekly"),
    ("Interior Assembly", "Tool maintenance daily, workstation inspection weekly"),
    ("Electrical Systems", "Testing after each shift, full diagnostic weekly"),
    ("Quality Testing", "Calibrate instruments daily, validate test cases weekly"),
    ("Packaging System", "Inspect packaging materials daily, maintain seals weekly"),
];
