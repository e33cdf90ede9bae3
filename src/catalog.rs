// LineWatch - KPI and production line catalog
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Static KPI and production line catalog.
//!
//! The catalog is immutable and shared by every line. KPI and line sets are
//! closed, so both are modeled as enums; textual identifiers are only
//! accepted at the parsing boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LinewatchError;

/// Key Performance Indicator tracked on every production line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kpi {
    /// Overall Equipment Effectiveness (%).
    #[serde(rename = "OEE")]
    Oee,
    /// Emissions per kilometre (g/km).
    #[serde(rename = "CO2/km")]
    Co2PerKm,
    /// Preventive Maintenance Risk index.
    #[serde(rename = "PM Risk")]
    PmRisk,
    /// Supply Chain Resilience score (0-1).
    #[serde(rename = "SC Resilience")]
    ScResilience,
    /// Throughput Variability Rate.
    #[serde(rename = "TVR")]
    Tvr,
    /// Battery production efficiency (%).
    #[serde(rename = "Batt Efficiency")]
    BattEfficiency,
    /// Charging station utilization (%).
    #[serde(rename = "Chg Utilization")]
    ChgUtilization,
    /// Security incidents (count, 0 is ideal).
    #[serde(rename = "Security")]
    Security,
}

impl Kpi {
    /// Every KPI, in catalog order.
    pub const ALL: [Kpi; 8] = [
        Kpi::Oee,
        Kpi::Co2PerKm,
        Kpi::PmRisk,
        Kpi::ScResilience,
        Kpi::Tvr,
        Kpi::BattEfficiency,
        Kpi::ChgUtilization,
        Kpi::Security,
    ];

    /// Static definition of this KPI.
    pub fn definition(&self) -> &'static KpiDefinition {
        &DEFINITIONS[*self as usize]
    }

    /// Display name, e.g. `"CO2/km"`.
    pub fn name(&self) -> &'static str {
        self.definition().name
    }

    /// Target value.
    pub fn target(&self) -> f64 {
        self.definition().target
    }

    /// Minimum seconds between two refreshes.
    pub fn refresh_interval_secs(&self) -> u64 {
        self.definition().refresh_interval_secs
    }
}

impl fmt::Display for Kpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kpi {
    type Err = LinewatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kpi::ALL
            .iter()
            .copied()
            .find(|kpi| kpi.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LinewatchError::UnknownKpi(s.to_string()))
    }
}

/// Static definition of a KPI.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiDefinition {
    /// KPI this definition describes
    pub kpi: Kpi,
    /// Display name
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Target value (0 means "zero is ideal")
    pub target: f64,
    /// Signed weight in the aggregate failure model (None = not part of it)
    pub failure_weight: Option<f64>,
    /// Minimum seconds between refreshes
    pub refresh_interval_secs: u64,
    /// Icon name for the presentation layer
    pub display_icon: &'static str,
    /// Lowest physically valid value
    pub lower_bound: f64,
    /// Highest physically valid value
    pub upper_bound: f64,
    /// Inclusive range of cold-start values
    pub initial_range: (f64, f64),
}

impl KpiDefinition {
    /// Check whether a value is within the physical bounds.
    pub fn in_bounds(&self, value: f64) -> bool {
        value >= self.lower_bound && value <= self.upper_bound
    }

    /// Check whether a value is a plausible cold-start value.
    pub fn in_initial_range(&self, value: f64) -> bool {
        value >= self.initial_range.0 && value <= self.initial_range.1
    }

    /// Clamp a value to the physical bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower_bound, self.upper_bound)
    }

    /// Signed distance from target.
    pub fn delta(&self, value: f64) -> f64 {
        value - self.target
    }

    /// Whether the KPI target is zero (incident counts).
    pub fn is_zero_target(&self) -> bool {
        self.target == 0.0
    }
}

static DEFINITIONS: [KpiDefinition; 8] = [
    KpiDefinition {
        kpi: Kpi::Oee,
        name: "OEE",
        description: "Overall Equipment Effectiveness",
        target: 85.0,
        failure_weight: Some(-0.4),
        refresh_interval_secs: 30,
        display_icon: "speedometer2",
        lower_bound: 60.0,
        upper_bound: 95.0,
        initial_range: (80.0, 90.0),
    },
    KpiDefinition {
        kpi: Kpi::Co2PerKm,
        name: "CO2/km",
        description: "Emissions per kilometer (g/km)",
        target: 95.0,
        failure_weight: None,
        refresh_interval_secs: 120,
        display_icon: "cloud-fog2",
        lower_bound: 80.0,
        upper_bound: 150.0,
        initial_range: (90.0, 110.0),
    },
    KpiDefinition {
        kpi: Kpi::PmRisk,
        name: "PM Risk",
        description: "Preventive Maintenance Risk Index",
        target: 30.0,
        failure_weight: Some(0.7),
        refresh_interval_secs: 300,
        display_icon: "tools",
        lower_bound: 10.0,
        upper_bound: 95.0,
        initial_range: (20.0, 40.0),
    },
    KpiDefinition {
        kpi: Kpi::ScResilience,
        name: "SC Resilience",
        description: "Supply Chain Resilience Score",
        target: 0.85,
        failure_weight: None,
        refresh_interval_secs: 600,
        display_icon: "truck",
        lower_bound: 0.4,
        upper_bound: 0.95,
        initial_range: (0.75, 0.85),
    },
    KpiDefinition {
        kpi: Kpi::Tvr,
        name: "TVR",
        description: "Throughput Variability Rate",
        target: 0.12,
        failure_weight: Some(0.5),
        refresh_interval_secs: 60,
        display_icon: "graph-up",
        lower_bound: 0.05,
        upper_bound: 0.3,
        initial_range: (0.10, 0.15),
    },
    KpiDefinition {
        kpi: Kpi::BattEfficiency,
        name: "Batt Efficiency",
        description: "Battery Production Efficiency",
        target: 92.5,
        failure_weight: Some(-0.3),
        refresh_interval_secs: 45,
        display_icon: "battery-charging",
        lower_bound: 85.0,
        upper_bound: 98.0,
        initial_range: (90.0, 94.0),
    },
    KpiDefinition {
        kpi: Kpi::ChgUtilization,
        name: "Chg Utilization",
        description: "Charging Station Utilization",
        target: 78.0,
        failure_weight: Some(0.2),
        refresh_interval_secs: 90,
        display_icon: "lightning-charge",
        lower_bound: 65.0,
        upper_bound: 90.0,
        // Cold start uses the shift baseline: 80 by day, 70 by night
        initial_range: (70.0, 80.0),
    },
    KpiDefinition {
        kpi: Kpi::Security,
        name: "Security",
        description: "Security Incidents (0 is ideal)",
        target: 0.0,
        failure_weight: None,
        refresh_interval_secs: 1800,
        display_icon: "shield-lock",
        lower_bound: 0.0,
        upper_bound: 2.0,
        initial_range: (0.0, 0.0),
    },
];

/// Production line identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineId {
    Line1,
    Line2,
    Line3,
    Line4,
}

impl LineId {
    /// Every production line, in catalog order.
    pub const ALL: [LineId; 4] = [LineId::Line1, LineId::Line2, LineId::Line3, LineId::Line4];

    /// Identifier as used in configuration, e.g. `"line2"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineId::Line1 => "line1",
            LineId::Line2 => "line2",
            LineId::Line3 => "line3",
            LineId::Line4 => "line4",
        }
    }

    /// Static description of this line.
    pub fn info(&self) -> &'static ProductionLine {
        &LINES[*self as usize]
    }

    /// Display name, e.g. `"Battery Line"`.
    pub fn display_name(&self) -> &'static str {
        self.info().display_name
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineId {
    type Err = LinewatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LineId::ALL
            .iter()
            .copied()
            .find(|line| line.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LinewatchError::UnknownLine(s.to_string()))
    }
}

/// Static description of a production line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionLine {
    pub id: LineId,
    pub display_name: &'static str,
    /// Accent color for the presentation layer
    pub color: &'static str,
    pub icon: &'static str,
    /// Nominal units produced per hour
    pub base_output_rate: f64,
    /// Number of monitored assets
    pub asset_count: u32,
}

static LINES: [ProductionLine; 4] = [
    ProductionLine {
        id: LineId::Line1,
        display_name: "Assembly Line 1",
        color: "#4facfe",
        icon: "gear",
        base_output_rate: 120.0,
        asset_count: 42,
    },
    ProductionLine {
        id: LineId::Line2,
        display_name: "Battery Line",
        color: "#00f2fe",
        icon: "battery-charging",
        base_output_rate: 95.0,
        asset_count: 28,
    },
    ProductionLine {
        id: LineId::Line3,
        display_name: "Paint Shop",
        color: "#ff7de9",
        icon: "paint-bucket",
        base_output_rate: 110.0,
        asset_count: 18,
    },
    ProductionLine {
        id: LineId::Line4,
        display_name: "Final Assembly",
        color: "#ff9a3c",
        icon: "check2-circle",
        base_output_rate: 105.0,
        asset_count: 35,
    },
];
