// LineWatch - KPI status classification
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! KPI status classification module
//!
//! This module grades each KPI value against its target (excellent, good or
//! critical) and turns a snapshot into a ranked list of insights with an
//! action recommendation per KPI.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Kpi;
use crate::snapshot::Snapshot;

/// Recommendation attached to excellent KPIs.
pub const MAINTAIN_ACTION: &str = "Maintain current performance";
/// Recommendation for KPIs without a dedicated action.
pub const DEFAULT_ACTION: &str = "Review performance metrics and take corrective action";

/// Status of a KPI relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiStatus {
    /// At or above target
    Excellent,
    /// Slightly below target
    Good,
    /// Well below target
    Critical,
}

impl KpiStatus {
    /// Rank used to order insights, most urgent first
    pub fn urgency(&self) -> u8 {
        match self {
            KpiStatus::Critical => 0,
            KpiStatus::Good => 1,
            KpiStatus::Excellent => 2,
        }
    }

    /// Display color for the presentation layer
    pub fn color(&self) -> &'static str {
        match self {
            KpiStatus::Excellent => "#2ECC40",
            KpiStatus::Good => "#FFDC00",
            KpiStatus::Critical => "#FF4136",
        }
    }
}

impl fmt::Display for KpiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpiStatus::Excellent => write!(f, "excellent"),
            KpiStatus::Good => write!(f, "good"),
            KpiStatus::Critical => write!(f, "critical"),
        }
    }
}

/// Graded KPI with its recommended action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kpi: Kpi,
    pub status: KpiStatus,
    /// Current value
    pub value: f64,
    /// Signed distance from target
    pub delta: f64,
    pub recommendation: String,
}

/// Configuration for the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Ratio to target from which a KPI is excellent (default: 1.0)
    pub excellent_ratio: f64,
    /// Ratio to target from which a KPI is good (default: 0.9)
    pub good_ratio: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            excellent_ratio: 1.0,
            good_ratio: 0.9,
        }
    }
}

/// KPI status classifier
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    /// Create a new classifier with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with custom configuration
    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Grade a KPI value against its target.
    ///
    /// Zero-target KPIs are excellent at exactly zero and critical otherwise.
    pub fn classify(&self, kpi: Kpi, value: f64) -> KpiStatus {
        let target = kpi.target();
        if target == 0.0 {
            return if value == 0.0 {
                KpiStatus::Excellent
            } else {
                KpiStatus::Critical
            };
        }

        let ratio = value / target;
        if ratio >= self.config.excellent_ratio {
            KpiStatus::Excellent
        } else if ratio >= self.config.good_ratio {
            KpiStatus::Good
        } else {
            KpiStatus::Critical
        }
    }

    /// Grade every KPI of a snapshot, ranked critical → good → excellent.
    ///
    /// Within a status group KPIs keep catalog order.
    pub fn insights(&self, snapshot: &Snapshot) -> Vec<Insight> {
        let mut insights: Vec<Insight> = snapshot
            .iter()
            .map(|(kpi, reading)| {
                let status = self.classify(kpi, reading.value);
                let recommendation = match status {
                    KpiStatus::Excellent => MAINTAIN_ACTION,
                    _ => action_for(kpi),
                };
                Insight {
                    kpi,
                    status,
                    value: reading.value,
                    delta: kpi.definition().delta(reading.value),
                    recommendation: recommendation.to_string(),
                }
            })
            .collect();

        // Stable sort keeps catalog order inside each group
        insights.sort_by_key(|i| i.status.urgency());
        insights
    }

    /// Get current configuration
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

/// Corrective action for a KPI that is off target.
pub fn action_for(kpi: Kpi) -> &'static str {
    ACTIONS
        .iter()
        .find(|(k, _)| *k == kpi)
        .map(|(_, text)| *text)
        .unwrap_or(DEFAULT_ACTION)
}

static ACTIONS: [(Kpi, &str); 8] = [
    (Kpi::Oee, "Optimize workflow to eliminate bottlenecks and reduce downtime"),
    (Kpi::Co2PerKm, "Implement energy-efficient manufacturing processes and reduce waste"),
    (Kpi::PmRisk, "Schedule preventive maintenance within 24 hours to avoid failures"),
    (Kpi::ScResilience, "Diversify suppliers and increase inventory buffers"),
    (Kpi::Tvr, "Analyze production variability sources and standardize processes"),
    (Kpi::BattEfficiency, "Optimize battery cell production parameters and quality control"),
    (Kpi::ChgUtilization, "Reallocate charging stations based on demand patterns"),
    (Kpi::Security, "Investigate incidents immediately and strengthen security protocols"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LineId;
    use chrono::Utc;

    #[test]
    fn test_classify_ratio_thresholds() {
        let classifier = Classifier::new();
        assert_eq!(classifier.classify(Kpi::Oee, 85.0), KpiStatus::Excellent);
        assert_eq!(classifier.classify(Kpi::Oee, 85.0 * 0.95), KpiStatus::Good);
        assert_eq!(classifier.classify(Kpi::Oee, 85.0 * 0.5), KpiStatus::Critical);
        assert_eq!(classifier.classify(Kpi::Oee, 85.0 * 0.9), KpiStatus::Good);
    }

    #[test]
    fn test_classify_zero_target() {
        let classifier = Classifier::new();
        assert_eq!(classifier.classify(Kpi::Security, 0.0), KpiStatus::Excellent);
        assert_eq!(classifier.classify(Kpi::Security, 1.0), KpiStatus::Critical);
        assert_eq!(classifier.classify(Kpi::Security, 2.0), KpiStatus::Critical);
    }

    #[test]
    fn test_insights_ranked() {
        let snap = Snapshot::from_values(
            LineId::Line2,
            [
                (Kpi::Oee, 88.0),
                (Kpi::PmRisk, 10.0),
                (Kpi::BattEfficiency, 90.0),
                (Kpi::Security, 1.0),
            ],
            Utc::now(),
        );
        let insights = Classifier::new().insights(&snap);
        let order: Vec<(Kpi, KpiStatus)> = insights.iter().map(|i| (i.kpi, i.status)).collect();
        assert_eq!(
            order,
            vec![
                (Kpi::PmRisk, KpiStatus::Critical),
                (Kpi::Security, KpiStatus::Critical),
                (Kpi::BattEfficiency, KpiStatus::Good),
                (Kpi::Oee, KpiStatus::Excellent),
            ]
        );
        assert_eq!(insights[3].recommendation, MAINTAIN_ACTION);
        assert_eq!(
            insights[1].recommendation,
            "Investigate incidents immediately and strengthen security protocols"
        );
    }

    #[test]
    fn test_every_kpi_has_action() {
        for kpi in Kpi::ALL {
            assert_ne!(action_for(kpi), DEFAULT_ACTION, "{}", kpi);
        }
    }

    #[test]
    fn test_custom_config() {
        let classifier = Classifier::with_config(ClassifierConfig {
            excellent_ratio: 1.05,
            good_ratio: 0.95,
        });
        assert_eq!(classifier.classify(Kpi::Oee, 86.0), KpiStatus::Good);
        assert_eq!(classifier.classify(Kpi::Oee, 80.0), KpiStatus::Critical);
        assert_eq!(classifier.config().good_ratio, 0.95);
    }
}
