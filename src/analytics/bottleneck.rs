// LineWatch - Resource bottleneck forecast
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Next-shift resource bottleneck forecast.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tracked resources, by utilization index.
pub const RESOURCES: [&str; 5] = ["Robots", "Personnel", "Energy", "Materials", "Machines"];

/// Projected utilization above which a resource is a bottleneck (percent).
pub const BOTTLENECK_THRESHOLD: f64 = 85.0;
/// Range of next-shift utilization growth.
pub const GROWTH_RANGE: (f64, f64) = (0.05, 0.15);
/// Severity points per point above threshold.
pub const SEVERITY_SCALE: f64 = 5.0;
/// Maximum severity.
pub const MAX_SEVERITY: f64 = 100.0;

/// A resource projected to saturate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    /// Index into the utilization vector
    pub index: usize,
    /// Resource name
    pub resource: String,
    /// Current utilization (percent)
    pub current: f64,
    /// Projected utilization (percent)
    pub projected: f64,
    /// Severity 0-100
    pub severity: f64,
}

/// Name of the resource at an index.
pub fn resource_name(index: usize) -> String {
    match RESOURCES.get(index) {
        Some(name) => name.to_string(),
        None => format!("Resource {}", index),
    }
}

/// Evaluate one resource with an explicit growth factor.
pub fn evaluate_resource(index: usize, current: f64, growth: f64) -> Option<Bottleneck> {
    let projected = current * (1.0 + growth);
    if projected <= BOTTLENECK_THRESHOLD {
        return None;
    }
    Some(Bottleneck {
        index,
        resource: resource_name(index),
        current,
        projected,
        severity: ((projected - BOTTLENECK_THRESHOLD) * SEVERITY_SCALE).min(MAX_SEVERITY),
    })
}

/// Flag bottlenecks with the same growth applied to every resource.
pub fn project_bottlenecks(utilization: &[f64], growth: f64) -> Vec<Bottleneck> {
    utilization
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| evaluate_resource(i, u, growth))
        .collect()
}

/// Flag bottlenecks with an independently sampled growth per resource.
pub fn predict_bottlenecks<R: Rng + ?Sized>(utilization: &[f64], rng: &mut R) -> Vec<Bottleneck> {
    utilization
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| {
            let growth = rng.gen_range(GROWTH_RANGE.0..=GROWTH_RANGE.1);
            evaluate_resource(i, u, growth)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_growth() {
        let flagged = project_bottlenecks(&[90.0, 50.0, 88.0, 60.0, 95.0], 0.0);
        let indices: Vec<usize> = flagged.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 2, 4]);

        assert_relative_eq!(flagged[0].severity, 25.0);
        assert_relative_eq!(flagged[1].severity, 15.0);
        assert_relative_eq!(flagged[2].severity, 50.0);
        assert_eq!(flagged[0].resource, "Robots");
        assert_eq!(flagged[2].resource, "Machines");
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(evaluate_resource(0, 85.0, 0.0).is_none());
    }

    #[test]
    fn test_severity_capped() {
        let b = evaluate_resource(1, 95.0, 0.15).unwrap();
        assert_relative_eq!(b.projected, 109.25, epsilon = 1e-9);
        assert_eq!(b.severity, MAX_SEVERITY);
    }

    #[test]
    fn test_sampled_growth_range() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            for b in predict_bottlenecks(&[80.0, 76.0, 90.0], &mut rng) {
                let growth = b.projected / b.current - 1.0;
                assert!(growth >= 0.05 - 1e-9 && growth <= 0.15 + 1e-9);
            }
        }
        // 70 × 1.15 never crosses the threshold
        assert!(predict_bottlenecks(&[70.0; 5], &mut rng).is_empty());
    }

    #[test]
    fn test_unknown_resource_name() {
        assert_eq!(resource_name(7), "Resource 7");
    }
}
