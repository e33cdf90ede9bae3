// LineWatch - Aggregate failure probability
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Aggregate machine failure probability from weighted KPIs.

use crate::catalog::Kpi;
use crate::snapshot::Snapshot;

/// Failure probability of a line in percent.
///
/// Every KPI carrying a failure weight contributes `value / target × weight`
/// (the raw value when the target is zero). The weighted score is scaled by
/// the total absolute weight to `[0, 100]`. KPIs missing from the snapshot
/// are skipped entirely.
pub fn calculate_failure_probability(snapshot: &Snapshot) -> f64 {
    let mut score = 0.0;
    let mut total_weight = 0.0;

    for kpi in Kpi::ALL {
        let def = kpi.definition();
        let (Some(weight), Some(value)) = (def.failure_weight, snapshot.value(kpi)) else {
            continue;
        };
        let normalized = if def.target > 0.0 {
            value / def.target
        } else {
            value
        };
        score += normalized * weight;
        total_weight += weight.abs();
    }

    if total_weight == 0.0 {
        return 0.0;
    }
    (score / total_weight * 100.0).clamp(0.0, 100.0)
}
