// LineWatch - Trend projection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Short-horizon KPI trend projection.

use std::collections::BTreeMap;

use rand::Rng;

use crate::catalog::Kpi;
use crate::snapshot::Snapshot;

/// Drift range applied to a KPI at or above target.
pub const ABOVE_TARGET_DRIFT: (f64, f64) = (0.1, 0.5);
/// Recovery range applied to a KPI below target.
pub const BELOW_TARGET_RECOVERY: (f64, f64) = (0.2, 1.0);
/// Projection band relative to target.
pub const TREND_BAND: (f64, f64) = (0.7, 1.3);

/// Project a value with an explicit step magnitude.
///
/// At or above target the value drifts down by `step`, below target it
/// recovers up by `step`. The result stays within `[0.7, 1.3] × target`.
pub fn project_trend(current: f64, target: f64, step: f64) -> f64 {
    let projected = if current >= target {
        current - step
    } else {
        current + step
    };
    let (lo, hi) = trend_band(target);
    projected.max(lo).min(hi)
}

fn trend_band(target: f64) -> (f64, f64) {
    let a = target * TREND_BAND.0;
    let b = target * TREND_BAND.1;
    (a.min(b), a.max(b))
}

/// Project a value with a sampled step.
pub fn predict_kpi_trend<R: Rng + ?Sized>(current: f64, target: f64, rng: &mut R) -> f64 {
    let step = if current >= target {
        rng.gen_range(ABOVE_TARGET_DRIFT.0..=ABOVE_TARGET_DRIFT.1)
    } else {
        rng.gen_range(BELOW_TARGET_RECOVERY.0..=BELOW_TARGET_RECOVERY.1)
    };
    project_trend(current, target, step)
}

/// Project every KPI present in a snapshot.
pub fn predict_snapshot_trends<R: Rng + ?Sized>(snapshot: &Snapshot, rng: &mut R) -> BTreeMap<Kpi, f64> {
    snapshot
        .iter()
        .map(|(kpi, reading)| (kpi, predict_kpi_trend(reading.value, kpi.target(), rng)))
        .collect()
}
