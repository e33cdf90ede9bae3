// LineWatch - KPI value generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Stochastic value models for every KPI.
//!
//! Each KPI has its own next-value model:
//!
//! - bounded noise: `clamp(current + N(0, σ))` for OEE, CO2/km, Batt
//!   Efficiency, SC Resilience and TVR
//! - PM Risk: rare upward spike, otherwise noise around a per-line baseline
//! - Chg Utilization: shift-dependent baseline plus noise
//! - Security: rare incidents, never accumulating
//!
//! Cold-start values are drawn from the catalog's initial ranges instead.

use chrono::{FixedOffset, Offset, Timelike, Utc};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::analytics::bottleneck::RESOURCES;
use crate::catalog::{Kpi, LineId};
use crate::snapshot::{Snapshot, Timestamp};

/// Noise standard deviation for OEE.
pub const OEE_SIGMA: f64 = 0.8;
/// Noise standard deviation for CO2/km.
pub const CO2_SIGMA: f64 = 1.5;
/// Noise standard deviation for Batt Efficiency.
pub const BATT_SIGMA: f64 = 0.3;
/// Noise standard deviation for SC Resilience.
pub const SC_RESILIENCE_SIGMA: f64 = 0.02;
/// Noise standard deviation for TVR.
pub const TVR_SIGMA: f64 = 0.005;

/// Chance of a PM Risk spike per refresh.
pub const PM_SPIKE_PROBABILITY: f64 = 0.05;
/// Range of a PM Risk spike.
pub const PM_SPIKE_RANGE: (f64, f64) = (5.0, 15.0);
/// Ceiling of a PM Risk spike.
pub const PM_SPIKE_CEILING: f64 = 95.0;
/// Noise around the per-line PM Risk baseline.
pub const PM_NOISE_SIGMA: f64 = 2.0;

/// Charging utilization baseline.
pub const CHG_BASELINE: f64 = 75.0;
/// Boost applied during the day shift.
pub const CHG_DAY_BOOST: f64 = 10.0;
/// Drop applied outside the day shift.
pub const CHG_NIGHT_DROP: f64 = 5.0;
/// Noise around the charging baseline.
pub const CHG_NOISE_SIGMA: f64 = 2.0;
/// Cold-start charging utilization during the day shift.
pub const CHG_INITIAL_DAY: f64 = 80.0;
/// Cold-start charging utilization outside the day shift.
pub const CHG_INITIAL_NIGHT: f64 = 70.0;
/// First local hour of the day shift.
pub const DAY_SHIFT_START: u32 = 8;
/// First local hour after the day shift.
pub const DAY_SHIFT_END: u32 = 18;

/// Chance of a security incident per refresh.
pub const SECURITY_INCIDENT_PROBABILITY: f64 = 0.01;

/// Range of sampled resource utilization (inclusive, percent).
pub const UTILIZATION_RANGE: (u32, u32) = (60, 95);

/// PM Risk level a line settles around.
pub fn pm_risk_baseline(line: LineId) -> f64 {
    match line {
        LineId::Line1 => 35.0,
        LineId::Line2 => 25.0,
        LineId::Line3 => 40.0,
        LineId::Line4 => 30.0,
    }
}

/// Whether a local hour falls in the day shift.
pub fn is_day_shift(hour: u32) -> bool {
    (DAY_SHIFT_START..DAY_SHIFT_END).contains(&hour)
}

fn gaussian<R: Rng + ?Sized>(rng: &mut R, sigma: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z * sigma
}

/// Value generator bound to the plant's time zone.
#[derive(Debug, Clone, Copy)]
pub struct ValueGenerator {
    plant_offset: FixedOffset,
}

impl Default for ValueGenerator {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl ValueGenerator {
    /// Create a generator for a plant time zone.
    pub fn new(plant_offset: FixedOffset) -> Self {
        Self { plant_offset }
    }

    /// Local plant hour at an instant.
    pub fn local_hour(&self, now: Timestamp) -> u32 {
        now.with_timezone(&self.plant_offset).hour()
    }

    fn chg_baseline(&self, now: Timestamp) -> f64 {
        if is_day_shift(self.local_hour(now)) {
            CHG_BASELINE + CHG_DAY_BOOST
        } else {
            CHG_BASELINE - CHG_NIGHT_DROP
        }
    }

    /// Produce the next value of a KPI. The returned timestamp is `now`.
    pub fn next_value<R: Rng + ?Sized>(
        &self,
        kpi: Kpi,
        current: f64,
        line: LineId,
        now: Timestamp,
        rng: &mut R,
    ) -> (f64, Timestamp) {
        let def = kpi.definition();
        let value = match kpi {
            Kpi::Oee => current + gaussian(rng, OEE_SIGMA),
            Kpi::Co2PerKm => current + gaussian(rng, CO2_SIGMA),
            Kpi::BattEfficiency => current + gaussian(rng, BATT_SIGMA),
            Kpi::ScResilience => current + gaussian(rng, SC_RESILIENCE_SIGMA),
            Kpi::Tvr => current + gaussian(rng, TVR_SIGMA),
            Kpi::PmRisk => {
                if rng.gen_bool(PM_SPIKE_PROBABILITY) {
                    let spike = rng.gen_range(PM_SPIKE_RANGE.0..=PM_SPIKE_RANGE.1);
                    (current + spike).min(PM_SPIKE_CEILING)
                } else {
                    pm_risk_baseline(line) + gaussian(rng, PM_NOISE_SIGMA)
                }
            }
            Kpi::ChgUtilization => self.chg_baseline(now) + gaussian(rng, CHG_NOISE_SIGMA),
            Kpi::Security => {
                if rng.gen_bool(SECURITY_INCIDENT_PROBABILITY) {
                    rng.gen_range(1..=2) as f64
                } else {
                    0.0
                }
            }
        };
        (def.clamp(value), now)
    }

    /// Draw a cold-start value for a KPI.
    pub fn initial_value<R: Rng + ?Sized>(&self, kpi: Kpi, now: Timestamp, rng: &mut R) -> f64 {
        match kpi {
            Kpi::ChgUtilization => {
                if is_day_shift(self.local_hour(now)) {
                    CHG_INITIAL_DAY
                } else {
                    CHG_INITIAL_NIGHT
                }
            }
            Kpi::Security => 0.0,
            _ => {
                let (lo, hi) = kpi.definition().initial_range;
                rng.gen_range(lo..=hi)
            }
        }
    }

    /// Build a full snapshot for a line, every KPI stamped `now`.
    pub fn cold_start<R: Rng + ?Sized>(&self, line: LineId, now: Timestamp, rng: &mut R) -> Snapshot {
        let values: Vec<(Kpi, f64)> = Kpi::ALL
            .iter()
            .map(|&kpi| (kpi, self.initial_value(kpi, now, rng)))
            .collect();
        Snapshot::from_values(line, values, now)
    }
}

/// Draw a utilization percentage for every tracked resource.
pub fn sample_utilization<R: Rng + ?Sized>(rng: &mut R) -> Vec<f64> {
    RESOURCES
        .iter()
        .map(|_| rng.gen_range(UTILIZATION_RANGE.0..=UTILIZATION_RANGE.1) as f64)
        .collect()
}
