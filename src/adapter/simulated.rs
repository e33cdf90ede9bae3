// LineWatch - Simulated data adapter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Virtual factory adapter.

use chrono::FixedOffset;
use rand::rngs::StdRng;

use super::{AdapterMode, AdapterStatus, ConnectionState, DataAdapter};
use crate::catalog::{Kpi, LineId};
use crate::error::AdapterError;
use crate::generator::ValueGenerator;
use crate::snapshot::{KpiReading, Snapshot, Timestamp};

/// Adapter producing KPI values from the value generator.
///
/// Keeps its own last-known snapshot and evolves it on every read.
#[derive(Debug)]
pub struct SimulatedAdapter {
    line: LineId,
    generator: ValueGenerator,
    rng: StdRng,
    state: Option<Snapshot>,
    last_update: Option<Timestamp>,
}

impl SimulatedAdapter {
    /// Create a simulated adapter for a line.
    pub fn new(line: LineId, plant_offset: FixedOffset, rng: StdRng) -> Self {
        Self {
            line,
            generator: ValueGenerator::new(plant_offset),
            rng,
            state: None,
            last_update: None,
        }
    }

    /// Last-known snapshot, if any read or prime happened yet.
    pub fn state(&self) -> Option<&Snapshot> {
        self.state.as_ref()
    }
}

impl DataAdapter for SimulatedAdapter {
    fn line(&self) -> LineId {
        self.line
    }

    fn mode(&self) -> AdapterMode {
        AdapterMode::Simulated
    }

    fn connect(&mut self, _now: Timestamp) -> bool {
        true
    }

    fn read_kpi(&mut self, kpi: Kpi, now: Timestamp) -> Result<KpiReading, AdapterError> {
        if self.state.is_none() {
            self.state = Some(self.generator.cold_start(self.line, now, &mut self.rng));
        }

        let current = match self.state.as_ref().and_then(|s| s.value(kpi)) {
            Some(value) => value,
            None => self.generator.initial_value(kpi, now, &mut self.rng),
        };
        let (value, timestamp) =
            self.generator
                .next_value(kpi, current, self.line, now, &mut self.rng);

        let reading = KpiReading::new(value, timestamp);
        if let Some(state) = self.state.as_mut() {
            state.set(kpi, reading);
        }
        self.last_update = Some(now);
        Ok(reading)
    }

    fn status(&self) -> AdapterStatus {
        AdapterStatus {
            line: self.line,
            status: ConnectionState::Connected,
            mode: AdapterMode::Simulated,
            message: format!("Virtual factory data for {}", self.line.display_name()),
            last_update: self.last_update,
            last_reading: self.last_update,
        }
    }

    fn prime(&mut self, snapshot: &Snapshot) {
        self.state = Some(snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rand::SeedableRng;

    fn adapter() -> SimulatedAdapter {
        SimulatedAdapter::new(
            LineId::Line2,
            FixedOffset::east_opt(0).unwrap(),
            StdRng::seed_from_u64(7),
        )
    }

    fn t(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_706_781_600 + secs, 0).unwrap()
    }

    #[test]
    fn test_connect_always_succeeds() {
        let mut adapter = adapter();
        assert!(adapter.connect(t(0)));
        assert!(adapter.status().is_connected());
    }

    #[test]
    fn test_read_initializes_state_lazily() {
        let mut adapter = adapter();
        assert!(adapter.state().is_none());

        let reading = adapter.read_kpi(Kpi::Oee, t(0)).unwrap();
        assert_eq!(reading.last_updated, t(0));
        assert!(Kpi::Oee.definition().in_bounds(reading.value));

        let state = adapter.state().unwrap();
        assert!(state.is_complete());
        assert_eq!(state.value(Kpi::Oee), Some(reading.value));
    }

    #[test]
    fn test_read_evolves_from_last_known_value() {
        let mut adapter = adapter();
        let mut previous = adapter.read_kpi(Kpi::BattEfficiency, t(0)).unwrap().value;
        for i in 1..50 {
            let next = adapter.read_kpi(Kpi::BattEfficiency, t(i * 45)).unwrap().value;
            // σ = 0.3, a step beyond 2.0 is practically impossible
            assert!((next - previous).abs() < 2.0);
            previous = next;
        }
    }

    #[test]
    fn test_prime_overwrites_state() {
        let mut adapter = adapter();
        adapter.read_kpi(Kpi::Oee, t(0)).unwrap();

        let primed = Snapshot::from_values(LineId::Line2, [(Kpi::Oee, 61.0)], t(10));
        adapter.prime(&primed);
        assert_eq!(adapter.state().unwrap().value(Kpi::Oee), Some(61.0));

        let next = adapter.read_kpi(Kpi::Oee, t(40)).unwrap().value;
        assert!(next < 66.0);
    }

    #[test]
    fn test_status() {
        let mut adapter = adapter();
        let status = adapter.status();
        assert_eq!(status.mode, AdapterMode::Simulated);
        assert_eq!(status.message, "Virtual factory data for Battery Line");
        assert!(status.last_update.is_none());

        adapter.read_kpi(Kpi::Tvr, t(5)).unwrap();
        assert_eq!(adapter.status().last_update, Some(t(5)));
        assert_eq!(adapter.status().last_reading, Some(t(5)));
    }
}
