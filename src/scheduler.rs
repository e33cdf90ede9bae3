// LineWatch - Update scheduler
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Staleness-gated KPI refresh.
//!
//! A tick refreshes only the KPIs whose refresh interval has elapsed since
//! their last update. Read failures are isolated per KPI: the value is held
//! and the timestamp advanced so the KPI is not retried before its next
//! interval.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::adapter::{AdapterMode, DataAdapter};
use crate::catalog::{Kpi, LineId};
use crate::generator::ValueGenerator;
use crate::snapshot::{KpiReading, Snapshot, Timestamp};

/// Outcome of one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Line that was ticked
    pub line: LineId,
    /// Adapter mode used
    pub mode: AdapterMode,
    /// Whether the line was initialized by this tick
    pub cold_start: bool,
    /// KPIs refreshed from the adapter
    pub refreshed: Vec<Kpi>,
    /// KPIs whose read failed (value held)
    pub failed: Vec<Kpi>,
    /// Adapter connection state after the tick
    pub connected: bool,
}

impl TickReport {
    fn new(line: LineId, mode: AdapterMode, cold_start: bool) -> Self {
        Self {
            line,
            mode,
            cold_start,
            refreshed: Vec::new(),
            failed: Vec::new(),
            connected: true,
        }
    }

    /// Number of adapter reads attempted
    pub fn reads(&self) -> usize {
        self.refreshed.len() + self.failed.len()
    }

    /// Whether nothing was due
    pub fn is_idle(&self) -> bool {
        !self.cold_start && self.reads() == 0
    }
}

/// Decides which KPIs refresh on a tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateScheduler {
    generator: ValueGenerator,
}

impl UpdateScheduler {
    /// Create a scheduler using a generator for cold starts
    pub fn new(generator: ValueGenerator) -> Self {
        Self { generator }
    }

    /// Run one tick.
    ///
    /// Without a previous snapshot the line is cold-started: every KPI gets
    /// an initial value stamped `now`, the adapter is primed with it and no
    /// reads happen. Otherwise every due KPI is read from the adapter.
    pub fn tick<R: Rng + ?Sized>(
        &self,
        previous: Option<&Snapshot>,
        adapter: &mut dyn DataAdapter,
        now: Timestamp,
        rng: &mut R,
    ) -> (Snapshot, TickReport) {
        let line = adapter.line();
        let mode = adapter.mode();

        let previous = match previous {
            Some(snapshot) => snapshot,
            None => {
                log::info!("Cold start for {} ({})", line, mode);
                let snapshot = self.generator.cold_start(line, now, rng);
                adapter.prime(&snapshot);
                let mut report = TickReport::new(line, mode, true);
                report.connected = adapter.status().is_connected();
                return (snapshot, report);
            }
        };

        let mut snapshot = previous.clone();
        let mut report = TickReport::new(line, mode, false);

        for kpi in Kpi::ALL {
            if !snapshot.is_due(kpi, now) {
                continue;
            }
            let held = snapshot.get(kpi).copied();

            match adapter.read_kpi(kpi, now) {
                Ok(reading) => {
                    let last_updated = match held {
                        Some(h) => h.last_updated.max(reading.last_updated),
                        None => reading.last_updated,
                    };
                    let value = kpi.definition().clamp(reading.value);
                    snapshot.set(kpi, KpiReading::new(value, last_updated));
                    report.refreshed.push(kpi);
                }
                Err(e) => {
                    log::warn!("{}: keeping previous {} value: {}", line, kpi, e);
                    if let Some(h) = held {
                        snapshot.set(kpi, KpiReading::new(h.value, h.last_updated.max(now)));
                    }
                    report.failed.push(kpi);
                }
            }
        }

        report.connected = adapter.status().is_connected();
        (snapshot, report)
    }
}
