// LineWatch - KPI snapshots and state store
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! KPI snapshots and the per-line state store.
//!
//! A [`Snapshot`] is the full set of current KPI values and timestamps for
//! one production line. Published snapshots are immutable (`Arc<Snapshot>`);
//! a tick works on a copy and publishes the result atomically through
//! [`KpiStore`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Kpi, LineId};
use crate::error::Result;

/// Wall-clock instant used throughout the engine.
pub type Timestamp = DateTime<Utc>;

/// Current value of one KPI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiReading {
    /// Current value
    pub value: f64,
    /// When the value was last refreshed
    pub last_updated: Timestamp,
}

impl KpiReading {
    /// Create a new reading.
    pub fn new(value: f64, last_updated: Timestamp) -> Self {
        Self {
            value,
            last_updated,
        }
    }
}

/// Current KPI values for one production line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Line this snapshot describes
    pub line: LineId,
    readings: BTreeMap<Kpi, KpiReading>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new(line: LineId) -> Self {
        Self {
            line,
            readings: BTreeMap::new(),
        }
    }

    /// Build a snapshot where every given value was refreshed at `at`.
    pub fn from_values(
        line: LineId,
        values: impl IntoIterator<Item = (Kpi, f64)>,
        at: Timestamp,
    ) -> Self {
        let readings = values
            .into_iter()
            .map(|(kpi, value)| (kpi, KpiReading::new(value, at)))
            .collect();
        Self { line, readings }
    }

    /// Return a copy with one KPI replaced.
    pub fn with_value(mut self, kpi: Kpi, value: f64, at: Timestamp) -> Self {
        self.readings.insert(kpi, KpiReading::new(value, at));
        self
    }

    /// Get the reading for a KPI.
    pub fn get(&self, kpi: Kpi) -> Option<&KpiReading> {
        self.readings.get(&kpi)
    }

    /// Get the current value of a KPI.
    pub fn value(&self, kpi: Kpi) -> Option<f64> {
        self.readings.get(&kpi).map(|r| r.value)
    }

    /// Get the last refresh time of a KPI.
    pub fn last_updated(&self, kpi: Kpi) -> Option<Timestamp> {
        self.readings.get(&kpi).map(|r| r.last_updated)
    }

    pub(crate) fn set(&mut self, kpi: Kpi, reading: KpiReading) {
        self.readings.insert(kpi, reading);
    }

    /// Iterate readings in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (Kpi, &KpiReading)> {
        self.readings.iter().map(|(kpi, reading)| (*kpi, reading))
    }

    /// Number of KPIs present.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the snapshot holds no KPI at all.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Whether every catalog KPI is present.
    pub fn is_complete(&self) -> bool {
        Kpi::ALL.iter().all(|kpi| self.readings.contains_key(kpi))
    }

    /// Time elapsed since a KPI was refreshed.
    pub fn age(&self, kpi: Kpi, now: Timestamp) -> Option<Duration> {
        self.last_updated(kpi).map(|t| now - t)
    }

    /// Whether a KPI has gone stale relative to its refresh interval.
    ///
    /// A KPI missing from the snapshot is always due.
    pub fn is_due(&self, kpi: Kpi, now: Timestamp) -> bool {
        match self.age(kpi, now) {
            Some(age) => age.num_milliseconds() >= kpi.refresh_interval_secs() as i64 * 1000,
            None => true,
        }
    }

    /// Most recent refresh across all KPIs.
    pub fn newest_update(&self) -> Option<Timestamp> {
        self.readings.values().map(|r| r.last_updated).max()
    }

    /// Human-readable age, e.g. `"Updated: 2m 5s ago"`.
    pub fn age_text(&self, kpi: Kpi, now: Timestamp) -> Option<String> {
        self.age(kpi, now).map(|age| {
            let secs = age.num_seconds().max(0);
            format!("Updated: {}m {}s ago", secs / 60, secs % 60)
        })
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Latest published snapshot per production line.
#[derive(Debug, Default)]
pub struct KpiStore {
    snapshots: RwLock<HashMap<LineId, Arc<Snapshot>>>,
}

impl KpiStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot for a line, if the line was ever initialized.
    pub fn get(&self, line: LineId) -> Option<Arc<Snapshot>> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&line)
            .cloned()
    }

    /// Publish a new snapshot for its line.
    ///
    /// Per KPI, the reading with the newer timestamp wins, so a late tick that
    /// computed from an older copy cannot move `last_updated` backwards.
    pub(crate) fn publish(&self, mut snapshot: Snapshot) -> Arc<Snapshot> {
        let mut snapshots = self.snapshots.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = snapshots.get(&snapshot.line) {
            for (kpi, existing) in current.iter() {
                match snapshot.get(kpi) {
                    Some(incoming) if incoming.last_updated >= existing.last_updated => {}
                    _ => snapshot.set(kpi, *existing),
                }
            }
        }

        let published = Arc::new(snapshot);
        snapshots.insert(published.line, Arc::clone(&published));
        published
    }

    /// Lines with a published snapshot.
    pub fn lines(&self) -> Vec<LineId> {
        let mut lines: Vec<LineId> = self
            .snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        lines.sort();
        lines
    }
}
