// LineWatch - Data adapters
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Data sources for KPI readings
//!
//! A [`DataAdapter`] supplies fresh KPI readings for one production line.
//! Two implementations exist:
//!
//! - [`SimulatedAdapter`]: virtual factory backed by the value generator
//! - [`EquipmentAdapter`]: secured OPC-UA link stub for real equipment

mod equipment;
mod simulated;

pub use equipment::EquipmentAdapter;
pub use simulated::SimulatedAdapter;

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Kpi, LineId};
use crate::config::EngineConfig;
use crate::error::{AdapterError, LinewatchError};
use crate::snapshot::{KpiReading, Snapshot, Timestamp};

/// Where KPI readings come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterMode {
    /// Virtual factory
    Simulated,
    /// Real equipment over OPC-UA
    Equipment,
}

impl AdapterMode {
    /// Identifier as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterMode::Simulated => "simulated",
            AdapterMode::Equipment => "equipment",
        }
    }

    /// Label shown in adapter status
    pub fn label(&self) -> &'static str {
        match self {
            AdapterMode::Simulated => "Simulation",
            AdapterMode::Equipment => "Production",
        }
    }
}

impl fmt::Display for AdapterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterMode {
    type Err = LinewatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" | "simulation" | "virtual" => Ok(AdapterMode::Simulated),
            "equipment" | "production" => Ok(AdapterMode::Equipment),
            _ => Err(LinewatchError::UnknownMode(s.to_string())),
        }
    }
}

/// Link state reported by an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// Status snapshot of an adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterStatus {
    /// Line served by the adapter
    pub line: LineId,
    /// Link state
    pub status: ConnectionState,
    /// Data source
    pub mode: AdapterMode,
    /// Human-readable description
    pub message: String,
    /// Last reading (simulated) or last connect (equipment)
    pub last_update: Option<Timestamp>,
    /// Last successful KPI read
    #[serde(default)]
    pub last_reading: Option<Timestamp>,
}

impl AdapterStatus {
    /// Whether the adapter currently has a live link
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionState::Connected
    }

    /// Most recent sign of life: the last reading, else the last update
    pub fn last_activity(&self) -> Option<Timestamp> {
        self.last_reading.or(self.last_update)
    }

    /// Last update as `HH:MM:SS`, or `"Never"`
    pub fn last_update_text(&self) -> String {
        match self.last_update {
            Some(t) => t.format("%H:%M:%S").to_string(),
            None => "Never".to_string(),
        }
    }
}

/// Source of KPI readings for one production line.
pub trait DataAdapter: Send + fmt::Debug {
    /// Line served by this adapter
    fn line(&self) -> LineId;

    /// Data source kind
    fn mode(&self) -> AdapterMode;

    /// Establish the link. Never fails past this boundary; returns whether
    /// the adapter is connected afterwards.
    fn connect(&mut self, now: Timestamp) -> bool;

    /// Read a fresh value for one KPI
    fn read_kpi(&mut self, kpi: Kpi, now: Timestamp) -> Result<KpiReading, AdapterError>;

    /// Current link status
    fn status(&self) -> AdapterStatus;

    /// Seed the adapter's own state with a freshly cold-started snapshot.
    fn prime(&mut self, _snapshot: &Snapshot) {}
}

/// Build the adapter for a (line, mode) pair.
pub fn create_adapter(
    line: LineId,
    mode: AdapterMode,
    config: &EngineConfig,
    rng: StdRng,
) -> Box<dyn DataAdapter> {
    match mode {
        AdapterMode::Simulated => Box::new(SimulatedAdapter::new(line, config.plant_offset(), rng)),
        AdapterMode::Equipment => {
            Box::new(EquipmentAdapter::new(line, config.equipment.clone(), rng))
        }
    }
}
