// LineWatch - Equipment data adapter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! OPC-UA equipment adapter stub.
//!
//! Runs the secured handshake against the configured endpoint and returns
//! placeholder readings while connected.

use rand::rngs::StdRng;
use rand::Rng;

use super::{AdapterMode, AdapterStatus, ConnectionState, DataAdapter};
use crate::catalog::{Kpi, LineId};
use crate::config::EquipmentConfig;
use crate::error::AdapterError;
use crate::snapshot::{KpiReading, Timestamp};
use crate::tls::{handshake, HandshakeResult, TlsState};

/// Range of placeholder readings returned while connected.
pub const PLACEHOLDER_RANGE: (f64, f64) = (80.0, 95.0);

/// Adapter for real factory equipment.
#[derive(Debug)]
pub struct EquipmentAdapter {
    line: LineId,
    config: EquipmentConfig,
    rng: StdRng,
    state: TlsState,
    session: Option<HandshakeResult>,
    last_connect: Option<Timestamp>,
    last_reading: Option<Timestamp>,
    last_error: Option<String>,
}

impl EquipmentAdapter {
    /// Create a disconnected adapter.
    pub fn new(line: LineId, config: EquipmentConfig, rng: StdRng) -> Self {
        Self {
            line,
            config,
            rng,
            state: TlsState::Disconnected,
            session: None,
            last_connect: None,
            last_reading: None,
            last_error: None,
        }
    }

    /// Session parameters of the current link.
    pub fn session(&self) -> Option<&HandshakeResult> {
        self.session.as_ref()
    }

    /// Reason of the last failed handshake.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl DataAdapter for EquipmentAdapter {
    fn line(&self) -> LineId {
        self.line
    }

    fn mode(&self) -> AdapterMode {
        AdapterMode::Equipment
    }

    fn connect(&mut self, now: Timestamp) -> bool {
        match handshake(
            &self.config.endpoint,
            self.config.security_policy,
            &self.config.tls,
        ) {
            Ok(session) => {
                log::debug!(
                    "{}: connected to {} ({}, {})",
                    self.line,
                    self.config.endpoint,
                    session.protocol_version,
                    session.cipher_suite
                );
                self.state = TlsState::Connected;
                self.session = Some(session);
                self.last_connect = Some(now);
                self.last_error = None;
                true
            }
            Err(e) => {
                log::warn!("{}: equipment connection failed: {}", self.line, e);
                self.state = TlsState::Error;
                self.session = None;
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    fn read_kpi(&mut self, _kpi: Kpi, now: Timestamp) -> Result<KpiReading, AdapterError> {
        if self.state != TlsState::Connected && !self.connect(now) {
            return Err(AdapterError::NotConnected { line: self.line });
        }
        let value = self.rng.gen_range(PLACEHOLDER_RANGE.0..=PLACEHOLDER_RANGE.1);
        self.last_reading = Some(now);
        Ok(KpiReading::new(value, now))
    }

    fn status(&self) -> AdapterStatus {
        let status = if self.state == TlsState::Connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        AdapterStatus {
            line: self.line,
            status,
            mode: AdapterMode::Equipment,
            message: "OPC-UA to factory equipment".to_string(),
            last_update: self.last_connect,
            last_reading: self.last_reading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::{SecurityPolicy, TlsConfig};
    use chrono::{TimeZone, Utc};
    use rand::SeedableRng;

    fn t(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_706_781_600 + secs, 0).unwrap()
    }

    fn adapter(config: EquipmentConfig) -> EquipmentAdapter {
        EquipmentAdapter::new(LineId::Line1, config, StdRng::seed_from_u64(3))
    }

    #[test]
    fn test_initial_status_is_disconnected() {
        let status = adapter(EquipmentConfig::default()).status();
        assert_eq!(status.status, ConnectionState::Disconnected);
        assert_eq!(status.mode, AdapterMode::Equipment);
        assert_eq!(status.message, "OPC-UA to factory equipment");
        assert_eq!(status.last_update_text(), "Never");
    }

    #[test]
    fn test_connect_with_default_config() {
        let mut adapter = adapter(EquipmentConfig::default());
        assert!(adapter.connect(t(0)));
        assert!(adapter.session().is_some());

        let status = adapter.status();
        assert!(status.is_connected());
        assert_eq!(status.last_update, Some(t(0)));
    }

    #[test]
    fn test_read_reconnects_on_demand() {
        let mut adapter = adapter(EquipmentConfig::default());
        let reading = adapter.read_kpi(Kpi::Oee, t(5)).unwrap();
        assert!(reading.value >= 80.0 && reading.value <= 95.0);
        assert_eq!(reading.last_updated, t(5));
        assert!(adapter.status().is_connected());
    }

    #[test]
    fn test_reads_advance_last_reading_not_last_connect() {
        let mut adapter = adapter(EquipmentConfig::default());
        adapter.read_kpi(Kpi::Oee, t(30)).unwrap();
        adapter.read_kpi(Kpi::Tvr, t(2100)).unwrap();

        let status = adapter.status();
        assert_eq!(status.last_update, Some(t(30)));
        assert_eq!(status.last_reading, Some(t(2100)));
        assert_eq!(status.last_activity(), Some(t(2100)));
    }

    #[test]
    fn test_failed_handshake_reports_disconnected() {
        let config = EquipmentConfig::default().with_tls(TlsConfig::new());
        let mut adapter = adapter(config);

        assert!(!adapter.connect(t(0)));
        assert!(adapter.last_error().is_some());
        assert!(!adapter.status().is_connected());
        assert!(adapter.status().last_update.is_none());
        assert!(adapter.status().last_reading.is_none());

        assert_eq!(
            adapter.read_kpi(Kpi::Oee, t(1)),
            Err(AdapterError::NotConnected { line: LineId::Line1 })
        );
    }

    #[test]
    fn test_plain_session() {
        let config = EquipmentConfig::new("opc.tcp://10.1.2.3:4840")
            .with_security_policy(SecurityPolicy::None);
        let mut adapter = adapter(config);
        assert!(adapter.connect(t(0)));
        assert!(adapter.session().unwrap().peer_fingerprint.is_none());
    }
}
