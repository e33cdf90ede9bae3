// LineWatch - Engine configuration
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Engine configuration.

use std::path::Path;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LinewatchError, Result};
use crate::tls::{endpoint_host, SecurityPolicy, TlsConfig, OPC_TCP_SCHEME};

/// Largest accepted plant UTC offset, in minutes.
pub const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

/// Master configuration for the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for every random source (None = entropy).
    pub seed: Option<u64>,

    /// Plant UTC offset in minutes, used to derive the local shift hour.
    pub utc_offset_minutes: i32,

    /// Equipment connection settings for production mode.
    pub equipment: EquipmentConfig,
}

impl EngineConfig {
    /// Create a default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the plant UTC offset
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Set the equipment connection settings
    pub fn with_equipment(mut self, equipment: EquipmentConfig) -> Self {
        self.equipment = equipment;
        self
    }

    /// Plant time zone. Out-of-range offsets fall back to UTC.
    pub fn plant_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    /// Check the configuration for inconsistencies.
    pub fn validate(&self) -> Result<()> {
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(LinewatchError::Config(format!(
                "utc_offset_minutes {} out of range (max {})",
                self.utc_offset_minutes, MAX_UTC_OFFSET_MINUTES
            )));
        }
        self.equipment.validate()
    }

    /// Parse from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Equipment (production mode) connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentConfig {
    /// OPC-UA endpoint, e.g. `opc.tcp://localhost:4840`
    pub endpoint: String,
    /// Message security policy
    pub security_policy: SecurityPolicy,
    /// TLS client settings
    pub tls: TlsConfig,
}

impl Default for EquipmentConfig {
    fn default() -> Self {
        Self {
            endpoint: "opc.tcp://localhost:4840".to_string(),
            security_policy: SecurityPolicy::Basic256Sha256SignAndEncrypt,
            tls: TlsConfig::new()
                .with_server_name("localhost")
                .with_min_version("1.2"),
        }
    }
}

impl EquipmentConfig {
    /// Create settings for an endpoint with default security
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            ..Default::default()
        }
    }

    /// Set the security policy
    pub fn with_security_policy(mut self, policy: SecurityPolicy) -> Self {
        self.security_policy = policy;
        self
    }

    /// Set the TLS client settings
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    /// Check the endpoint scheme and that secured policies have TLS settings.
    pub fn validate(&self) -> Result<()> {
        if endpoint_host(&self.endpoint).is_none() {
            return Err(LinewatchError::Config(format!(
                "equipment endpoint '{}' must use {}host[:port]",
                self.endpoint, OPC_TCP_SCHEME
            )));
        }
        if self.security_policy.requires_tls() && !self.tls.is_valid_client() {
            return Err(LinewatchError::Config(format!(
                "security policy {} requires a TLS client configuration",
                self.security_policy
            )));
        }
        Ok(())
    }
}
