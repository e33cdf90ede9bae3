//! Error types for LineWatch
//!
//! This module defines all error types used throughout the library.
//! None of them is fatal: the scheduler and context absorb adapter errors
//! and surface them as degraded status instead.

use thiserror::Error;

use crate::catalog::LineId;

/// Result type alias for LineWatch operations
pub type Result<T> = std::result::Result<T, LinewatchError>;

/// Main error type for LineWatch operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinewatchError {
    /// Production line identifier not in the catalog
    #[error("Unknown production line: {0}")]
    UnknownLine(String),

    /// KPI name not in the catalog
    #[error("Unknown KPI: {0}")]
    UnknownKpi(String),

    /// Adapter mode not recognised
    #[error("Unknown adapter mode: {0}")]
    UnknownMode(String),

    /// Adapter error
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for LinewatchError {
    fn from(err: serde_json::Error) -> Self {
        LinewatchError::Config(err.to_string())
    }
}

impl From<std::io::Error> for LinewatchError {
    fn from(err: std::io::Error) -> Self {
        LinewatchError::Config(err.to_string())
    }
}

/// Errors raised by a data adapter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// Equipment link is down and reconnecting failed
    #[error("Not connected to equipment for {line}")]
    NotConnected { line: LineId },

    /// Secure handshake could not be completed
    #[error("Handshake failed: {reason}")]
    Handshake { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LinewatchError::Adapter(AdapterError::Handshake {
            reason: "certificate expired".to_string(),
        });
        let msg = format!("{}", err);
        assert!(msg.contains("Handshake failed"));
        assert!(msg.contains("certificate expired"));
    }

    #[test]
    fn test_error_conversion() {
        let adapter_err = AdapterError::NotConnected { line: LineId::Line2 };
        let err: LinewatchError = adapter_err.into();
        assert!(matches!(err, LinewatchError::Adapter(_)));
        assert!(err.to_string().contains("line2"));
    }

    #[test]
    fn test_json_error_becomes_config_error() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: LinewatchError = json_err.into();
        assert!(matches!(err, LinewatchError::Config(_)));
    }
}
