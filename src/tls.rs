// LineWatch - Secure equipment link
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! TLS settings and handshake stub for equipment links
//!
//! Describes how the equipment adapter secures its OPC-UA session. No socket
//! is opened: [`handshake`] validates the endpoint, security policy and TLS
//! settings and produces the negotiated parameters a real session would use.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::error::{AdapterError, LinewatchError};

/// Scheme every equipment endpoint must use.
pub const OPC_TCP_SCHEME: &str = "opc.tcp://";

/// TLS configuration builder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to client certificate file (PEM format)
    pub cert_path: Option<String>,
    /// Path to private key file (PEM format)
    pub key_path: Option<String>,
    /// Path to CA certificate for verification
    pub ca_path: Option<String>,
    /// Server name for verification
    pub server_name: Option<String>,
    /// Allow self-signed certificates
    pub allow_self_signed: bool,
    /// Minimum TLS version ("1.2" or "1.3")
    pub min_version: Option<String>,
}

impl TlsConfig {
    /// Create a new empty TLS configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure certificate and key paths
    pub fn with_cert(mut self, cert_path: &str, key_path: &str) -> Self {
        self.cert_path = Some(cert_path.to_string());
        self.key_path = Some(key_path.to_string());
        self
    }

    /// Configure CA certificate path for verification
    pub fn with_ca(mut self, ca_path: &str) -> Self {
        self.ca_path = Some(ca_path.to_string());
        self
    }

    /// Configure expected server name
    pub fn with_server_name(mut self, name: &str) -> Self {
        self.server_name = Some(name.to_string());
        self
    }

    /// Allow self-signed certificates
    pub fn allow_self_signed(mut self) -> Self {
        self.allow_self_signed = true;
        self
    }

    /// Set minimum TLS version
    pub fn with_min_version(mut self, version: &str) -> Self {
        self.min_version = Some(version.to_string());
        self
    }

    /// Check if this is a valid client configuration
    pub fn is_valid_client(&self) -> bool {
        // Client needs at least server name or CA for verification
        self.server_name.is_some() || self.ca_path.is_some() || self.allow_self_signed
    }

    /// Negotiated protocol version, or None if the minimum is unsupported
    fn negotiated_version(&self) -> Option<&'static str> {
        match self.min_version.as_deref() {
            None | Some("1.2") | Some("1.3") => Some("TLSv1.3"),
            Some(_) => None,
        }
    }
}

/// OPC-UA message security policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SecurityPolicy {
    /// Plain session, no signing
    None,
    /// Messages signed
    Basic256Sha256Sign,
    /// Messages signed and encrypted
    #[default]
    Basic256Sha256SignAndEncrypt,
}

impl SecurityPolicy {
    /// Whether this policy needs a TLS client configuration
    pub fn requires_tls(&self) -> bool {
        !matches!(self, SecurityPolicy::None)
    }

    /// Cipher suite announced for this policy
    fn cipher_suite(&self) -> &'static str {
        match self {
            SecurityPolicy::None => "NONE",
            SecurityPolicy::Basic256Sha256Sign => "TLS_ECDHE_ECDSA_WITH_NULL_SHA256",
            SecurityPolicy::Basic256Sha256SignAndEncrypt => "TLS_AES_256_GCM_SHA384",
        }
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityPolicy::None => "None",
            SecurityPolicy::Basic256Sha256Sign => "Basic256Sha256Sign",
            SecurityPolicy::Basic256Sha256SignAndEncrypt => "Basic256Sha256SignAndEncrypt",
        };
        f.write_str(name)
    }
}

impl FromStr for SecurityPolicy {
    type Err = LinewatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SecurityPolicy::None),
            "basic256sha256sign" | "sign" => Ok(SecurityPolicy::Basic256Sha256Sign),
            "basic256sha256signandencrypt" | "signandencrypt" => {
                Ok(SecurityPolicy::Basic256Sha256SignAndEncrypt)
            }
            _ => Err(LinewatchError::Config(format!("unknown security policy: {}", s))),
        }
    }
}

/// Connection state for equipment sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsState {
    /// Not connected
    #[default]
    Disconnected,
    /// Connected and ready
    Connected,
    /// Last handshake failed
    Error,
}

/// Result of a successful handshake
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakeResult {
    /// Host extracted from the endpoint
    pub host: String,
    /// Negotiated protocol version
    pub protocol_version: String,
    /// Negotiated cipher suite
    pub cipher_suite: String,
    /// Peer certificate fingerprint (if the session is secured)
    pub peer_fingerprint: Option<String>,
}

/// Extract the host part of an `opc.tcp://host[:port][/path]` endpoint.
pub fn endpoint_host(endpoint: &str) -> Option<&str> {
    let rest = endpoint.strip_prefix(OPC_TCP_SCHEME)?;
    let authority = rest.split('/').next().unwrap_or("");
    let host = authority.split(':').next().unwrap_or("");
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Run the secured handshake stub against an endpoint.
///
/// Fails when the endpoint is not `opc.tcp://`, when a signing policy has
/// no usable client TLS config, when the minimum version is unsupported, or
/// when the server name does not match the endpoint host and self-signed
/// certificates are not allowed.
pub fn handshake(
    endpoint: &str,
    policy: SecurityPolicy,
    tls: &TlsConfig,
) -> Result<HandshakeResult, AdapterError> {
    let host = endpoint_host(endpoint).ok_or_else(|| AdapterError::Handshake {
        reason: format!("invalid endpoint '{}', expected {}host[:port]", endpoint, OPC_TCP_SCHEME),
    })?;

    if !policy.requires_tls() {
        return Ok(HandshakeResult {
            host: host.to_string(),
            protocol_version: "none".to_string(),
            cipher_suite: policy.cipher_suite().to_string(),
            peer_fingerprint: None,
        });
    }

    if !tls.is_valid_client() {
        return Err(AdapterError::Handshake {
            reason: format!("policy {} requires a TLS client configuration", policy),
        });
    }

    let version = tls.negotiated_version().ok_or_else(|| AdapterError::Handshake {
        reason: format!(
            "unsupported minimum TLS version {}",
            tls.min_version.as_deref().unwrap_or("?")
        ),
    })?;

    if let Some(expected) = tls.server_name.as_deref() {
        if !expected.eq_ignore_ascii_case(host) && !tls.allow_self_signed {
            return Err(AdapterError::Handshake {
                reason: format!("certificate name mismatch: expected {}, got {}", expected, host),
            });
        }
    }

    Ok(HandshakeResult {
        host: host.to_string(),
        protocol_version: version.to_string(),
        cipher_suite: policy.cipher_suite().to_string(),
        peer_fingerprint: Some(format!("xxh64:{:016x}", xxh64(host.as_bytes(), 0))),
    })
}
