//! Health monitoring for data adapters
//!
//! Rolls up the status of every registered adapter into one system status.

use serde::{Deserialize, Serialize};

use crate::adapter::{AdapterStatus, ConnectionState};
use crate::snapshot::Timestamp;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Component is healthy
    Healthy,
    /// Component is degraded but functional
    Degraded,
    /// Component is unhealthy
    Unhealthy,
    /// Component status is unknown
    #[default]
    Unknown,
}

impl HealthStatus {
    /// Check if the status is operational (healthy or degraded)
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }

    /// Check if the status is healthy
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Health check result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Component name, e.g. `line2/simulated`
    pub component: String,
    /// Status
    pub status: HealthStatus,
    /// Last update reported by the component
    pub last_update: Option<Timestamp>,
    /// Details message
    pub message: String,
}

impl HealthCheck {
    /// Create a healthy check result
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            last_update: None,
            message: "OK".to_string(),
        }
    }

    /// Create an unhealthy check result
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            last_update: None,
            message: message.into(),
        }
    }

    /// Create a degraded check result
    pub fn degraded(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Degraded,
            last_update: None,
            message: message.into(),
        }
    }

    /// Set the last update time for this check
    pub fn with_last_update(mut self, last_update: Option<Timestamp>) -> Self {
        self.last_update = last_update;
        self
    }

    /// Set the message for this check
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Health configuration thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct HealthConfig {
    /// Seconds without an update before a connected adapter is degraded
    pub stale_after_secs: i64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            // Longest KPI refresh interval
            stale_after_secs: 1800,
        }
    }
}

/// Health monitor for the system
#[derive(Debug, Default)]
pub struct HealthMonitor {
    /// Component health checks
    checks: Vec<HealthCheck>,
    /// Degradation thresholds
    config: HealthConfig,
    /// Current system status
    system_status: HealthStatus,
}

impl HealthMonitor {
    /// Create a new health monitor
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a health monitor with custom configuration
    pub fn with_config(config: HealthConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    /// Build a monitor from adapter statuses
    pub fn from_statuses(statuses: &[AdapterStatus], now: Timestamp) -> Self {
        let mut monitor = Self::new();
        for status in statuses {
            monitor.check_adapter(status, now);
        }
        monitor
    }

    /// Grade one adapter and record the result.
    ///
    /// Disconnected adapters are unhealthy. Connected adapters whose last
    /// reading (or connect, before any reading) is older than the stale
    /// threshold are degraded.
    pub fn check_adapter(&mut self, status: &AdapterStatus, now: Timestamp) {
        let component = format!("{}/{}", status.line, status.mode);
        let last_activity = status.last_activity();
        let check = match status.status {
            ConnectionState::Disconnected => HealthCheck::unhealthy(
                component,
                format!("{} disconnected", status.message),
            ),
            ConnectionState::Connected => match last_activity {
                Some(t) if (now - t).num_seconds() > self.config.stale_after_secs => {
                    HealthCheck::degraded(
                        component,
                        format!("no update for {}s", (now - t).num_seconds()),
                    )
                }
                _ => HealthCheck::healthy(component).with_message(status.message.clone()),
            },
        };
        self.add_check(check.with_last_update(last_activity));
    }

    /// Add a health check result
    pub fn add_check(&mut self, check: HealthCheck) {
        // Remove old check for same component
        self.checks.retain(|c| c.component != check.component);
        self.checks.push(check);
        self.update_system_status();
    }

    /// Update overall system status based on all checks
    fn update_system_status(&mut self) {
        if self.checks.is_empty() {
            self.system_status = HealthStatus::Unknown;
            return;
        }

        let unhealthy = self.unhealthy_count();
        let degraded = self.degraded_count();

        self.system_status = if unhealthy == self.checks.len() {
            HealthStatus::Unhealthy
        } else if unhealthy > 0 || degraded > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
    }

    /// Get current system status
    pub fn status(&self) -> HealthStatus {
        self.system_status
    }

    /// Get all checks
    pub fn checks(&self) -> &[HealthCheck] {
        &self.checks
    }

    /// Get configuration
    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    /// Get check for a specific component
    pub fn get_check(&self, component: &str) -> Option<&HealthCheck> {
        self.checks.iter().find(|c| c.component == component)
    }

    /// Generate health report
    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("System Status: {:?}\n\n", self.system_status));

        for check in &self.checks {
            let last = match check.last_update {
                Some(t) => t.format("%H:%M:%S").to_string(),
                None => "Never".to_string(),
            };
            report.push_str(&format!(
                "[{:?}] {} - {} (last update: {})\n",
                check.status, check.component, check.message, last
            ));
        }

        report
    }

    /// Check if system is operational
    pub fn is_operational(&self) -> bool {
        self.system_status.is_ok()
    }

    /// Get count of healthy components
    pub fn healthy_count(&self) -> usize {
        self.count(HealthStatus::Healthy)
    }

    /// Get count of degraded components
    pub fn degraded_count(&self) -> usize {
        self.count(HealthStatus::Degraded)
    }

    /// Get count of unhealthy components
    pub fn unhealthy_count(&self) -> usize {
        self.count(HealthStatus::Unhealthy)
    }

    fn count(&self, status: HealthStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}
