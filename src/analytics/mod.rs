// LineWatch - Predictive analytics
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Predictive analytics over KPI snapshots.
//!
//! Every function here is a read-only computation over a snapshot. Randomness
//! is confined to trend projection and bottleneck growth sampling, and both
//! have a deterministic counterpart taking the sampled quantity explicitly:
//!
//! | Sampled | Deterministic |
//! |---|---|
//! | [`predict_kpi_trend`] | [`project_trend`] |
//! | [`predict_bottlenecks`] | [`project_bottlenecks`] |

pub mod bottleneck;
pub mod components;
pub mod failure;
pub mod forecast;
pub mod maintenance;
pub mod trend;

pub use bottleneck::{predict_bottlenecks, project_bottlenecks, Bottleneck, RESOURCES};
pub use components::{components, predict_component_failures, Component, FailurePrediction};
pub use failure::calculate_failure_probability;
pub use forecast::{performance_forecast, ForecastPoint, PerformanceForecast, RiskBand};
pub use maintenance::{
    calculate_optimal_maintenance, project_risk_series, MaintenanceDay, MaintenancePlan,
    MaintenancePriority, MaintenanceSchedule,
};
pub use trend::{predict_kpi_trend, predict_snapshot_trends, project_trend};
