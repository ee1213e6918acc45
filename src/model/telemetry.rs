//! # Telemetry Snapshots
//!
//! The immutable, point-in-time bundles handed to subscribers.
//!
//! Snapshots are values, never references into session state: a view that
//! holds one cannot observe later mutation, and two views reading the same
//! update cycle observe bit-identical data. Telemetry carries the tagged
//! variant for the order's delivery method, decided once at session start.

use crate::eta::EtaEstimate;
use crate::model::{OrderId, OrderStatus};
use serde::{Deserialize, Serialize};

/// Simulated telemetry for one tick of a moving asset.
///
/// `progress_fraction` is monotone non-decreasing while the order is in
/// transit and clamps at 1.0; drone battery is strictly non-increasing over
/// the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TelemetrySnapshot {
    Vehicle {
        /// Completion ratio of the nominal route, 0.0 to 1.0.
        progress_fraction: f64,
        driver_name: String,
        phone: String,
        rating: f64,
        vehicle_type: String,
        /// Whole minutes to arrival, floored at zero.
        eta_minutes: u64,
        /// Congestion factor the route is currently experiencing, 0.0 to 1.0.
        traffic_level: f64,
    },
    Drone {
        /// Completion ratio of the nominal route, 0.0 to 1.0.
        progress_fraction: f64,
        altitude_m: f64,
        speed_mps: f64,
        battery_percent: f64,
        signal_percent: f64,
        heading_degrees: f64,
        wind_kph: f64,
        temperature_c: f64,
        /// Whole minutes to arrival, floored at zero.
        eta_minutes: u64,
    },
}

impl TelemetrySnapshot {
    pub fn progress_fraction(&self) -> f64 {
        match self {
            TelemetrySnapshot::Vehicle {
                progress_fraction, ..
            }
            | TelemetrySnapshot::Drone {
                progress_fraction, ..
            } => *progress_fraction,
        }
    }

    pub fn eta_minutes(&self) -> u64 {
        match self {
            TelemetrySnapshot::Vehicle { eta_minutes, .. }
            | TelemetrySnapshot::Drone { eta_minutes, .. } => *eta_minutes,
        }
    }

    pub fn battery_percent(&self) -> Option<f64> {
        match self {
            TelemetrySnapshot::Drone {
                battery_percent, ..
            } => Some(*battery_percent),
            TelemetrySnapshot::Vehicle { .. } => None,
        }
    }

    pub fn wind_kph(&self) -> Option<f64> {
        match self {
            TelemetrySnapshot::Drone { wind_kph, .. } => Some(*wind_kph),
            TelemetrySnapshot::Vehicle { .. } => None,
        }
    }
}

/// Everything a mounted view needs to render, published atomically per
/// update cycle over the session's watch channel.
///
/// A single `SessionSnapshot` always pairs a status with the telemetry of
/// the same tick; no view can observe a status/telemetry pair from two
/// different ticks. `telemetry` is `None` for sessions that are not in
/// transit, and for sessions degraded to status-only tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub eta: Option<EtaEstimate>,
    pub telemetry: Option<TelemetrySnapshot>,
    /// Number of telemetry ticks this session has processed. Lets callers
    /// observe (and tests assert) that no ticks happen while paused.
    pub tick_seq: u64,
}
