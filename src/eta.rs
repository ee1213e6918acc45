//! # ETA Estimation
//!
//! Computes and revises the estimated delivery time.
//!
//! # Architecture Note
//! [`estimate`] is a pure function of `(record, telemetry, now, prior)`: it
//! reads no clocks and holds no state. The coordinator owns the prior
//! estimate and the revision cadence (every N ticks, a configuration
//! constant), which keeps the estimator independently testable and the
//! published ETA free of per-tick jitter.
//!
//! Revision rules:
//! - An ETA may only move later, and any increase carries a
//!   [`DelayReason`] code for the language layer. It never silently
//!   decreases; an earlier candidate is ignored in favor of the prior value.
//! - The first estimate is retained as `original_eta` so views can show the
//!   "was / now" comparison.
//! - Remaining time clamps at zero; past-due estimates surface as the
//!   `arriving` flag, never as a negative duration.

use crate::config::EngineConfig;
use crate::model::{DeliveryMethod, OrderRecord, TelemetrySnapshot};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Why an ETA moved later. Stable codes; the language layer maps them to
/// localized copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DelayReason {
    Traffic,
    Weather,
    RestaurantDelay,
}

impl DelayReason {
    pub fn code(&self) -> &'static str {
        match self {
            DelayReason::Traffic => "traffic",
            DelayReason::Weather => "weather",
            DelayReason::RestaurantDelay => "restaurant-delay",
        }
    }
}

/// The current delivery estimate for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct EtaEstimate {
    /// Current best estimate of arrival.
    pub eta: Instant,
    /// The first estimate ever produced for this session, kept for display
    /// comparison against revisions.
    pub original_eta: Instant,
    /// Present iff `eta` has been revised later than the prior estimate.
    pub delay_reason: Option<DelayReason>,
    /// Set when remaining time has clamped to zero (or the route completed):
    /// the asset is arriving now.
    pub arriving: bool,
}

impl EtaEstimate {
    /// Whole minutes until `eta`, rounded up, floored at zero.
    pub fn remaining_minutes(&self, now: Instant) -> u64 {
        self.eta.saturating_duration_since(now).as_secs().div_ceil(60)
    }
}

/// Computes the estimate for `record` at `now`.
///
/// With no `prior` this produces the base estimate (nominal remaining time
/// from the current stage, or the nominal route duration once in transit).
/// With a `prior`, telemetry that has fallen behind the deterministic
/// progress ramp by more than the configured slack pushes the ETA later with
/// a delay reason; anything else keeps the prior estimate.
pub fn estimate(
    record: &OrderRecord,
    telemetry: Option<&TelemetrySnapshot>,
    now: Instant,
    prior: Option<&EtaEstimate>,
    config: &EngineConfig,
) -> EtaEstimate {
    let nominal = config.nominal_route_duration;
    let base = match record.transit_started_at() {
        Some(started) => started + nominal,
        None => now + record.nominal_remaining(config),
    };

    let Some(prior) = prior else {
        let arriving = base <= now;
        return EtaEstimate {
            eta: base,
            original_eta: base,
            delay_reason: None,
            arriving,
        };
    };

    // Candidate revision: where the asset will land at its observed pace.
    let candidate = match (telemetry, record.transit_started_at()) {
        (Some(telemetry), Some(started)) => {
            let progress = telemetry.progress_fraction();
            let expected = (now.saturating_duration_since(started).as_secs_f64()
                / nominal.as_secs_f64())
            .min(1.0);
            if expected - progress > config.eta_revision_slack {
                let remaining = Duration::from_secs_f64((1.0 - progress) * nominal.as_secs_f64());
                Some((now + remaining, transit_delay_reason(record, telemetry, config)))
            } else {
                None
            }
        }
        // Not in transit yet: a stage overrun shows up as the base estimate
        // drifting past the prior one.
        _ if base > prior.eta => Some((base, DelayReason::RestaurantDelay)),
        _ => None,
    };

    let (eta, delay_reason) = match candidate {
        Some((at, reason)) if at > prior.eta => (at, Some(reason)),
        // Never decrease, never drop an already-surfaced reason.
        _ => (prior.eta, prior.delay_reason),
    };

    let route_done = telemetry.is_some_and(|t| t.progress_fraction() >= 1.0);
    EtaEstimate {
        eta,
        original_eta: prior.original_eta,
        delay_reason,
        arriving: eta <= now || route_done,
    }
}

fn transit_delay_reason(
    record: &OrderRecord,
    telemetry: &TelemetrySnapshot,
    config: &EngineConfig,
) -> DelayReason {
    match record.delivery_method() {
        DeliveryMethod::Drone
            if telemetry
                .wind_kph()
                .is_some_and(|w| w >= config.wind_delay_threshold_kph) =>
        {
            DelayReason::Weather
        }
        _ => DelayReason::Traffic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeliveryMethod, OrderDraft, OrderId, OrderStatus};

    fn record_in_transit(now: Instant) -> OrderRecord {
        let mut draft = OrderDraft::new(DeliveryMethod::Standard);
        draft.push_item("Ramen", 12.0, 1);
        let mut record = draft.place(OrderId::from("o1"), now).unwrap();
        record.advance(OrderStatus::Preparing, now).unwrap();
        record.advance(OrderStatus::OutForDelivery, now).unwrap();
        record
    }

    fn vehicle_snapshot(progress: f64) -> TelemetrySnapshot {
        TelemetrySnapshot::Vehicle {
            progress_fraction: progress,
            driver_name: "Marco".into(),
            phone: "+1-555-0100".into(),
            rating: 4.8,
            vehicle_type: "scooter".into(),
            eta_minutes: 10,
            traffic_level: 0.3,
        }
    }

    #[tokio::test]
    async fn base_estimate_uses_nominal_route_duration() {
        let config = EngineConfig::default();
        let now = Instant::now();
        let record = record_in_transit(now);
        let first = estimate(&record, None, now, None, &config);
        assert_eq!(first.eta, now + config.nominal_route_duration);
        assert_eq!(first.original_eta, first.eta);
        assert!(first.delay_reason.is_none());
        assert!(!first.arriving);
    }

    #[tokio::test]
    async fn estimate_is_pure() {
        let config = EngineConfig::default();
        let now = Instant::now();
        let record = record_in_transit(now);
        let snapshot = vehicle_snapshot(0.2);
        let a = estimate(&record, Some(&snapshot), now, None, &config);
        let b = estimate(&record, Some(&snapshot), now, None, &config);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn behind_schedule_increases_eta_with_reason() {
        let config = EngineConfig::default();
        let now = Instant::now();
        let record = record_in_transit(now);
        let prior = estimate(&record, None, now, None, &config);

        // Half the nominal duration has passed but progress is far behind.
        let later = now + config.nominal_route_duration / 2;
        let snapshot = vehicle_snapshot(0.2);
        let revised = estimate(&record, Some(&snapshot), later, Some(&prior), &config);
        assert!(revised.eta > prior.eta);
        assert_eq!(revised.delay_reason, Some(DelayReason::Traffic));
        assert_eq!(revised.original_eta, prior.eta);
    }

    #[tokio::test]
    async fn eta_never_decreases() {
        let config = EngineConfig::default();
        let now = Instant::now();
        let record = record_in_transit(now);
        let prior = estimate(&record, None, now, None, &config);

        // Ahead of schedule: the candidate would be earlier, so the prior
        // estimate stands.
        let later = now + config.nominal_route_duration / 10;
        let snapshot = vehicle_snapshot(0.9);
        let revised = estimate(&record, Some(&snapshot), later, Some(&prior), &config);
        assert_eq!(revised.eta, prior.eta);
        assert!(revised.delay_reason.is_none());
    }

    #[tokio::test]
    async fn overdue_estimate_clamps_to_arriving() {
        let config = EngineConfig::default();
        let now = Instant::now();
        let record = record_in_transit(now);
        let prior = estimate(&record, None, now, None, &config);

        let way_past = now + config.nominal_route_duration * 2;
        let snapshot = vehicle_snapshot(0.995);
        let revised = estimate(&record, Some(&snapshot), way_past, Some(&prior), &config);
        assert!(revised.arriving);
        assert_eq!(revised.remaining_minutes(way_past), 0);
    }

    #[tokio::test]
    async fn drone_delay_in_high_wind_is_weather() {
        let config = EngineConfig::default();
        let now = Instant::now();
        let mut draft = OrderDraft::new(DeliveryMethod::Drone);
        draft.push_item("Sushi", 18.0, 1);
        let mut record = draft.place(OrderId::from("d1"), now).unwrap();
        record.advance(OrderStatus::OutForDelivery, now).unwrap();
        let prior = estimate(&record, None, now, None, &config);

        let snapshot = TelemetrySnapshot::Drone {
            progress_fraction: 0.1,
            altitude_m: 80.0,
            speed_mps: 12.0,
            battery_percent: 70.0,
            signal_percent: 90.0,
            heading_degrees: 180.0,
            wind_kph: config.wind_delay_threshold_kph + 5.0,
            temperature_c: 21.0,
            eta_minutes: 9,
        };
        let later = now + config.nominal_route_duration / 2;
        let revised = estimate(&record, Some(&snapshot), later, Some(&prior), &config);
        assert_eq!(revised.delay_reason, Some(DelayReason::Weather));
    }
}
