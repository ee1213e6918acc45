//! # Status Timeline
//!
//! Projects an order's status onto a fixed stage catalog for display.
//!
//! # Architecture Note
//! The presentation layer shows the same order at two granularities: a
//! compact five-stage strip and a detailed eight-stage list. Both are
//! projections of one canonical stage order, so `completed`/`current` can
//! never disagree between surfaces. Two of the canonical stages
//! (`ready-for-pickup`, `picked-up`) are display-only: no [`OrderStatus`]
//! value maps to them, and they count as completed once the status has moved
//! past their position.

use crate::config::EngineConfig;
use crate::model::{OrderRecord, OrderStatus};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// One stage of the canonical display catalog, in stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimelineStage {
    Placed,
    Accepted,
    Preparing,
    ReadyForPickup,
    PickedUp,
    OutForDelivery,
    Nearby,
    Delivered,
}

impl TimelineStage {
    /// Position in the canonical stage order.
    pub fn canonical_index(&self) -> usize {
        *self as usize
    }

    /// Stable key for the language/formatting layer.
    pub fn code(&self) -> &'static str {
        match self {
            TimelineStage::Placed => "placed",
            TimelineStage::Accepted => "accepted",
            TimelineStage::Preparing => "preparing",
            TimelineStage::ReadyForPickup => "ready-for-pickup",
            TimelineStage::PickedUp => "picked-up",
            TimelineStage::OutForDelivery => "out-for-delivery",
            TimelineStage::Nearby => "nearby",
            TimelineStage::Delivered => "delivered",
        }
    }

    /// The status value that lands exactly on this stage, if one exists.
    fn exact_status(&self) -> Option<OrderStatus> {
        match self {
            TimelineStage::Placed => Some(OrderStatus::Placed),
            TimelineStage::Accepted => Some(OrderStatus::Accepted),
            TimelineStage::Preparing => Some(OrderStatus::Preparing),
            TimelineStage::OutForDelivery => Some(OrderStatus::OutForDelivery),
            TimelineStage::Nearby => Some(OrderStatus::Nearby),
            TimelineStage::Delivered => Some(OrderStatus::Delivered),
            TimelineStage::ReadyForPickup | TimelineStage::PickedUp => None,
        }
    }
}

/// Which projection of the canonical stage order a view wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Five stages: the compact tracking card.
    Coarse,
    /// All eight stages: the detailed tracking modal.
    Fine,
}

impl Granularity {
    pub fn stages(&self) -> &'static [TimelineStage] {
        const COARSE: [TimelineStage; 5] = [
            TimelineStage::Placed,
            TimelineStage::Preparing,
            TimelineStage::OutForDelivery,
            TimelineStage::Nearby,
            TimelineStage::Delivered,
        ];
        const FINE: [TimelineStage; 8] = [
            TimelineStage::Placed,
            TimelineStage::Accepted,
            TimelineStage::Preparing,
            TimelineStage::ReadyForPickup,
            TimelineStage::PickedUp,
            TimelineStage::OutForDelivery,
            TimelineStage::Nearby,
            TimelineStage::Delivered,
        ];
        match self {
            Granularity::Coarse => &COARSE,
            Granularity::Fine => &FINE,
        }
    }
}

/// One row of a projected timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub stage: TimelineStage,
    /// True iff this stage is at or before the order's current stage.
    pub completed: bool,
    /// True iff the order's status lands exactly on this stage. Always false
    /// for cancelled orders, whose progress is frozen.
    pub current: bool,
    /// Actual time for stages the order has passed through, estimated time
    /// otherwise.
    pub timestamp: Instant,
    /// Tags `timestamp` as an estimate (pending stages, and completed
    /// display-only stages whose exact time was never observed).
    pub estimated: bool,
}

/// Projects `record` onto the requested granularity.
///
/// Cancelled orders return the frozen partial progress at the cancellation
/// point; pending stages keep their (now moot) schedule estimates but are
/// never marked current.
pub fn timeline(
    record: &OrderRecord,
    granularity: Granularity,
    now: Instant,
    config: &EngineConfig,
) -> Vec<TimelineEntry> {
    let cancelled = record.status() == OrderStatus::Cancelled;
    let progress = record.progress_status();
    // progress_status never returns Cancelled, so the index is always there.
    let status_idx = progress.canonical_index().unwrap_or(0);
    let anchor_time = record
        .status_reached_at(progress)
        .unwrap_or_else(|| record.created_at());

    granularity
        .stages()
        .iter()
        .map(|stage| {
            let idx = stage.canonical_index();
            let completed = idx <= status_idx;
            let current = !cancelled && idx == status_idx && stage.exact_status() == Some(progress);
            let actual = stage
                .exact_status()
                .and_then(|s| record.status_reached_at(s));
            let (timestamp, estimated) = match actual {
                Some(at) if completed => (at, false),
                _ if completed => {
                    // Display-only stage crossed without a discrete event:
                    // fall back to the nearest preceding recorded time.
                    let preceding = record
                        .status_history()
                        .iter()
                        .rev()
                        .find(|(s, _)| s.canonical_index().is_some_and(|i| i <= idx))
                        .map(|(_, at)| *at)
                        .unwrap_or(anchor_time);
                    (preceding, true)
                }
                _ => {
                    // Pending: schedule forward from when the current stage
                    // was reached, but never into the past.
                    let scheduled = anchor_time + config.gap_sum(status_idx, idx);
                    (scheduled.max(now), true)
                }
            };
            TimelineEntry {
                stage: *stage,
                completed,
                current,
                timestamp,
                estimated,
            }
        })
        .collect()
}
