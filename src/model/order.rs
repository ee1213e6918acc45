//! # Order Model
//!
//! The immutable identity and mutable status of one delivery order.
//!
//! # Architecture Note
//! The engine never constructs an order from user input: the cart-to-order
//! transition (an external collaborator) builds an [`OrderDraft`], freezes it
//! with [`OrderDraft::place`], and hands the resulting [`OrderRecord`] to the
//! coordinator. After placement the item list and total are frozen; the only
//! mutable fields are `status`, the status history, and the estimated
//! delivery time, and the coordinator is the only writer of those.

use crate::config::EngineConfig;
use crate::error::TrackingError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tokio::time::Instant;

/// Type-safe identifier for orders. Opaque, unique, assigned at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Type-safe identifier for a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session_{}", self.0)
    }
}

/// Identifier for a subscribed presentation surface (tracking card, full
/// map, drone panel). Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub String);

impl Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ViewId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One line item of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// How the order travels. Set at creation, immutable; gates which telemetry
/// variant the session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMethod {
    Standard,
    Drone,
}

/// Lifecycle status of an order.
///
/// Statuses form a fixed total order (`Placed < Accepted < Preparing <
/// OutForDelivery < Nearby < Delivered`); `Cancelled` is a terminal sibling
/// reachable from any non-terminal stage. The serialized form is the stable
/// kebab-case key the language layer maps to display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Placed,
    Accepted,
    Preparing,
    OutForDelivery,
    Nearby,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Position of this status in the canonical 8-stage display order
    /// (see [`crate::model::TimelineStage`]). `Cancelled` has no position.
    pub fn canonical_index(&self) -> Option<usize> {
        match self {
            OrderStatus::Placed => Some(0),
            OrderStatus::Accepted => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::OutForDelivery => Some(5),
            OrderStatus::Nearby => Some(6),
            OrderStatus::Delivered => Some(7),
            OrderStatus::Cancelled => None,
        }
    }

    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether a telemetry simulator should be running for this status.
    pub fn in_transit(&self) -> bool {
        matches!(self, OrderStatus::OutForDelivery | OrderStatus::Nearby)
    }

    /// Stable key for the language/formatting layer.
    pub fn code(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out-for-delivery",
            OrderStatus::Nearby => "nearby",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The pre-placement, mutable form of an order.
///
/// Items are append-only and the total is derived; [`OrderDraft::place`]
/// freezes both into an [`OrderRecord`]. An empty draft is valid, an empty
/// placed order is not.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    items: Vec<OrderItem>,
    delivery_method: DeliveryMethod,
}

impl OrderDraft {
    pub fn new(delivery_method: DeliveryMethod) -> Self {
        Self {
            items: Vec::new(),
            delivery_method,
        }
    }

    /// Appends a line item. Drafts only grow; there is no remove.
    pub fn push_item(&mut self, name: impl Into<String>, unit_price: f64, quantity: u32) {
        self.items.push(OrderItem {
            name: name.into(),
            unit_price,
            quantity,
        });
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Derived total of the draft as it stands.
    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Freezes the draft into a placed [`OrderRecord`].
    pub fn place(self, id: OrderId, now: Instant) -> Result<OrderRecord, TrackingError> {
        if self.items.is_empty() {
            return Err(TrackingError::EmptyOrder(id));
        }
        let total = self.total();
        Ok(OrderRecord {
            id,
            items: self.items,
            total,
            status: OrderStatus::Placed,
            delivery_method: self.delivery_method,
            created_at: now,
            estimated_delivery: None,
            status_history: vec![(OrderStatus::Placed, now)],
        })
    }
}

/// One placed order. Identity fields are frozen; `status` advances
/// monotonically (with the cancel escape) through [`OrderRecord::advance`]
/// and [`OrderRecord::cancel`], which the coordinator alone calls.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    id: OrderId,
    items: Vec<OrderItem>,
    total: f64,
    status: OrderStatus,
    delivery_method: DeliveryMethod,
    created_at: Instant,
    estimated_delivery: Option<Instant>,
    status_history: Vec<(OrderStatus, Instant)>,
}

impl OrderRecord {
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn delivery_method(&self) -> DeliveryMethod {
        self.delivery_method
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn estimated_delivery(&self) -> Option<Instant> {
        self.estimated_delivery
    }

    /// Actual transition times, oldest first. Always starts with `Placed`.
    pub fn status_history(&self) -> &[(OrderStatus, Instant)] {
        &self.status_history
    }

    /// The last non-cancelled status. For live orders this is `status`; for
    /// cancelled orders it is the stage progress was frozen at.
    pub fn progress_status(&self) -> OrderStatus {
        self.status_history
            .iter()
            .rev()
            .map(|(s, _)| *s)
            .find(|s| *s != OrderStatus::Cancelled)
            .unwrap_or(OrderStatus::Placed)
    }

    /// When this order entered transit, if it has.
    pub fn transit_started_at(&self) -> Option<Instant> {
        self.status_history
            .iter()
            .find(|(s, _)| *s == OrderStatus::OutForDelivery)
            .map(|(_, at)| *at)
    }

    /// Exact time the order reached `status`, if it ever did.
    pub fn status_reached_at(&self, status: OrderStatus) -> Option<Instant> {
        self.status_history
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, at)| *at)
    }

    /// Advances `status` forward along the stage order.
    ///
    /// Skipping optional stages (`accepted`, `nearby`) is a legal forward
    /// move; any regression, repeat, or move out of a terminal stage is an
    /// [`TrackingError::InvalidTransition`]. Cancellation goes through
    /// [`OrderRecord::cancel`], never through here.
    pub(crate) fn advance(&mut self, to: OrderStatus, now: Instant) -> Result<(), TrackingError> {
        let from = self.status;
        let valid = match (from.canonical_index(), to.canonical_index()) {
            (Some(f), Some(t)) => t > f,
            _ => false, // cancelled source or target
        };
        if !valid {
            return Err(TrackingError::InvalidTransition { from, to });
        }
        self.status = to;
        self.status_history.push((to, now));
        Ok(())
    }

    /// The explicit cancel escape, legal from any non-terminal stage.
    pub(crate) fn cancel(&mut self, now: Instant) -> Result<(), TrackingError> {
        if self.status.is_terminal() {
            return Err(TrackingError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Cancelled,
            });
        }
        self.status = OrderStatus::Cancelled;
        self.status_history.push((OrderStatus::Cancelled, now));
        Ok(())
    }

    pub(crate) fn set_estimated_delivery(&mut self, at: Instant) {
        self.estimated_delivery = Some(at);
    }

    /// Nominal time still needed to reach `Delivered` from the current stage.
    pub fn nominal_remaining(&self, config: &EngineConfig) -> std::time::Duration {
        match self.progress_status().canonical_index() {
            Some(idx) => config.gap_sum(idx, 7),
            None => std::time::Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drone_record() -> OrderRecord {
        let mut draft = OrderDraft::new(DeliveryMethod::Drone);
        draft.push_item("Pad Thai", 11.5, 2);
        draft.push_item("Spring Rolls", 4.0, 1);
        draft.place(OrderId::from("order-1"), Instant::now()).unwrap()
    }

    #[tokio::test]
    async fn draft_total_is_derived_and_frozen() {
        let mut draft = OrderDraft::new(DeliveryMethod::Standard);
        assert_eq!(draft.total(), 0.0);
        draft.push_item("Burger", 8.0, 2);
        assert_eq!(draft.total(), 16.0);
        let record = draft.place(OrderId::from("o"), Instant::now()).unwrap();
        assert_eq!(record.total(), 16.0);
        assert_eq!(record.status(), OrderStatus::Placed);
    }

    #[tokio::test]
    async fn empty_draft_cannot_be_placed() {
        let draft = OrderDraft::new(DeliveryMethod::Standard);
        let err = draft.place(OrderId::from("o"), Instant::now()).unwrap_err();
        assert_eq!(err, TrackingError::EmptyOrder(OrderId::from("o")));
    }

    #[tokio::test]
    async fn status_advances_forward_only() {
        let mut record = drone_record();
        let now = Instant::now();
        record.advance(OrderStatus::Preparing, now).unwrap();
        // Skipping the optional accepted stage was legal; regression is not.
        let err = record.advance(OrderStatus::Placed, now).unwrap_err();
        assert!(matches!(err, TrackingError::InvalidTransition { .. }));
        record.advance(OrderStatus::OutForDelivery, now).unwrap();
        record.advance(OrderStatus::Delivered, now).unwrap();
        // Terminal: nothing moves anymore.
        assert!(record.advance(OrderStatus::Nearby, now).is_err());
        assert!(record.cancel(now).is_err());
    }

    #[tokio::test]
    async fn cancel_freezes_progress_status() {
        let mut record = drone_record();
        let now = Instant::now();
        record.advance(OrderStatus::Preparing, now).unwrap();
        record.cancel(now).unwrap();
        assert_eq!(record.status(), OrderStatus::Cancelled);
        assert_eq!(record.progress_status(), OrderStatus::Preparing);
    }
}
