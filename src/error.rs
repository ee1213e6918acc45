//! # Tracking Errors
//!
//! This module defines the common error types used throughout the tracking
//! engine. By centralizing error definitions, we ensure consistent error
//! handling across the coordinator, its client, and the domain model.
//!
//! # Severity
//! Not every variant is equally serious:
//! - [`TrackingError::InvalidTransition`] is a caller contract violation,
//!   rejected and logged at `warn`.
//! - [`TrackingError::SimulatorAlreadyRunning`] is an internal invariant
//!   violation, logged at `error` and backed by a `debug_assert!` so it
//!   fails loudly in development builds.
//! - [`TrackingError::UnknownSession`] is recoverable. A late `unsubscribe`
//!   after a session closes is treated as a no-op by the coordinator (view
//!   teardown races are expected), so this variant only surfaces on `subscribe`
//!   and the explicit session operations.
//! - [`TrackingError::SimulatorMisconfigured`] never fails a session: the
//!   coordinator degrades to status-only tracking (no telemetry) instead.

use crate::model::{OrderId, OrderStatus, SessionId};
use thiserror::Error;

/// Errors that can occur within the tracking engine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackingError {
    /// A status change that regresses the stage order (or leaves a terminal
    /// stage) without going through the explicit cancel escape.
    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// An operation addressed a session id that is closed or never existed.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    /// Internal invariant violation: a second tick loop was started for a
    /// session that already has one.
    #[error("simulator already running for session {0}")]
    SimulatorAlreadyRunning(SessionId),

    /// The simulator could not be constructed from the engine configuration.
    /// The session stays usable in status-only mode.
    #[error("simulator misconfigured: {0}")]
    SimulatorMisconfigured(String),

    /// An order cannot be placed with an empty item list.
    #[error("order has no items: {0}")]
    EmptyOrder(OrderId),

    /// The coordinator's channel is closed (it has shut down).
    #[error("coordinator closed")]
    CoordinatorClosed,

    /// The coordinator dropped the response channel before answering.
    #[error("coordinator dropped response channel")]
    CoordinatorDropped,
}
