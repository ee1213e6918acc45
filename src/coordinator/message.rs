//! # Coordinator Messages
//!
//! The request types sent from [`crate::coordinator::TrackingClient`] (and
//! from per-session ticker tasks) to the coordinator's sequential loop.
//! Every externally-visible operation carries a oneshot `respond_to`; `Tick`
//! is internal and fire-and-forget.

use crate::error::TrackingError;
use crate::model::{
    Granularity, OrderRecord, OrderStatus, SessionId, SessionSnapshot, TimelineEntry, ViewId,
};
use tokio::sync::{oneshot, watch};

/// Type alias for the one-shot response channel used by the coordinator.
pub type Response<T> = oneshot::Sender<Result<T, TrackingError>>;

/// Requests the coordinator processes, one at a time, to completion.
///
/// # Ordering
/// Because the coordinator drains these sequentially, a `Tick` is a
/// non-preemptible unit of work: simulate, revise the ETA if due, publish.
/// A `Cancel` or `Advance` queued behind a `Tick` is applied only after that
/// tick's snapshot is fully published, so no subscriber ever sees a
/// status/telemetry pair from two different update cycles.
#[derive(Debug)]
pub enum SessionRequest {
    /// Opens (or re-joins) the tracking session for an order. Idempotent per
    /// order id while the session is open.
    Open {
        order: OrderRecord,
        respond_to: Response<SessionId>,
    },
    /// Mounts a view: returns the current snapshot plus the watch channel
    /// the view re-renders from.
    Subscribe {
        session_id: SessionId,
        view_id: ViewId,
        respond_to: Response<(SessionSnapshot, watch::Receiver<SessionSnapshot>)>,
    },
    /// Unmounts a view. A no-op for unknown sessions so view teardown can
    /// race session close.
    Unsubscribe {
        session_id: SessionId,
        view_id: ViewId,
        respond_to: Response<()>,
    },
    /// Externally-triggered forward status transition (kitchen progress,
    /// handoff to courier).
    Advance {
        session_id: SessionId,
        to: OrderStatus,
        respond_to: Response<SessionSnapshot>,
    },
    /// The explicit cancel escape.
    Cancel {
        session_id: SessionId,
        respond_to: Response<SessionSnapshot>,
    },
    /// Discards the session and appends its order to the history.
    Close {
        session_id: SessionId,
        respond_to: Response<()>,
    },
    /// Reads the current snapshot without subscribing.
    Snapshot {
        session_id: SessionId,
        respond_to: Response<SessionSnapshot>,
    },
    /// Projects the session's order onto a timeline granularity.
    Timeline {
        session_id: SessionId,
        granularity: Granularity,
        respond_to: Response<Vec<TimelineEntry>>,
    },
    /// Stops every session and ends the coordinator loop.
    Shutdown { respond_to: Response<()> },
    /// Internal: one cadence beat from a session's ticker task. Carries the
    /// ticker epoch so beats from an already-stopped ticker are discarded
    /// instead of mutating state.
    Tick { session_id: SessionId, epoch: u64 },
}
