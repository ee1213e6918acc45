//! # Tracking Client
//!
//! The type-safe handle for talking to the coordinator. It forwards requests
//! over the coordinator's mpsc channel and returns results via oneshot
//! channels. The client is cheap to clone and can be shared across tasks;
//! every clone talks to the same coordinator, so views holding different
//! clones still observe the same session state.

use crate::coordinator::message::{Response, SessionRequest};
use crate::error::TrackingError;
use crate::model::{
    Granularity, OrderRecord, OrderStatus, SessionId, SessionSnapshot, TimelineEntry, ViewId,
};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument};

/// A cloneable handle to the [`crate::coordinator::TrackingCoordinator`].
#[derive(Clone)]
pub struct TrackingClient {
    sender: mpsc::Sender<SessionRequest>,
}

impl TrackingClient {
    pub(crate) fn new(sender: mpsc::Sender<SessionRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Response<T>) -> SessionRequest,
    ) -> Result<T, TrackingError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| TrackingError::CoordinatorClosed)?;
        response
            .await
            .map_err(|_| TrackingError::CoordinatorDropped)?
    }

    /// Opens the tracking session for `order`, or returns the already-open
    /// session for the same order id.
    #[instrument(skip(self, order), fields(order_id = %order.id()))]
    pub async fn open_session(&self, order: OrderRecord) -> Result<SessionId, TrackingError> {
        debug!("Sending open_session");
        self.request(|respond_to| SessionRequest::Open { order, respond_to })
            .await
    }

    /// Mounts a view on a session. Returns the current snapshot and the
    /// watch channel all future snapshots arrive on. Views must render from
    /// the snapshot only; nothing they hold is mutable session state.
    #[instrument(skip(self))]
    pub async fn subscribe(
        &self,
        session_id: SessionId,
        view_id: ViewId,
    ) -> Result<(SessionSnapshot, watch::Receiver<SessionSnapshot>), TrackingError> {
        debug!("Sending subscribe");
        self.request(|respond_to| SessionRequest::Subscribe {
            session_id,
            view_id,
            respond_to,
        })
        .await
    }

    /// Unmounts a view. Unknown or already-closed sessions are a no-op.
    #[instrument(skip(self))]
    pub async fn unsubscribe(
        &self,
        session_id: SessionId,
        view_id: ViewId,
    ) -> Result<(), TrackingError> {
        debug!("Sending unsubscribe");
        self.request(|respond_to| SessionRequest::Unsubscribe {
            session_id,
            view_id,
            respond_to,
        })
        .await
    }

    /// Applies an external forward status transition through the
    /// coordinator, the only writer of order status.
    #[instrument(skip(self))]
    pub async fn advance_status(
        &self,
        session_id: SessionId,
        to: OrderStatus,
    ) -> Result<SessionSnapshot, TrackingError> {
        debug!("Sending advance_status");
        self.request(|respond_to| SessionRequest::Advance {
            session_id,
            to,
            respond_to,
        })
        .await
    }

    /// Cancels the order if its status is not terminal.
    #[instrument(skip(self))]
    pub async fn cancel(&self, session_id: SessionId) -> Result<SessionSnapshot, TrackingError> {
        debug!("Sending cancel");
        self.request(|respond_to| SessionRequest::Cancel {
            session_id,
            respond_to,
        })
        .await
    }

    /// Closes a session, discarding its snapshot and archiving its order.
    #[instrument(skip(self))]
    pub async fn close_session(&self, session_id: SessionId) -> Result<(), TrackingError> {
        debug!("Sending close_session");
        self.request(|respond_to| SessionRequest::Close {
            session_id,
            respond_to,
        })
        .await
    }

    /// Reads the current snapshot without mounting a view.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, session_id: SessionId) -> Result<SessionSnapshot, TrackingError> {
        self.request(|respond_to| SessionRequest::Snapshot {
            session_id,
            respond_to,
        })
        .await
    }

    /// Projects the session's order onto the requested timeline
    /// granularity. Both granularities project the same canonical stage
    /// order, so they can never disagree on completion.
    #[instrument(skip(self))]
    pub async fn timeline(
        &self,
        session_id: SessionId,
        granularity: Granularity,
    ) -> Result<Vec<TimelineEntry>, TrackingError> {
        self.request(|respond_to| SessionRequest::Timeline {
            session_id,
            granularity,
            respond_to,
        })
        .await
    }

    /// Stops every session and ends the coordinator loop.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), TrackingError> {
        debug!("Sending shutdown");
        self.request(|respond_to| SessionRequest::Shutdown { respond_to })
            .await
    }
}
