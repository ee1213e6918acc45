//! # Session State
//!
//! One open tracking context for a single order id, owning at most one
//! telemetry simulator and the watch channel its subscribers render from.
//! All mutation happens inside the coordinator's loop; this module only
//! defines the state and its small invariant-preserving helpers.

use crate::config::EngineConfig;
use crate::coordinator::message::SessionRequest;
use crate::error::TrackingError;
use crate::eta::EtaEstimate;
use crate::model::{OrderRecord, SessionId, SessionSnapshot, TelemetrySnapshot, ViewId};
use crate::simulator::TelemetrySimulator;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// Lifecycle of a session.
///
/// `Closed` has no variant here: closing removes the session from the
/// coordinator's map entirely, which discards the retained snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    /// Open, not in transit: no tick loop to run yet.
    Idle,
    /// In transit with a live ticker (or about to have one).
    Active,
    /// Zero subscribers: ticker stopped, snapshot and simulator retained so
    /// a resubscribe resumes instead of resetting.
    Paused,
}

pub(crate) struct Session {
    pub(crate) id: SessionId,
    pub(crate) order: OrderRecord,
    pub(crate) state: SessionState,
    pub(crate) simulator: Option<TelemetrySimulator>,
    pub(crate) eta: Option<EtaEstimate>,
    pub(crate) last_telemetry: Option<TelemetrySnapshot>,
    pub(crate) subscribers: HashSet<ViewId>,
    pub(crate) tick_seq: u64,
    pub(crate) ticks_since_revision: u32,
    publisher: watch::Sender<SessionSnapshot>,
    ticker: Option<JoinHandle<()>>,
    /// Bumped every time the ticker stops. `Tick` messages from an older
    /// epoch are in flight from a dead ticker and are discarded unprocessed.
    epoch: u64,
}

impl Session {
    pub(crate) fn new(id: SessionId, order: OrderRecord, eta: Option<EtaEstimate>) -> Self {
        let state = if order.status().in_transit() {
            SessionState::Active
        } else {
            SessionState::Idle
        };
        let initial = SessionSnapshot {
            order_id: order.id().clone(),
            status: order.status(),
            eta: eta.clone(),
            telemetry: None,
            tick_seq: 0,
        };
        let (publisher, _) = watch::channel(initial);
        Self {
            id,
            order,
            state,
            simulator: None,
            eta,
            last_telemetry: None,
            subscribers: HashSet::new(),
            tick_seq: 0,
            ticks_since_revision: 0,
            publisher,
            ticker: None,
            epoch: 0,
        }
    }

    /// The current point-in-time bundle handed to subscribers.
    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            order_id: self.order.id().clone(),
            status: self.order.status(),
            eta: self.eta.clone(),
            telemetry: self.last_telemetry.clone(),
            tick_seq: self.tick_seq,
        }
    }

    /// Publishes the current snapshot to every subscriber in one update.
    pub(crate) fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }

    pub(crate) fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.publisher.subscribe()
    }

    /// True iff a tick carrying `epoch` comes from the live ticker.
    pub(crate) fn accepts_tick(&self, epoch: u64) -> bool {
        self.ticker.is_some() && self.epoch == epoch && self.state == SessionState::Active
    }

    /// Spawns the cadence task for this session. The task owns no state; it
    /// only sends `Tick` messages back into the coordinator's queue.
    pub(crate) fn start_ticker(
        &mut self,
        sender: mpsc::Sender<SessionRequest>,
        interval: Duration,
    ) -> Result<(), TrackingError> {
        if self.ticker.is_some() {
            // Internal invariant: one tick loop per session, ever.
            error!(session_id = %self.id, "second ticker requested for live session");
            debug_assert!(false, "second ticker requested for live session");
            return Err(TrackingError::SimulatorAlreadyRunning(self.id));
        }
        let session_id = self.id;
        let epoch = self.epoch;
        debug!(session_id = %session_id, epoch, "ticker started");
        self.ticker = Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately; the
            // cadence starts after it.
            timer.tick().await;
            loop {
                timer.tick().await;
                if sender
                    .send(SessionRequest::Tick { session_id, epoch })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }));
        Ok(())
    }

    /// Stops the ticker, if any, and invalidates in-flight ticks.
    pub(crate) fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            self.epoch += 1;
            debug!(session_id = %self.id, epoch = self.epoch, "ticker stopped");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
