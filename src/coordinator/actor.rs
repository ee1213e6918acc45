//! # Tracking Session Coordinator
//!
//! The single source of truth for every open tracking session.
//!
//! # Architecture Note
//! This struct is the "server" half of the coordinator. It owns all session
//! state and the receiver end of the request channel, and processes messages
//! *sequentially* in a loop. That gives us the concurrency model the engine
//! needs without a single lock:
//!
//! - A tick is a non-preemptible unit of work (simulate → revise ETA if due →
//!   publish) because nothing else can run between those steps.
//! - Status changes and telemetry land in the same published
//!   [`SessionSnapshot`], so every mounted view observes transitions
//!   atomically in the same update cycle.
//! - Sessions are isolated map entries; one session's tick can never read or
//!   mutate another's state.
//!
//! The coordinator is also the only writer of order status. Ticker tasks
//! just send cadence beats; the simulator just reports motion; the decision
//! to advance to `delivered` when progress first reaches 1.0 is made here.

use crate::config::EngineConfig;
use crate::coordinator::client::TrackingClient;
use crate::coordinator::message::SessionRequest;
use crate::coordinator::session::{Session, SessionState};
use crate::error::TrackingError;
use crate::eta::estimate;
use crate::model::{
    timeline, OrderId, OrderRecord, OrderStatus, SessionId, SessionSnapshot, ViewId,
};
use crate::simulator::TelemetrySimulator;
use std::collections::HashMap;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// The coordinator actor. Create with [`TrackingCoordinator::new`], then
/// spawn [`TrackingCoordinator::run`] and talk to it through the returned
/// [`TrackingClient`].
pub struct TrackingCoordinator {
    receiver: mpsc::Receiver<SessionRequest>,
    /// Handed to ticker tasks so their beats join the same queue as client
    /// requests.
    ticker_sender: mpsc::Sender<SessionRequest>,
    sessions: HashMap<SessionId, Session>,
    by_order: HashMap<OrderId, SessionId>,
    /// Orders from closed sessions. Never deleted, only appended to.
    history: Vec<OrderRecord>,
    next_id: u64,
    config: EngineConfig,
}

impl TrackingCoordinator {
    /// Creates the coordinator and its client handle.
    pub fn new(config: EngineConfig) -> (Self, TrackingClient) {
        let (sender, receiver) = mpsc::channel(config.channel_capacity);
        let coordinator = Self {
            receiver,
            ticker_sender: sender.clone(),
            sessions: HashMap::new(),
            by_order: HashMap::new(),
            history: Vec::new(),
            next_id: 1,
            config,
        };
        (coordinator, TrackingClient::new(sender))
    }

    /// Runs the coordinator loop until shutdown.
    pub async fn run(mut self) {
        info!("Tracking coordinator started");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                SessionRequest::Open { order, respond_to } => {
                    let _ = respond_to.send(Ok(self.open(order)));
                }
                SessionRequest::Subscribe {
                    session_id,
                    view_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.subscribe(session_id, view_id));
                }
                SessionRequest::Unsubscribe {
                    session_id,
                    view_id,
                    respond_to,
                } => {
                    self.unsubscribe(session_id, view_id);
                    let _ = respond_to.send(Ok(()));
                }
                SessionRequest::Advance {
                    session_id,
                    to,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.advance(session_id, to));
                }
                SessionRequest::Cancel {
                    session_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.cancel(session_id));
                }
                SessionRequest::Close {
                    session_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.close(session_id));
                }
                SessionRequest::Snapshot {
                    session_id,
                    respond_to,
                } => {
                    let result = self
                        .sessions
                        .get(&session_id)
                        .map(Session::snapshot)
                        .ok_or(TrackingError::UnknownSession(session_id));
                    let _ = respond_to.send(result);
                }
                SessionRequest::Timeline {
                    session_id,
                    granularity,
                    respond_to,
                } => {
                    let result = self
                        .sessions
                        .get(&session_id)
                        .map(|s| timeline(&s.order, granularity, Instant::now(), &self.config))
                        .ok_or(TrackingError::UnknownSession(session_id));
                    let _ = respond_to.send(result);
                }
                SessionRequest::Tick { session_id, epoch } => {
                    self.tick(session_id, epoch);
                }
                SessionRequest::Shutdown { respond_to } => {
                    for (_, mut session) in self.sessions.drain() {
                        session.stop_ticker();
                        self.history.push(session.order.clone());
                    }
                    self.by_order.clear();
                    let _ = respond_to.send(Ok(()));
                    break;
                }
            }
        }
        info!(orders = self.history.len(), "Tracking coordinator shutdown");
    }

    /// Opens a session, or returns the existing one for an already-open
    /// order id. Exactly one simulator per open session, no matter how often
    /// this is called.
    fn open(&mut self, order: OrderRecord) -> SessionId {
        if let Some(existing) = self.by_order.get(order.id()) {
            debug!(session_id = %existing, order_id = %order.id(), "Session already open");
            return *existing;
        }

        let session_id = SessionId(self.next_id);
        self.next_id += 1;
        let now = Instant::now();

        let mut record = order;
        let eta = estimate(&record, None, now, None, &self.config);
        record.set_estimated_delivery(eta.eta);

        let mut session = Session::new(session_id, record, Some(eta));
        if session.order.status().in_transit() {
            Self::start_transit(&mut session, &self.config, self.ticker_sender.clone(), now);
        }
        info!(
            session_id = %session_id,
            order_id = %session.order.id(),
            status = %session.order.status(),
            size = self.sessions.len() + 1,
            "Session opened"
        );
        self.by_order.insert(session.order.id().clone(), session_id);
        self.sessions.insert(session_id, session);
        session_id
    }

    fn subscribe(
        &mut self,
        session_id: SessionId,
        view_id: ViewId,
    ) -> Result<(SessionSnapshot, watch::Receiver<SessionSnapshot>), TrackingError> {
        let interval = self.config.tick_interval;
        let sender = self.ticker_sender.clone();
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(TrackingError::UnknownSession(session_id))?;

        session.subscribers.insert(view_id.clone());
        if session.state == SessionState::Paused {
            // Resume from the retained snapshot, never reset.
            if session.order.status().in_transit() && session.simulator.is_some() {
                session.state = SessionState::Active;
                session.start_ticker(sender, interval)?;
            } else {
                session.state = SessionState::Idle;
            }
            debug!(session_id = %session_id, view_id = %view_id, "Session resumed");
        }
        info!(
            session_id = %session_id,
            view_id = %view_id,
            subscribers = session.subscribers.len(),
            "View subscribed"
        );
        Ok((session.snapshot(), session.watch()))
    }

    /// Unsubscribes a view. Unknown sessions are a no-op: a view tearing
    /// down after its session closed is not an error.
    fn unsubscribe(&mut self, session_id: SessionId, view_id: ViewId) {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            debug!(session_id = %session_id, view_id = %view_id, "Late unsubscribe ignored");
            return;
        };
        if !session.subscribers.remove(&view_id) {
            return;
        }
        info!(
            session_id = %session_id,
            view_id = %view_id,
            subscribers = session.subscribers.len(),
            "View unsubscribed"
        );
        if session.subscribers.is_empty() {
            // Last view gone: release the timer within one tick interval,
            // retain the snapshot and simulator for a possible resubscribe.
            session.stop_ticker();
            session.state = SessionState::Paused;
            debug!(session_id = %session_id, "Session paused");
        }
    }

    /// Applies an external forward transition and publishes it atomically.
    fn advance(
        &mut self,
        session_id: SessionId,
        to: OrderStatus,
    ) -> Result<SessionSnapshot, TrackingError> {
        let now = Instant::now();
        let config = self.config.clone();
        let sender = self.ticker_sender.clone();
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(TrackingError::UnknownSession(session_id))?;

        if let Err(e) = session.order.advance(to, now) {
            warn!(session_id = %session_id, error = %e, "Status transition rejected");
            return Err(e);
        }
        info!(session_id = %session_id, status = %to, "Status advanced");

        if to.in_transit() && session.simulator.is_none() {
            Self::start_transit(session, &config, sender, now);
        } else if to.is_terminal() {
            session.stop_ticker();
            session.simulator = None;
        }

        // ETA recomputes on every status change, monotone across the session.
        let revised = estimate(
            &session.order,
            session.last_telemetry.as_ref(),
            now,
            session.eta.as_ref(),
            &config,
        );
        session.order.set_estimated_delivery(revised.eta);
        session.eta = Some(revised);
        session.publish();
        Ok(session.snapshot())
    }

    /// The cancel escape: legal from any non-terminal stage, after which no
    /// simulator runs for this order and the snapshot is frozen.
    fn cancel(&mut self, session_id: SessionId) -> Result<SessionSnapshot, TrackingError> {
        let now = Instant::now();
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(TrackingError::UnknownSession(session_id))?;

        if let Err(e) = session.order.cancel(now) {
            warn!(session_id = %session_id, error = %e, "Cancel rejected");
            return Err(e);
        }
        session.stop_ticker();
        session.simulator = None;
        session.state = SessionState::Idle;
        session.publish();
        info!(session_id = %session_id, order_id = %session.order.id(), "Order cancelled");
        Ok(session.snapshot())
    }

    fn close(&mut self, session_id: SessionId) -> Result<(), TrackingError> {
        let mut session = self
            .sessions
            .remove(&session_id)
            .ok_or(TrackingError::UnknownSession(session_id))?;
        session.stop_ticker();
        self.by_order.remove(session.order.id());
        info!(
            session_id = %session_id,
            order_id = %session.order.id(),
            size = self.sessions.len(),
            "Session closed"
        );
        self.history.push(session.order.clone());
        Ok(())
    }

    /// One cadence beat: the non-preemptible simulate → revise → publish
    /// unit. Beats from dead tickers (stale epoch, paused or closed session)
    /// are discarded without touching state.
    fn tick(&mut self, session_id: SessionId, epoch: u64) {
        let config = self.config.clone();
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return;
        };
        if !session.accepts_tick(epoch) {
            debug!(session_id = %session_id, epoch, "Stale tick discarded");
            return;
        }
        let Some(simulator) = session.simulator.as_mut() else {
            return;
        };

        let now = Instant::now();
        let telemetry = simulator.tick(now);
        let route_done = telemetry.progress_fraction() >= 1.0;
        session.tick_seq += 1;
        session.ticks_since_revision += 1;
        session.last_telemetry = Some(telemetry);

        // Debounced ETA revision: not every tick, to avoid jitter spam.
        if session.ticks_since_revision >= config.eta_revision_ticks || route_done {
            session.ticks_since_revision = 0;
            let revised = estimate(
                &session.order,
                session.last_telemetry.as_ref(),
                now,
                session.eta.as_ref(),
                &config,
            );
            if let Some(reason) = revised.delay_reason {
                let newly_delayed = session
                    .eta
                    .as_ref()
                    .is_none_or(|e| e.delay_reason != revised.delay_reason);
                if newly_delayed {
                    info!(session_id = %session_id, reason = reason.code(), "ETA revised");
                }
            }
            session.order.set_estimated_delivery(revised.eta);
            session.eta = Some(revised);
        }

        if route_done {
            // Lifecycle decision belongs here, not in the simulator. The
            // delivered status and the final telemetry go out in the same
            // update.
            if let Err(e) = session.order.advance(OrderStatus::Delivered, now) {
                warn!(session_id = %session_id, error = %e, "Auto-delivery rejected");
            } else {
                info!(session_id = %session_id, order_id = %session.order.id(), "Order delivered");
            }
            session.stop_ticker();
            session.simulator = None;
        }
        session.publish();
    }

    /// Builds the simulator for a session entering transit and starts its
    /// tick loop unless the session is paused (a paused session gets its
    /// ticker back on resubscribe). A misconfigured simulator degrades the
    /// session to status-only tracking instead of failing it.
    fn start_transit(
        session: &mut Session,
        config: &EngineConfig,
        sender: mpsc::Sender<SessionRequest>,
        now: Instant,
    ) {
        match TelemetrySimulator::new(&session.order, config, now) {
            Ok(simulator) => {
                session.simulator = Some(simulator);
                if session.state != SessionState::Paused {
                    session.state = SessionState::Active;
                    if let Err(e) = session.start_ticker(sender, config.tick_interval) {
                        warn!(session_id = %session.id, error = %e, "Ticker not started");
                    }
                }
            }
            Err(e) => {
                warn!(
                    session_id = %session.id,
                    error = %e,
                    "Telemetry unavailable, falling back to status-only tracking"
                );
                session.simulator = None;
            }
        }
    }
}
