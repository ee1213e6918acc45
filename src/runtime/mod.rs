//! # Runtime Lifecycle
//!
//! Orchestration for starting and stopping the engine.
//!
//! Individual components are simple; wiring them is where mistakes live.
//! [`TrackingSystem`] is the conductor: it creates the coordinator and its
//! client, spawns the coordinator loop, and on shutdown tells the
//! coordinator to stop every session (which aborts all ticker tasks) before
//! awaiting the loop. Shutdown is an explicit message rather than
//! channel-closure detection because the coordinator holds a sender clone
//! for its own ticker tasks, so its channel never closes on its own.

pub mod tracing;

use crate::config::EngineConfig;
use crate::coordinator::{TrackingClient, TrackingCoordinator};
use crate::error::TrackingError;
use tokio::task::JoinHandle;
use ::tracing::info;

pub use self::tracing::setup_tracing;

/// The running engine: the coordinator task plus the client handle that
/// talks to it.
pub struct TrackingSystem {
    pub client: TrackingClient,
    handle: JoinHandle<()>,
}

impl TrackingSystem {
    /// Starts the coordinator with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        let (coordinator, client) = TrackingCoordinator::new(config);
        let handle = tokio::spawn(coordinator.run());
        info!("Tracking system started");
        Self { client, handle }
    }

    /// Stops every session and waits for the coordinator loop to finish.
    pub async fn shutdown(self) -> Result<(), TrackingError> {
        self.client.shutdown().await?;
        let _ = self.handle.await;
        info!("Tracking system stopped");
        Ok(())
    }
}
