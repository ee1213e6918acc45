//! # Delivery Tracking Engine
//!
//! An order lifecycle and live tracking simulation engine for a food
//! delivery client: status progression, ETA estimation, and a simulated
//! moving-asset telemetry feed (courier or drone) that stays consistent
//! across every mounted view.
//!
//! ## Architecture Overview
//!
//! The engine separates concerns into four layers:
//!
//! 1. **[`model`]**: pure data. [`model::OrderRecord`] and its status
//!    machine, the [`model::timeline`] projection (one canonical stage
//!    order, two display granularities), and the snapshot types.
//! 2. **[`eta`]**: a pure estimator. Base ETA on transit entry, debounced
//!    increase-only revisions with stable delay-reason codes.
//! 3. **[`simulator`]**: bounded, seeded motion simulation. A
//!    deterministic progress ramp with clamped noise, never a lifecycle
//!    decision.
//! 4. **[`coordinator`]**: the single source of truth. One sequential
//!    message loop owns every session, runs at most one simulator per
//!    session, and fans bit-identical snapshots out to all subscribers over
//!    a watch channel.
//!
//! ## Concurrency Model
//!
//! - The coordinator processes one message at a time (no locks needed).
//! - Per-session ticker tasks own no state; they send cadence beats into
//!   the same queue as client requests, so a tick is a non-preemptible
//!   simulate → revise → publish unit.
//! - Sessions are isolated; tick cadence and ETA debounce are configuration
//!   constants, so tests drive the engine under tokio's paused clock.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use delivery_tracking::config::EngineConfig;
//! use delivery_tracking::model::{DeliveryMethod, OrderDraft, OrderId, ViewId};
//! use delivery_tracking::runtime::TrackingSystem;
//! use tokio::time::Instant;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let system = TrackingSystem::new(EngineConfig::default());
//!
//!     let mut draft = OrderDraft::new(DeliveryMethod::Drone);
//!     draft.push_item("Pad Thai", 11.5, 1);
//!     let order = draft.place(OrderId::from("order-42"), Instant::now())?;
//!
//!     let session = system.client.open_session(order).await?;
//!     let (snapshot, mut updates) = system
//!         .client
//!         .subscribe(session, ViewId::from("tracking-card"))
//!         .await?;
//!     println!("status: {}", snapshot.status);
//!
//!     updates.changed().await?;
//!     println!("update: {:?}", *updates.borrow());
//!
//!     system.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod eta;
pub mod model;
pub mod runtime;
pub mod simulator;

// Re-export core types for convenience
pub use config::EngineConfig;
pub use coordinator::{TrackingClient, TrackingCoordinator};
pub use error::TrackingError;
pub use eta::{DelayReason, EtaEstimate};
pub use model::{
    DeliveryMethod, Granularity, OrderDraft, OrderId, OrderRecord, OrderStatus, SessionId,
    SessionSnapshot, TelemetrySnapshot, ViewId,
};
pub use runtime::TrackingSystem;
pub use simulator::TelemetrySimulator;
