//! # Session Coordination
//!
//! The coordinator is the engine's only stateful component: it owns every
//! open tracking session (one per order id, each with at most one telemetry
//! simulator) and fans identical snapshots out to however many views are
//! mounted. The presentation surfaces (tracking card, full map, drone
//! panel) all subscribe to the same session and therefore can never
//! diverge.
//!
//! The module follows the server/client split: [`TrackingCoordinator`] is
//! the sequential message loop that owns the state, [`TrackingClient`] is
//! the cloneable handle callers use, and [`message::SessionRequest`] is the
//! wire between them.

pub mod actor;
pub mod client;
pub mod message;
pub(crate) mod session;

pub use actor::TrackingCoordinator;
pub use client::TrackingClient;
pub use message::{Response, SessionRequest};
