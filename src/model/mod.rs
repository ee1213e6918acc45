//! # Domain Model
//!
//! Pure data structures for orders, the status timeline projection, and the
//! telemetry snapshots the coordinator fans out. Nothing in this module does
//! I/O or owns a task; all lifecycle decisions live in the coordinator.

pub mod order;
pub mod telemetry;
pub mod timeline;

pub use order::{
    DeliveryMethod, OrderDraft, OrderId, OrderItem, OrderRecord, OrderStatus, SessionId, ViewId,
};
pub use telemetry::{SessionSnapshot, TelemetrySnapshot};
pub use timeline::{timeline, Granularity, TimelineEntry, TimelineStage};
