//! # Observability & Tracing
//!
//! Structured logging setup for the tracking engine.
//!
//! The engine logs with the `tracing` crate throughout: session lifecycle at
//! `info` (opened, subscribed, paused, delivered, closed), tick-level detail
//! and stale-tick discards at `debug`, and contract violations at `warn`/
//! `error`. Fields are structured (`session_id`, `order_id`, `status`,
//! `reason`) so production log pipelines can filter on them.
//!
//! ```bash
//! RUST_LOG=info cargo run      # lifecycle events
//! RUST_LOG=debug cargo run     # plus every tick and channel send
//! ```

/// Initializes the global subscriber. Call once, at startup.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // session_id/order_id fields carry the context
        .compact()
        .init();
}
