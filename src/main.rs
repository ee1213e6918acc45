//! Demo: one drone order tracked end to end.
//!
//! Drives the engine the way the app's screens would: place an order, open
//! its tracking session, mount two views (the compact card and the drone
//! panel), walk the order through the kitchen stages, then let the
//! simulator carry it to delivery. Run with `RUST_LOG=info` to watch the
//! lifecycle, or `RUST_LOG=debug` for every tick.

use delivery_tracking::config::EngineConfig;
use delivery_tracking::model::{DeliveryMethod, Granularity, OrderDraft, OrderId, OrderStatus, ViewId};
use delivery_tracking::runtime::{setup_tracing, TrackingSystem};
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    // Short timings so the demo finishes in under a minute.
    let config = EngineConfig {
        tick_interval: Duration::from_secs(2),
        nominal_route_duration: Duration::from_secs(30),
        ..EngineConfig::default()
    };
    let system = TrackingSystem::new(config);

    let mut draft = OrderDraft::new(DeliveryMethod::Drone);
    draft.push_item("Pad Thai", 11.5, 2);
    draft.push_item("Mango Sticky Rice", 6.0, 1);
    let order = draft.place(OrderId::from("order-1001"), Instant::now())?;
    info!(order_id = %order.id(), total = order.total(), "Order placed");

    let session = system.client.open_session(order).await?;
    let (snapshot, mut updates) = system
        .client
        .subscribe(session, ViewId::from("tracking-card"))
        .await?;
    let (_, _panel_updates) = system
        .client
        .subscribe(session, ViewId::from("drone-panel"))
        .await?;
    info!(status = %snapshot.status, "Tracking opened");

    // The kitchen works through its stages.
    for status in [
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
    ] {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let snapshot = system.client.advance_status(session, status).await?;
        let eta = snapshot
            .eta
            .as_ref()
            .map(|e| e.remaining_minutes(Instant::now()))
            .unwrap_or(0);
        info!(status = %snapshot.status, eta_minutes = eta, "Progress");
    }

    // Watch the drone fly until the coordinator marks the order delivered.
    loop {
        updates.changed().await?;
        let snapshot = updates.borrow().clone();
        if let Some(telemetry) = &snapshot.telemetry {
            info!(
                progress = format!("{:.0}%", telemetry.progress_fraction() * 100.0),
                battery = telemetry
                    .battery_percent()
                    .map(|b| format!("{b:.1}%"))
                    .unwrap_or_default(),
                "Drone telemetry"
            );
        }
        if snapshot.status == OrderStatus::Delivered {
            info!("Order delivered");
            break;
        }
    }

    for entry in system.client.timeline(session, Granularity::Fine).await? {
        info!(
            stage = entry.stage.code(),
            completed = entry.completed,
            estimated = entry.estimated,
            "Timeline"
        );
    }

    system.client.close_session(session).await?;
    system.shutdown().await?;
    Ok(())
}
