//! End-to-end coordinator behavior under a paused clock: session lifecycle,
//! ticker teardown, snapshot fan-out and the auto-delivery decision.
//!
//! The tick interval is 2s everywhere here, so sleeps use odd durations to
//! land between beats and keep tick counts exact.

use delivery_tracking::config::EngineConfig;
use delivery_tracking::error::TrackingError;
use delivery_tracking::model::{DeliveryMethod, OrderDraft, OrderId, OrderStatus, ViewId};
use delivery_tracking::runtime::TrackingSystem;
use std::time::Duration;
use tokio::time::{sleep, Instant};

fn placed_order(id: &str, method: DeliveryMethod) -> delivery_tracking::model::OrderRecord {
    let mut draft = OrderDraft::new(method);
    draft.push_item("Ramen", 12.0, 1);
    draft.place(OrderId::from(id), Instant::now()).unwrap()
}

fn short_route_config() -> EngineConfig {
    EngineConfig {
        tick_interval: Duration::from_secs(2),
        nominal_route_duration: Duration::from_secs(20),
        ..EngineConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn open_is_idempotent_and_runs_one_simulator() {
    let system = TrackingSystem::new(short_route_config());
    let order = placed_order("dup", DeliveryMethod::Drone);
    let session = system.client.open_session(order).await.unwrap();
    system
        .client
        .advance_status(session, OrderStatus::OutForDelivery)
        .await
        .unwrap();

    // A second open for the same order id joins the existing session.
    let again = system
        .client
        .open_session(placed_order("dup", DeliveryMethod::Drone))
        .await
        .unwrap();
    assert_eq!(session, again);

    // One ticker at a 2s cadence: exactly 4 beats in 9s. A duplicate
    // simulator would double that.
    sleep(Duration::from_secs(9)).await;
    let snapshot = system.client.snapshot(session).await.unwrap();
    assert_eq!(snapshot.tick_seq, 4);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn last_unsubscribe_stops_ticks_resubscribe_resumes() {
    let system = TrackingSystem::new(short_route_config());
    let session = system
        .client
        .open_session(placed_order("pause", DeliveryMethod::Standard))
        .await
        .unwrap();
    system
        .client
        .advance_status(session, OrderStatus::OutForDelivery)
        .await
        .unwrap();
    system
        .client
        .subscribe(session, ViewId::from("card"))
        .await
        .unwrap();

    sleep(Duration::from_secs(5)).await;
    system
        .client
        .unsubscribe(session, ViewId::from("card"))
        .await
        .unwrap();
    let paused = system.client.snapshot(session).await.unwrap();
    assert_eq!(paused.tick_seq, 2);

    // No subscribers, no timer. The snapshot must not move.
    sleep(Duration::from_secs(9)).await;
    let still = system.client.snapshot(session).await.unwrap();
    assert_eq!(still, paused);

    // Resubscribing hands back the retained snapshot, not a reset one, and
    // restarts the cadence from there.
    let (resumed, _updates) = system
        .client
        .subscribe(session, ViewId::from("card"))
        .await
        .unwrap();
    assert_eq!(resumed, paused);
    sleep(Duration::from_secs(5)).await;
    let moving = system.client.snapshot(session).await.unwrap();
    assert_eq!(moving.tick_seq, 4);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn subscribers_observe_identical_snapshots() {
    let system = TrackingSystem::new(short_route_config());
    let session = system
        .client
        .open_session(placed_order("fanout", DeliveryMethod::Drone))
        .await
        .unwrap();
    system
        .client
        .advance_status(session, OrderStatus::OutForDelivery)
        .await
        .unwrap();

    let (_, card_rx) = system
        .client
        .subscribe(session, ViewId::from("card"))
        .await
        .unwrap();
    let (_, panel_rx) = system
        .client
        .subscribe(session, ViewId::from("panel"))
        .await
        .unwrap();

    sleep(Duration::from_secs(5)).await;
    // Same update cycle, same value. No await between the two reads.
    let card = card_rx.borrow().clone();
    let panel = panel_rx.borrow().clone();
    assert_eq!(card, panel);
    assert!(card.telemetry.is_some());

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn drone_route_completes_and_auto_delivers_atomically() {
    let system = TrackingSystem::new(short_route_config());
    let session = system
        .client
        .open_session(placed_order("flight", DeliveryMethod::Drone))
        .await
        .unwrap();
    let (snapshot, mut updates) = system
        .client
        .subscribe(session, ViewId::from("panel"))
        .await
        .unwrap();
    assert!(snapshot.telemetry.is_none());

    system
        .client
        .advance_status(session, OrderStatus::Accepted)
        .await
        .unwrap();
    system
        .client
        .advance_status(session, OrderStatus::OutForDelivery)
        .await
        .unwrap();

    let mut last_progress = 0.0;
    let mut last_battery = 100.0;
    let mut last_eta = None;
    let delivered = loop {
        updates.changed().await.unwrap();
        let snapshot = updates.borrow_and_update().clone();
        if let Some(telemetry) = &snapshot.telemetry {
            assert!(telemetry.progress_fraction() >= last_progress);
            last_progress = telemetry.progress_fraction();
            if let Some(battery) = telemetry.battery_percent() {
                assert!(battery <= last_battery);
                last_battery = battery;
            }
        }
        if let Some(eta) = &snapshot.eta {
            if let Some(previous) = last_eta {
                assert!(eta.eta >= previous, "ETA went backwards");
            }
            assert!(eta.eta >= eta.original_eta);
            last_eta = Some(eta.eta);
        }
        if snapshot.status == OrderStatus::Delivered {
            break snapshot;
        }
    };

    // Delivered status and the final telemetry arrive in one update, never
    // split across two.
    let telemetry = delivered.telemetry.expect("final telemetry");
    assert_eq!(telemetry.progress_fraction(), 1.0);
    assert!(last_battery < 100.0);
    assert!(delivered.eta.expect("eta").arriving);

    // A 20s route on a 2s cadence lands in ten beats.
    assert_eq!(delivered.tick_seq, 10);

    // Terminal sessions run no simulator.
    sleep(Duration::from_secs(9)).await;
    let settled = system.client.snapshot(session).await.unwrap();
    assert_eq!(settled.tick_seq, delivered.tick_seq);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancel_freezes_the_session() {
    let system = TrackingSystem::new(short_route_config());
    let session = system
        .client
        .open_session(placed_order("cancel", DeliveryMethod::Standard))
        .await
        .unwrap();
    system
        .client
        .advance_status(session, OrderStatus::Preparing)
        .await
        .unwrap();
    let frozen = system.client.cancel(session).await.unwrap();
    assert_eq!(frozen.status, OrderStatus::Cancelled);
    assert!(frozen.telemetry.is_none());

    // Cancelled is terminal: no transition out, no simulator, ever.
    let err = system
        .client
        .advance_status(session, OrderStatus::OutForDelivery)
        .await
        .unwrap_err();
    assert!(matches!(err, TrackingError::InvalidTransition { .. }));

    let (snapshot, _updates) = system
        .client
        .subscribe(session, ViewId::from("card"))
        .await
        .unwrap();
    assert_eq!(snapshot.status, OrderStatus::Cancelled);
    sleep(Duration::from_secs(9)).await;
    let later = system.client.snapshot(session).await.unwrap();
    assert_eq!(later.tick_seq, 0);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn rejects_regressions_and_unknown_sessions() {
    let system = TrackingSystem::new(short_route_config());
    let session = system
        .client
        .open_session(placed_order("rules", DeliveryMethod::Standard))
        .await
        .unwrap();
    system
        .client
        .advance_status(session, OrderStatus::OutForDelivery)
        .await
        .unwrap();

    let err = system
        .client
        .advance_status(session, OrderStatus::Preparing)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TrackingError::InvalidTransition {
            from: OrderStatus::OutForDelivery,
            to: OrderStatus::Preparing,
        }
    ));

    let bogus = delivery_tracking::model::SessionId(999);
    let err = system
        .client
        .subscribe(bogus, ViewId::from("card"))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackingError::UnknownSession(_)));
    // Late unsubscribe after a session is gone is deliberately a no-op.
    system
        .client
        .unsubscribe(bogus, ViewId::from("card"))
        .await
        .unwrap();

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn close_then_reopen_starts_a_fresh_session() {
    let system = TrackingSystem::new(short_route_config());
    let session = system
        .client
        .open_session(placed_order("reopen", DeliveryMethod::Standard))
        .await
        .unwrap();
    system.client.close_session(session).await.unwrap();

    let err = system.client.snapshot(session).await.unwrap_err();
    assert!(matches!(err, TrackingError::UnknownSession(_)));

    let fresh = system
        .client
        .open_session(placed_order("reopen", DeliveryMethod::Standard))
        .await
        .unwrap();
    assert_ne!(session, fresh);

    system.shutdown().await.unwrap();
}
