//! # Telemetry Simulation
//!
//! Drives plausible motion telemetry for one transit leg.
//!
//! # Architecture Note
//! Progress is a deterministic ramp against the configured nominal route
//! duration; the per-tick randomness is bounded noise *around* that ramp,
//! clamped monotone, so a session always reaches 1.0 within the nominal
//! duration instead of random-walking indefinitely. The RNG is seeded from
//! the engine seed and the order id, so a session's telemetry is
//! reproducible run-to-run.
//!
//! The simulator never touches order status. It reports motion; the
//! coordinator decides lifecycle transitions (advancing to `delivered` when
//! progress first reaches 1.0) and owns the tick loop that calls
//! [`TelemetrySimulator::tick`].

use crate::config::EngineConfig;
use crate::error::TrackingError;
use crate::model::{DeliveryMethod, OrderRecord, TelemetrySnapshot};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::Instant;

// Canned courier identities, stand-ins for a real dispatch service.
const DRIVER_NAMES: [&str; 4] = ["Marco R.", "Aylin K.", "Dana P.", "Yusuf T."];
const VEHICLE_TYPES: [&str; 3] = ["scooter", "bicycle", "car"];

/// Produces the variant-specific telemetry fields for one tick.
///
/// Implementations own the continuous state of their asset (battery level,
/// altitude, traffic) and evolve it with bounded, clamped steps.
pub trait MotionModel: Send {
    fn advance(&mut self, progress: f64, eta_minutes: u64, rng: &mut SmallRng)
        -> TelemetrySnapshot;
}

/// Road courier: identity fields are fixed for the session, traffic is a
/// clamped random walk.
struct VehicleMotion {
    driver_name: String,
    phone: String,
    rating: f64,
    vehicle_type: String,
    traffic_level: f64,
}

impl MotionModel for VehicleMotion {
    fn advance(
        &mut self,
        progress: f64,
        eta_minutes: u64,
        rng: &mut SmallRng,
    ) -> TelemetrySnapshot {
        self.traffic_level = (self.traffic_level + rng.random_range(-0.08..0.08)).clamp(0.0, 1.0);
        TelemetrySnapshot::Vehicle {
            progress_fraction: progress,
            driver_name: self.driver_name.clone(),
            phone: self.phone.clone(),
            rating: self.rating,
            vehicle_type: self.vehicle_type.clone(),
            eta_minutes,
            traffic_level: self.traffic_level,
        }
    }
}

/// Drone: battery decays strictly monotonically, flight fields are clamped
/// walks around their cruise values, and the craft descends over the final
/// tenth of the route.
struct DroneMotion {
    altitude_m: f64,
    speed_mps: f64,
    battery_percent: f64,
    signal_percent: f64,
    heading_degrees: f64,
    wind_kph: f64,
    temperature_c: f64,
    cruise_altitude_m: f64,
    drain_per_tick: f64,
    battery_floor: f64,
}

impl MotionModel for DroneMotion {
    fn advance(
        &mut self,
        progress: f64,
        eta_minutes: u64,
        rng: &mut SmallRng,
    ) -> TelemetrySnapshot {
        let drain = self.drain_per_tick * rng.random_range(0.8..1.2);
        self.battery_percent = (self.battery_percent - drain).max(self.battery_floor);

        let target_altitude = if progress > 0.9 {
            // Final approach: descend linearly to the ground.
            self.cruise_altitude_m * (1.0 - progress) / 0.1
        } else {
            self.cruise_altitude_m
        };
        self.altitude_m = (self.altitude_m + (target_altitude - self.altitude_m) * 0.5
            + rng.random_range(-2.0..2.0))
        .clamp(0.0, self.cruise_altitude_m + 20.0);

        self.speed_mps = (self.speed_mps + rng.random_range(-0.8..0.8)).clamp(6.0, 18.0);
        self.signal_percent = (self.signal_percent + rng.random_range(-3.0..3.0)).clamp(40.0, 100.0);
        self.heading_degrees = (self.heading_degrees + rng.random_range(-5.0..5.0)).rem_euclid(360.0);
        self.wind_kph = (self.wind_kph + rng.random_range(-2.5..2.5)).clamp(0.0, 45.0);
        self.temperature_c = (self.temperature_c + rng.random_range(-0.3..0.3)).clamp(8.0, 36.0);

        TelemetrySnapshot::Drone {
            progress_fraction: progress,
            altitude_m: self.altitude_m,
            speed_mps: self.speed_mps,
            battery_percent: self.battery_percent,
            signal_percent: self.signal_percent,
            heading_degrees: self.heading_degrees,
            wind_kph: self.wind_kph,
            temperature_c: self.temperature_c,
            eta_minutes,
        }
    }
}

/// One transit leg's telemetry source. Created when a session enters
/// transit; the variant is decided once from the order's delivery method and
/// is immutable for the session's lifetime.
pub struct TelemetrySimulator {
    model: Box<dyn MotionModel>,
    rng: SmallRng,
    started_at: Instant,
    nominal: Duration,
    progress_jitter: f64,
    last_progress: f64,
}

impl std::fmt::Debug for TelemetrySimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySimulator")
            .field("started_at", &self.started_at)
            .field("nominal", &self.nominal)
            .field("progress_jitter", &self.progress_jitter)
            .field("last_progress", &self.last_progress)
            .finish_non_exhaustive()
    }
}

impl TelemetrySimulator {
    pub fn new(
        order: &OrderRecord,
        config: &EngineConfig,
        started_at: Instant,
    ) -> Result<Self, TrackingError> {
        if config.nominal_route_duration.is_zero() {
            return Err(TrackingError::SimulatorMisconfigured(
                "nominal route duration is zero".into(),
            ));
        }
        if config.tick_interval.is_zero() {
            return Err(TrackingError::SimulatorMisconfigured(
                "tick interval is zero".into(),
            ));
        }

        let mut rng = SmallRng::seed_from_u64(session_seed(config.seed, &order.id().0));
        let model: Box<dyn MotionModel> = match order.delivery_method() {
            DeliveryMethod::Standard => Box::new(VehicleMotion {
                driver_name: DRIVER_NAMES[rng.random_range(0..DRIVER_NAMES.len())].to_string(),
                phone: format!("+1-555-01{:02}", rng.random_range(0..100u32)),
                rating: (rng.random_range(40..50u32) as f64) / 10.0,
                vehicle_type: VEHICLE_TYPES[rng.random_range(0..VEHICLE_TYPES.len())].to_string(),
                traffic_level: rng.random_range(0.1..0.5),
            }),
            DeliveryMethod::Drone => Box::new(DroneMotion {
                altitude_m: config.cruise_altitude_m,
                speed_mps: 12.0,
                battery_percent: 100.0,
                signal_percent: 95.0,
                heading_degrees: rng.random_range(0.0..360.0),
                wind_kph: rng.random_range(5.0..20.0),
                temperature_c: rng.random_range(14.0..26.0),
                cruise_altitude_m: config.cruise_altitude_m,
                drain_per_tick: config.battery_drain_per_tick,
                battery_floor: config.battery_floor,
            }),
        };

        Ok(Self {
            model,
            rng,
            started_at,
            nominal: config.nominal_route_duration,
            progress_jitter: config.progress_jitter,
            last_progress: 0.0,
        })
    }

    /// Advances the asset by one tick and returns the snapshot.
    ///
    /// Progress never decreases and is forced to exactly 1.0 once the
    /// nominal duration has elapsed, regardless of noise.
    pub fn tick(&mut self, now: Instant) -> TelemetrySnapshot {
        let elapsed = now.saturating_duration_since(self.started_at);
        let ramp = elapsed.as_secs_f64() / self.nominal.as_secs_f64();
        let progress = if ramp >= 1.0 {
            1.0
        } else {
            let noise = self.rng.random_range(-self.progress_jitter..=self.progress_jitter);
            (ramp + noise).clamp(self.last_progress, 1.0)
        };
        self.last_progress = progress;

        let remaining = Duration::from_secs_f64((1.0 - progress) * self.nominal.as_secs_f64());
        let eta_minutes = remaining.as_secs().div_ceil(60);
        self.model.advance(progress, eta_minutes, &mut self.rng)
    }

    pub fn progress(&self) -> f64 {
        self.last_progress
    }
}

/// Folds the order id into the engine seed so every session gets its own
/// reproducible RNG stream.
fn session_seed(seed: u64, order_id: &str) -> u64 {
    order_id
        .bytes()
        .fold(seed ^ 0xcbf2_9ce4_8422_2325, |acc, b| {
            (acc ^ b as u64).wrapping_mul(0x1000_0000_01b3)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderDraft, OrderId, OrderStatus};

    fn order(method: DeliveryMethod, id: &str, now: Instant) -> OrderRecord {
        let mut draft = OrderDraft::new(method);
        draft.push_item("Bento", 14.0, 1);
        let mut record = draft.place(OrderId::from(id), now).unwrap();
        record.advance(OrderStatus::OutForDelivery, now).unwrap();
        record
    }

    #[tokio::test]
    async fn progress_is_monotone_and_battery_decays() {
        let config = EngineConfig::default();
        let now = Instant::now();
        let record = order(DeliveryMethod::Drone, "d1", now);
        let mut sim = TelemetrySimulator::new(&record, &config, now).unwrap();

        let mut last_progress = 0.0;
        let mut last_battery = 100.0;
        for i in 1..=50u32 {
            let at = now + config.tick_interval * i;
            let snapshot = sim.tick(at);
            let progress = snapshot.progress_fraction();
            let battery = snapshot.battery_percent().unwrap();
            assert!(progress >= last_progress);
            assert!((0.0..=1.0).contains(&progress));
            assert!(battery <= last_battery);
            assert!(battery >= config.battery_floor);
            last_progress = progress;
            last_battery = battery;
        }
    }

    #[tokio::test]
    async fn route_completes_within_nominal_duration() {
        let config = EngineConfig::default();
        let now = Instant::now();
        let record = order(DeliveryMethod::Standard, "v1", now);
        let mut sim = TelemetrySimulator::new(&record, &config, now).unwrap();

        let snapshot = sim.tick(now + config.nominal_route_duration);
        assert_eq!(snapshot.progress_fraction(), 1.0);
        assert_eq!(snapshot.eta_minutes(), 0);
    }

    #[tokio::test]
    async fn same_seed_reproduces_the_same_run() {
        let config = EngineConfig::default();
        let now = Instant::now();
        let record = order(DeliveryMethod::Drone, "d2", now);
        let mut a = TelemetrySimulator::new(&record, &config, now).unwrap();
        let mut b = TelemetrySimulator::new(&record, &config, now).unwrap();

        for i in 1..=10u32 {
            let at = now + config.tick_interval * i;
            assert_eq!(a.tick(at), b.tick(at));
        }
    }

    #[tokio::test]
    async fn variant_follows_delivery_method() {
        let config = EngineConfig::default();
        let now = Instant::now();
        let drone = order(DeliveryMethod::Drone, "d3", now);
        let vehicle = order(DeliveryMethod::Standard, "v3", now);

        let mut drone_sim = TelemetrySimulator::new(&drone, &config, now).unwrap();
        let mut vehicle_sim = TelemetrySimulator::new(&vehicle, &config, now).unwrap();
        assert!(matches!(
            drone_sim.tick(now + config.tick_interval),
            TelemetrySnapshot::Drone { .. }
        ));
        assert!(matches!(
            vehicle_sim.tick(now + config.tick_interval),
            TelemetrySnapshot::Vehicle { .. }
        ));
    }

    #[tokio::test]
    async fn zero_route_duration_is_rejected() {
        let config = EngineConfig {
            nominal_route_duration: Duration::ZERO,
            ..EngineConfig::default()
        };
        let now = Instant::now();
        let record = order(DeliveryMethod::Drone, "d4", now);
        let err = TelemetrySimulator::new(&record, &config, now).unwrap_err();
        assert!(matches!(err, TrackingError::SimulatorMisconfigured(_)));
    }
}
