//! # Engine Configuration
//!
//! All timing and motion constants live here so that behavior is explicit
//! configuration, not emergent from call timing. Tests run the engine under
//! tokio's paused clock and rely on these constants being injectable.

use std::time::Duration;

/// Configuration for the tracking engine.
///
/// One `EngineConfig` is handed to the coordinator at startup and shared by
/// every session it opens. The per-stage durations index the canonical stage
/// order (see [`crate::model::TimelineStage`]); gap `i` is the nominal time
/// between canonical stage `i` and stage `i + 1`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Wall-clock cadence of the telemetry tick loop (default: 2s).
    pub tick_interval: Duration,

    /// Nominal time for a transit leg to go from progress 0.0 to 1.0
    /// (default: 10 minutes). The simulator's progress ramp is deterministic
    /// against this duration; perturbation is noise around it.
    pub nominal_route_duration: Duration,

    /// ETA revisions are considered every N telemetry ticks, not every tick,
    /// to avoid jitter spam (default: 5).
    pub eta_revision_ticks: u32,

    /// Progress shortfall (expected minus actual) that triggers an upward
    /// ETA revision with a delay reason (default: 0.1).
    pub eta_revision_slack: f64,

    /// Nominal gaps between consecutive canonical stages, placed → delivered.
    /// Seven gaps for eight stages.
    pub stage_gaps: [Duration; 7],

    /// Bound on the per-tick progress perturbation (default: 0.01).
    pub progress_jitter: f64,

    /// Base battery drain per tick, in percent (default: 0.4).
    pub battery_drain_per_tick: f64,

    /// Battery level the simulator will not decay below (default: 5.0).
    pub battery_floor: f64,

    /// Drone cruise altitude in meters (default: 80.0).
    pub cruise_altitude_m: f64,

    /// Wind speed above which a drone ETA revision reports a weather delay,
    /// in km/h (default: 28.0).
    pub wind_delay_threshold_kph: f64,

    /// Seed for the simulator's RNG. Sessions derive their own stream from
    /// this seed and the order id, so runs are reproducible (default: 0).
    pub seed: u64,

    /// Capacity of the coordinator's request channel (default: 64).
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(2),
            nominal_route_duration: Duration::from_secs(10 * 60),
            eta_revision_ticks: 5,
            eta_revision_slack: 0.1,
            stage_gaps: [
                Duration::from_secs(60),      // placed -> accepted
                Duration::from_secs(60),      // accepted -> preparing
                Duration::from_secs(8 * 60),  // preparing -> ready-for-pickup
                Duration::from_secs(2 * 60),  // ready-for-pickup -> picked-up
                Duration::from_secs(60),      // picked-up -> out-for-delivery
                Duration::from_secs(8 * 60),  // out-for-delivery -> nearby
                Duration::from_secs(2 * 60),  // nearby -> delivered
            ],
            progress_jitter: 0.01,
            battery_drain_per_tick: 0.4,
            battery_floor: 5.0,
            cruise_altitude_m: 80.0,
            wind_delay_threshold_kph: 28.0,
            seed: 0,
            channel_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Nominal time from canonical stage `from` to stage `to`.
    pub fn gap_sum(&self, from: usize, to: usize) -> Duration {
        self.stage_gaps[from.min(7)..to.min(7)].iter().sum()
    }
}
