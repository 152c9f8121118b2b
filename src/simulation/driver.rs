//! Synthetic reading generator.
//!
//! Each step reads the shared setpoint, adds a sinusoidal wave and uniform
//! sensor noise, and runs the result through the hydraulic classifiers,
//! the alert rules and the safety scorer. The wave is a pure function of the
//! tick index, so the waveform's shape is reproducible while the absolute
//! values carry noise.
//!
//! # Clock and noise injection
//! `step_at` takes `now` explicitly and the driver is generic over its
//! `Rng`, so tests can pin both the timestamp and the noise sequence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::alert::{assess, evaluate_alerts, SafetyAssessment};
use crate::config::SimulationConfig;
use crate::hydraulics::classify;
use crate::logging::{self, Component};
use crate::model::{AlertEvent, AlertSeverity, ChannelProfile, Sample};
use crate::setpoint::SetpointStore;
use crate::vision::VisionFeed;

/// Velocity gets this fraction of the depth wave.
pub const VELOCITY_WAVE_SCALE: f64 = 0.5;
/// No sediment is carried below this velocity, in m/s.
pub const SEDIMENT_MIN_VELOCITY: f64 = 0.1;

/// Everything one tick produces.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    pub tick: u64,
    pub sample: Sample,
    pub alerts: Vec<AlertEvent>,
    pub safety: SafetyAssessment,
}

/// `max(0, v^1.5 · k + noise)` above 0.1 m/s, otherwise 0.
pub fn estimate_sediment(velocity: f64, coefficient: f64, noise: f64) -> f64 {
    if velocity > SEDIMENT_MIN_VELOCITY {
        (velocity.powf(1.5) * coefficient + noise).max(0.0)
    } else {
        0.0
    }
}

pub struct SimulationDriver<R = StdRng> {
    profile: ChannelProfile,
    params: SimulationConfig,
    setpoints: Arc<SetpointStore>,
    vision: Option<Arc<VisionFeed>>,
    rng: R,
    tick: u64,
}

impl SimulationDriver<StdRng> {
    /// Driver with OS-seeded noise.
    pub fn new(profile: ChannelProfile, params: SimulationConfig, setpoints: Arc<SetpointStore>) -> Self {
        Self::with_rng(profile, params, setpoints, StdRng::from_entropy())
    }
}

impl<R: Rng> SimulationDriver<R> {
    pub fn with_rng(
        profile: ChannelProfile,
        params: SimulationConfig,
        setpoints: Arc<SetpointStore>,
        rng: R,
    ) -> Self {
        Self {
            profile,
            params,
            setpoints,
            vision: None,
            rng,
            tick: 0,
        }
    }

    /// Folds the camera collaborator's float count and alert text into each tick.
    pub fn with_vision(mut self, feed: Arc<VisionFeed>) -> Self {
        self.vision = Some(feed);
        self
    }

    /// Index the next step will use.
    pub fn next_tick(&self) -> u64 {
        self.tick
    }

    pub fn params(&self) -> &SimulationConfig {
        &self.params
    }

    /// Depth wave at `tick`: `sin(tick·ω)·A`.
    pub fn wave(&self, tick: u64) -> f64 {
        (tick as f64 * self.params.wave_omega).sin() * self.params.wave_amplitude
    }

    fn noise(&mut self) -> f64 {
        let j = self.params.jitter;
        if j > 0.0 {
            self.rng.gen_range(-j..=j)
        } else {
            0.0
        }
    }

    pub fn step(&mut self) -> TickOutput {
        self.step_at(Utc::now())
    }

    pub fn step_at(&mut self, now: DateTime<Utc>) -> TickOutput {
        let tick = self.tick;
        self.tick += 1;

        let setpoint = self.setpoints.snapshot();

        let (depth, velocity, sediment) = if setpoint.simulation_mode {
            let wave = self.wave(tick);
            let depth = (setpoint.depth + wave + self.noise()).max(0.0);
            let velocity = (setpoint.velocity + wave * VELOCITY_WAVE_SCALE + self.noise()).max(0.0);
            let noise = self.noise();
            let sediment = estimate_sediment(velocity, self.params.sediment_coefficient, noise);
            (depth, velocity, sediment)
        } else {
            // Live readings are already real; use them as-is.
            (setpoint.depth.max(0.0), setpoint.velocity.max(0.0), setpoint.sediment.max(0.0))
        };

        let state = classify(&self.profile, depth, velocity);

        let (float_count, vision_alert) = match &self.vision {
            Some(feed) => feed.take(),
            None => (0, None),
        };

        let sample = Sample {
            timestamp: now,
            depth,
            velocity,
            flow_rate: state.flow_rate,
            froude: state.froude,
            regime: state.regime,
            uniformity: state.uniformity,
            sediment,
            float_count,
        };

        let mut alerts = evaluate_alerts(depth, state.regime, now);
        if let Some(text) = vision_alert {
            logging::debug(Component::Vision, Some(format!("tick {}", tick).as_str()), &text);
            alerts.push(AlertEvent::new(now, AlertSeverity::Yellow, text));
        }

        TickOutput {
            tick,
            sample,
            alerts,
            safety: assess(depth, velocity, state.froude),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::SafetyLevel;
    use crate::model::FlowRegime;
    use crate::setpoint::Setpoint;
    use crate::vision::VisionObservation;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn driver_for(setpoint: Setpoint, params: SimulationConfig) -> SimulationDriver<StdRng> {
        SimulationDriver::with_rng(
            ChannelProfile::default(),
            params,
            Arc::new(SetpointStore::new(setpoint)),
            StdRng::seed_from_u64(7),
        )
    }

    fn noiseless() -> SimulationConfig {
        SimulationConfig { jitter: 0.0, ..SimulationConfig::default() }
    }

    #[test]
    fn test_readings_stay_within_wave_plus_jitter_bounds() {
        let params = SimulationConfig::default();
        let depth_bound = params.wave_amplitude + params.jitter + 1e-12;
        let velocity_bound = params.wave_amplitude * VELOCITY_WAVE_SCALE + params.jitter + 1e-12;
        let mut driver = driver_for(Setpoint::default(), params);

        for _ in 0..500 {
            let out = driver.step_at(fixed_now());
            assert!(
                (out.sample.depth - 2.0).abs() <= depth_bound,
                "tick {} depth {} outside 2.0 ± {}",
                out.tick,
                out.sample.depth,
                depth_bound
            );
            assert!(
                (out.sample.velocity - 1.5).abs() <= velocity_bound,
                "tick {} velocity {} outside 1.5 ± {}",
                out.tick,
                out.sample.velocity,
                velocity_bound
            );
        }
    }

    #[test]
    fn test_noiseless_signal_follows_the_wave_exactly() {
        let mut driver = driver_for(Setpoint::default(), noiseless());
        for _ in 0..50 {
            let tick = driver.next_tick();
            let expected_wave = driver.wave(tick);
            let out = driver.step_at(fixed_now());
            assert!((out.sample.depth - (2.0 + expected_wave)).abs() < 1e-12);
            assert!((out.sample.velocity - (1.5 + 0.5 * expected_wave)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_same_tick_index_gives_same_wave_phase() {
        let a = driver_for(Setpoint::default(), SimulationConfig::default());
        let b = driver_for(Setpoint::default(), SimulationConfig::default());
        for tick in [0, 1, 17, 63, 1000] {
            assert_eq!(a.wave(tick), b.wave(tick));
        }
        assert_eq!(a.wave(0), 0.0);
    }

    #[test]
    fn test_tick_index_advances_by_one_per_step() {
        let mut driver = driver_for(Setpoint::default(), SimulationConfig::default());
        let ticks: Vec<_> = (0..4).map(|_| driver.step_at(fixed_now()).tick).collect();
        assert_eq!(ticks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_dry_setpoint_clamps_to_zero_and_still_classifies() {
        let dry = Setpoint { depth: 0.0, velocity: 0.0, ..Setpoint::default() };
        let mut driver = driver_for(dry, SimulationConfig::default());
        for _ in 0..100 {
            let out = driver.step_at(fixed_now());
            assert!(out.sample.depth >= 0.0);
            assert!(out.sample.velocity >= 0.0);
            assert!(out.sample.froude.is_finite());
            assert_eq!(out.sample.sediment, 0.0, "no sediment below 0.1 m/s");
            assert_eq!(out.safety.score, 0, "near-dry channel should score 0");
        }
    }

    #[test]
    fn test_sediment_grows_with_velocity() {
        assert_eq!(estimate_sediment(0.05, 0.6, 0.0), 0.0);
        let slow = estimate_sediment(1.0, 0.6, 0.0);
        let fast = estimate_sediment(4.0, 0.6, 0.0);
        assert!((slow - 0.6).abs() < 1e-12);
        assert!((fast - 4.8).abs() < 1e-12);
        assert_eq!(estimate_sediment(0.2, 0.6, -1.0), 0.0, "noise cannot push sediment negative");
    }

    #[test]
    fn test_deep_setpoint_raises_red_every_tick() {
        let deep = Setpoint { depth: 4.0, ..Setpoint::default() };
        let mut driver = driver_for(deep, SimulationConfig::default());
        for _ in 0..20 {
            let out = driver.step_at(fixed_now());
            assert!(out.alerts.iter().any(|a| a.severity == AlertSeverity::Red));
        }
    }

    #[test]
    fn test_fast_shallow_setpoint_raises_supercritical_warning() {
        let fast = Setpoint { depth: 1.0, velocity: 5.0, ..Setpoint::default() };
        let mut driver = driver_for(fast, noiseless());
        let out = driver.step_at(fixed_now());
        assert_eq!(out.sample.regime, FlowRegime::Supercritical);
        assert_eq!(out.alerts.len(), 1);
        assert_eq!(out.alerts[0].severity, AlertSeverity::Yellow);
        assert_eq!(out.safety.level, SafetyLevel::Caution);
    }

    #[test]
    fn test_live_mode_uses_setpoint_unperturbed() {
        let live = Setpoint { depth: 1.234, velocity: 0.876, sediment: 0.42, simulation_mode: false };
        let mut driver = driver_for(live, SimulationConfig::default());
        for _ in 0..10 {
            let out = driver.step_at(fixed_now());
            assert_eq!(out.sample.depth, 1.234);
            assert_eq!(out.sample.velocity, 0.876);
            assert_eq!(out.sample.sediment, 0.42);
        }
    }

    #[test]
    fn test_setpoint_changes_apply_on_next_tick() {
        let setpoints = Arc::new(SetpointStore::default());
        let mut driver = SimulationDriver::with_rng(
            ChannelProfile::default(),
            noiseless(),
            Arc::clone(&setpoints),
            StdRng::seed_from_u64(1),
        );
        driver.step_at(fixed_now());
        setpoints.set_manual_depth(3.0);
        let out = driver.step_at(fixed_now());
        assert!((out.sample.depth - 3.0).abs() <= driver.params().wave_amplitude);
    }

    #[test]
    fn test_vision_feed_is_folded_into_the_tick() {
        let feed = Arc::new(VisionFeed::new());
        let mut driver = driver_for(Setpoint::default(), SimulationConfig::default())
            .with_vision(Arc::clone(&feed));

        feed.publish(VisionObservation {
            float_count: 2,
            alert_text: Some("floating debris detected".to_string()),
        });

        let first = driver.step_at(fixed_now());
        assert_eq!(first.sample.float_count, 2);
        assert_eq!(first.alerts.len(), 1);
        assert_eq!(first.alerts[0].message, "floating debris detected");

        let second = driver.step_at(fixed_now());
        assert_eq!(second.sample.float_count, 2);
        assert!(second.alerts.is_empty(), "vision alert text is delivered once");
    }

    #[test]
    fn test_switching_to_live_mode_at_runtime() {
        let setpoints = Arc::new(SetpointStore::default());
        let mut driver = SimulationDriver::with_rng(
            ChannelProfile::default(),
            SimulationConfig::default(),
            Arc::clone(&setpoints),
            StdRng::seed_from_u64(11),
        );

        // A few simulated ticks first, so the wave phase is non-zero.
        for _ in 0..5 {
            driver.step_at(fixed_now());
        }

        setpoints.set_simulation_mode(false);
        setpoints.set_sediment(0.33);
        setpoints.apply_live_reading(2.71, 1.62);

        let out = driver.step_at(fixed_now());
        assert_eq!(out.tick, 5);
        assert_eq!(out.sample.depth, 2.71, "live depth should be used unperturbed");
        assert_eq!(out.sample.velocity, 1.62, "live velocity should be used unperturbed");
        assert_eq!(out.sample.sediment, 0.33, "live ticks use the baseline sediment");

        setpoints.set_simulation_mode(true);
        let out = driver.step_at(fixed_now());
        assert_ne!(out.sample.depth, 2.71, "simulated ticks are perturbed again");
    }
}
