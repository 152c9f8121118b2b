/// Shared depth/velocity setpoint.
///
/// One `SetpointStore` is created at startup and handed (as an `Arc`) to both
/// the simulator's manual controls and the simulation driver. It is a single
/// cell, not a log: every write replaces the current value. Readers always
/// get a whole `Setpoint` copied out under one lock, never a torn pair.

use std::sync::{PoisonError, RwLock};

/// Upper end of the simulator's manual depth control, in metres.
pub const MANUAL_DEPTH_MAX_M: f64 = 5.0;
/// Upper end of the simulator's manual velocity control, in m/s.
pub const MANUAL_VELOCITY_MAX_MS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setpoint {
    pub depth: f64,
    pub velocity: f64,
    /// Baseline sediment concentration, used as-is for live readings.
    pub sediment: f64,
    /// When false the setpoint is a live sensor reading and is not perturbed.
    pub simulation_mode: bool,
}

impl Default for Setpoint {
    fn default() -> Self {
        Self {
            depth: 2.0,
            velocity: 1.5,
            sediment: 0.5,
            simulation_mode: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct SetpointStore {
    current: RwLock<Setpoint>,
}

impl SetpointStore {
    pub fn new(initial: Setpoint) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Atomic copy of the current setpoint.
    pub fn snapshot(&self) -> Setpoint {
        // Setpoint is plain data, so a poisoned lock still holds a usable value.
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut Setpoint)) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut guard);
    }

    pub fn replace(&self, setpoint: Setpoint) {
        self.update(|current| *current = setpoint);
    }

    /// Manual depth control, clamped to [0, 5] m.
    pub fn set_manual_depth(&self, depth: f64) {
        let depth = clamp_finite(depth, MANUAL_DEPTH_MAX_M);
        self.update(|current| current.depth = depth);
    }

    /// Manual velocity control, clamped to [0, 10] m/s.
    pub fn set_manual_velocity(&self, velocity: f64) {
        let velocity = clamp_finite(velocity, MANUAL_VELOCITY_MAX_MS);
        self.update(|current| current.velocity = velocity);
    }

    pub fn set_sediment(&self, sediment: f64) {
        let sediment = clamp_finite(sediment, f64::MAX);
        self.update(|current| current.sediment = sediment);
    }

    pub fn set_simulation_mode(&self, enabled: bool) {
        self.update(|current| current.simulation_mode = enabled);
    }

    /// Writes a live sensor reading. Both values land in the same write, and
    /// negatives are clamped to zero.
    pub fn apply_live_reading(&self, depth: f64, velocity: f64) {
        let depth = clamp_finite(depth, f64::MAX);
        let velocity = clamp_finite(velocity, f64::MAX);
        self.update(|current| {
            current.depth = depth;
            current.velocity = velocity;
        });
    }
}

/// NaN maps to 0.
fn clamp_finite(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}
