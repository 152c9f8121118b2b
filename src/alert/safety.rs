//! Decision-support safety score for the simulator panel.
//!
//! Starts at 100 and applies independent, additive deductions:
//!
//! | condition                             | effect                      |
//! |---------------------------------------|-----------------------------|
//! | h ≤ 0.1 m                             | score forced to 0           |
//! | Fr > 1.2                              | −40, reduce v to 0.8·v      |
//! | Fr < 1.0 and v > 3.0 m/s              | −20                         |
//! | 0.5 ≤ Fr ≤ 1.2, neither of the above  | −10                         |
//! | h > 4.0 m                             | −50                         |
//!
//! The final score is clamped to [0, 100].

use serde::Serialize;

pub const DRY_DEPTH_M: f64 = 0.1;
pub const OVERTOPPING_DEPTH_M: f64 = 4.0;
pub const FAST_FROUDE: f64 = 1.2;
pub const NEAR_CRITICAL_LOW: f64 = 0.5;
pub const HIGH_SUBCRITICAL_VELOCITY: f64 = 3.0;
/// Advised velocity as a fraction of the current one when Fr > 1.2.
pub const VELOCITY_REDUCTION: f64 = 0.8;

/// Tri-level presentation state of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SafetyLevel {
    /// Score above 80.
    Nominal,
    /// Score 51–80.
    Caution,
    /// Score 50 or below.
    Danger,
}

impl SafetyLevel {
    pub fn from_score(score: u8) -> Self {
        if score > 80 {
            SafetyLevel::Nominal
        } else if score > 50 {
            SafetyLevel::Caution
        } else {
            SafetyLevel::Danger
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyAssessment {
    pub score: u8,
    pub level: SafetyLevel,
    /// Velocity the operator should aim for, when a reduction is advised.
    pub advised_velocity: Option<f64>,
    pub advisories: Vec<String>,
}

/// Scores the current depth, velocity and Froude number.
pub fn assess(depth: f64, velocity: f64, fr: f64) -> SafetyAssessment {
    let mut score: i32 = 100;
    let mut advisories = Vec::new();
    let mut advised_velocity = None;

    let dry = depth <= DRY_DEPTH_M;
    if dry {
        advisories.push("channel nearly dry; check upstream inflow".to_string());
    }

    let fast = fr > FAST_FROUDE;
    let fast_subcritical = fr < 1.0 && velocity > HIGH_SUBCRITICAL_VELOCITY;

    if fast {
        score -= 40;
        let target = velocity * VELOCITY_REDUCTION;
        advised_velocity = Some(target);
        advisories.push(format!(
            "supercritical flow (Fr = {:.2}); reduce velocity to {:.2} m/s",
            fr, target
        ));
    }

    if fast_subcritical {
        score -= 20;
        advisories.push(format!(
            "high velocity ({:.2} m/s) in subcritical flow; check banks for erosion",
            velocity
        ));
    }

    if !fast && !fast_subcritical && (NEAR_CRITICAL_LOW..=FAST_FROUDE).contains(&fr) {
        score -= 10;
        advisories.push(format!("flow near critical (Fr = {:.2}); surface may be unstable", fr));
    }

    if depth > OVERTOPPING_DEPTH_M {
        score -= 50;
        advisories.push(format!("water level {:.2} m is close to overtopping", depth));
    }

    if dry {
        score = 0;
    }

    let score = score.clamp(0, 100) as u8;
    SafetyAssessment {
        score,
        level: SafetyLevel::from_score(score),
        advised_velocity,
        advisories,
    }
}
