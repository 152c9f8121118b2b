/// Flow rate, Froude number, regime and uniformity classification.
///
/// All functions here are pure and total: any finite input produces a
/// defined output, and a dry channel always classifies as Subcritical /
/// Non-uniform rather than faulting.

use crate::hydraulics::geometry::geometry;
use crate::model::{ChannelProfile, FlowRegime, FlowUniformity, GeometryState, GRAVITY};

/// Below this Froude number the flow is Subcritical.
pub const SUBCRITICAL_BELOW: f64 = 0.95;
/// Above this Froude number the flow is Supercritical.
pub const SUPERCRITICAL_ABOVE: f64 = 1.05;

/// Relative tolerance between measured and Manning normal velocity.
pub const UNIFORM_TOLERANCE: f64 = 0.10;
/// Keeps the relative difference finite when the normal velocity is ~0.
const NORMAL_VELOCITY_EPSILON: f64 = 0.001;

/// Discharge `Q = A·v`.
pub fn flow_rate(area: f64, velocity: f64) -> f64 {
    area * velocity
}

/// `Fr = v / √(g·h)`; zero for a dry channel.
pub fn froude(velocity: f64, depth: f64) -> f64 {
    if depth <= 0.0 {
        return 0.0;
    }
    velocity / (GRAVITY * depth).sqrt()
}

/// Classifies a Froude number into a regime.
///
///   Fr < 0.95          →  Subcritical
///   Fr > 1.05          →  Supercritical
///   0.95 ≤ Fr ≤ 1.05   →  Critical
pub fn regime(fr: f64) -> FlowRegime {
    if fr < SUBCRITICAL_BELOW {
        FlowRegime::Subcritical
    } else if fr > SUPERCRITICAL_ABOVE {
        FlowRegime::Supercritical
    } else {
        FlowRegime::Critical
    }
}

/// Manning normal velocity `v_n = (1/n)·R^(2/3)·i^(1/2)`.
pub fn normal_velocity(profile: &ChannelProfile, hydraulic_radius: f64) -> f64 {
    if hydraulic_radius <= 0.0 {
        return 0.0;
    }
    (1.0 / profile.roughness) * hydraulic_radius.powf(2.0 / 3.0) * profile.bed_slope.sqrt()
}

/// Uniform when the measured velocity is within 10% of the normal velocity.
pub fn uniformity(profile: &ChannelProfile, hydraulic_radius: f64, velocity: f64) -> FlowUniformity {
    if hydraulic_radius <= 0.0 {
        return FlowUniformity::NonUniform;
    }
    let v_n = normal_velocity(profile, hydraulic_radius);
    if (velocity - v_n).abs() / (v_n + NORMAL_VELOCITY_EPSILON) < UNIFORM_TOLERANCE {
        FlowUniformity::Uniform
    } else {
        FlowUniformity::NonUniform
    }
}

/// Full hydraulic state for one depth/velocity pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydraulicState {
    pub geometry: GeometryState,
    pub velocity: f64,
    pub flow_rate: f64,
    pub froude: f64,
    pub regime: FlowRegime,
    pub uniformity: FlowUniformity,
}

/// Runs geometry and every classifier for a single reading.
pub fn classify(profile: &ChannelProfile, depth: f64, velocity: f64) -> HydraulicState {
    let g = geometry(profile, depth);
    let fr = froude(velocity, depth);
    HydraulicState {
        geometry: g,
        velocity,
        flow_rate: flow_rate(g.area, velocity),
        froude: fr,
        regime: regime(fr),
        uniformity: uniformity(profile, g.hydraulic_radius, velocity),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_froude_at_gentle_flow_is_subcritical() {
        let fr = froude(1.5, 2.0);
        assert!((fr - 0.339).abs() < 1e-3, "Fr should be ~0.339, got {}", fr);
        assert_eq!(regime(fr), FlowRegime::Subcritical);
    }

    #[test]
    fn test_froude_at_fast_shallow_flow_is_supercritical() {
        let fr = froude(5.0, 1.0);
        assert!((fr - 1.596).abs() < 1e-3, "Fr should be ~1.596, got {}", fr);
        assert_eq!(regime(fr), FlowRegime::Supercritical);
    }

    #[test]
    fn test_froude_is_zero_for_dry_channel() {
        for v in [0.0, 1.0, 25.0, -3.0] {
            assert_eq!(froude(v, 0.0), 0.0, "Fr(v={}, h=0) should be 0", v);
            assert_eq!(froude(v, -1.0), 0.0, "Fr(v={}, h<0) should be 0", v);
        }
    }

    #[test]
    fn test_hysteresis_band_boundaries() {
        assert_eq!(regime(0.949), FlowRegime::Subcritical);
        assert_eq!(regime(0.95), FlowRegime::Critical);
        assert_eq!(regime(1.0), FlowRegime::Critical);
        assert_eq!(regime(1.05), FlowRegime::Critical);
        assert_eq!(regime(1.051), FlowRegime::Supercritical);
    }

    #[test]
    fn test_regime_is_monotonic_in_froude() {
        // Walking Fr downward must never move the label toward Supercritical.
        let mut previous = regime(3.0);
        let mut fr = 3.0;
        while fr >= 0.0 {
            let current = regime(fr);
            assert!(
                current <= previous,
                "regime moved from {:?} to {:?} while Fr decreased to {}",
                previous,
                current,
                fr
            );
            previous = current;
            fr -= 0.001;
        }
    }

    #[test]
    fn test_uniform_when_velocity_matches_manning() {
        let profile = ChannelProfile::default();
        let state = classify(&profile, 2.0, 0.0);
        let v_n = normal_velocity(&profile, state.geometry.hydraulic_radius);
        assert!(v_n > 0.0);
        assert_eq!(
            uniformity(&profile, state.geometry.hydraulic_radius, v_n * 1.05),
            FlowUniformity::Uniform
        );
        assert_eq!(
            uniformity(&profile, state.geometry.hydraulic_radius, v_n * 1.5),
            FlowUniformity::NonUniform
        );
    }

    #[test]
    fn test_dry_channel_is_non_uniform() {
        let profile = ChannelProfile::default();
        assert_eq!(uniformity(&profile, 0.0, 1.0), FlowUniformity::NonUniform);
        let state = classify(&profile, 0.0, 2.0);
        assert_eq!(state.flow_rate, 0.0);
        assert_eq!(state.froude, 0.0);
        assert_eq!(state.regime, FlowRegime::Subcritical);
        assert_eq!(state.uniformity, FlowUniformity::NonUniform);
    }

    #[test]
    fn test_classify_combines_geometry_and_kinematics() {
        let state = classify(&ChannelProfile::default(), 2.0, 1.5);
        assert!((state.flow_rate - 15.0).abs() < 1e-9);
        assert_eq!(state.regime, FlowRegime::Subcritical);
        assert_eq!(state, classify(&ChannelProfile::default(), 2.0, 1.5));
    }
}
