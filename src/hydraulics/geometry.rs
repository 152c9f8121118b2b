/// Trapezoidal cross-section geometry.
///
/// For bottom width `b` and side slope `m` (horizontal:vertical):
///   top width        B = b + 2·m·h
///   area             A = (b + m·h)·h
///   wetted perimeter P = b + 2·h·√(1 + m²)
///   hydraulic radius R = A / P

use crate::model::{ChannelProfile, GeometryState};

/// Computes the cross-section at `depth`.
///
/// A dry or negative depth yields the degenerate section `A = 0`, `B = b`,
/// `P = 0`, `R = 0`. Never divides by zero.
pub fn geometry(profile: &ChannelProfile, depth: f64) -> GeometryState {
    let b = profile.bottom_width;
    let m = profile.side_slope;

    if depth <= 0.0 {
        return GeometryState {
            depth: 0.0,
            top_width: b,
            area: 0.0,
            wetted_perimeter: 0.0,
            hydraulic_radius: 0.0,
        };
    }

    let top_width = b + 2.0 * m * depth;
    let area = (b + m * depth) * depth;
    let wetted_perimeter = b + 2.0 * depth * (1.0 + m * m).sqrt();
    let hydraulic_radius = if wetted_perimeter > 0.0 {
        area / wetted_perimeter
    } else {
        0.0
    };

    GeometryState {
        depth,
        top_width,
        area,
        wetted_perimeter,
        hydraulic_radius,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
