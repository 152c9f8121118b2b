/// Closed-form steady-state hydraulics for the monitored channel.
///
/// Submodules:
/// - `geometry` — depth → trapezoidal cross-section.
/// - `classify` — flow rate, Froude number, regime and uniformity labels.

pub mod classify;
pub mod geometry;

pub use classify::{classify, flow_rate, froude, normal_velocity, regime, uniformity, HydraulicState};
pub use geometry::geometry;
