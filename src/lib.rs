//! Open-channel flow monitoring service.
//!
//! Turns depth/velocity readings (live, or synthesised by the simulation
//! driver) into trapezoidal-channel hydraulics, flags abnormal flow, and
//! records the resulting time series for trend analysis.
//!
//! Data flow per tick:
//!   `SetpointStore` → `SimulationDriver` → {`hydraulics`, `alert`} → `Sample`
//!   → `TimeSeriesStore` → `analysis`

pub mod alert;
pub mod analysis;
pub mod config;
pub mod hydraulics;
pub mod logging;
pub mod model;
pub mod setpoint;
pub mod simulation;
pub mod store;
pub mod vision;
