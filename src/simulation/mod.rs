/// Synthetic reading generation and its periodic scheduler.
///
/// Submodules:
/// - `driver` — one tick: setpoint + wave + noise → sample, alerts, safety.
/// - `ticker` — runs a driver on a worker thread with start/stop/cancel.

pub mod driver;
pub mod ticker;

pub use driver::{estimate_sediment, SimulationDriver, TickOutput};
pub use ticker::{Ticker, TickerOptions, TickerReport};
