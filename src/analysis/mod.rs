/// Historical analytics over persisted samples.
///
/// This module turns windows of `monitor_logs` rows into the summaries the
/// history view displays. Anything heavier (regression, seasonal patterns)
/// is left to offline tooling reading the exported CSV.
///
/// Submodules:
/// - `trends` — per-window aggregates (peak depth, mean velocity, regime counts).

pub mod trends;

pub use trends::{aggregate, Aggregate, TrendSummary};
