//! Time-series persistence for samples and alerts.
//!
//! `TimeSeriesStore` is the storage boundary: append-only writes with a
//! store-assigned, strictly increasing id, plus the history queries the
//! analytics side needs. A failed write is returned to the caller and never
//! retried here.
//!
//! Implementations:
//! - `memory::InMemoryStore` — process-local, used for demos and tests.
//! - `pg::PgStore` — the `monitor_logs` / `alerts` tables.
//!
//! `export` dumps `monitor_logs` as CSV and reads such a dump back.

pub mod export;
pub mod memory;
pub mod pg;

pub use export::{export_csv, export_to_path, parse_export};
pub use memory::InMemoryStore;
pub use pg::PgStore;

use crate::model::{AlertEvent, LoggedAlert, LoggedSample, Sample, StoreError};

/// Row limit applied when a query does not give one.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

pub trait TimeSeriesStore: Send + Sync {
    /// Persists one sample and returns its id.
    fn append_sample(&self, sample: &Sample) -> Result<i64, StoreError>;

    /// Persists one alert and returns its id.
    fn append_alert(&self, alert: &AlertEvent) -> Result<i64, StoreError>;

    /// The most recent `limit` samples, newest first. `None` means
    /// `DEFAULT_QUERY_LIMIT`. An empty store yields an empty vec.
    fn query(&self, limit: Option<usize>) -> Result<Vec<LoggedSample>, StoreError>;

    /// Every sample in insertion order.
    fn all_samples(&self) -> Result<Vec<LoggedSample>, StoreError>;

    /// The most recent `limit` alerts, newest first.
    fn recent_alerts(&self, limit: Option<usize>) -> Result<Vec<LoggedAlert>, StoreError>;
}

pub(crate) fn effective_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_QUERY_LIMIT)
}
