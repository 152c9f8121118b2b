/// In-process store used when no database is configured.

use std::sync::{Mutex, MutexGuard};

use crate::model::{AlertEvent, LoggedAlert, LoggedSample, Sample, StoreError};
use crate::store::{effective_limit, TimeSeriesStore};

#[derive(Debug, Default)]
struct Tables {
    monitor_logs: Vec<LoggedSample>,
    alerts: Vec<LoggedAlert>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        // A writer panicked mid-append; treat the tables as unavailable
        // rather than serve rows that may be half written.
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory tables lock poisoned".to_string()))
    }
}

impl TimeSeriesStore for InMemoryStore {
    fn append_sample(&self, sample: &Sample) -> Result<i64, StoreError> {
        let mut tables = self.tables()?;
        let id = tables.monitor_logs.last().map_or(1, |last| last.id + 1);
        tables.monitor_logs.push(LoggedSample::from_sample(id, sample));
        Ok(id)
    }

    fn append_alert(&self, alert: &AlertEvent) -> Result<i64, StoreError> {
        let mut tables = self.tables()?;
        let id = tables.alerts.last().map_or(1, |last| last.id + 1);
        tables.alerts.push(LoggedAlert {
            id,
            event: alert.clone(),
        });
        Ok(id)
    }

    fn query(&self, limit: Option<usize>) -> Result<Vec<LoggedSample>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .monitor_logs
            .iter()
            .rev()
            .take(effective_limit(limit))
            .cloned()
            .collect())
    }

    fn all_samples(&self) -> Result<Vec<LoggedSample>, StoreError> {
        Ok(self.tables()?.monitor_logs.clone())
    }

    fn recent_alerts(&self, limit: Option<usize>) -> Result<Vec<LoggedAlert>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .alerts
            .iter()
            .rev()
            .take(effective_limit(limit))
            .cloned()
            .collect())
    }
}
