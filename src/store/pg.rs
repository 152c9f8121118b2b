/// PostgreSQL-backed time-series store.
///
/// Uses the synchronous `postgres` client behind a mutex so the ticker
/// thread and on-demand history readers can share one connection. Rows are
/// read by column name into `LoggedSample` / `LoggedAlert`, never by
/// position.
///
/// Connection settings come from `DATABASE_URL` (a `.env` file is honoured).

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use postgres::{Client, NoTls, Row};

use crate::model::{AlertEvent, LoggedAlert, LoggedSample, Sample, StoreError};
use crate::store::{effective_limit, TimeSeriesStore};

/// Tables created on connect if missing.
pub const SCHEMA_SQL: &str = include_str!("../../sql/001_monitor_schema.sql");

/// Environment variable holding the connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable holding the password for the seeded admin account.
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";

pub struct PgStore {
    client: Mutex<Client>,
}

/// Reads `DATABASE_URL`, loading `.env` first. `None` when unset.
pub fn database_url() -> Option<String> {
    dotenv::dotenv().ok();
    std::env::var(DATABASE_URL_ENV).ok().filter(|url| !url.trim().is_empty())
}

impl PgStore {
    /// Connects, creates the schema if needed, and seeds the default admin.
    pub fn connect(url: &str, admin_password: &str) -> Result<Self, StoreError> {
        let mut client = Client::connect(url, NoTls)?;
        ensure_schema(&mut client, admin_password)?;
        Ok(Self {
            client: Mutex::new(client),
        })
    }

    /// Connects using `DATABASE_URL` and `ADMIN_PASSWORD`.
    pub fn connect_from_env() -> Result<Self, StoreError> {
        let url = database_url()
            .ok_or_else(|| StoreError::Unavailable(format!("{} is not set", DATABASE_URL_ENV)))?;
        let admin_password = std::env::var(ADMIN_PASSWORD_ENV).map_err(|_| {
            StoreError::Unavailable(format!("{} is not set", ADMIN_PASSWORD_ENV))
        })?;
        Self::connect(&url, &admin_password)
    }

    fn client(&self) -> Result<MutexGuard<'_, Client>, StoreError> {
        self.client
            .lock()
            .map_err(|_| StoreError::Unavailable("postgres client lock poisoned".to_string()))
    }

    /// Role of `username`, if the account exists.
    pub fn user_role(&self, username: &str) -> Result<Option<String>, StoreError> {
        let rows = self
            .client()?
            .query("SELECT role FROM users WHERE username = $1", &[&username])?;
        Ok(rows.first().map(|row| row.get("role")))
    }
}

/// Creates the tables and inserts `admin` (role `admin`) unless it already exists.
pub fn ensure_schema(client: &mut Client, admin_password: &str) -> Result<(), StoreError> {
    client.batch_execute(SCHEMA_SQL)?;
    client.execute(
        "INSERT INTO users (username, password, role, created_at)
         VALUES ('admin', $1, 'admin', now())
         ON CONFLICT (username) DO NOTHING",
        &[&admin_password],
    )?;
    Ok(())
}

fn sample_from_row(row: &Row) -> Result<LoggedSample, StoreError> {
    let flow_state: String = row.try_get("flow_state")?;
    let float_count: i32 = row.try_get("float_count")?;
    Ok(LoggedSample {
        id: row.try_get("id")?,
        timestamp: row.try_get::<_, DateTime<Utc>>("timestamp")?,
        depth: row.try_get("depth")?,
        velocity: row.try_get("velocity")?,
        flow_rate: row.try_get("flow_rate")?,
        fr_number: row.try_get("fr_number")?,
        flow_state: flow_state.parse()?,
        float_count: u32::try_from(float_count)
            .map_err(|_| StoreError::Malformed(format!("negative float_count {}", float_count)))?,
    })
}

fn alert_from_row(row: &Row) -> Result<LoggedAlert, StoreError> {
    let level: String = row.try_get("level")?;
    let status: String = row.try_get("status")?;
    Ok(LoggedAlert {
        id: row.try_get("id")?,
        event: AlertEvent {
            timestamp: row.try_get("timestamp")?,
            severity: level.parse()?,
            message: row.try_get("message")?,
            status: status.parse()?,
        },
    })
}

fn limit_param(limit: Option<usize>) -> i64 {
    i64::try_from(effective_limit(limit)).unwrap_or(i64::MAX)
}

/// `float_count` is an INTEGER column; a count it cannot hold is refused,
/// never truncated.
fn float_count_param(count: u32) -> Result<i32, StoreError> {
    i32::try_from(count).map_err(|_| {
        StoreError::Malformed(format!("float_count {} exceeds the INTEGER column", count))
    })
}

const SAMPLE_COLUMNS: &str =
    "id, timestamp, depth, velocity, flow_rate, fr_number, flow_state, float_count";

impl TimeSeriesStore for PgStore {
    fn append_sample(&self, sample: &Sample) -> Result<i64, StoreError> {
        let float_count = float_count_param(sample.float_count)?;
        let row = self.client()?.query_one(
            "INSERT INTO monitor_logs
                (timestamp, depth, velocity, flow_rate, fr_number, flow_state, float_count)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
            &[
                &sample.timestamp,
                &sample.depth,
                &sample.velocity,
                &sample.flow_rate,
                &sample.froude,
                &sample.regime.label(),
                &float_count,
            ],
        )?;
        Ok(row.try_get("id")?)
    }

    fn append_alert(&self, alert: &AlertEvent) -> Result<i64, StoreError> {
        let row = self.client()?.query_one(
            "INSERT INTO alerts (timestamp, level, message, status)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
            &[
                &alert.timestamp,
                &alert.severity.to_string(),
                &alert.message,
                &alert.status.to_string(),
            ],
        )?;
        Ok(row.try_get("id")?)
    }

    fn query(&self, limit: Option<usize>) -> Result<Vec<LoggedSample>, StoreError> {
        let sql = format!(
            "SELECT {} FROM monitor_logs ORDER BY id DESC LIMIT $1",
            SAMPLE_COLUMNS
        );
        let rows = self.client()?.query(sql.as_str(), &[&limit_param(limit)])?;
        rows.iter().map(sample_from_row).collect()
    }

    fn all_samples(&self) -> Result<Vec<LoggedSample>, StoreError> {
        let sql = format!("SELECT {} FROM monitor_logs ORDER BY id ASC", SAMPLE_COLUMNS);
        let rows = self.client()?.query(sql.as_str(), &[])?;
        rows.iter().map(sample_from_row).collect()
    }

    fn recent_alerts(&self, limit: Option<usize>) -> Result<Vec<LoggedAlert>, StoreError> {
        let rows = self.client()?.query(
            "SELECT id, timestamp, level, message, status
             FROM alerts
             ORDER BY id DESC
             LIMIT $1",
            &[&limit_param(limit)],
        )?;
        rows.iter().map(alert_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_declares_all_three_tables() {
        for table in ["monitor_logs", "alerts", "users"] {
            assert!(
                SCHEMA_SQL.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table)),
                "schema should create '{}'",
                table
            );
        }
    }

    #[test]
    fn test_sample_select_matches_monitor_log_columns() {
        let columns: Vec<_> = SAMPLE_COLUMNS.split(", ").collect();
        assert_eq!(columns, crate::model::MONITOR_LOG_COLUMNS.to_vec());
    }

    #[test]
    fn test_limit_defaults_when_absent() {
        assert_eq!(limit_param(None), 100);
        assert_eq!(limit_param(Some(7)), 7);
    }

    #[test]
    fn test_float_count_out_of_column_range_is_refused() {
        assert_eq!(float_count_param(12).unwrap(), 12);
        assert_eq!(float_count_param(i32::MAX as u32).unwrap(), i32::MAX);
        assert!(matches!(
            float_count_param(u32::MAX),
            Err(StoreError::Malformed(_))
        ));
    }
}
