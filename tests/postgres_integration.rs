/// Integration tests for the PostgreSQL time-series store
///
/// These tests verify:
/// 1. Connecting creates the schema and seeds the admin account
/// 2. Samples round-trip through monitor_logs by column name
/// 3. Alerts round-trip with their level and status
/// 4. Ids increase and queries return newest first
///
/// Prerequisites:
/// - PostgreSQL running and reachable
/// - DATABASE_URL and ADMIN_PASSWORD set (a .env file is honoured)
///
/// Run with: cargo test --test postgres_integration -- --ignored --test-threads=1
///
/// Note: rows written here are deleted again, but the tests share the
/// monitor_logs and alerts tables with any running daemon.

use chanmon_service::model::{
    AlertEvent, AlertSeverity, AlertStatus, FlowRegime, FlowUniformity, Sample,
};
use chanmon_service::store::{PgStore, TimeSeriesStore};

use chrono::{DurationRound, TimeDelta, TimeZone, Utc};
use postgres::{Client, NoTls};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn connect_store() -> PgStore {
    PgStore::connect_from_env().unwrap_or_else(|e| {
        eprintln!("\n{}\n", "=".repeat(80));
        eprintln!("POSTGRES INTEGRATION TEST SETUP ERROR");
        eprintln!("{}", "=".repeat(80));
        eprintln!("\n{}\n", e);
        eprintln!("Set DATABASE_URL and ADMIN_PASSWORD (or add them to .env)\n");
        panic!("Database connection failed");
    })
}

fn raw_client() -> Client {
    let url = chanmon_service::store::pg::database_url().expect("DATABASE_URL should be set");
    Client::connect(&url, NoTls).expect("raw connection should succeed")
}

fn cleanup_rows(client: &mut Client, marker_count: i32) {
    client
        .execute("DELETE FROM monitor_logs WHERE float_count = $1", &[&marker_count])
        .ok();
    client
        .execute("DELETE FROM alerts WHERE message LIKE 'integration test%'", &[])
        .ok();
}

/// Marker stored in float_count so cleanup only touches rows written here.
const MARKER_FLOAT_COUNT: u32 = 987_654;

fn marked_sample(depth: f64, velocity: f64, regime: FlowRegime) -> Sample {
    Sample {
        // TIMESTAMPTZ keeps microseconds; truncate so the round trip compares equal.
        timestamp: Utc::now().duration_trunc(TimeDelta::microseconds(1)).unwrap(),
        depth,
        velocity,
        flow_rate: 9.0,
        froude: 0.42,
        regime,
        uniformity: FlowUniformity::NonUniform,
        sediment: 0.5,
        float_count: MARKER_FLOAT_COUNT,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
#[ignore] // Requires PostgreSQL
fn test_connect_seeds_admin_account() {
    let store = connect_store();
    let role = store.user_role("admin").expect("users table should be queryable");
    assert_eq!(role.as_deref(), Some("admin"));

    // Reconnecting must not fail on the existing admin row.
    let again = connect_store();
    assert_eq!(again.user_role("admin").unwrap().as_deref(), Some("admin"));
    assert_eq!(again.user_role("nobody-here").unwrap(), None);
}

#[test]
#[ignore] // Requires PostgreSQL
fn test_sample_round_trip_by_column_name() {
    let store = connect_store();
    let mut client = raw_client();
    cleanup_rows(&mut client, MARKER_FLOAT_COUNT as i32);

    let sample = marked_sample(2.03, 1.51, FlowRegime::Subcritical);
    let id = store.append_sample(&sample).expect("insert should succeed");

    let newest = store.query(Some(1)).unwrap();
    assert_eq!(newest.len(), 1);
    let row = &newest[0];
    assert_eq!(row.id, id);
    assert_eq!(row.timestamp, sample.timestamp);
    assert_eq!(row.depth, 2.03);
    assert_eq!(row.velocity, 1.51);
    assert_eq!(row.fr_number, 0.42);
    assert_eq!(row.flow_state, FlowRegime::Subcritical);
    assert_eq!(row.float_count, MARKER_FLOAT_COUNT);

    cleanup_rows(&mut client, MARKER_FLOAT_COUNT as i32);
}

#[test]
#[ignore] // Requires PostgreSQL
fn test_ids_increase_and_query_is_newest_first() {
    let store = connect_store();
    let mut client = raw_client();
    cleanup_rows(&mut client, MARKER_FLOAT_COUNT as i32);

    let regimes = [FlowRegime::Subcritical, FlowRegime::Critical, FlowRegime::Supercritical];
    let ids: Vec<i64> = regimes
        .iter()
        .map(|r| store.append_sample(&marked_sample(1.0, 3.0, *r)).unwrap())
        .collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids should be strictly increasing: {:?}", ids);

    let newest = store.query(Some(3)).unwrap();
    let returned: Vec<i64> = newest.iter().map(|r| r.id).collect();
    let mut expected = ids.clone();
    expected.reverse();
    assert_eq!(returned, expected);
    assert_eq!(newest[0].flow_state, FlowRegime::Supercritical);

    cleanup_rows(&mut client, MARKER_FLOAT_COUNT as i32);
}

#[test]
#[ignore] // Requires PostgreSQL
fn test_alert_round_trip() {
    let store = connect_store();
    let mut client = raw_client();
    cleanup_rows(&mut client, MARKER_FLOAT_COUNT as i32);

    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let event = AlertEvent::new(at, AlertSeverity::Red, "integration test: depth");
    let id = store.append_alert(&event).unwrap();

    let recent = store.recent_alerts(Some(10)).unwrap();
    let logged = recent.iter().find(|a| a.id == id).expect("alert should be readable");
    assert_eq!(logged.event.severity, AlertSeverity::Red);
    assert_eq!(logged.event.status, AlertStatus::Unread);
    assert_eq!(logged.event.message, "integration test: depth");
    assert_eq!(logged.event.timestamp, at);

    cleanup_rows(&mut client, MARKER_FLOAT_COUNT as i32);
}
