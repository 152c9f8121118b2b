//! Alert rule evaluation.
//!
//! Rules are checked in a fixed order and are not mutually exclusive: a deep
//! supercritical tick raises both alerts. The evaluator does no I/O;
//! persisting the events (and deciding whether to suppress repeats, see
//! `alert::dedup`) is the caller's job.

use chrono::{DateTime, Utc};

use crate::model::{AlertEvent, AlertSeverity, FlowRegime};

/// Water level above which the RED alert fires, in metres.
pub const DEPTH_LIMIT_M: f64 = 3.5;

pub const DEPTH_LIMIT_MESSAGE: &str = "water level exceeds limit";
pub const SUPERCRITICAL_MESSAGE: &str = "flow transitioned to supercritical; scour risk";

/// Evaluates every alert rule against one tick's state.
///
/// Returns the fired events in rule order:
///   1. depth > 3.5 m          →  RED
///   2. regime Supercritical   →  YELLOW
pub fn evaluate_alerts(depth: f64, regime: FlowRegime, now: DateTime<Utc>) -> Vec<AlertEvent> {
    let mut alerts = Vec::new();

    if depth > DEPTH_LIMIT_M {
        alerts.push(AlertEvent::new(now, AlertSeverity::Red, DEPTH_LIMIT_MESSAGE));
    }

    if regime == FlowRegime::Supercritical {
        alerts.push(AlertEvent::new(now, AlertSeverity::Yellow, SUPERCRITICAL_MESSAGE));
    }

    alerts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
