//! Window aggregates over logged samples.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{FlowRegime, LoggedSample};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub sample_count: usize,
    pub max_depth: f64,
    pub mean_velocity: f64,
    pub mean_flow_rate: f64,
    pub peak_froude: f64,
    pub supercritical_count: usize,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

/// Result of aggregating a window. An empty window is `NoData`, never a
/// division by zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Aggregate {
    NoData,
    Summary(TrendSummary),
}

impl Aggregate {
    pub fn summary(&self) -> Option<&TrendSummary> {
        match self {
            Aggregate::NoData => None,
            Aggregate::Summary(s) => Some(s),
        }
    }
}

/// Aggregates any window of samples; order does not matter.
pub fn aggregate(samples: &[LoggedSample]) -> Aggregate {
    let Some(first) = samples.first() else {
        return Aggregate::NoData;
    };

    let mut summary = TrendSummary {
        sample_count: samples.len(),
        max_depth: f64::NEG_INFINITY,
        mean_velocity: 0.0,
        mean_flow_rate: 0.0,
        peak_froude: f64::NEG_INFINITY,
        supercritical_count: 0,
        window_start: first.timestamp,
        window_end: first.timestamp,
    };

    let mut velocity_sum = 0.0;
    let mut flow_sum = 0.0;
    for s in samples {
        summary.max_depth = summary.max_depth.max(s.depth);
        summary.peak_froude = summary.peak_froude.max(s.fr_number);
        velocity_sum += s.velocity;
        flow_sum += s.flow_rate;
        if s.flow_state == FlowRegime::Supercritical {
            summary.supercritical_count += 1;
        }
        summary.window_start = summary.window_start.min(s.timestamp);
        summary.window_end = summary.window_end.max(s.timestamp);
    }

    let n = samples.len() as f64;
    summary.mean_velocity = velocity_sum / n;
    summary.mean_flow_rate = flow_sum / n;
    Aggregate::Summary(summary)
}
