//! Alerting and decision support.
//!
//! Submodules:
//! - `thresholds` — rule-based alert events per tick.
//! - `dedup` — optional suppression of repeated events before persistence.
//! - `safety` — composite safety score and operator advice.

pub mod dedup;
pub mod safety;
pub mod thresholds;

pub use dedup::AlertDeduplicator;
pub use safety::{assess, SafetyAssessment, SafetyLevel};
pub use thresholds::evaluate_alerts;
