/// Core data types for the channel monitoring service.
///
/// This module defines the shared domain model imported by all other modules:
/// channel geometry configuration, per-tick samples, alert events, the
/// persisted row types, and the error enums. It contains no hydraulic logic
/// and no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

/// Gravitational acceleration used by the Froude number, in m/s².
pub const GRAVITY: f64 = 9.81;

// ---------------------------------------------------------------------------
// Channel configuration
// ---------------------------------------------------------------------------

/// Static trapezoidal channel profile.
///
/// Loaded once at startup by `config::load_config` and validated there;
/// the hydraulic functions assume a validated profile and never re-check it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelProfile {
    /// Bottom width `b`, in metres.
    pub bottom_width: f64,
    /// Side-slope ratio `m` (horizontal:vertical).
    pub side_slope: f64,
    /// Bed slope `i` (dimensionless).
    pub bed_slope: f64,
    /// Manning roughness `n`, in s·m^-1/3.
    pub roughness: f64,
}

impl Default for ChannelProfile {
    fn default() -> Self {
        Self {
            bottom_width: 3.0,
            side_slope: 1.0,
            bed_slope: 0.0002,
            roughness: 0.014,
        }
    }
}

impl ChannelProfile {
    /// Rejects profiles that would make the geometry or Manning formulas
    /// meaningless: `b > 0`, `m ≥ 0`, `0 < i < 1`, `n > 0`, all finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("bottom_width", self.bottom_width),
            ("side_slope", self.side_slope),
            ("bed_slope", self.bed_slope),
            ("roughness", self.roughness),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::InvalidProfile(format!("{} must be finite, got {}", name, value)));
            }
        }
        if self.bottom_width <= 0.0 {
            return Err(ConfigError::InvalidProfile(format!(
                "bottom_width must be > 0, got {}",
                self.bottom_width
            )));
        }
        if self.side_slope < 0.0 {
            return Err(ConfigError::InvalidProfile(format!(
                "side_slope must be >= 0, got {}",
                self.side_slope
            )));
        }
        if self.bed_slope <= 0.0 || self.bed_slope >= 1.0 {
            return Err(ConfigError::InvalidProfile(format!(
                "bed_slope must be in (0, 1), got {}",
                self.bed_slope
            )));
        }
        if self.roughness <= 0.0 {
            return Err(ConfigError::InvalidProfile(format!(
                "roughness must be > 0, got {}",
                self.roughness
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Derived state
// ---------------------------------------------------------------------------

/// Cross-section geometry at a given depth. Recomputed every tick, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryState {
    pub depth: f64,
    pub top_width: f64,
    pub area: f64,
    pub wetted_perimeter: f64,
    pub hydraulic_radius: f64,
}

/// Flow regime from the Froude number, with a hysteresis band around 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FlowRegime {
    Subcritical,
    Critical,
    Supercritical,
}

impl FlowRegime {
    pub fn label(&self) -> &'static str {
        match self {
            FlowRegime::Subcritical => "Subcritical",
            FlowRegime::Critical => "Critical",
            FlowRegime::Supercritical => "Supercritical",
        }
    }
}

impl fmt::Display for FlowRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FlowRegime {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Subcritical" => Ok(FlowRegime::Subcritical),
            "Critical" => Ok(FlowRegime::Critical),
            "Supercritical" => Ok(FlowRegime::Supercritical),
            other => Err(StoreError::Malformed(format!("unknown flow regime '{}'", other))),
        }
    }
}

/// Whether the measured velocity matches the Manning normal velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowUniformity {
    Uniform,
    NonUniform,
}

impl FlowUniformity {
    pub fn label(&self) -> &'static str {
        match self {
            FlowUniformity::Uniform => "Uniform",
            FlowUniformity::NonUniform => "Non-uniform",
        }
    }
}

impl fmt::Display for FlowUniformity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FlowUniformity {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Uniform" => Ok(FlowUniformity::Uniform),
            "Non-uniform" => Ok(FlowUniformity::NonUniform),
            other => Err(StoreError::Malformed(format!("unknown uniformity '{}'", other))),
        }
    }
}

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// One tick of derived channel state. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub depth: f64,
    pub velocity: f64,
    pub flow_rate: f64,
    pub froude: f64,
    pub regime: FlowRegime,
    pub uniformity: FlowUniformity,
    /// Estimated suspended sediment concentration.
    pub sediment: f64,
    /// Floating objects counted by the vision collaborator.
    pub float_count: u32,
}

/// A `monitor_logs` row as persisted, with its store-assigned id.
///
/// Field order matches the table's column order, which is also the
/// export header order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedSample {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub depth: f64,
    pub velocity: f64,
    pub flow_rate: f64,
    pub fr_number: f64,
    pub flow_state: FlowRegime,
    pub float_count: u32,
}

impl LoggedSample {
    pub fn from_sample(id: i64, sample: &Sample) -> Self {
        Self {
            id,
            timestamp: sample.timestamp,
            depth: sample.depth,
            velocity: sample.velocity,
            flow_rate: sample.flow_rate,
            fr_number: sample.froude,
            flow_state: sample.regime,
            float_count: sample.float_count,
        }
    }
}

/// Column names of `monitor_logs`, in declared order.
pub const MONITOR_LOG_COLUMNS: [&str; 8] = [
    "id",
    "timestamp",
    "depth",
    "velocity",
    "flow_rate",
    "fr_number",
    "flow_state",
    "float_count",
];

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertSeverity {
    Yellow,
    Red,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Yellow => write!(f, "YELLOW"),
            AlertSeverity::Red => write!(f, "RED"),
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "YELLOW" => Ok(AlertSeverity::Yellow),
            "RED" => Ok(AlertSeverity::Red),
            other => Err(StoreError::Malformed(format!("unknown alert level '{}'", other))),
        }
    }
}

/// Operator-facing state of an alert. Transitions happen outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertStatus {
    Unread,
    Resolved,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertStatus::Unread => write!(f, "UNREAD"),
            AlertStatus::Resolved => write!(f, "RESOLVED"),
        }
    }
}

impl FromStr for AlertStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "UNREAD" => Ok(AlertStatus::Unread),
            "RESOLVED" => Ok(AlertStatus::Resolved),
            other => Err(StoreError::Malformed(format!("unknown alert status '{}'", other))),
        }
    }
}

/// An alert raised for a single tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub timestamp: DateTime<Utc>,
    pub severity: AlertSeverity,
    pub message: String,
    pub status: AlertStatus,
}

impl AlertEvent {
    /// New alerts always start out unread.
    pub fn new(timestamp: DateTime<Utc>, severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            severity,
            message: message.into(),
            status: AlertStatus::Unread,
        }
    }
}

/// An `alerts` row as persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedAlert {
    pub id: i64,
    pub event: AlertEvent,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid channel profile: {0}")]
    InvalidProfile(String),

    #[error("invalid simulation settings: {0}")]
    InvalidSimulation(String),

    #[error("invalid setpoint: {0}")]
    InvalidSetpoint(String),
}

/// Errors from the time-series store. A failed write is never retried here.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Errors that stop a running simulation ticker.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("sample recording halted: {0}")]
    Store(#[from] StoreError),

    #[error("simulation worker panicked")]
    WorkerPanicked,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
