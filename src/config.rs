//! Service configuration.
//!
//! Loaded once at startup from a TOML file (default `chanmon.toml`). Every
//! section and field is optional; anything left out falls back to the
//! reference values below. Validation happens here, before any sample is
//! produced, so the hydraulic code can assume a sane `ChannelProfile`.
//!
//! ```toml
//! [channel]
//! bottom_width = 3.0
//! side_slope = 1.0
//! bed_slope = 0.0002
//! roughness = 0.014
//!
//! [simulation]
//! period_ms = 150
//! max_ticks = 400
//!
//! [store]
//! alert_dedup_window = 2
//! export_path = "monitor_logs.csv"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::LogLevel;
use crate::model::{ChannelProfile, ConfigError};
use crate::setpoint::Setpoint;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "chanmon.toml";
/// Environment variable overriding the config path.
pub const CONFIG_PATH_ENV: &str = "CHANMON_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub channel: ChannelProfile,
    pub simulation: SimulationConfig,
    pub setpoint: SetpointConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Periodic generator settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Tick period of the dashboard driver.
    pub period_ms: u64,
    /// Depth amplitude of the sinusoidal wave, in metres. Velocity gets half.
    pub wave_amplitude: f64,
    /// Wave phase advance per tick, in radians.
    pub wave_omega: f64,
    /// Half-width of the uniform sensor-noise jitter.
    pub jitter: f64,
    /// `k` in `sediment = v^1.5 · k`.
    pub sediment_coefficient: f64,
    /// Stop after this many ticks; run until stopped when absent.
    pub max_ticks: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            period_ms: 150,
            wave_amplitude: 0.03,
            wave_omega: 0.1,
            jitter: 0.005,
            sediment_coefficient: 0.6,
            max_ticks: None,
        }
    }
}

impl SimulationConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::InvalidSimulation("period_ms must be > 0".to_string()));
        }
        let non_negative = [
            ("wave_amplitude", self.wave_amplitude),
            ("jitter", self.jitter),
            ("sediment_coefficient", self.sediment_coefficient),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidSimulation(format!(
                    "{} must be a finite value >= 0, got {}",
                    name, value
                )));
            }
        }
        if !self.wave_omega.is_finite() {
            return Err(ConfigError::InvalidSimulation(format!(
                "wave_omega must be finite, got {}",
                self.wave_omega
            )));
        }
        Ok(())
    }
}

/// Initial contents of the setpoint store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SetpointConfig {
    pub depth: f64,
    pub velocity: f64,
    pub sediment: f64,
    pub simulation_mode: bool,
}

impl Default for SetpointConfig {
    fn default() -> Self {
        let s = Setpoint::default();
        Self {
            depth: s.depth,
            velocity: s.velocity,
            sediment: s.sediment,
            simulation_mode: s.simulation_mode,
        }
    }
}

impl SetpointConfig {
    /// Infinite or NaN setpoints would poison every derived value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("depth", self.depth),
            ("velocity", self.velocity),
            ("sediment", self.sediment),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::InvalidSetpoint(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn to_setpoint(&self) -> Setpoint {
        Setpoint {
            depth: self.depth.max(0.0),
            velocity: self.velocity.max(0.0),
            sediment: self.sediment.max(0.0),
            simulation_mode: self.simulation_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Row limit for history queries when the caller gives none.
    pub history_limit: usize,
    /// Where to write the CSV export at shutdown, if anywhere.
    pub export_path: Option<PathBuf>,
    /// See `alert::dedup`. Zero logs every fired rule.
    pub alert_dedup_window: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_limit: crate::store::DEFAULT_QUERY_LIMIT,
            export_path: None,
            alert_dedup_window: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            timestamps: true,
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.channel.validate()?;
        self.simulation.validate()?;
        self.setpoint.validate()?;
        Ok(())
    }
}

/// Parses and validates configuration text.
pub fn parse_config(text: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    if !path.exists() {
        let config = ServiceConfig::default();
        config.validate()?;
        return Ok(config);
    }
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

/// Config path from the first CLI argument, then `CHANMON_CONFIG`, then the default.
pub fn resolve_config_path(cli_arg: Option<String>) -> PathBuf {
    cli_arg
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
