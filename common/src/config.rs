use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::{Channel, DisplayRange};
use crate::dashboard::Dashboard;
use crate::error::ConfigError;
use crate::source::{RandomTelemetry, SampleMode, TelemetrySourcePointer};

/// Names a JSON config file used instead of the built-in layout.
pub const CONFIG_ENV: &str = "TESTSTAND_CONFIG";
/// Overrides the tick interval in milliseconds.
pub const TICK_ENV: &str = "TESTSTAND_TICK_MS";

const BUILTIN: &str = include_str!("./channels.json");

/// Layout and timing of the dashboard.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Number of samples kept per channel for the chart.
    #[serde(default = "default_history_len")]
    pub history_len: usize,

    #[serde(default = "default_servo_toggle_probability")]
    pub servo_toggle_probability: f64,

    /// Decimal places of the readouts.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    #[serde(default)]
    pub mode: SampleMode,

    pub channels: Vec<Channel>,
}

fn default_title() -> String {
    "Rocket Data & Stats".into()
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_history_len() -> usize {
    60
}

fn default_servo_toggle_probability() -> f64 {
    0.1
}

fn default_decimals() -> usize {
    2
}

impl DashboardConfig {
    /// The test-stand layout shipped with the application.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str::<Self>(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Loads the file named by `TESTSTAND_CONFIG` (or the built-in layout) and
    /// applies the `TESTSTAND_TICK_MS` override.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|var| std::env::var(var).ok())
    }

    fn from_vars(var: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match var(CONFIG_ENV) {
            Some(path) => {
                log::info!("Loading dashboard config from {path}");
                Self::from_path(path)?
            }
            None => Self::builtin()?,
        };

        if let Some(value) = var(TICK_ENV) {
            config.tick_interval_ms = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: TICK_ENV,
                value: value.clone(),
            })?;
            config.validate()?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        if self.history_len < 2 {
            return Err(ConfigError::HistoryTooShort(self.history_len));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if !(0.0..=1.0).contains(&self.servo_toggle_probability) {
            return Err(ConfigError::InvalidProbability(self.servo_toggle_probability));
        }
        if let SampleMode::Walk { step_fraction } = self.mode {
            if !(step_fraction > 0.0 && step_fraction <= 1.0) {
                return Err(ConfigError::InvalidStep(step_fraction));
            }
        }

        let mut ids = HashSet::new();
        for (index, channel) in self.channels.iter().enumerate() {
            if channel.id.trim().is_empty() {
                return Err(ConfigError::EmptyId { index });
            }
            if !ids.insert(channel.id.as_str()) {
                return Err(ConfigError::DuplicateId(channel.id.clone()));
            }
            if !channel.range.is_valid() {
                return Err(ConfigError::InvalidRange {
                    id: channel.id.clone(),
                    min: channel.range.min,
                    max: channel.range.max,
                });
            }
            if channel.kind.is_servo() && channel.range != DisplayRange::default() {
                return Err(ConfigError::ServoRange {
                    id: channel.id.clone(),
                    min: channel.range.min,
                    max: channel.range.max,
                });
            }
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// The random source described by this config.
    pub fn random_source(&self) -> TelemetrySourcePointer {
        Box::new(RandomTelemetry::new(self.mode, self.servo_toggle_probability))
    }

    pub fn build_dashboard(&self, source: TelemetrySourcePointer) -> Dashboard {
        Dashboard::new(self.title.clone(), self.channels.iter().cloned(), self.history_len, source)
    }
}

#[cfg(test)]
use crate::channel::ChannelKind;

#[test]
fn test_builtin_config() {
    let config = DashboardConfig::builtin().unwrap();

    assert_eq!(config.title, "Rocket Data & Stats");
    assert_eq!(config.tick_interval(), Duration::from_millis(500));
    assert_eq!(config.channels.iter().filter(|c| c.kind == ChannelKind::Pressure).count(), 3);
    assert_eq!(config.channels.iter().filter(|c| c.kind == ChannelKind::Servo).count(), 4);
    assert_eq!(config.mode, SampleMode::Walk { step_fraction: 0.08 });
}

#[test]
fn test_defaults_applied() {
    let config = DashboardConfig::from_json(
        r#"{ "channels": [ { "id": "pt1", "title": "Pressure 1", "kind": "pressure", "range": { "min": 0, "max": 10 } } ] }"#,
    )
    .unwrap();

    assert_eq!(config.title, "Rocket Data & Stats");
    assert_eq!(config.history_len, 60);
    assert_eq!(config.decimals, 2);
    assert_eq!(config.mode, SampleMode::Uniform);
}

#[test]
fn test_validation_errors() {
    let duplicate = r#"{ "channels": [
        { "id": "a", "title": "A", "kind": "servo" },
        { "id": "a", "title": "B", "kind": "servo" } ] }"#;
    assert!(matches!(DashboardConfig::from_json(duplicate), Err(ConfigError::DuplicateId(id)) if id == "a"));

    let inverted = r#"{ "channels": [ { "id": "a", "title": "A", "kind": "load", "range": { "min": 5, "max": 1 } } ] }"#;
    assert!(matches!(DashboardConfig::from_json(inverted), Err(ConfigError::InvalidRange { .. })));

    let zero_tick = r#"{ "tick_interval_ms": 0, "channels": [ { "id": "a", "title": "A", "kind": "servo" } ] }"#;
    assert!(matches!(DashboardConfig::from_json(zero_tick), Err(ConfigError::ZeroTickInterval)));

    let bad_step = r#"{ "mode": { "kind": "walk", "step_fraction": 2.0 }, "channels": [ { "id": "a", "title": "A", "kind": "servo" } ] }"#;
    assert!(matches!(DashboardConfig::from_json(bad_step), Err(ConfigError::InvalidStep(_))));

    let wide = r#"{ "channels": [ { "id": "a", "title": "A", "kind": "pressure", "range": { "min": -1e308, "max": 1e308 } } ] }"#;
    assert!(matches!(DashboardConfig::from_json(wide), Err(ConfigError::InvalidRange { .. })));

    let servo_range = r#"{ "channels": [ { "id": "v", "title": "Vent", "kind": "servo", "range": { "min": 10, "max": 20 } } ] }"#;
    assert!(matches!(DashboardConfig::from_json(servo_range), Err(ConfigError::ServoRange { id, .. }) if id == "v"));

    let servo_default = r#"{ "channels": [ { "id": "v", "title": "Vent", "kind": "servo", "range": { "min": 0, "max": 1 } } ] }"#;
    assert!(DashboardConfig::from_json(servo_default).is_ok());

    assert!(matches!(DashboardConfig::from_json(r#"{ "channels": [] }"#), Err(ConfigError::NoChannels)));
    assert!(matches!(DashboardConfig::from_json("{"), Err(ConfigError::Json(_))));
}

#[test]
fn test_env_overrides() {
    let config = DashboardConfig::from_vars(|var| (var == TICK_ENV).then(|| " 250 ".to_string())).unwrap();
    assert_eq!(config.tick_interval_ms, 250);

    let err = DashboardConfig::from_vars(|var| (var == TICK_ENV).then(|| "fast".to_string())).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { var: TICK_ENV, .. }));

    let err = DashboardConfig::from_vars(|var| (var == CONFIG_ENV).then(|| "/nonexistent/stand.json".to_string())).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
