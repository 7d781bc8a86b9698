use thiserror::Error;

/// Errors raised while loading or validating a dashboard configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config defines no channels")]
    NoChannels,

    #[error("channel #{index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate channel id `{0}`")]
    DuplicateId(String),

    #[error("channel `{id}` has an invalid display range {min}..{max}")]
    InvalidRange { id: String, min: f64, max: f64 },

    #[error("servo `{id}` must keep the 0..1 range, got {min}..{max}")]
    ServoRange { id: String, min: f64, max: f64 },

    #[error("history length must be at least 2, got {0}")]
    HistoryTooShort(usize),

    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,

    #[error("servo toggle probability {0} is outside 0..=1")]
    InvalidProbability(f64),

    #[error("walk step fraction {0} is outside (0, 1]")]
    InvalidStep(f64),

    #[error("invalid value `{value}` for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Errors raised while producing readings.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("channel `{id}` has an unusable display range {min}..{max}")]
    InvalidRange { id: String, min: f64, max: f64 },
}
