//! Data model of the test-stand dashboard: channels, readings, plot histories
//! and the random source that drives them. Nothing in here knows about the UI.

pub mod channel;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod history;
pub mod reading;
pub mod source;

pub use channel::{Channel, ChannelKind, DisplayRange};
pub use config::DashboardConfig;
pub use dashboard::{ChannelState, Dashboard, DashboardSharedPointer};
pub use error::{ConfigError, TelemetryError};
pub use history::History;
pub use reading::{Reading, ServoState};
pub use source::{RandomTelemetry, SampleMode, TelemetrySource, TelemetrySourcePointer};
