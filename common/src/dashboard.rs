use std::sync::{Arc, Mutex};

use crate::channel::{Channel, ChannelKind};
use crate::error::TelemetryError;
use crate::history::History;
use crate::reading::Reading;
use crate::source::TelemetrySourcePointer;

/// A channel together with its latest reading and plot history.
#[derive(Clone, Debug)]
pub struct ChannelState {
    pub channel: Channel,
    pub reading: Option<Reading>,
    pub history: History,
}

impl ChannelState {
    fn new(channel: Channel, history_len: usize) -> Self {
        Self {
            channel,
            reading: None,
            history: History::new(history_len),
        }
    }

    /// Readout text, or a placeholder before the first tick.
    pub fn display(&self, decimals: usize) -> String {
        match &self.reading {
            Some(reading) => reading.display(self.channel.unit(), decimals),
            None => "--".to_string(),
        }
    }

    /// Position of the current reading inside the display range.
    pub fn fraction(&self) -> f64 {
        self.reading
            .map(|reading| self.channel.range.fraction(reading.as_scalar()))
            .unwrap_or_default()
    }
}

/// The in-memory state behind the dashboard window.
pub struct Dashboard {
    title: String,
    channels: Vec<ChannelState>,
    source: TelemetrySourcePointer,
    ticks: u64,
}

pub type DashboardSharedPointer = Arc<Mutex<Dashboard>>;

impl Dashboard {
    pub fn new(
        title: impl Into<String>,
        channels: impl IntoIterator<Item = Channel>,
        history_len: usize,
        source: TelemetrySourcePointer,
    ) -> Self {
        Self {
            title: title.into(),
            channels: channels
                .into_iter()
                .map(|channel| ChannelState::new(channel, history_len))
                .collect(),
            source,
            ticks: 0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn channels(&self) -> &[ChannelState] {
        &self.channels
    }

    pub fn channels_of(&self, kind: ChannelKind) -> impl Iterator<Item = &ChannelState> + '_ {
        self.channels.iter().filter(move |state| state.channel.kind == kind)
    }

    pub fn channel(&self, id: &str) -> Option<&ChannelState> {
        self.channels.iter().find(|state| state.channel.id == id)
    }

    /// Replaces every reading with a fresh one from the source and records it in the history.
    ///
    /// Scalar readings are clamped into the channel's display range. The whole tick
    /// is sampled before anything is stored, so a failing source leaves the previous
    /// readings untouched.
    pub fn tick(&mut self) -> Result<(), TelemetryError> {
        let mut readings = Vec::with_capacity(self.channels.len());
        for state in &self.channels {
            let range = state.channel.range;
            let reading = match self.source.sample(&state.channel, state.reading.as_ref())? {
                Reading::Scalar(value) if !range.contains(value) => {
                    log::debug!("clamping {value} of `{}` into {}..{}", state.channel.id, range.min, range.max);
                    Reading::Scalar(range.clamp(value))
                }
                reading => reading,
            };
            readings.push(reading);
        }

        for (state, reading) in self.channels.iter_mut().zip(readings) {
            state.history.push(reading.as_scalar());
            state.reading = Some(reading);
        }

        self.ticks += 1;
        log::trace!("tick {} from {}", self.ticks, self.source.name());

        Ok(())
    }

    pub fn shared(self) -> DashboardSharedPointer {
        Arc::new(Mutex::new(self))
    }
}

#[cfg(test)]
use crate::{
    channel::DisplayRange,
    reading::ServoState,
    source::{RandomTelemetry, SampleMode, TelemetrySource},
};

/// Returns the same value for every scalar channel; fails once `fail_after` samples were taken.
#[cfg(test)]
struct FixedTelemetry {
    value: f64,
    taken: usize,
    fail_after: Option<usize>,
}

#[cfg(test)]
impl TelemetrySource for FixedTelemetry {
    fn name(&self) -> &str {
        "fixed"
    }

    fn sample(&mut self, channel: &Channel, previous: Option<&Reading>) -> Result<Reading, TelemetryError> {
        if self.fail_after.is_some_and(|limit| self.taken >= limit) {
            return Err(TelemetryError::InvalidRange {
                id: channel.id.clone(),
                min: channel.range.min,
                max: channel.range.max,
            });
        }
        self.taken += 1;

        Ok(match channel.kind {
            ChannelKind::Servo => Reading::Servo(
                previous
                    .and_then(Reading::servo_state)
                    .map(ServoState::toggle)
                    .unwrap_or(ServoState::Open),
            ),
            _ => Reading::Scalar(self.value),
        })
    }
}

#[cfg(test)]
fn test_channels() -> Vec<Channel> {
    vec![
        Channel::new("pt1", "Pressure 1", ChannelKind::Pressure, DisplayRange::new(0.0, 70.0)),
        Channel::new("tc1", "Temperature 1", ChannelKind::Temperature, DisplayRange::new(-20.0, 120.0)),
        Channel::servo("sv1", "Main valve"),
    ]
}

#[test]
fn test_tick_clamps_out_of_range_values() {
    let source = FixedTelemetry { value: 500.0, taken: 0, fail_after: None };
    let mut dashboard = Dashboard::new("Stand", test_channels(), 10, Box::new(source));

    assert_eq!(dashboard.channel("pt1").unwrap().display(1), "--");
    dashboard.tick().unwrap();

    let pressure = dashboard.channel("pt1").unwrap();
    assert_eq!(pressure.reading, Some(Reading::Scalar(70.0)));
    assert_eq!(pressure.fraction(), 1.0);
    assert_eq!(pressure.display(1), "70.0 bar");
    assert_eq!(dashboard.channel("tc1").unwrap().reading, Some(Reading::Scalar(120.0)));
    assert_eq!(dashboard.ticks(), 1);
}

#[test]
fn test_servo_history_tracks_state() {
    let source = FixedTelemetry { value: 1.0, taken: 0, fail_after: None };
    let mut dashboard = Dashboard::new("Stand", test_channels(), 10, Box::new(source));

    for _ in 0..3 {
        dashboard.tick().unwrap();
    }

    let servo = dashboard.channel("sv1").unwrap();
    assert_eq!(servo.history.iter().collect::<Vec<_>>(), vec![1.0, 0.0, 1.0]);
    assert_eq!(servo.display(2), "OPEN");
}

#[test]
fn test_failed_tick_keeps_previous_readings() {
    let source = FixedTelemetry { value: 10.0, taken: 0, fail_after: Some(4) };
    let mut dashboard = Dashboard::new("Stand", test_channels(), 10, Box::new(source));

    dashboard.tick().unwrap();
    assert!(dashboard.tick().is_err());

    assert_eq!(dashboard.ticks(), 1);
    for state in dashboard.channels() {
        assert_eq!(state.history.len(), 1);
    }
    assert_eq!(dashboard.channel("sv1").unwrap().reading, Some(Reading::Servo(ServoState::Open)));
}

#[test]
fn test_random_ticks_respect_ranges_and_capacity() {
    let source = RandomTelemetry::seeded(5, SampleMode::Walk { step_fraction: 0.2 }, 0.3);
    let mut dashboard = Dashboard::new("Stand", test_channels(), 8, Box::new(source));

    for _ in 0..50 {
        dashboard.tick().unwrap();
        for state in dashboard.channels() {
            let value = state.reading.unwrap().as_scalar();
            assert!(state.channel.range.contains(value));
        }
    }

    assert_eq!(dashboard.channels_of(ChannelKind::Servo).count(), 1);
    assert!(dashboard.channels().iter().all(|state| state.history.len() == 8));
}
