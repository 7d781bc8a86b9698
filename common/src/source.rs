use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::channel::{Channel, ChannelKind};
use crate::error::TelemetryError;
use crate::reading::{Reading, ServoState};

/// How scalar channels pick their next value.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SampleMode {
    /// A fresh uniform value in the display range every tick.
    #[default]
    Uniform,

    /// The previous value plus a random step of at most `step_fraction` of the range span.
    Walk { step_fraction: f64 },
}

/// Something that produces readings for channels.
pub trait TelemetrySource {
    /// Name used in log output.
    fn name(&self) -> &str;

    /// Produces the next reading of `channel`, given the reading of the previous tick.
    fn sample(&mut self, channel: &Channel, previous: Option<&Reading>) -> Result<Reading, TelemetryError>;
}

pub type TelemetrySourcePointer = Box<dyn TelemetrySource + Send>;

/// Generates random readings. There is no sensor behind any of them.
pub struct RandomTelemetry {
    rng: StdRng,
    mode: SampleMode,
    servo_toggle_probability: f64,
}

impl RandomTelemetry {
    pub fn new(mode: SampleMode, servo_toggle_probability: f64) -> Self {
        Self::with_rng(StdRng::from_os_rng(), mode, servo_toggle_probability)
    }

    /// Reproducible source, mostly for tests.
    pub fn seeded(seed: u64, mode: SampleMode, servo_toggle_probability: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), mode, servo_toggle_probability)
    }

    fn with_rng(rng: StdRng, mode: SampleMode, servo_toggle_probability: f64) -> Self {
        // NaN steps stay NaN and end up as a zero step when sampling.
        let mode = match mode {
            SampleMode::Walk { step_fraction } => SampleMode::Walk {
                step_fraction: step_fraction.clamp(0.0, 1.0),
            },
            SampleMode::Uniform => SampleMode::Uniform,
        };

        Self {
            rng,
            mode,
            servo_toggle_probability: if servo_toggle_probability.is_nan() {
                0.0
            } else {
                servo_toggle_probability.clamp(0.0, 1.0)
            },
        }
    }

    fn sample_servo(&mut self, previous: Option<&Reading>) -> ServoState {
        match previous.and_then(Reading::servo_state) {
            Some(state) if self.rng.random_bool(self.servo_toggle_probability) => state.toggle(),
            Some(state) => state,
            None => ServoState::Closed,
        }
    }

    fn sample_scalar(&mut self, channel: &Channel, previous: Option<&Reading>) -> Result<f64, TelemetryError> {
        let range = channel.range;
        if !range.is_valid() {
            return Err(TelemetryError::InvalidRange {
                id: channel.id.clone(),
                min: range.min,
                max: range.max,
            });
        }

        let previous = previous.map(Reading::as_scalar);
        let value = match (self.mode, previous) {
            (SampleMode::Walk { step_fraction }, Some(last)) => {
                let max_step = range.span() * step_fraction;
                let step = if max_step > 0.0 {
                    self.rng.random_range(-max_step..=max_step)
                } else {
                    0.0
                };
                range.clamp(last + step)
            }
            _ => self.rng.random_range(range.min..=range.max),
        };

        Ok(value)
    }
}

impl TelemetrySource for RandomTelemetry {
    fn name(&self) -> &str {
        match self.mode {
            SampleMode::Uniform => "random-uniform",
            SampleMode::Walk { .. } => "random-walk",
        }
    }

    fn sample(&mut self, channel: &Channel, previous: Option<&Reading>) -> Result<Reading, TelemetryError> {
        match channel.kind {
            ChannelKind::Servo => Ok(Reading::Servo(self.sample_servo(previous))),
            _ => self.sample_scalar(channel, previous).map(Reading::Scalar),
        }
    }
}

#[cfg(test)]
use crate::channel::DisplayRange;

#[test]
fn test_uniform_stays_in_range() {
    let channel = Channel::new("tc1", "Temperature 1", ChannelKind::Temperature, DisplayRange::new(-20.0, 120.0));
    let mut source = RandomTelemetry::seeded(7, SampleMode::Uniform, 0.1);

    let mut previous = None;
    for _ in 0..1000 {
        let reading = source.sample(&channel, previous.as_ref()).unwrap();
        assert!(channel.range.contains(reading.as_scalar()));
        previous = Some(reading);
    }
}

#[test]
fn test_walk_steps_are_bounded() {
    let channel = Channel::new("pt1", "Pressure 1", ChannelKind::Pressure, DisplayRange::new(0.0, 100.0));
    let mut source = RandomTelemetry::seeded(42, SampleMode::Walk { step_fraction: 0.05 }, 0.1);

    let mut last = source.sample(&channel, None).unwrap();
    for _ in 0..1000 {
        let next = source.sample(&channel, Some(&last)).unwrap();
        assert!(channel.range.contains(next.as_scalar()));
        assert!((next.as_scalar() - last.as_scalar()).abs() <= 5.0 + 1e-9);
        last = next;
    }
}

#[test]
fn test_servo_toggling() {
    let servo = Channel::servo("sv1", "Main oxidizer valve");

    let mut never = RandomTelemetry::seeded(1, SampleMode::Uniform, 0.0);
    assert_eq!(never.sample(&servo, None).unwrap(), Reading::Servo(ServoState::Closed));
    let open = Reading::Servo(ServoState::Open);
    assert_eq!(never.sample(&servo, Some(&open)).unwrap(), open);

    let mut always = RandomTelemetry::seeded(1, SampleMode::Uniform, 1.0);
    assert_eq!(always.sample(&servo, Some(&open)).unwrap(), Reading::Servo(ServoState::Closed));

    let mut nan = RandomTelemetry::seeded(1, SampleMode::Uniform, f64::NAN);
    assert_eq!(nan.sample(&servo, Some(&open)).unwrap(), open);
}

#[test]
fn test_invalid_range_is_an_error() {
    let channel = Channel::new("ld1", "Load", ChannelKind::Load, DisplayRange::new(10.0, 10.0));
    let mut source = RandomTelemetry::seeded(3, SampleMode::Uniform, 0.1);

    assert!(matches!(
        source.sample(&channel, None),
        Err(TelemetryError::InvalidRange { .. })
    ));
}

#[test]
fn test_overflowing_range_is_an_error() {
    let channel = Channel::new("pt9", "Pressure", ChannelKind::Pressure, DisplayRange::new(-1e308, 1e308));

    let mut uniform = RandomTelemetry::seeded(3, SampleMode::Uniform, 0.1);
    assert!(matches!(
        uniform.sample(&channel, None),
        Err(TelemetryError::InvalidRange { .. })
    ));

    let mut walk = RandomTelemetry::seeded(3, SampleMode::Walk { step_fraction: 0.5 }, 0.1);
    let previous = Reading::Scalar(0.0);
    assert!(matches!(
        walk.sample(&channel, Some(&previous)),
        Err(TelemetryError::InvalidRange { .. })
    ));
}

#[test]
fn test_out_of_bounds_walk_steps_are_clamped() {
    let channel = Channel::new("lc1", "Thrust", ChannelKind::Load, DisplayRange::new(0.0, 5.0));

    for step_fraction in [f64::INFINITY, f64::NAN, -3.0, 40.0] {
        let mut source = RandomTelemetry::seeded(8, SampleMode::Walk { step_fraction }, 0.1);
        let mut last = source.sample(&channel, None).unwrap();
        for _ in 0..100 {
            let next = source.sample(&channel, Some(&last)).unwrap();
            assert!(channel.range.contains(next.as_scalar()));
            last = next;
        }
    }
}

#[test]
fn test_seeded_sources_are_reproducible() {
    let channel = Channel::new("pt2", "Pressure 2", ChannelKind::Pressure, DisplayRange::new(0.0, 70.0));
    let mut a = RandomTelemetry::seeded(99, SampleMode::Uniform, 0.1);
    let mut b = RandomTelemetry::seeded(99, SampleMode::Uniform, 0.1);

    for _ in 0..10 {
        assert_eq!(a.sample(&channel, None).unwrap(), b.sample(&channel, None).unwrap());
    }
}
