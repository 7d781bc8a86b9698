use serde::{Deserialize, Serialize};

/// What a channel measures.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Temperature,
    Pressure,
    Load,
    Servo,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 4] = [
        ChannelKind::Pressure,
        ChannelKind::Temperature,
        ChannelKind::Load,
        ChannelKind::Servo,
    ];

    /// Human readable name, used as panel heading.
    pub fn label(&self) -> &'static str {
        match self {
            ChannelKind::Temperature => "Temperature",
            ChannelKind::Pressure => "Pressure",
            ChannelKind::Load => "Load",
            ChannelKind::Servo => "Servo",
        }
    }

    /// Unit assumed when a channel does not name one.
    pub fn default_unit(&self) -> &'static str {
        match self {
            ChannelKind::Temperature => "°C",
            ChannelKind::Pressure => "bar",
            ChannelKind::Load => "kN",
            ChannelKind::Servo => "",
        }
    }

    pub fn is_servo(&self) -> bool {
        matches!(self, ChannelKind::Servo)
    }
}

/// The range a rendered value is allowed to occupy.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DisplayRange {
    pub min: f64,
    pub max: f64,
}

impl Default for DisplayRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl DisplayRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Both ends finite, `min < max` and a span that does not overflow.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max && self.span().is_finite()
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Limits `value` to the range. NaN is pinned to the lower end.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.max(self.min).min(self.max)
    }

    /// Where `value` sits inside the range, from 0.0 (min) to 1.0 (max).
    pub fn fraction(&self, value: f64) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        (self.clamp(value) - self.min) / self.span()
    }
}

/// A named measurement slot on the dashboard.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub kind: ChannelKind,

    /// Falls back to [`ChannelKind::default_unit`] when left empty.
    #[serde(default)]
    pub unit: String,

    #[serde(default)]
    pub range: DisplayRange,
}

impl Channel {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: ChannelKind, range: DisplayRange) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            unit: kind.default_unit().to_string(),
            range,
        }
    }

    /// A servo valve; its range is the 0..1 plot band of closed/open.
    pub fn servo(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, title, ChannelKind::Servo, DisplayRange::default())
    }

    pub fn unit(&self) -> &str {
        if self.unit.is_empty() {
            self.kind.default_unit()
        } else {
            &self.unit
        }
    }
}

#[test]
fn test_clamp_and_fraction() {
    let range = DisplayRange::new(-10.0, 30.0);

    assert_eq!(range.clamp(45.0), 30.0);
    assert_eq!(range.clamp(-20.0), -10.0);
    assert_eq!(range.clamp(f64::NAN), -10.0);
    assert_eq!(range.fraction(10.0), 0.5);
    assert_eq!(range.fraction(100.0), 1.0);
    assert!(range.contains(30.0));
    assert!(!range.contains(30.1));
}

#[test]
fn test_invalid_ranges() {
    assert!(!DisplayRange::new(5.0, 5.0).is_valid());
    assert!(!DisplayRange::new(5.0, 1.0).is_valid());
    assert!(!DisplayRange::new(0.0, f64::INFINITY).is_valid());
    assert!(!DisplayRange::new(-1e308, 1e308).is_valid());
    assert_eq!(DisplayRange::new(5.0, 1.0).fraction(3.0), 0.0);
}

#[test]
fn test_channel_unit_fallback() {
    let json = r#"{ "id": "pt1", "title": "Pressure 1", "kind": "pressure", "range": { "min": 0, "max": 70 } }"#;
    let channel: Channel = serde_json::from_str(json).unwrap();

    assert_eq!(channel.kind, ChannelKind::Pressure);
    assert_eq!(channel.unit(), "bar");

    let servo: Channel = serde_json::from_str(r#"{ "id": "v1", "title": "Main valve", "kind": "servo" }"#).unwrap();
    assert_eq!(servo.range, DisplayRange::default());
    assert_eq!(servo.unit(), "");
}
