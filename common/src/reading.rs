use serde::{Deserialize, Serialize};

/// Position of a servo valve.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ServoState {
    #[default]
    Closed,
    Open,
}

impl ServoState {
    pub fn toggle(self) -> Self {
        match self {
            ServoState::Closed => ServoState::Open,
            ServoState::Open => ServoState::Closed,
        }
    }

    pub fn is_open(self) -> bool {
        self == ServoState::Open
    }

    pub fn label(self) -> &'static str {
        match self {
            ServoState::Closed => "CLOSED",
            ServoState::Open => "OPEN",
        }
    }
}

impl From<bool> for ServoState {
    fn from(open: bool) -> Self {
        if open {
            ServoState::Open
        } else {
            ServoState::Closed
        }
    }
}

/// The latest value of a channel.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum Reading {
    Scalar(f64),
    Servo(ServoState),
}

impl Reading {
    /// The value used for plotting. Servos plot as 1.0 when open and 0.0 when closed.
    pub fn as_scalar(&self) -> f64 {
        match self {
            Reading::Scalar(value) => *value,
            Reading::Servo(state) => {
                if state.is_open() {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn servo_state(&self) -> Option<ServoState> {
        match self {
            Reading::Servo(state) => Some(*state),
            Reading::Scalar(_) => None,
        }
    }

    /// Text shown in a readout, e.g. `12.50 bar` or `OPEN`.
    pub fn display(&self, unit: &str, decimals: usize) -> String {
        match self {
            Reading::Scalar(value) if unit.is_empty() => format!("{value:.decimals$}"),
            Reading::Scalar(value) => format!("{value:.decimals$} {unit}"),
            Reading::Servo(state) => state.label().to_string(),
        }
    }
}

#[test]
fn test_reading_display() {
    assert_eq!(Reading::Scalar(12.5).display("bar", 2), "12.50 bar");
    assert_eq!(Reading::Scalar(3.14159).display("", 1), "3.1");
    assert_eq!(Reading::Servo(ServoState::Open).display("", 2), "OPEN");
}

#[test]
fn test_servo_plot_value() {
    assert_eq!(Reading::Servo(ServoState::Open).as_scalar(), 1.0);
    assert_eq!(Reading::Servo(ServoState::Closed).as_scalar(), 0.0);
    assert_eq!(ServoState::Closed.toggle(), ServoState::Open);
    assert_eq!(ServoState::from(false), ServoState::Closed);
}
