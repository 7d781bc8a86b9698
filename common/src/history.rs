use std::collections::VecDeque;
use std::fmt::Write;

use crate::channel::DisplayRange;

/// Side length of the square viewbox the chart path is drawn in.
pub const VIEWBOX: f64 = 100.0;

/// A bounded buffer of the most recent plot values of one channel.
#[derive(Clone, Debug, PartialEq)]
pub struct History {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl History {
    /// Creates an empty history. Capacities below 2 are raised to 2 so a line can be drawn.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends a sample, dropping the oldest one when the buffer is full.
    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn min(&self) -> Option<f64> {
        self.iter().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.iter().reduce(f64::max)
    }

    /// Renders the samples as path commands (`M x y L x y ...`) inside a
    /// [`VIEWBOX`]-sized square. The newest sample sits at the right edge and
    /// `range.max` maps to the top.
    pub fn path_commands(&self, range: DisplayRange) -> String {
        let y_of = |value: f64| VIEWBOX * (1.0 - range.fraction(value));

        match self.samples.len() {
            0 => format!("M 0 {VIEWBOX} L {VIEWBOX} {VIEWBOX}"),
            1 => {
                let y = y_of(self.samples[0]);
                format!("M 0 {y:.2} L {VIEWBOX} {y:.2}")
            }
            len => {
                let step = VIEWBOX / (self.capacity - 1) as f64;
                // Right-align so a partially filled history grows from the right edge.
                let offset = (self.capacity - len) as f64 * step;

                let mut commands = String::with_capacity(len * 16);
                for (i, value) in self.iter().enumerate() {
                    let x = offset + i as f64 * step;
                    let verb = if i == 0 { 'M' } else { 'L' };
                    if i > 0 {
                        commands.push(' ');
                    }
                    // String writes are infallible.
                    let _ = write!(commands, "{verb} {x:.2} {:.2}", y_of(value));
                }
                commands
            }
        }
    }
}

#[cfg(test)]
fn points(commands: &str) -> Vec<(f64, f64)> {
    let tokens: Vec<&str> = commands.split_whitespace().collect();
    tokens
        .chunks(3)
        .map(|chunk| (chunk[1].parse().unwrap(), chunk[2].parse().unwrap()))
        .collect()
}

#[test]
fn test_history_evicts_oldest() {
    let mut history = History::new(3);
    for value in [1.0, 2.0, 3.0, 4.0] {
        history.push(value);
    }

    assert_eq!(history.len(), 3);
    assert_eq!(history.iter().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
    assert_eq!(history.latest(), Some(4.0));
    assert_eq!(history.min(), Some(2.0));
    assert_eq!(history.max(), Some(4.0));
}

#[test]
fn test_history_minimum_capacity() {
    let mut history = History::new(0);
    for value in [1.0, 2.0, 3.0] {
        history.push(value);
    }
    assert_eq!(history.iter().collect::<Vec<_>>(), vec![2.0, 3.0]);
}

#[test]
fn test_path_commands_inside_viewbox() {
    let range = DisplayRange::new(0.0, 50.0);
    let mut history = History::new(5);
    for value in [0.0, 25.0, 50.0, 80.0, -3.0] {
        history.push(value);
    }

    let commands = history.path_commands(range);
    assert!(commands.starts_with("M 0.00 100.00"));

    let points = points(&commands);
    assert_eq!(points.len(), 5);
    assert_eq!(points[1], (25.0, 50.0));
    assert_eq!(points[2], (50.0, 0.0));
    assert_eq!(points[3], (75.0, 0.0));
    assert_eq!(points[4], (100.0, 100.0));
    for (x, y) in points {
        assert!((0.0..=VIEWBOX).contains(&x));
        assert!((0.0..=VIEWBOX).contains(&y));
    }
}

#[test]
fn test_path_commands_partial_history_is_right_aligned() {
    let mut history = History::new(5);
    history.push(0.0);
    history.push(1.0);

    let points = points(&history.path_commands(DisplayRange::default()));
    assert_eq!(points, vec![(75.0, 100.0), (100.0, 0.0)]);
}

#[test]
fn test_path_commands_degenerate_histories() {
    let range = DisplayRange::new(0.0, 10.0);
    let mut history = History::new(4);
    assert_eq!(history.path_commands(range), "M 0 100 L 100 100");

    history.push(5.0);
    assert_eq!(history.path_commands(range), "M 0 50.00 L 100 50.00");
}
