//! Window walks that supply time ranges to the primitives.
//!
//! Windows are closed and one second apart: a backward walk continues with
//! `to = previous.from - 1s`, a forward walk with `from = previous.to + 1s`.

use chrono::{DateTime, Duration, Utc};

/// A closed time range `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        TimeWindow { from, to }
    }

    /// The window of `length` ending at `to`.
    pub fn ending_at(to: DateTime<Utc>, length: Duration) -> Self {
        TimeWindow { from: to - length, to }
    }
}

/// Walks backward from an anchor while the window's upper bound is after `floor`.
#[derive(Debug, Clone)]
pub struct BackwardWalk {
    next: TimeWindow,
    length: Duration,
    floor: DateTime<Utc>,
}

impl BackwardWalk {
    pub fn new(end: DateTime<Utc>, floor: DateTime<Utc>, length: Duration) -> Self {
        BackwardWalk {
            next: TimeWindow::ending_at(end, length),
            length,
            floor,
        }
    }
}

impl Iterator for BackwardWalk {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<TimeWindow> {
        if self.next.to <= self.floor {
            return None;
        }
        let current = self.next;
        self.next = TimeWindow::ending_at(current.from - Duration::seconds(1), self.length);
        Some(current)
    }
}

/// Walks forward from a start while the window's upper bound is before `ceiling`.
///
/// A trailing partial window is never produced.
#[derive(Debug, Clone)]
pub struct ForwardWalk {
    next: TimeWindow,
    length: Duration,
    ceiling: DateTime<Utc>,
}

impl ForwardWalk {
    pub fn new(start: DateTime<Utc>, ceiling: DateTime<Utc>, length: Duration) -> Self {
        ForwardWalk {
            next: TimeWindow::new(start, start + length),
            length,
            ceiling,
        }
    }
}

impl Iterator for ForwardWalk {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<TimeWindow> {
        if self.next.to >= self.ceiling {
            return None;
        }
        let current = self.next;
        let from = current.to + Duration::seconds(1);
        self.next = TimeWindow::new(from, from + self.length);
        Some(current)
    }
}
