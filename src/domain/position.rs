//! Direction, open position and closed trade records.

use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Trade side. `Flat` never describes an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Flat,
    Long,
    Short,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
            Direction::Flat => Direction::Flat,
        }
    }

    /// +1 for Long, -1 for Short, 0 for Flat.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
            Direction::Flat => 0.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Flat => "FLAT",
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        };
        f.write_str(s)
    }
}

/// The engine's single position slot. `Position::default()` is flat.
///
/// A `stop_price` of 0.0 means no stop has been set yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Position {
    pub open: bool,
    pub direction: Direction,
    pub entry_time: Option<DateTime<FixedOffset>>,
    pub entry_price: f64,
    pub size: i64,
    pub stop_price: f64,
    pub max_favorable_ticks: i64,
}

impl Position {
    /// Long exits at or below the stop, Short at or above it. An unset stop never triggers.
    pub fn stop_triggered(&self, close: f64) -> bool {
        if !self.open || self.stop_price == 0.0 {
            return false;
        }
        match self.direction {
            Direction::Long => close <= self.stop_price,
            Direction::Short => close >= self.stop_price,
            Direction::Flat => false,
        }
    }

    pub fn realized_pnl(&self, exit_price: f64) -> f64 {
        if !self.open {
            return 0.0;
        }
        (exit_price - self.entry_price) * self.direction.sign() * self.size as f64
    }
}

/// Immutable record of a closed position.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_time: DateTime<FixedOffset>,
    pub exit_time: DateTime<FixedOffset>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: i64,
    pub direction: Direction,
    pub pnl: f64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_position() -> Position {
        Position {
            open: true,
            direction: Direction::Long,
            entry_time: None,
            entry_price: 100.0,
            size: 2,
            stop_price: 95.0,
            max_favorable_ticks: 0,
        }
    }

    fn short_position() -> Position {
        Position {
            direction: Direction::Short,
            stop_price: 105.0,
            ..long_position()
        }
    }

    #[test]
    fn default_is_flat() {
        let pos = Position::default();
        assert!(!pos.open);
        assert_eq!(pos.direction, Direction::Flat);
        assert_eq!(pos.stop_price, 0.0);
    }

    #[test]
    fn opposite_direction() {
        assert_eq!(Direction::Long.opposite(), Direction::Short);
        assert_eq!(Direction::Short.opposite(), Direction::Long);
        assert_eq!(Direction::Flat.opposite(), Direction::Flat);
    }

    #[test]
    fn stop_long_triggered() {
        let pos = long_position();
        assert!(pos.stop_triggered(94.0));
        assert!(pos.stop_triggered(95.0));
        assert!(!pos.stop_triggered(96.0));
    }

    #[test]
    fn stop_short_triggered() {
        let pos = short_position();
        assert!(pos.stop_triggered(106.0));
        assert!(pos.stop_triggered(105.0));
        assert!(!pos.stop_triggered(104.0));
    }

    #[test]
    fn unset_stop_never_triggers() {
        let mut pos = long_position();
        pos.stop_price = 0.0;
        assert!(!pos.stop_triggered(0.0));
        assert!(!pos.stop_triggered(-10.0));
    }

    #[test]
    fn flat_never_triggers() {
        let pos = Position {
            stop_price: 95.0,
            ..Position::default()
        };
        assert!(!pos.stop_triggered(1.0));
    }

    #[test]
    fn pnl_long_and_short() {
        assert!((long_position().realized_pnl(103.0) - 6.0).abs() < f64::EPSILON);
        assert!((short_position().realized_pnl(103.0) - (-6.0)).abs() < f64::EPSILON);
        assert!((short_position().realized_pnl(97.5) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::Short.sign(), -1.0);
        assert_eq!(Direction::Flat.sign(), 0.0);
    }

    #[test]
    fn pnl_flat_is_zero() {
        assert_eq!(Position::default().realized_pnl(123.0), 0.0);
    }

    #[test]
    fn direction_display() {
        assert_eq!(Direction::Long.to_string(), "LONG");
        assert_eq!(Direction::Flat.to_string(), "FLAT");
    }
}
