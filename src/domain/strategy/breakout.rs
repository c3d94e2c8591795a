//! Range breakout.
//!
//! The window holds the last `lookback` ticks, the current one included. Long when
//! the close clears the window's highest high, Short when it breaks the lowest low,
//! provided that range is at least `min_range`. A bar whose own high or low brackets
//! its close can therefore never signal.
//! Confidence = min(0.99, base + range * 0.01).

use std::collections::VecDeque;

use super::Signal;
use crate::domain::position::{Direction, Position};
use crate::domain::tick::Tick;

pub const DEFAULT_LOOKBACK: usize = 20;
pub const DEFAULT_CONFIDENCE: f64 = 0.55;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BreakoutConfig {
    /// 0 falls back to [`DEFAULT_LOOKBACK`].
    pub lookback: usize,
    pub min_range: f64,
    /// Base confidence; non-positive falls back to [`DEFAULT_CONFIDENCE`].
    pub confidence: f64,
}

impl BreakoutConfig {
    pub fn effective_lookback(&self) -> usize {
        if self.lookback == 0 {
            DEFAULT_LOOKBACK
        } else {
            self.lookback
        }
    }
}

#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    pub config: BreakoutConfig,
    window: VecDeque<(f64, f64)>,
}

impl BreakoutStrategy {
    pub fn new(config: BreakoutConfig) -> Self {
        let cap = config.effective_lookback();
        BreakoutStrategy {
            config,
            window: VecDeque::with_capacity(cap),
        }
    }

    pub fn on_tick(&mut self, tick: &Tick, position: &Position) -> Option<Signal> {
        let lookback = self.config.effective_lookback();
        self.window.push_back((tick.high, tick.low));
        while self.window.len() > lookback {
            self.window.pop_front();
        }

        let (high, low) = self.window_range(lookback)?;
        let range = high - low;
        if range < self.config.min_range || position.open {
            return None;
        }

        if tick.close > high {
            Some(Signal::new(tick, Direction::Long, self.confidence(range), "range_break_high"))
        } else if tick.close < low {
            Some(Signal::new(tick, Direction::Short, self.confidence(range), "range_break_low"))
        } else {
            None
        }
    }

    fn window_range(&self, lookback: usize) -> Option<(f64, f64)> {
        if self.window.len() < lookback {
            return None;
        }
        let high = self.window.iter().map(|w| w.0).fold(f64::MIN, f64::max);
        let low = self.window.iter().map(|w| w.1).fold(f64::MAX, f64::min);
        Some((high, low))
    }

    fn confidence(&self, range: f64) -> f64 {
        let base = if self.config.confidence <= 0.0 {
            DEFAULT_CONFIDENCE
        } else {
            self.config.confidence
        };
        (base + range * 0.01).min(0.99)
    }
}
