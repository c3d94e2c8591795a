//! Z-score fade over a rolling window of closes (population standard deviation).

use std::collections::VecDeque;

use super::Signal;
use crate::domain::position::{Direction, Position};
use crate::domain::tick::Tick;

pub const DEFAULT_LOOKBACK: usize = 30;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeanReversionConfig {
    /// 0 falls back to [`DEFAULT_LOOKBACK`].
    pub lookback: usize,
    pub z_threshold: f64,
}

impl MeanReversionConfig {
    pub fn effective_lookback(&self) -> usize {
        if self.lookback == 0 {
            DEFAULT_LOOKBACK
        } else {
            self.lookback
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeanReversionStrategy {
    pub config: MeanReversionConfig,
    closes: VecDeque<f64>,
}

impl MeanReversionStrategy {
    pub fn new(config: MeanReversionConfig) -> Self {
        let cap = config.effective_lookback() + 1;
        MeanReversionStrategy {
            config,
            closes: VecDeque::with_capacity(cap),
        }
    }

    pub fn on_tick(&mut self, tick: &Tick, position: &Position) -> Option<Signal> {
        let lookback = self.config.effective_lookback();
        self.closes.push_back(tick.close);
        while self.closes.len() > lookback {
            self.closes.pop_front();
        }
        if self.closes.len() < lookback {
            return None;
        }

        let (mean, std) = mean_std(self.closes.iter().copied());
        if std == 0.0 || position.open {
            return None;
        }
        let z = (tick.close - mean) / std;
        let confidence = (0.6 + z.abs() * 0.05).min(0.9);

        if z > self.config.z_threshold {
            Some(Signal::new(tick, Direction::Short, confidence, "zscore_high"))
        } else if z < -self.config.z_threshold {
            Some(Signal::new(tick, Direction::Long, confidence, "zscore_low"))
        } else {
            None
        }
    }
}

/// Mean and population standard deviation; (0, 0) for an empty input.
pub fn mean_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let variance = values
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / n as f64;
    (mean, variance.sqrt())
}
