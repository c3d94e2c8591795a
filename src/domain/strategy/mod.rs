//! Signal generators.
//!
//! The set of strategies is closed:
//! - `Breakout`: range breakout over the last N ticks
//! - `MeanReversion`: z-score fade over a rolling window of closes
//! - `DeltaTrend`: order-flow delta aligned with volume-profile skew
//!
//! Every variant owns its rolling state, stays silent until warm, and never
//! signals while a position is open.

pub mod breakout;
pub mod delta_trend;
pub mod mean_reversion;

use chrono::{DateTime, FixedOffset};
use std::fmt;

use super::position::{Direction, Position};
use super::tick::{FeatureSet, Tick};

pub use breakout::{BreakoutConfig, BreakoutStrategy};
pub use delta_trend::{DeltaTrendConfig, DeltaTrendStrategy};
pub use mean_reversion::{MeanReversionConfig, MeanReversionStrategy};

/// Directional recommendation for the current tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub timestamp: DateTime<FixedOffset>,
    pub direction: Direction,
    pub confidence: f64,
    pub reason: &'static str,
}

impl Signal {
    pub(crate) fn new(
        tick: &Tick,
        direction: Direction,
        confidence: f64,
        reason: &'static str,
    ) -> Self {
        Signal {
            timestamp: tick.timestamp,
            direction,
            confidence,
            reason,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Strategy {
    Breakout(BreakoutStrategy),
    MeanReversion(MeanReversionStrategy),
    DeltaTrend(DeltaTrendStrategy),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Breakout(_) => "breakout",
            Strategy::MeanReversion(_) => "mean_reversion",
            Strategy::DeltaTrend(_) => "delta_trend",
        }
    }

    pub fn on_tick(
        &mut self,
        tick: &Tick,
        features: &FeatureSet,
        position: &Position,
    ) -> Option<Signal> {
        match self {
            Strategy::Breakout(s) => s.on_tick(tick, position),
            Strategy::MeanReversion(s) => s.on_tick(tick, position),
            Strategy::DeltaTrend(s) => s.on_tick(tick, features, position),
        }
    }
}

impl From<BreakoutConfig> for Strategy {
    fn from(config: BreakoutConfig) -> Self {
        Strategy::Breakout(BreakoutStrategy::new(config))
    }
}

impl From<MeanReversionConfig> for Strategy {
    fn from(config: MeanReversionConfig) -> Self {
        Strategy::MeanReversion(MeanReversionStrategy::new(config))
    }
}

impl From<DeltaTrendConfig> for Strategy {
    fn from(config: DeltaTrendConfig) -> Self {
        Strategy::DeltaTrend(DeltaTrendStrategy::new(config))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Breakout(s) => write!(
                f,
                "breakout(lookback={}, min_range={}, confidence={})",
                s.config.lookback, s.config.min_range, s.config.confidence
            ),
            Strategy::MeanReversion(s) => write!(
                f,
                "mean_reversion(lookback={}, z_threshold={})",
                s.config.lookback, s.config.z_threshold
            ),
            Strategy::DeltaTrend(s) => write!(
                f,
                "delta_trend(delta_threshold={}, profile_skew={}, min_volume={})",
                s.config.delta_threshold, s.config.profile_skew, s.config.min_volume
            ),
        }
    }
}
