//! Order-flow trend: trade with the delta when the volume profile leans the same way.
//!
//! Reads the `delta_norm`, `vp_skew` and `ohlcv_vol_sma` features; holds no state.

use super::Signal;
use crate::domain::position::{Direction, Position};
use crate::domain::tick::{FeatureSet, Tick};

pub const DELTA_FEATURE: &str = "delta_norm";
pub const SKEW_FEATURE: &str = "vp_skew";
pub const VOLUME_FEATURE: &str = "ohlcv_vol_sma";

const CONFIDENCE: f64 = 0.65;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeltaTrendConfig {
    pub delta_threshold: f64,
    pub profile_skew: f64,
    pub min_volume: f64,
}

#[derive(Debug, Clone)]
pub struct DeltaTrendStrategy {
    pub config: DeltaTrendConfig,
}

impl DeltaTrendStrategy {
    pub fn new(config: DeltaTrendConfig) -> Self {
        DeltaTrendStrategy { config }
    }

    pub fn on_tick(
        &mut self,
        tick: &Tick,
        features: &FeatureSet,
        position: &Position,
    ) -> Option<Signal> {
        if position.open {
            return None;
        }
        let delta = features.get(DELTA_FEATURE);
        let skew = features.get(SKEW_FEATURE);
        if features.get(VOLUME_FEATURE) < self.config.min_volume {
            return None;
        }

        let c = &self.config;
        if delta >= c.delta_threshold && skew >= c.profile_skew {
            Some(Signal::new(tick, Direction::Long, CONFIDENCE, "delta_profile_long"))
        } else if delta <= -c.delta_threshold && skew <= -c.profile_skew {
            Some(Signal::new(tick, Direction::Short, CONFIDENCE, "delta_profile_short"))
        } else {
            None
        }
    }
}
