//! Per-tick feature generation.
//!
//! A [`FeatureEngine`] runs an ordered list of generators over each tick and
//! merges their outputs into a single [`FeatureSet`]. Later generators overwrite
//! earlier ones on key collisions.

use chrono::Timelike;
use std::collections::VecDeque;
use std::f64::consts::PI;

use super::tick::{FeatureSet, Tick};
use crate::ports::feature_port::FeatureProvider;

pub const DEFAULT_WINDOW: usize = 20;

/// Rolling price/volume features over the last `window` ticks.
#[derive(Debug, Clone)]
pub struct OhlcvGenerator {
    pub window: usize,
    closes: VecDeque<f64>,
    volumes: VecDeque<i64>,
}

impl OhlcvGenerator {
    /// A window of 0 keeps the full history.
    pub fn new(window: usize) -> Self {
        OhlcvGenerator {
            window,
            closes: VecDeque::new(),
            volumes: VecDeque::new(),
        }
    }

    fn generate(&mut self, tick: &Tick, out: &mut FeatureSet) {
        self.closes.push_back(tick.close);
        self.volumes.push_back(tick.volume);
        if self.window > 0 {
            while self.closes.len() > self.window {
                self.closes.pop_front();
                self.volumes.pop_front();
            }
        }
        let sma = self.closes.iter().sum::<f64>() / self.closes.len() as f64;
        // integer mean, truncated
        let vol_sma = self.volumes.iter().sum::<i64>() / self.volumes.len() as i64;

        out.insert("ohlcv_close", tick.close);
        out.insert("ohlcv_range", tick.range());
        out.insert("ohlcv_body", tick.close - tick.open);
        out.insert("ohlcv_sma", sma);
        out.insert("ohlcv_sma_dist", tick.close - sma);
        out.insert("ohlcv_vol_sma", vol_sma as f64);
    }
}

#[derive(Debug, Clone)]
pub enum FeatureGenerator {
    Ohlcv(OhlcvGenerator),
    Delta,
    VolumeProfile,
    Session,
    TimeOfDay,
}

impl FeatureGenerator {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureGenerator::Ohlcv(_) => "ohlcv",
            FeatureGenerator::Delta => "delta",
            FeatureGenerator::VolumeProfile => "volume_profile",
            FeatureGenerator::Session => "session",
            FeatureGenerator::TimeOfDay => "time",
        }
    }

    pub fn generate(&mut self, tick: &Tick, out: &mut FeatureSet) {
        match self {
            FeatureGenerator::Ohlcv(g) => g.generate(tick, out),
            FeatureGenerator::Delta => {
                let delta = tick.bid_ask_delta as f64;
                out.insert("delta_raw", delta);
                out.insert("delta_norm", delta / (tick.volume as f64).max(1.0));
            }
            FeatureGenerator::VolumeProfile => {
                let (levels, skew) = profile_skew(tick);
                out.insert("vp_levels", levels);
                out.insert("vp_skew", skew);
            }
            FeatureGenerator::Session => {
                let key = match tick.session.as_str() {
                    "RTH" => "session_rth",
                    "ETH" => "session_eth",
                    _ => "session_other",
                };
                out.insert(key, 1.0);
            }
            FeatureGenerator::TimeOfDay => {
                let seconds = tick.timestamp.naive_utc().time().num_seconds_from_midnight();
                let angle = 2.0 * PI * (seconds as f64 / 86_400.0);
                out.insert("tod_sin", angle.sin());
                out.insert("tod_cos", angle.cos());
            }
        }
    }
}

/// (level count, skew) where skew is the distance of the volume-weighted price
/// from the middle of the profile's price range, normalized by that range.
fn profile_skew(tick: &Tick) -> (f64, f64) {
    let profile = &tick.volume_profile;
    if profile.is_empty() {
        return (0.0, 0.0);
    }
    let mut total_volume = 0i64;
    let mut weighted = 0.0;
    let mut min = profile[0].price;
    let mut max = profile[0].price;
    for level in profile {
        total_volume += level.volume;
        weighted += level.price * level.volume as f64;
        min = min.min(level.price);
        max = max.max(level.price);
    }
    let mean = weighted / (total_volume as f64).max(1.0);
    let mid = (min + max) / 2.0;
    let skew = (mean - mid) / (max - min).max(0.0001);
    (profile.len() as f64, skew)
}

#[derive(Debug, Clone, Default)]
pub struct FeatureEngine {
    pub generators: Vec<FeatureGenerator>,
}

impl FeatureEngine {
    pub fn new(generators: Vec<FeatureGenerator>) -> Self {
        FeatureEngine { generators }
    }

    /// All built-in generators, OHLCV over `window` ticks.
    pub fn standard(window: usize) -> Self {
        FeatureEngine::new(vec![
            FeatureGenerator::Ohlcv(OhlcvGenerator::new(window)),
            FeatureGenerator::Delta,
            FeatureGenerator::VolumeProfile,
            FeatureGenerator::Session,
            FeatureGenerator::TimeOfDay,
        ])
    }
}

impl FeatureProvider for FeatureEngine {
    fn build(&mut self, tick: &Tick) -> FeatureSet {
        let mut out = FeatureSet::new(tick.timestamp);
        for generator in &mut self.generators {
            generator.generate(tick, &mut out);
        }
        out
    }
}
