//! Market tick and feature set representation.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single level in a volume profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub volume: i64,
}

/// One timestamped market observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub bid_ask_delta: i64,
    #[serde(default)]
    pub volume_profile: Vec<PriceLevel>,
    #[serde(default)]
    pub session: String,
    #[serde(default)]
    pub symbol: String,
}

impl Tick {
    /// Calendar day of the tick in its own offset.
    pub fn session_day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// high - low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Flat collection of named scalar features computed for a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub timestamp: DateTime<FixedOffset>,
    pub values: HashMap<String, f64>,
}

impl FeatureSet {
    pub fn new(timestamp: DateTime<FixedOffset>) -> Self {
        FeatureSet {
            timestamp,
            values: HashMap::new(),
        }
    }

    /// Value of a feature, 0.0 when absent.
    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }
}
