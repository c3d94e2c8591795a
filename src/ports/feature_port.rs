//! Feature provider port trait.

use crate::domain::tick::{FeatureSet, Tick};

/// Produces the feature mapping handed to the strategy. Called exactly once per tick.
pub trait FeatureProvider {
    fn build(&mut self, tick: &Tick) -> FeatureSet;
}
