//! Tick source port trait.

use std::sync::mpsc::Receiver;

use crate::domain::error::TicksimError;
use crate::domain::tick::Tick;

/// Ticks delivered one at a time by a producer thread. The channel has no buffer,
/// so the producer waits until each tick is taken. A producer failure arrives as
/// the last item.
pub type TickStream = Receiver<Result<Tick, TicksimError>>;

pub trait TickSource {
    fn load_all(&self) -> Result<Vec<Tick>, TicksimError>;

    fn stream(&self) -> TickStream;
}
