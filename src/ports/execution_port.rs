//! Execution venue port trait.

use crate::domain::error::TicksimError;
use crate::domain::order::{Fill, Order};
use crate::domain::position::Position;

/// A venue that fills synchronously or refuses. Errors are surfaced as
/// [`TicksimError::Execution`] and are never retried by the engine.
pub trait ExecutionVenue {
    fn place_order(&mut self, order: &Order) -> Result<Fill, TicksimError>;

    fn close_position(
        &mut self,
        position: &Position,
        price: f64,
        reason: &str,
    ) -> Result<Fill, TicksimError>;
}
