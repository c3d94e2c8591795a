//! In-process execution venue that fills everything immediately.

use crate::domain::error::TicksimError;
use crate::domain::order::{Fill, Order};
use crate::domain::position::Position;
use crate::ports::execution_port::ExecutionVenue;

/// Fills market orders at the requested price and size. Order ids are
/// `MOCK-<n>` for entries and `MOCK-CLOSE-<n>` for closes, numbered from one
/// counter per broker.
#[derive(Debug, Default)]
pub struct MockBroker {
    counter: u64,
    last_fill: Option<Fill>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_fill(&self) -> Option<&Fill> {
        self.last_fill.as_ref()
    }
}

impl ExecutionVenue for MockBroker {
    fn place_order(&mut self, order: &Order) -> Result<Fill, TicksimError> {
        if order.size <= 0 {
            return Err(TicksimError::Execution {
                reason: format!("order size must be positive, got {}", order.size),
            });
        }
        self.counter += 1;
        let fill = Fill {
            order_id: format!("MOCK-{}", self.counter),
            timestamp: order.timestamp,
            price: order.price,
            size: order.size,
            direction: order.direction,
        };
        self.last_fill = Some(fill.clone());
        Ok(fill)
    }

    fn close_position(
        &mut self,
        position: &Position,
        price: f64,
        _reason: &str,
    ) -> Result<Fill, TicksimError> {
        let Some(timestamp) = position.entry_time else {
            return Err(TicksimError::Execution {
                reason: "cannot close a position that was never opened".into(),
            });
        };
        self.counter += 1;
        let fill = Fill {
            order_id: format!("MOCK-CLOSE-{}", self.counter),
            timestamp,
            price,
            size: position.size,
            direction: position.direction.opposite(),
        };
        self.last_fill = Some(fill.clone());
        Ok(fill)
    }
}
