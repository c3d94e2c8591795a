//! Order requests and fills exchanged with an execution venue.

use chrono::{DateTime, FixedOffset};

use super::position::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderType {
    #[default]
    Market,
    Limit,
}

/// A request to the execution venue. `id` is empty until the venue assigns one.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub timestamp: DateTime<FixedOffset>,
    pub direction: Direction,
    pub size: i64,
    pub order_type: OrderType,
    pub price: f64,
}

impl Order {
    pub fn market(
        timestamp: DateTime<FixedOffset>,
        direction: Direction,
        size: i64,
        price: f64,
    ) -> Self {
        Order {
            id: String::new(),
            timestamp,
            direction,
            size,
            order_type: OrderType::Market,
            price,
        }
    }
}

/// What the venue actually booked.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub order_id: String,
    pub timestamp: DateTime<FixedOffset>,
    pub price: f64,
    pub size: i64,
    pub direction: Direction,
}
