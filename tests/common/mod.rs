#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset};
use std::cell::RefCell;
use std::rc::Rc;
use ticksim::domain::engine::Engine;
use ticksim::domain::error::TicksimError;
use ticksim::domain::evaluator::Evaluator;
use ticksim::domain::order::{Fill, Order};
use ticksim::domain::position::Position;
use ticksim::domain::risk::{RiskManager, RiskSettings};
use ticksim::domain::strategy::Strategy;
use ticksim::domain::tick::Tick;
use ticksim::ports::execution_port::ExecutionVenue;

pub fn base_time() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-01-02T09:30:00-05:00").unwrap()
}

/// Flat bar `i` seconds after the base time.
pub fn tick_at(i: i64, close: f64) -> Tick {
    bar_at(base_time() + Duration::seconds(i), close + 0.25, close - 0.25, close)
}

pub fn bar_at(timestamp: DateTime<FixedOffset>, high: f64, low: f64, close: f64) -> Tick {
    Tick {
        timestamp,
        open: close,
        high,
        low,
        close,
        volume: 100,
        bid_ask_delta: 0,
        volume_profile: vec![],
        session: "RTH".into(),
        symbol: "ES".into(),
    }
}

/// Last-trade print `i` seconds after the base time: open, high and low carry
/// the previous print, close is the new one.
pub fn print_at(i: i64, prev: f64, close: f64) -> Tick {
    Tick {
        open: prev,
        ..bar_at(base_time() + Duration::seconds(i), prev, prev, close)
    }
}

/// Consecutive prints one second apart with the given closes.
pub fn ticks(closes: &[f64]) -> Vec<Tick> {
    let mut prev = closes.first().copied().unwrap_or_default();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let t = print_at(i as i64, prev, c);
            prev = c;
            t
        })
        .collect()
}

pub fn risk_settings() -> RiskSettings {
    RiskSettings {
        daily_stop_loss: -500.0,
        per_trade_stop_ticks: 10,
        breakeven_ticks: 5,
        breakeven_plus: 1,
        trailing_ticks: 8,
        tick_size: 1.0,
        max_daily_trades: 0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VenueCall {
    Order(Order),
    Close { price: f64, reason: String },
}

/// Fills at the requested price plus `slippage` and records every call.
pub struct RecordingVenue {
    pub calls: Rc<RefCell<Vec<VenueCall>>>,
    pub slippage: f64,
}

impl RecordingVenue {
    pub fn new() -> (Self, Rc<RefCell<Vec<VenueCall>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                calls: Rc::clone(&calls),
                slippage: 0.0,
            },
            calls,
        )
    }
}

impl ExecutionVenue for RecordingVenue {
    fn place_order(&mut self, order: &Order) -> Result<Fill, TicksimError> {
        self.calls.borrow_mut().push(VenueCall::Order(order.clone()));
        Ok(Fill {
            order_id: format!("REC-{}", self.calls.borrow().len()),
            timestamp: order.timestamp,
            price: order.price + self.slippage,
            size: order.size,
            direction: order.direction,
        })
    }

    fn close_position(
        &mut self,
        position: &Position,
        price: f64,
        reason: &str,
    ) -> Result<Fill, TicksimError> {
        self.calls.borrow_mut().push(VenueCall::Close {
            price,
            reason: reason.to_string(),
        });
        Ok(Fill {
            order_id: format!("REC-{}", self.calls.borrow().len()),
            timestamp: position.entry_time.unwrap_or_else(base_time),
            price,
            size: position.size,
            direction: position.direction.opposite(),
        })
    }
}

/// Refuses entries, closes, or both.
pub struct FailingVenue {
    pub fail_entry: bool,
    pub fail_close: bool,
}

impl ExecutionVenue for FailingVenue {
    fn place_order(&mut self, order: &Order) -> Result<Fill, TicksimError> {
        if self.fail_entry {
            return Err(TicksimError::Execution {
                reason: "order rejected".into(),
            });
        }
        Ok(Fill {
            order_id: "OK".into(),
            timestamp: order.timestamp,
            price: order.price,
            size: order.size,
            direction: order.direction,
        })
    }

    fn close_position(
        &mut self,
        position: &Position,
        price: f64,
        _reason: &str,
    ) -> Result<Fill, TicksimError> {
        if self.fail_close {
            return Err(TicksimError::Execution {
                reason: "close rejected".into(),
            });
        }
        Ok(Fill {
            order_id: "OK".into(),
            timestamp: position.entry_time.unwrap_or_else(base_time),
            price,
            size: position.size,
            direction: position.direction.opposite(),
        })
    }
}

pub fn engine_with(
    strategy: impl Into<Strategy>,
    venue: impl ExecutionVenue + 'static,
    settings: RiskSettings,
) -> Engine {
    Engine::builder()
        .strategy(strategy)
        .venue(venue)
        .evaluator(Evaluator::new())
        .risk(RiskManager::new(settings))
        .symbol("ES")
        .build()
        .unwrap()
}
