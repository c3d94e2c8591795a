//! Tick-driven decision loop.
//!
//! Per tick, in order:
//! 1. reset daily risk accounting on a new calendar day
//! 2. build features
//! 3. with a position open: ratchet its stop, close on a stop hit and stop there
//! 4. ask the strategy for a signal
//! 5. open a position when the signal is directional, risk allows it and the slot is free
//!
//! The engine holds at most one position. Signals that cannot be acted on are
//! dropped without error; venue errors abort the tick and propagate.

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use super::error::TicksimError;
use super::evaluator::{Evaluator, Summary};
use super::features::FeatureEngine;
use super::order::Order;
use super::position::{Direction, Position, Trade};
use super::risk::RiskManager;
use super::strategy::{Signal, Strategy};
use super::tick::Tick;
use crate::ports::execution_port::ExecutionVenue;
use crate::ports::feature_port::FeatureProvider;

pub const STOP_REASON: &str = "stop";

/// Owned copy of the engine state for reporting away from the tick loop.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub position: Position,
    pub summary: Summary,
    pub daily_pnl: f64,
    pub daily_trades: usize,
    pub halted: bool,
}

pub struct Engine {
    strategy: Strategy,
    venue: Box<dyn ExecutionVenue>,
    evaluator: Evaluator,
    risk: RiskManager,
    features: Box<dyn FeatureProvider>,
    trade_size: i64,
    symbol: String,
    position: Position,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn on_tick(&mut self, tick: &Tick) -> Result<(), TicksimError> {
        self.risk.reset_if_new_session(tick);
        let features = self.features.build(tick);

        if self.position.open {
            let before = self.position.stop_price;
            self.risk.update_stops(&mut self.position, tick);
            if self.position.stop_price != before {
                debug!(
                    symbol = %self.symbol,
                    from = before,
                    to = self.position.stop_price,
                    max_favorable_ticks = self.position.max_favorable_ticks,
                    "stop moved"
                );
            }
            if self.position.stop_triggered(tick.close) {
                return self.close_position(tick.timestamp, tick.close, STOP_REASON);
            }
        }

        let Some(signal) = self.strategy.on_tick(tick, &features, &self.position) else {
            return Ok(());
        };
        if signal.direction == Direction::Flat {
            return Ok(());
        }
        if !self.risk.allow_entry() {
            debug!(symbol = %self.symbol, reason = signal.reason, halted = self.risk.halted,
                daily_trades = self.risk.daily_trades, "entry denied by risk");
            return Ok(());
        }
        if self.position.open {
            debug!(symbol = %self.symbol, reason = signal.reason, "signal ignored, position open");
            return Ok(());
        }
        self.open_position(tick, &signal)
    }

    /// Force-close any open position at its own entry price and time.
    pub fn flush(&mut self, reason: &str) -> Result<(), TicksimError> {
        if !self.position.open {
            return Ok(());
        }
        let Some(entry_time) = self.position.entry_time else {
            return Err(TicksimError::Data {
                reason: "open position without entry time".into(),
            });
        };
        self.close_position(entry_time, self.position.entry_price, reason)
    }

    fn open_position(&mut self, tick: &Tick, signal: &Signal) -> Result<(), TicksimError> {
        let order = Order::market(tick.timestamp, signal.direction, self.trade_size, tick.close);
        let fill = self.venue.place_order(&order)?;

        self.position = Position {
            open: true,
            direction: signal.direction,
            entry_time: Some(tick.timestamp),
            entry_price: fill.price,
            size: fill.size,
            stop_price: 0.0,
            max_favorable_ticks: 0,
        };
        self.risk.record_entry();
        info!(
            symbol = %self.symbol,
            direction = %signal.direction,
            price = fill.price,
            size = fill.size,
            order_id = %fill.order_id,
            reason = signal.reason,
            confidence = signal.confidence,
            "position opened"
        );
        Ok(())
    }

    fn close_position(
        &mut self,
        exit_time: DateTime<FixedOffset>,
        price: f64,
        reason: &str,
    ) -> Result<(), TicksimError> {
        if !self.position.open {
            return Ok(());
        }
        let fill = self.venue.close_position(&self.position, price, reason)?;
        let pnl = self.position.realized_pnl(fill.price);

        let trade = Trade {
            entry_time: self.position.entry_time.unwrap_or(exit_time),
            exit_time,
            entry_price: self.position.entry_price,
            exit_price: fill.price,
            size: self.position.size,
            direction: self.position.direction,
            pnl,
            reason: reason.to_string(),
        };
        info!(
            symbol = %self.symbol,
            direction = %trade.direction,
            entry = trade.entry_price,
            exit = trade.exit_price,
            pnl,
            reason,
            "position closed"
        );
        self.evaluator.record(trade);
        self.risk.apply_daily_pnl(pnl);
        self.position = Position::default();
        Ok(())
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn summary(&self) -> Summary {
        self.evaluator.summary()
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn risk(&self) -> &RiskManager {
        &self.risk
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            position: self.position.clone(),
            summary: self.evaluator.summary(),
            daily_pnl: self.risk.daily_pnl,
            daily_trades: self.risk.daily_trades,
            halted: self.risk.halted,
        }
    }
}

/// Collects the engine's collaborators. `build` refuses to produce an engine
/// unless strategy, venue, evaluator and risk manager are all bound.
pub struct EngineBuilder {
    strategy: Option<Strategy>,
    venue: Option<Box<dyn ExecutionVenue>>,
    evaluator: Option<Evaluator>,
    risk: Option<RiskManager>,
    features: Box<dyn FeatureProvider>,
    trade_size: i64,
    symbol: String,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        EngineBuilder {
            strategy: None,
            venue: None,
            evaluator: None,
            risk: None,
            features: Box::new(FeatureEngine::default()),
            trade_size: 1,
            symbol: String::new(),
        }
    }
}

impl EngineBuilder {
    pub fn strategy(mut self, strategy: impl Into<Strategy>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    pub fn venue(mut self, venue: impl ExecutionVenue + 'static) -> Self {
        self.venue = Some(Box::new(venue));
        self
    }

    pub fn evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn risk(mut self, risk: RiskManager) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn features(mut self, features: impl FeatureProvider + 'static) -> Self {
        self.features = Box::new(features);
        self
    }

    pub fn trade_size(mut self, size: i64) -> Self {
        self.trade_size = size;
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn validate(&self) -> Result<(), TicksimError> {
        if self.strategy.is_none() {
            return Err(TicksimError::MissingCollaborator { name: "strategy" });
        }
        if self.venue.is_none() {
            return Err(TicksimError::MissingCollaborator { name: "execution venue" });
        }
        if self.evaluator.is_none() {
            return Err(TicksimError::MissingCollaborator { name: "evaluator" });
        }
        if self.risk.is_none() {
            return Err(TicksimError::MissingCollaborator { name: "risk manager" });
        }
        Ok(())
    }

    pub fn build(self) -> Result<Engine, TicksimError> {
        self.validate()?;
        let (Some(strategy), Some(venue), Some(evaluator), Some(risk)) =
            (self.strategy, self.venue, self.evaluator, self.risk)
        else {
            return Err(TicksimError::MissingCollaborator { name: "engine collaborators" });
        };
        Ok(Engine {
            strategy,
            venue,
            evaluator,
            risk,
            features: self.features,
            trade_size: self.trade_size,
            symbol: self.symbol,
            position: Position::default(),
        })
    }
}
