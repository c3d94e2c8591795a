//! Stop management and daily risk limits.
//!
//! Stops are evaluated in a fixed order on every tick while a position is open:
//! 1. fixed stop at `entry ∓ per_trade_stop_ticks * tick_size`, only while unset
//! 2. breakeven once the best excursion reaches `breakeven_ticks`
//! 3. trailing once the best excursion reaches `trailing_ticks`
//!
//! Breakeven and trailing candidates only replace the current stop when they are
//! more favorable, so a set stop ratchets toward the market and never loosens.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::position::{Direction, Position};
use super::tick::Tick;

/// Risk limits and stop parameters. Tick counts are whole ticks of `tick_size`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RiskSettings {
    /// Negative threshold for cumulative daily P&L; 0 disables the halt.
    pub daily_stop_loss: f64,
    pub per_trade_stop_ticks: i64,
    pub breakeven_ticks: i64,
    pub breakeven_plus: i64,
    pub trailing_ticks: i64,
    pub tick_size: f64,
    /// 0 means unlimited.
    pub max_daily_trades: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RiskManager {
    pub settings: RiskSettings,
    pub daily_pnl: f64,
    pub daily_trades: usize,
    pub last_session_day: Option<NaiveDate>,
    pub halted: bool,
}

impl RiskManager {
    pub fn new(settings: RiskSettings) -> Self {
        RiskManager {
            settings,
            ..Default::default()
        }
    }

    /// Reset daily accounting when the tick starts a new calendar day.
    /// Returns true when a reset happened.
    pub fn reset_if_new_session(&mut self, tick: &Tick) -> bool {
        let day = tick.session_day();
        if self.last_session_day == Some(day) {
            return false;
        }
        debug!(%day, prev_pnl = self.daily_pnl, prev_trades = self.daily_trades, "new session");
        self.daily_pnl = 0.0;
        self.daily_trades = 0;
        self.halted = false;
        self.last_session_day = Some(day);
        true
    }

    pub fn allow_entry(&self) -> bool {
        if self.halted {
            return false;
        }
        let cap = self.settings.max_daily_trades;
        !(cap > 0 && self.daily_trades >= cap)
    }

    pub fn record_entry(&mut self) {
        self.daily_trades += 1;
    }

    /// Book realized P&L against the session and halt on breaching the daily stop.
    pub fn apply_daily_pnl(&mut self, pnl: f64) {
        self.daily_pnl += pnl;
        let limit = self.settings.daily_stop_loss;
        if limit < 0.0 && self.daily_pnl <= limit && !self.halted {
            info!(daily_pnl = self.daily_pnl, limit, "daily stop loss hit, halting entries");
            self.halted = true;
        }
    }

    pub fn update_stops(&self, position: &mut Position, tick: &Tick) {
        if !position.open {
            return;
        }
        let s = &self.settings;

        let moved = ticks_moved(position, tick.close, s.tick_size);
        if moved > position.max_favorable_ticks {
            position.max_favorable_ticks = moved;
        }

        if position.stop_price == 0.0 {
            position.stop_price = stop_from_entry(position, s.per_trade_stop_ticks, s.tick_size);
        }

        if s.breakeven_ticks > 0 && position.max_favorable_ticks >= s.breakeven_ticks {
            let candidate = breakeven_stop(position, s.breakeven_plus, s.tick_size);
            position.stop_price = better_stop(position, position.stop_price, candidate);
        }

        if s.trailing_ticks > 0 && position.max_favorable_ticks >= s.trailing_ticks {
            let candidate = trailing_stop(
                position,
                position.max_favorable_ticks,
                s.trailing_ticks,
                s.tick_size,
            );
            position.stop_price = better_stop(position, position.stop_price, candidate);
        }
    }
}

/// Whole ticks moved in the position's favor; 0 when tick size is not positive.
pub fn ticks_moved(position: &Position, close: f64, tick_size: f64) -> i64 {
    if tick_size <= 0.0 {
        return 0;
    }
    let mv = match position.direction {
        Direction::Long => close - position.entry_price,
        _ => position.entry_price - close,
    };
    (mv / tick_size).floor() as i64
}

pub fn stop_from_entry(position: &Position, stop_ticks: i64, tick_size: f64) -> f64 {
    if stop_ticks <= 0 || tick_size <= 0.0 {
        return 0.0;
    }
    let offset = stop_ticks as f64 * tick_size;
    match position.direction {
        Direction::Long => position.entry_price - offset,
        _ => position.entry_price + offset,
    }
}

pub fn breakeven_stop(position: &Position, plus_ticks: i64, tick_size: f64) -> f64 {
    if tick_size <= 0.0 {
        return position.entry_price;
    }
    let adj = plus_ticks as f64 * tick_size;
    match position.direction {
        Direction::Long => position.entry_price + adj,
        _ => position.entry_price - adj,
    }
}

pub fn trailing_stop(position: &Position, max_ticks: i64, trail_ticks: i64, tick_size: f64) -> f64 {
    if tick_size <= 0.0 {
        return position.entry_price;
    }
    let from_entry = (max_ticks - trail_ticks) as f64 * tick_size;
    match position.direction {
        Direction::Long => position.entry_price + from_entry,
        _ => position.entry_price - from_entry,
    }
}

/// The more favorable of two stops. An unset (0.0) current stop is always replaced,
/// which also means a genuine stop at 0.0 cannot be told apart from no stop.
pub fn better_stop(position: &Position, current: f64, candidate: f64) -> f64 {
    if current == 0.0 {
        return candidate;
    }
    match position.direction {
        Direction::Long => current.max(candidate),
        _ => current.min(candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn tick_at(ts: &str, close: f64) -> Tick {
        Tick {
            timestamp: DateTime::parse_from_rfc3339(ts).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
            bid_ask_delta: 0,
            volume_profile: vec![],
            session: "RTH".into(),
            symbol: "ES".into(),
        }
    }

    fn tick(close: f64) -> Tick {
        tick_at("2024-01-02T10:00:00Z", close)
    }

    fn settings() -> RiskSettings {
        RiskSettings {
            daily_stop_loss: -500.0,
            per_trade_stop_ticks: 10,
            breakeven_ticks: 5,
            breakeven_plus: 1,
            trailing_ticks: 8,
            tick_size: 1.0,
            max_daily_trades: 3,
        }
    }

    fn open(direction: Direction, entry: f64) -> Position {
        Position {
            open: true,
            direction,
            entry_time: None,
            entry_price: entry,
            size: 1,
            stop_price: 0.0,
            max_favorable_ticks: 0,
        }
    }

    #[test]
    fn fixed_stop_set_on_first_update() {
        let rm = RiskManager::new(settings());
        let mut pos = open(Direction::Long, 100.0);
        rm.update_stops(&mut pos, &tick(100.0));
        assert!((pos.stop_price - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn breakeven_then_trailing_long() {
        let rm = RiskManager::new(settings());
        let mut pos = open(Direction::Long, 100.0);
        rm.update_stops(&mut pos, &tick(100.0));

        rm.update_stops(&mut pos, &tick(106.0));
        assert_eq!(pos.max_favorable_ticks, 6);
        assert!((pos.stop_price - 101.0).abs() < f64::EPSILON);

        rm.update_stops(&mut pos, &tick(110.0));
        assert_eq!(pos.max_favorable_ticks, 10);
        assert!((pos.stop_price - 102.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_does_not_loosen_on_pullback() {
        let rm = RiskManager::new(settings());
        let mut pos = open(Direction::Long, 100.0);
        rm.update_stops(&mut pos, &tick(112.0));
        let high_water = pos.stop_price;
        rm.update_stops(&mut pos, &tick(104.0));
        assert_eq!(pos.max_favorable_ticks, 12);
        assert!((pos.stop_price - high_water).abs() < f64::EPSILON);
    }

    #[test]
    fn short_stops_mirror_long() {
        let rm = RiskManager::new(settings());
        let mut pos = open(Direction::Short, 100.0);
        rm.update_stops(&mut pos, &tick(100.0));
        assert!((pos.stop_price - 110.0).abs() < f64::EPSILON);

        rm.update_stops(&mut pos, &tick(94.0));
        assert!((pos.stop_price - 99.0).abs() < f64::EPSILON);

        rm.update_stops(&mut pos, &tick(90.0));
        assert!((pos.stop_price - 98.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fractional_tick_size_floors_excursion() {
        let rm = RiskManager::new(RiskSettings {
            tick_size: 0.25,
            ..settings()
        });
        let mut pos = open(Direction::Long, 100.0);
        rm.update_stops(&mut pos, &tick(100.6));
        assert_eq!(pos.max_favorable_ticks, 2);
        assert!((pos.stop_price - 97.5).abs() < 1e-9);
    }

    #[test]
    fn zero_tick_size_disables_stop_math() {
        let rm = RiskManager::new(RiskSettings {
            tick_size: 0.0,
            ..settings()
        });
        let mut pos = open(Direction::Long, 100.0);
        rm.update_stops(&mut pos, &tick(150.0));
        assert_eq!(pos.max_favorable_ticks, 0);
        assert_eq!(pos.stop_price, 0.0);
    }

    #[test]
    fn flat_position_untouched() {
        let rm = RiskManager::new(settings());
        let mut pos = Position::default();
        rm.update_stops(&mut pos, &tick(100.0));
        assert_eq!(pos, Position::default());
    }

    #[test]
    fn better_stop_rules() {
        let long = open(Direction::Long, 100.0);
        let short = open(Direction::Short, 100.0);
        assert_eq!(better_stop(&long, 0.0, 95.0), 95.0);
        assert_eq!(better_stop(&long, 96.0, 95.0), 96.0);
        assert_eq!(better_stop(&long, 96.0, 97.0), 97.0);
        assert_eq!(better_stop(&short, 0.0, 105.0), 105.0);
        assert_eq!(better_stop(&short, 104.0, 105.0), 104.0);
        assert_eq!(better_stop(&short, 104.0, 103.0), 103.0);
    }

    #[test]
    fn allow_entry_respects_trade_cap() {
        let mut rm = RiskManager::new(settings());
        for _ in 0..3 {
            assert!(rm.allow_entry());
            rm.record_entry();
        }
        assert!(!rm.allow_entry());
    }

    #[test]
    fn zero_trade_cap_is_unlimited() {
        let mut rm = RiskManager::new(RiskSettings {
            max_daily_trades: 0,
            ..settings()
        });
        for _ in 0..100 {
            rm.record_entry();
        }
        assert!(rm.allow_entry());
    }

    #[test]
    fn daily_stop_loss_halts_at_threshold() {
        let mut rm = RiskManager::new(settings());
        rm.apply_daily_pnl(-200.0);
        assert!(rm.allow_entry());
        rm.apply_daily_pnl(-300.0);
        assert!(rm.halted);
        assert!(!rm.allow_entry());
        rm.apply_daily_pnl(1000.0);
        assert!(rm.halted, "halt persists for the session");
    }

    #[test]
    fn daily_stop_loss_disabled_when_zero() {
        let mut rm = RiskManager::new(RiskSettings {
            daily_stop_loss: 0.0,
            ..settings()
        });
        rm.apply_daily_pnl(-10_000.0);
        assert!(!rm.halted);
    }

    #[test]
    fn session_reset_on_new_day_only() {
        let mut rm = RiskManager::new(settings());
        assert!(rm.reset_if_new_session(&tick_at("2024-01-02T09:30:00Z", 1.0)));
        rm.record_entry();
        rm.apply_daily_pnl(-600.0);
        assert!(rm.halted);

        assert!(!rm.reset_if_new_session(&tick_at("2024-01-02T15:59:00Z", 1.0)));
        assert!(rm.halted);
        assert_eq!(rm.daily_trades, 1);

        assert!(rm.reset_if_new_session(&tick_at("2024-01-03T09:30:00Z", 1.0)));
        assert!(!rm.halted);
        assert_eq!(rm.daily_trades, 0);
        assert_eq!(rm.daily_pnl, 0.0);
    }
}
