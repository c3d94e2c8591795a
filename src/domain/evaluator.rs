//! Closed-trade history and performance statistics.
//!
//! The [`Summary`] is recomputed from the full history on every call; nothing is
//! maintained incrementally.

use std::fmt;

use super::position::Trade;

const SMALL_PNL: f64 = 100.0;
const MEDIUM_PNL: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PnlBucket {
    LossSmall,
    LossMedium,
    LossLarge,
    WinSmall,
    WinMedium,
    WinLarge,
}

impl PnlBucket {
    pub const ALL: [PnlBucket; 6] = [
        PnlBucket::LossSmall,
        PnlBucket::LossMedium,
        PnlBucket::LossLarge,
        PnlBucket::WinSmall,
        PnlBucket::WinMedium,
        PnlBucket::WinLarge,
    ];

    /// Bucket for a non-zero P&L by magnitude: < 100 small, < 300 medium, else large.
    pub fn classify(pnl: f64) -> Option<PnlBucket> {
        let magnitude = pnl.abs();
        let bucket = if pnl > 0.0 {
            if magnitude < SMALL_PNL {
                PnlBucket::WinSmall
            } else if magnitude < MEDIUM_PNL {
                PnlBucket::WinMedium
            } else {
                PnlBucket::WinLarge
            }
        } else if pnl < 0.0 {
            if magnitude < SMALL_PNL {
                PnlBucket::LossSmall
            } else if magnitude < MEDIUM_PNL {
                PnlBucket::LossMedium
            } else {
                PnlBucket::LossLarge
            }
        } else {
            return None;
        };
        Some(bucket)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PnlBucket::LossSmall => "loss_small",
            PnlBucket::LossMedium => "loss_medium",
            PnlBucket::LossLarge => "loss_large",
            PnlBucket::WinSmall => "win_small",
            PnlBucket::WinMedium => "win_medium",
            PnlBucket::WinLarge => "win_large",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PnlBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trade counts per [`PnlBucket`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PnlDistribution {
    counts: [usize; 6],
}

impl PnlDistribution {
    pub fn get(&self, bucket: PnlBucket) -> usize {
        self.counts[bucket.index()]
    }

    fn add(&mut self, bucket: PnlBucket) {
        self.counts[bucket.index()] += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = (PnlBucket, usize)> + '_ {
        PnlBucket::ALL.into_iter().map(|b| (b, self.get(b)))
    }
}

impl fmt::Display for PnlDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(b, n)| format!("{b}:{n}")).collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    /// wins + losses; zero-P&L trades are only counted in `breakeven`.
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakeven: usize,
    /// wins / (wins + losses)
    pub win_rate: f64,
    pub expectancy: f64,
    pub max_drawdown: f64,
    pub average_win: f64,
    /// Negative when there are losses.
    pub average_loss: f64,
    pub net_pnl: f64,
    pub equity_curve: Vec<f64>,
    pub distribution: PnlDistribution,
}

impl Summary {
    /// Gross wins over gross losses; +inf when there are no losses.
    pub fn profit_factor(&self) -> f64 {
        if self.average_loss == 0.0 {
            return f64::INFINITY;
        }
        (self.average_win * self.wins as f64) / (self.average_loss * self.losses as f64).abs()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    trades: Vec<Trade>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn summary(&self) -> Summary {
        summarize(&self.trades)
    }
}

pub fn summarize(trades: &[Trade]) -> Summary {
    let mut equity = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    let mut wins = 0usize;
    let mut losses = 0usize;
    let mut win_sum = 0.0_f64;
    let mut loss_sum = 0.0_f64;
    let mut distribution = PnlDistribution::default();
    let mut curve = Vec::with_capacity(trades.len());

    for trade in trades {
        equity += trade.pnl;
        curve.push(equity);
        if equity > peak {
            peak = equity;
        }
        max_dd = max_dd.max(peak - equity);

        if trade.pnl > 0.0 {
            wins += 1;
            win_sum += trade.pnl;
        } else if trade.pnl < 0.0 {
            losses += 1;
            loss_sum += trade.pnl;
        }
        if let Some(bucket) = PnlBucket::classify(trade.pnl) {
            distribution.add(bucket);
        }
    }

    let decided = wins + losses;
    let win_rate = if decided > 0 {
        wins as f64 / decided as f64
    } else {
        0.0
    };
    let average_win = if wins > 0 { win_sum / wins as f64 } else { 0.0 };
    let average_loss = if losses > 0 {
        loss_sum / losses as f64
    } else {
        0.0
    };
    let expectancy = if decided > 0 {
        win_rate * average_win + (1.0 - win_rate) * average_loss
    } else {
        0.0
    };

    Summary {
        total_trades: decided,
        wins,
        losses,
        breakeven: trades.len() - decided,
        win_rate,
        expectancy,
        max_drawdown: max_dd,
        average_win,
        average_loss,
        net_pnl: equity,
        equity_curve: curve,
        distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Direction;
    use approx::assert_relative_eq;
    use chrono::DateTime;

    fn make_trade(pnl: f64) -> Trade {
        let ts = DateTime::parse_from_rfc3339("2024-01-02T10:00:00Z").unwrap();
        Trade {
            entry_time: ts,
            exit_time: ts,
            entry_price: 100.0,
            exit_price: 100.0 + pnl,
            size: 1,
            direction: Direction::Long,
            pnl,
            reason: "stop".into(),
        }
    }

    fn evaluator(pnls: &[f64]) -> Evaluator {
        let mut ev = Evaluator::new();
        for &p in pnls {
            ev.record(make_trade(p));
        }
        ev
    }

    #[test]
    fn empty_history() {
        let s = Evaluator::new().summary();
        assert_eq!(s.total_trades, 0);
        assert_eq!(s.win_rate, 0.0);
        assert_eq!(s.expectancy, 0.0);
        assert_eq!(s.max_drawdown, 0.0);
        assert!(s.equity_curve.is_empty());
        assert!(s.profit_factor().is_infinite());
    }

    #[test]
    fn mixed_trades_summary() {
        let s = evaluator(&[50.0, -150.0, 400.0]).summary();
        assert_eq!(s.wins, 2);
        assert_eq!(s.losses, 1);
        assert_relative_eq!(s.win_rate, 2.0 / 3.0);
        assert_relative_eq!(s.max_drawdown, 150.0);
        assert_eq!(s.equity_curve, vec![50.0, -100.0, 300.0]);
        assert_eq!(s.distribution.get(PnlBucket::WinSmall), 1);
        assert_eq!(s.distribution.get(PnlBucket::LossMedium), 1);
        assert_eq!(s.distribution.get(PnlBucket::WinLarge), 1);
        assert_eq!(s.distribution.get(PnlBucket::LossSmall), 0);
        assert_relative_eq!(s.net_pnl, 300.0);
    }

    #[test]
    fn expectancy_is_blended() {
        let s = evaluator(&[50.0, -150.0, 400.0]).summary();
        // avg win 225, avg loss -150
        assert_relative_eq!(s.average_win, 225.0);
        assert_relative_eq!(s.average_loss, -150.0);
        let expected = (2.0 / 3.0) * 225.0 + (1.0 / 3.0) * -150.0;
        assert_relative_eq!(s.expectancy, expected, epsilon = 1e-9);
    }

    #[test]
    fn zero_pnl_counts_toward_neither() {
        let s = evaluator(&[0.0, 100.0, 0.0]).summary();
        assert_eq!(s.total_trades, 1);
        assert_eq!(s.breakeven, 2);
        assert_eq!(s.wins, 1);
        assert_eq!(s.losses, 0);
        assert_relative_eq!(s.win_rate, 1.0);
        assert_eq!(s.distribution.iter().map(|(_, n)| n).sum::<usize>(), 1);
    }

    #[test]
    fn drawdown_from_zero_peak() {
        let s = evaluator(&[-100.0, -50.0, 200.0]).summary();
        assert_relative_eq!(s.max_drawdown, 150.0);
    }

    #[test]
    fn profit_factor() {
        let s = evaluator(&[100.0, -50.0, 200.0]).summary();
        assert_relative_eq!(s.profit_factor(), 6.0);
    }

    #[test]
    fn profit_factor_without_losses_is_infinite() {
        let s = evaluator(&[10.0, 20.0]).summary();
        assert_eq!(s.profit_factor(), f64::INFINITY);
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(PnlBucket::classify(99.99), Some(PnlBucket::WinSmall));
        assert_eq!(PnlBucket::classify(100.0), Some(PnlBucket::WinMedium));
        assert_eq!(PnlBucket::classify(300.0), Some(PnlBucket::WinLarge));
        assert_eq!(PnlBucket::classify(-299.0), Some(PnlBucket::LossMedium));
        assert_eq!(PnlBucket::classify(-300.0), Some(PnlBucket::LossLarge));
        assert_eq!(PnlBucket::classify(0.0), None);
    }

    #[test]
    fn summary_is_idempotent() {
        let ev = evaluator(&[10.0, -20.0, 30.0]);
        assert_eq!(ev.summary(), ev.summary());
    }

    #[test]
    fn distribution_display() {
        let s = evaluator(&[50.0]).summary();
        assert_eq!(
            s.distribution.to_string(),
            "loss_small:0 loss_medium:0 loss_large:0 win_small:1 win_medium:0 win_large:0"
        );
    }
}
