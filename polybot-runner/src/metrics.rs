//! Simulation metrics: pure functions over a resolved trade list.
//!
//! Every metric is a pure function: trades (and initial capital) in, scalar
//! out. `SimulationMetrics::compute` can be re-run on a stored trade list at
//! any time and gives the same numbers.

use serde::{Deserialize, Serialize};

use polybot_core::domain::{Direction, Trade};

/// Aggregate statistics for one simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,

    pub win_rate: f64,
    /// Mean P&L of winning trades (positive).
    pub avg_win: f64,
    /// Mean P&L of losing trades (negative).
    pub avg_loss: f64,

    pub total_pnl: f64,
    /// Total P&L as a percentage of initial capital.
    pub total_pnl_pct: f64,

    /// Mean EV per unit stake the model claimed at entry.
    pub avg_ev_expected: f64,
    /// Mean realized P&L per unit stake.
    pub avg_ev_realized: f64,

    /// Largest peak-to-trough fall of the capital curve, as a negative
    /// fraction of the peak (e.g. -0.15).
    pub max_drawdown: f64,
    /// Per-trade Sharpe of stake-relative returns. `None` with fewer than two
    /// trades or zero variance.
    pub sharpe_ratio: Option<f64>,
    pub profit_factor: f64,

    pub max_consecutive_losses: usize,
    pub max_position_used: f64,

    // ── Per-direction accuracy ──
    pub up_trades: usize,
    pub up_wins: usize,
    pub down_trades: usize,
    pub down_wins: usize,
}

impl SimulationMetrics {
    /// Compute all metrics from the resolved trades of a run.
    pub fn compute(trades: &[Trade], initial_capital: f64) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        let (up_trades, up_wins) = direction_counts(trades, Direction::Up);
        let (down_trades, down_wins) = direction_counts(trades, Direction::Down);
        let realized: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();

        Self {
            total_trades: trades.len(),
            winning_trades,
            losing_trades: trades.len() - winning_trades,
            win_rate: win_rate(trades),
            avg_win: avg_pnl(trades, true),
            avg_loss: avg_pnl(trades, false),
            total_pnl,
            total_pnl_pct: if initial_capital > 0.0 {
                total_pnl / initial_capital * 100.0
            } else {
                0.0
            },
            avg_ev_expected: mean_f64(
                &trades.iter().map(|t| t.expected_value).collect::<Vec<_>>(),
            ),
            avg_ev_realized: mean_f64(&realized),
            max_drawdown: max_drawdown(&capital_curve(trades, initial_capital)),
            sharpe_ratio: sharpe_ratio(&realized),
            profit_factor: profit_factor(trades),
            max_consecutive_losses: max_consecutive_losses(trades),
            max_position_used: trades.iter().map(|t| t.position_size).fold(0.0, f64::max),
            up_trades,
            up_wins,
            down_trades,
            down_wins,
        }
    }

    /// Win rate of trades taken in `direction`; 0 when there were none.
    pub fn direction_win_rate(&self, direction: Direction) -> f64 {
        let (n, w) = match direction {
            Direction::Up => (self.up_trades, self.up_wins),
            Direction::Down => (self.down_trades, self.down_wins),
        };
        if n == 0 {
            0.0
        } else {
            w as f64 / n as f64
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Capital after each trade, starting from `initial_capital`.
pub fn capital_curve(trades: &[Trade], initial_capital: f64) -> Vec<f64> {
    std::iter::once(initial_capital)
        .chain(trades.iter().map(|t| t.capital_after))
        .collect()
}

/// Fraction of trades that won.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Maximum drawdown as a negative fraction of the running peak.
///
/// Returns 0.0 for a flat or monotonically rising curve.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &c in curve {
        if c > peak {
            peak = c;
        }
        if peak > 0.0 {
            max_dd = max_dd.min((c - peak) / peak);
        }
    }
    max_dd
}

/// mean / sample std of per-trade returns.
pub fn sharpe_ratio(returns: &[f64]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return None;
    }
    Some(mean_f64(returns) / std)
}

/// Gross profit / gross loss, capped at 100.0 when nothing was lost.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Longest run of consecutive losing trades.
pub fn max_consecutive_losses(trades: &[Trade]) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() {
            current = 0;
        } else {
            current += 1;
            max_streak = max_streak.max(current);
        }
    }
    max_streak
}

// ─── Helpers ────────────────────────────────────────────────────────

fn avg_pnl(trades: &[Trade], winners: bool) -> f64 {
    let pnls: Vec<f64> = trades
        .iter()
        .filter(|t| t.is_winner() == winners)
        .map(|t| t.pnl)
        .collect();
    mean_f64(&pnls)
}

fn direction_counts(trades: &[Trade], direction: Direction) -> (usize, usize) {
    trades
        .iter()
        .filter(|t| t.direction == direction)
        .fold((0, 0), |(n, w), t| (n + 1, w + usize::from(t.is_winner())))
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
