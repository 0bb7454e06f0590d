//! Trade: a simulated wager on one decision interval, entry → resolution.

use super::ids::{SimulationId, TradeId};
use super::signal::{Direction, IndicatorSignal};
use crate::execution::{EntryFill, Payoff};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeResult {
    Win,
    Loss,
    Pending,
}

/// A wager taken from a `Signal`, resolved against the realized future price.
///
/// Created `Pending` by the simulator and resolved exactly once via
/// [`Trade::resolve`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub id: TradeId,
    pub simulation_id: SimulationId,
    pub timestamp: DateTime<Utc>,
    pub market_id: String,
    pub market_name: String,
    pub direction: Direction,

    // ── Contract prices ──
    /// Quoted contract price before slippage.
    pub quoted_price: f64,
    /// Effective contract entry price after slippage.
    pub entry_price: f64,
    /// Contract value at exit: 1.0 win, 0.0 loss, or the take-profit level.
    pub exit_price: Option<f64>,

    // ── Underlying ──
    pub asset_entry_price: f64,
    pub asset_exit_price: f64,

    // ── Model data at entry ──
    pub model_probability: f64,
    pub expected_value: f64,
    pub confidence: f64,

    // ── Position ──
    pub position_size: f64,
    /// Stake as a fraction of capital at entry.
    pub position_fraction: f64,
    /// Loss streak in force when the stake was sized.
    pub loss_streak_at_entry: u32,

    // ── Result ──
    pub result: TradeResult,
    pub fees: f64,
    pub slippage_cost: f64,
    pub pnl: f64,
    /// P&L as a fraction of the stake.
    pub pnl_pct: f64,
    pub capital_after: f64,

    // ── Reasoning snapshot ──
    pub indicator_signals: Vec<IndicatorSignal>,
}

impl Trade {
    /// Apply the settlement. Only a pending trade can be resolved; calling
    /// this on a resolved trade is a no-op.
    pub fn resolve(&mut self, fill: &EntryFill, payoff: &Payoff, capital_after: f64) {
        if self.result != TradeResult::Pending {
            return;
        }
        self.quoted_price = fill.quoted_price;
        self.entry_price = fill.entry_price;
        self.slippage_cost = fill.slippage_cost;
        self.exit_price = Some(payoff.exit_price);
        self.fees = payoff.fee;
        self.pnl = payoff.net_pnl;
        self.pnl_pct = if self.position_size > 0.0 {
            payoff.net_pnl / self.position_size
        } else {
            0.0
        };
        self.capital_after = capital_after;
        self.result = if payoff.won {
            TradeResult::Win
        } else {
            TradeResult::Loss
        };
    }

    pub fn is_winner(&self) -> bool {
        self.result == TradeResult::Win
    }

    pub fn is_resolved(&self) -> bool {
        self.result != TradeResult::Pending
    }
}
