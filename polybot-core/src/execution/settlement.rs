//! Settlement of a binary contract stake.
//!
//! A stake buys `stake / entry_price` contracts. A winning contract is worth
//! 1.0 at resolution, or the take-profit level when the position is closed
//! early. The fee is charged on winning profit only; a loss forfeits the
//! whole stake.

use serde::{Deserialize, Serialize};

use super::slippage::EntryFill;

/// Settled P&L of one stake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Payoff {
    /// Contract value at exit.
    pub exit_price: f64,
    pub gross_pnl: f64,
    pub fee: f64,
    pub net_pnl: f64,
    pub won: bool,
}

/// Exit level for a winning contract.
///
/// A take-profit only applies when it sits strictly between the entry price
/// and full payout; otherwise the contract is held to resolution.
pub fn exit_level(entry_price: f64, take_profit: Option<f64>) -> f64 {
    match take_profit {
        Some(tp) if tp.is_finite() && tp > entry_price && tp < 1.0 => tp,
        _ => 1.0,
    }
}

pub fn settle(
    fill: &EntryFill,
    stake: f64,
    won: bool,
    take_profit: Option<f64>,
    fee_fraction: f64,
) -> Payoff {
    if stake <= 0.0 || !stake.is_finite() || fill.entry_price <= 0.0 {
        return Payoff {
            exit_price: if won { 1.0 } else { 0.0 },
            gross_pnl: 0.0,
            fee: 0.0,
            net_pnl: 0.0,
            won,
        };
    }

    if !won {
        return Payoff {
            exit_price: 0.0,
            gross_pnl: -stake,
            fee: 0.0,
            net_pnl: -stake,
            won: false,
        };
    }

    let contracts = stake / fill.entry_price;
    let exit_price = exit_level(fill.entry_price, take_profit);
    let gross_pnl = contracts * exit_price - stake;
    let fee = fee_fraction.max(0.0) * gross_pnl.max(0.0);

    Payoff {
        exit_price,
        gross_pnl,
        fee,
        net_pnl: gross_pnl - fee,
        won: true,
    }
}
