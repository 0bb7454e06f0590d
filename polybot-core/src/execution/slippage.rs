//! Slippage model: how much worse than the quote a stake gets filled.
//!
//! slippage fraction = base fee fraction
//!                   + impact_coefficient * stake / liquidity
//!                   + noise, noise ~ U[0, max_noise)
//!
//! The fraction multiplies the quoted contract price. The effective entry is
//! capped at `MAX_ENTRY_PRICE` so a winning contract always pays something.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::Direction;

/// Contract prices are kept inside the open unit interval.
pub const MIN_CONTRACT_PRICE: f64 = 0.01;
pub const MAX_ENTRY_PRICE: f64 = 0.99;

/// Execution cost parameters for simulated fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionModel {
    /// Price impact per unit of `stake / liquidity`.
    pub impact_coefficient: f64,
    /// Notional depth of the book the stake is compared against.
    pub liquidity: f64,
    /// Upper bound of the uniform noise term (fraction of price).
    pub max_noise: f64,
}

impl Default for ExecutionModel {
    fn default() -> Self {
        Self {
            impact_coefficient: 0.01,
            liquidity: 10_000.0,
            max_noise: 0.005,
        }
    }
}

impl ExecutionModel {
    /// No impact and no noise. Only the fee fraction remains.
    pub fn frictionless() -> Self {
        Self {
            impact_coefficient: 0.0,
            liquidity: 10_000.0,
            max_noise: 0.0,
        }
    }

    /// Deterministic part of the slippage fraction plus a noise draw.
    ///
    /// `noise_draw` is the raw uniform sample in [0, 1); it is scaled by
    /// `max_noise` here so callers can replay fills exactly.
    pub fn slippage_fraction(&self, fee_fraction: f64, stake: f64, noise_draw: f64) -> f64 {
        let impact = if self.liquidity > 0.0 {
            self.impact_coefficient * stake.max(0.0) / self.liquidity
        } else {
            0.0
        };
        let noise = self.max_noise.max(0.0) * noise_draw.clamp(0.0, 1.0);
        (fee_fraction.max(0.0) + impact.max(0.0) + noise).max(0.0)
    }

    /// Fill a stake at `quoted_price`, drawing exactly one noise sample.
    pub fn fill_entry<R: Rng>(
        &self,
        quoted_price: f64,
        stake: f64,
        fee_fraction: f64,
        rng: &mut R,
    ) -> EntryFill {
        let draw: f64 = rng.gen();
        self.fill_with_draw(quoted_price, stake, fee_fraction, draw)
    }

    pub fn fill_with_draw(
        &self,
        quoted_price: f64,
        stake: f64,
        fee_fraction: f64,
        noise_draw: f64,
    ) -> EntryFill {
        let quoted = quoted_price.clamp(MIN_CONTRACT_PRICE, MAX_ENTRY_PRICE);
        let slippage_fraction = self.slippage_fraction(fee_fraction, stake, noise_draw);
        let entry_price = (quoted * (1.0 + slippage_fraction)).min(MAX_ENTRY_PRICE);

        // Contracts forgone because of the worse price, valued at full payout.
        let slippage_cost = if stake > 0.0 {
            stake / quoted - stake / entry_price
        } else {
            0.0
        };

        EntryFill {
            quoted_price: quoted,
            entry_price,
            slippage_fraction,
            slippage_cost,
        }
    }
}

/// Result of filling a stake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryFill {
    pub quoted_price: f64,
    pub entry_price: f64,
    pub slippage_fraction: f64,
    pub slippage_cost: f64,
}

/// Quoted price of the contract that pays out if `direction` happens.
///
/// `market_price` is the implied probability of UP, so DOWN costs its
/// complement.
pub fn contract_price(direction: Direction, market_price: f64) -> f64 {
    let p = match direction {
        Direction::Up => market_price,
        Direction::Down => 1.0 - market_price,
    };
    if p.is_nan() {
        return 0.5;
    }
    p.clamp(MIN_CONTRACT_PRICE, MAX_ENTRY_PRICE)
}
