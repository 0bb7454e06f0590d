//! Position sizers: edge, confidence and capital in, stake out.
//!
//! Policies are a closed set selected by `SizingPolicy`. Every policy
//! returns a finite, non-negative stake no larger than available capital,
//! and 0 when capital is exhausted.

pub mod fixed;
pub mod kelly;
pub mod martingale;

pub use fixed::fixed_size;
pub use kelly::{kelly_multiplier, kelly_size};
pub use martingale::{martingale_size, MARTINGALE_CAP_FRACTION};

use serde::{Deserialize, Serialize};

/// How a stake is sized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizingPolicy {
    /// Fractional Kelly scaled by confidence, capped at the max fraction.
    #[default]
    Kelly,
    /// The max fraction of initial capital on every trade.
    Fixed,
    /// Double a base fraction after every consecutive loss.
    Martingale { base_fraction: f64 },
}

impl SizingPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            SizingPolicy::Kelly => "kelly",
            SizingPolicy::Fixed => "fixed",
            SizingPolicy::Martingale { .. } => "martingale",
        }
    }
}

/// Everything a sizer may look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingInputs {
    pub expected_value: f64,
    pub confidence: f64,
    /// Capital available right now.
    pub capital: f64,
    pub initial_capital: f64,
    pub max_position_fraction: f64,
    pub consecutive_losses: u32,
}

impl SizingInputs {
    fn is_degenerate(&self) -> bool {
        !(self.capital.is_finite() && self.capital > 0.0)
            || !self.expected_value.is_finite()
            || !self.confidence.is_finite()
            || !self.initial_capital.is_finite()
            || !self.max_position_fraction.is_finite()
    }
}

/// Stake for `inputs` under `policy`.
pub fn size_position(policy: &SizingPolicy, inputs: &SizingInputs) -> f64 {
    if inputs.is_degenerate() {
        return 0.0;
    }

    let raw = match *policy {
        SizingPolicy::Kelly => kelly_size(
            inputs.expected_value,
            inputs.confidence,
            inputs.capital,
            inputs.max_position_fraction,
        ),
        SizingPolicy::Fixed => fixed_size(
            inputs.initial_capital,
            inputs.max_position_fraction,
            inputs.capital,
        ),
        SizingPolicy::Martingale { base_fraction } => {
            martingale_size(base_fraction, inputs.capital, inputs.consecutive_losses)
        }
    };

    if raw.is_finite() {
        raw.clamp(0.0, inputs.capital)
    } else {
        0.0
    }
}
