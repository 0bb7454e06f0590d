//! Signal combiner: many indicator readings in, one directional probability out.
//!
//! Every non-neutral reading casts one vote for its side, regardless of
//! strength, so families of correlated indicators cannot dominate through
//! raw strength sums. Strength only nudges the winning side's probability,
//! and the result is squeezed into [0.45, 0.75].

use serde::{Deserialize, Serialize};

use crate::domain::{Direction, IndicatorSignal};

/// Probability reported when there is no usable signal.
pub const NEUTRAL_PROBABILITY: f64 = 0.5;
/// Cap on the vote share after the strength boost.
pub const MAX_RAW_PROBABILITY: f64 = 0.95;
/// Weight of the winners' mean strength in the boost.
pub const STRENGTH_BOOST: f64 = 0.1;
/// Affine squeeze of the raw share into the reported range.
pub const SCALED_FLOOR: f64 = 0.45;
pub const SCALED_SPAN: f64 = 0.30;

/// Combined reading across all indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    /// Model probability that `direction` happens.
    pub probability: f64,
    pub direction: Direction,
    pub rationale: String,
    /// False when there were no votes or the votes tied.
    pub has_signal: bool,
}

impl Combination {
    fn no_signal(direction: Direction, rationale: &str) -> Self {
        Self {
            probability: NEUTRAL_PROBABILITY,
            direction,
            rationale: rationale.to_string(),
            has_signal: false,
        }
    }
}

/// Side reported when the indicators give no signal: the cheaper contract.
pub fn fallback_direction(market_price: f64) -> Direction {
    if market_price.is_nan() || market_price <= 0.5 {
        Direction::Up
    } else {
        Direction::Down
    }
}

/// Votes cast by directional readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub up: usize,
    pub down: usize,
}

impl VoteTally {
    pub fn count(signals: &[IndicatorSignal]) -> Self {
        signals.iter().fold(Self::default(), |mut tally, s| {
            match s.bias {
                Some(Direction::Up) => tally.up += 1,
                Some(Direction::Down) => tally.down += 1,
                None => {}
            }
            tally
        })
    }

    pub fn total(&self) -> usize {
        self.up + self.down
    }

    /// Side with strictly more votes.
    pub fn majority(&self) -> Option<Direction> {
        match self.up.cmp(&self.down) {
            std::cmp::Ordering::Greater => Some(Direction::Up),
            std::cmp::Ordering::Less => Some(Direction::Down),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn votes_for(&self, direction: Direction) -> usize {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }
}

/// Mean strength of the readings leaning `direction`; 0 when there are none.
pub fn mean_strength(signals: &[IndicatorSignal], direction: Direction) -> f64 {
    let (sum, n) = signals
        .iter()
        .filter(|s| s.bias == Some(direction))
        .fold((0.0, 0usize), |(sum, n), s| (sum + s.strength, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Combine indicator readings into one probability and direction.
///
/// `market_price` only picks the reported direction when there is no
/// signal; it never moves the probability.
pub fn combine_signals(signals: &[IndicatorSignal], market_price: f64) -> Combination {
    let fallback = fallback_direction(market_price);
    if signals.is_empty() {
        return Combination::no_signal(fallback, "no active indicators");
    }

    let tally = VoteTally::count(signals);
    if tally.total() == 0 {
        return Combination::no_signal(fallback, "indicators neutral");
    }

    let Some(direction) = tally.majority() else {
        return Combination::no_signal(fallback, "indicators split, no consensus");
    };

    let share = tally.votes_for(direction) as f64 / tally.total() as f64;
    let boost = STRENGTH_BOOST * mean_strength(signals, direction);
    let boosted = (share + boost).min(MAX_RAW_PROBABILITY);
    let probability = SCALED_FLOOR + boosted * SCALED_SPAN;

    let reasons: Vec<String> = signals
        .iter()
        .filter(|s| s.bias == Some(direction))
        .map(|s| format!("{}: {}", s.name, s.interpretation))
        .collect();

    Combination {
        probability,
        direction,
        rationale: format!("Direction {direction} based on: {}", reasons.join(", ")),
        has_signal: true,
    }
}
