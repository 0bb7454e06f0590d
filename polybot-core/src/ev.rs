//! Expected value, confidence, and the trade decision.
//!
//! `generate_signal` is the single entry point that turns indicator readings
//! and a market quote into a complete `Signal`: combine, price the edge,
//! score confidence, decide, size.

use serde::{Deserialize, Serialize};

use crate::combiner::{combine_signals, mean_strength, VoteTally};
use crate::config::{DecisionPolicy, StrategyConfig};
use crate::domain::{clamp_unit, Bar, Direction, IndicatorSignal, MarketSnapshot, Signal};
use crate::signals::evaluate_indicators;
use crate::sizers::{size_position, SizingInputs};

/// Confidence reported when no indicator leans either way.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

const AGREEMENT_WEIGHT: f64 = 0.4;
const STRENGTH_WEIGHT: f64 = 0.3;
const CONVICTION_WEIGHT: f64 = 0.3;

/// Expected value per unit stake of buying the `direction` contract.
///
/// `p_up` is the model probability of UP and `market_price` the price of the
/// UP contract; DOWN buys the complement at `1 - market_price`.
/// `EV = p_win * (1 - buy) - (1 - p_win) * buy`, which simplifies to
/// `p_win - buy`.
pub fn expected_value(p_up: f64, market_price: f64, direction: Direction) -> f64 {
    let (buy, p_win) = match direction {
        Direction::Up => (market_price, p_up),
        Direction::Down => (1.0 - market_price, 1.0 - p_up),
    };
    p_win * (1.0 - buy) - (1.0 - p_win) * buy
}

/// Probability of UP given the probability of the chosen direction.
pub fn probability_of_up(probability: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Up => probability,
        Direction::Down => 1.0 - probability,
    }
}

/// Confidence in a reading, in [0, 1].
///
/// 0.4 x agreement ratio of the majority side, 0.3 x mean strength of that
/// side, 0.3 x distance of `model_probability` from a coin flip (scaled to
/// [0, 1]). On a vote tie the side with the higher mean strength counts as
/// the majority.
pub fn confidence(signals: &[IndicatorSignal], model_probability: f64) -> f64 {
    let tally = VoteTally::count(signals);
    if tally.total() == 0 {
        return NEUTRAL_CONFIDENCE;
    }

    let majority = tally.majority().unwrap_or_else(|| {
        if mean_strength(signals, Direction::Down) > mean_strength(signals, Direction::Up) {
            Direction::Down
        } else {
            Direction::Up
        }
    });

    let agreement = tally.votes_for(majority) as f64 / tally.total() as f64;
    let strength = mean_strength(signals, majority);
    let conviction = (model_probability - 0.5).abs() * 2.0;

    clamp_unit(
        AGREEMENT_WEIGHT * agreement + STRENGTH_WEIGHT * strength + CONVICTION_WEIGHT * conviction,
    )
}

impl DecisionPolicy {
    /// Whether a reading with this edge and confidence should be traded.
    pub fn should_trade(
        &self,
        has_signal: bool,
        expected_value: f64,
        confidence: f64,
        config: &StrategyConfig,
    ) -> bool {
        if !has_signal || expected_value.is_nan() || expected_value <= 0.0 {
            return false;
        }
        match self {
            DecisionPolicy::PositiveEdge => true,
            DecisionPolicy::Thresholds => {
                expected_value >= config.min_ev && confidence >= config.min_confidence
            }
        }
    }
}

/// Capital and streak state the sizer reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    pub capital: f64,
    pub consecutive_losses: u32,
}

impl RiskState {
    /// Untouched account at the strategy's initial capital.
    pub fn fresh(config: &StrategyConfig) -> Self {
        Self {
            capital: config.initial_capital,
            consecutive_losses: 0,
        }
    }
}

/// Combine readings, price the edge, decide and size.
pub fn generate_signal(
    market: &MarketSnapshot,
    indicator_signals: Vec<IndicatorSignal>,
    config: &StrategyConfig,
    risk: &RiskState,
) -> Signal {
    let combination = combine_signals(&indicator_signals, market.market_price);
    let p_up = probability_of_up(combination.probability, combination.direction);
    let ev = expected_value(p_up, market.market_price, combination.direction);
    let confidence = confidence(&indicator_signals, combination.probability);

    let policy = config.decision_policy;
    let should_trade = policy.should_trade(combination.has_signal, ev, confidence, config);

    let position_size = if should_trade {
        size_position(
            &config.position_sizing,
            &SizingInputs {
                expected_value: ev,
                confidence,
                capital: risk.capital,
                initial_capital: config.initial_capital,
                max_position_fraction: config.max_position_fraction,
                consecutive_losses: risk.consecutive_losses,
            },
        )
    } else {
        0.0
    };

    Signal {
        timestamp: market.timestamp,
        market_id: market.market_id.clone(),
        market_name: market.market_name.clone(),
        asset_price: market.asset_price,
        market_price: market.market_price,
        model_probability: combination.probability,
        expected_value: ev,
        confidence,
        direction: combination.direction,
        should_trade,
        position_size,
        indicator_signals,
        rationale: combination.rationale,
    }
}

/// Run the configured indicators over `bars`, then `generate_signal`.
pub fn evaluate_market(
    bars: &[Bar],
    market: &MarketSnapshot,
    config: &StrategyConfig,
    risk: &RiskState,
) -> Signal {
    let readings = evaluate_indicators(bars, &config.indicators);
    generate_signal(market, readings, config, risk)
}
