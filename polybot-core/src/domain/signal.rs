//! Directional readings: per-indicator signals and the combined trade signal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a binary "up or down" market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

/// One indicator's reading over an evaluation window.
///
/// `bias == None` means neutral. Strength is clamped to [0, 1] on
/// construction; a non-finite strength becomes 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSignal {
    pub name: String,
    pub value: f64,
    pub interpretation: String,
    pub bias: Option<Direction>,
    pub strength: f64,
}

impl IndicatorSignal {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        interpretation: impl Into<String>,
        bias: Option<Direction>,
        strength: f64,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            interpretation: interpretation.into(),
            bias,
            strength: clamp_unit(strength),
        }
    }

    pub fn neutral(name: impl Into<String>, value: f64, interpretation: impl Into<String>) -> Self {
        Self::new(name, value, interpretation, None, 0.0)
    }

    /// Neutral reading emitted when the window is too short for the indicator.
    pub fn insufficient(name: impl Into<String>) -> Self {
        Self::neutral(name, 0.0, "insufficient data")
    }

    pub fn is_directional(&self) -> bool {
        self.bias.is_some()
    }
}

/// Clamp to [0, 1]; NaN maps to 0.
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Where and when a signal was evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub timestamp: DateTime<Utc>,
    pub market_id: String,
    pub market_name: String,
    /// Latest underlying asset price.
    pub asset_price: f64,
    /// Market-implied probability of UP (price of the UP contract).
    pub market_price: f64,
}

/// Complete output of one evaluation: probability, edge, decision, sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub market_id: String,
    pub market_name: String,
    pub asset_price: f64,
    pub market_price: f64,

    pub model_probability: f64,
    pub expected_value: f64,
    pub confidence: f64,

    pub direction: Direction,
    pub should_trade: bool,
    /// Suggested stake in account currency; 0 when not trading.
    pub position_size: f64,

    pub indicator_signals: Vec<IndicatorSignal>,
    pub rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_is_clamped() {
        let hi = IndicatorSignal::new("RSI", 10.0, "", Some(Direction::Up), 1.7);
        let lo = IndicatorSignal::new("RSI", 10.0, "", Some(Direction::Up), -0.2);
        let nan = IndicatorSignal::new("RSI", 10.0, "", Some(Direction::Up), f64::NAN);
        assert_eq!(hi.strength, 1.0);
        assert_eq!(lo.strength, 0.0);
        assert_eq!(nan.strength, 0.0);
    }

    #[test]
    fn insufficient_is_neutral() {
        let s = IndicatorSignal::insufficient("MACD");
        assert!(!s.is_directional());
        assert_eq!(s.strength, 0.0);
        assert_eq!(s.interpretation, "insufficient data");
    }

    #[test]
    fn direction_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Direction::Up).unwrap(), "\"up\"");
        let d: Direction = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(d, Direction::Down);
    }
}
