//! Built-in strategy presets.

use serde::Serialize;

use crate::config::{Approach, IndicatorConfig, StrategyConfig};

/// Registry keys of the built-in presets, in display order.
pub const PRESET_IDS: [&str; 3] = [
    "conservative_mean_reversion",
    "balanced_momentum",
    "aggressive_scalper",
];

/// Summary row for listing presets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetInfo {
    pub id: &'static str,
    pub name: String,
    pub description: String,
    pub approach: Approach,
    pub min_ev: f64,
    pub min_confidence: f64,
}

/// Look up a preset by id. Unknown ids yield `None`.
pub fn preset(id: &str) -> Option<StrategyConfig> {
    let config = match id {
        "conservative_mean_reversion" => StrategyConfig {
            name: "Conservative Mean Reversion".into(),
            description: "Bets on reversion to the mean. Trades only when RSI flags an \
                          excess and price presses a Bollinger band: few signals, high \
                          confidence."
                .into(),
            approach: Approach::MeanReversion,
            min_ev: 0.10,
            min_confidence: 0.70,
            indicators: vec![
                IndicatorConfig::new("rsi").with_param("period", 14.0),
                IndicatorConfig::new("bollinger")
                    .with_param("period", 20.0)
                    .with_param("std_dev", 2.0),
            ],
            max_position_fraction: 0.02,
            ..StrategyConfig::default()
        },
        "balanced_momentum" => StrategyConfig {
            name: "Balanced Momentum".into(),
            description: "Follows the trend, with RSI and MACD confirming momentum. More \
                          signals than the conservative preset; a middle ground between \
                          risk and frequency."
                .into(),
            approach: Approach::Momentum,
            min_ev: 0.08,
            min_confidence: 0.65,
            indicators: vec![
                IndicatorConfig::new("rsi").with_param("period", 14.0),
                IndicatorConfig::new("macd")
                    .with_param("fast", 12.0)
                    .with_param("slow", 26.0)
                    .with_param("signal", 9.0),
            ],
            max_position_fraction: 0.02,
            ..StrategyConfig::default()
        },
        "aggressive_scalper" => StrategyConfig {
            name: "Aggressive Scalper".into(),
            description: "Fast indicators and low thresholds give many signals. More \
                          trades also mean more fees and more risk."
                .into(),
            approach: Approach::Momentum,
            min_ev: 0.05,
            min_confidence: 0.60,
            indicators: vec![
                IndicatorConfig::new("rsi").with_param("period", 7.0),
                IndicatorConfig::new("macd")
                    .with_param("fast", 8.0)
                    .with_param("slow", 17.0)
                    .with_param("signal", 9.0),
            ],
            max_position_fraction: 0.03,
            ..StrategyConfig::default()
        },
        _ => return None,
    };
    Some(config)
}

pub fn list_presets() -> Vec<PresetInfo> {
    PRESET_IDS
        .iter()
        .filter_map(|&id| {
            preset(id).map(|c| PresetInfo {
                id,
                name: c.name,
                description: c.description,
                approach: c.approach,
                min_ev: c.min_ev,
                min_confidence: c.min_confidence,
            })
        })
        .collect()
}
