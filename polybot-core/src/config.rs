//! Serializable strategy configuration.
//!
//! A `StrategyConfig` is owned by the caller and only ever read by the core.
//! It loads from TOML, validates against fixed bounds, and hashes to a
//! content id so identical strategies share simulation ids.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ConfigHash;
use crate::signals::{MAX_PERIOD, PERIOD_PARAMS};
use crate::sizers::SizingPolicy;

/// Errors from loading or validating a strategy configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {field}: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("indicator entry {index} has an empty name")]
    UnnamedIndicator { index: usize },
}

/// Trading style label. Descriptive only: every enabled indicator votes
/// regardless of approach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approach {
    Momentum,
    MeanReversion,
    Hybrid,
    #[default]
    Auto,
}

/// How the trade/no-trade decision reads EV and confidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPolicy {
    /// Any directional signal with positive EV trades. Thresholds ignored.
    PositiveEdge,
    /// Positive EV, EV at or above `min_ev`, confidence at or above
    /// `min_confidence`.
    #[default]
    Thresholds,
}

/// One indicator entry: registry name plus numeric parameters.
///
/// `BTreeMap` keeps serialization (and so hashing) order deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

fn default_enabled() -> bool {
    true
}

impl IndicatorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Complete strategy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub name: String,
    pub description: String,
    pub approach: Approach,

    // ── Thresholds ──
    pub min_ev: f64,
    pub min_confidence: f64,
    pub decision_policy: DecisionPolicy,

    pub indicators: Vec<IndicatorConfig>,

    // ── Risk ──
    pub initial_capital: f64,
    pub max_position_fraction: f64,
    pub position_sizing: SizingPolicy,

    // ── Costs and exits ──
    /// Base fee/slippage fraction, also charged on winning profit.
    pub fee_fraction: f64,
    /// Contract price at which a winning position is closed early.
    pub take_profit: Option<f64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            name: "Custom Strategy".to_string(),
            description: String::new(),
            approach: Approach::Auto,
            min_ev: 0.08,
            min_confidence: 0.65,
            decision_policy: DecisionPolicy::Thresholds,
            indicators: Vec::new(),
            initial_capital: 1000.0,
            max_position_fraction: 0.02,
            position_sizing: SizingPolicy::Kelly,
            fee_fraction: 0.01,
            take_profit: None,
        }
    }
}

impl StrategyConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("min_ev", self.min_ev, 0.0, 1.0, "0 <= min_ev <= 1")?;
        check(
            "min_confidence",
            self.min_confidence,
            0.0,
            1.0,
            "0 <= min_confidence <= 1",
        )?;
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "initial_capital",
                value: self.initial_capital,
                expected: "a positive amount",
            });
        }
        if !(self.max_position_fraction > 0.0 && self.max_position_fraction <= 0.5) {
            return Err(ConfigError::OutOfRange {
                field: "max_position_fraction",
                value: self.max_position_fraction,
                expected: "0 < max_position_fraction <= 0.5",
            });
        }
        if let SizingPolicy::Martingale { base_fraction } = self.position_sizing {
            if !(base_fraction > 0.0 && base_fraction <= 0.1) {
                return Err(ConfigError::OutOfRange {
                    field: "position_sizing.base_fraction",
                    value: base_fraction,
                    expected: "0 < base_fraction <= 0.1",
                });
            }
        }
        check("fee_fraction", self.fee_fraction, 0.0, 0.1, "0 <= fee_fraction <= 0.1")?;
        if let Some(tp) = self.take_profit {
            if !(tp > 0.0 && tp < 1.0) {
                return Err(ConfigError::OutOfRange {
                    field: "take_profit",
                    value: tp,
                    expected: "0 < take_profit < 1",
                });
            }
        }
        if let Some(index) = self.indicators.iter().position(|i| i.name.trim().is_empty()) {
            return Err(ConfigError::UnnamedIndicator { index });
        }
        for indicator in &self.indicators {
            for (key, &value) in &indicator.params {
                if PERIOD_PARAMS.contains(&key.as_str()) && value > MAX_PERIOD as f64 {
                    return Err(ConfigError::OutOfRange {
                        field: "indicators.params",
                        value,
                        expected: "periods of at most 10000 bars",
                    });
                }
            }
        }
        Ok(())
    }

    /// Content hash of the canonical JSON form.
    pub fn config_hash(&self) -> ConfigHash {
        // Every field is a plain number, string, enum or BTreeMap.
        let json = serde_json::to_string(self).unwrap_or_default();
        ConfigHash::from_bytes(json.as_bytes())
    }

    /// Enabled indicator entries, in order.
    pub fn enabled_indicators(&self) -> impl Iterator<Item = &IndicatorConfig> {
        self.indicators.iter().filter(|i| i.enabled)
    }
}

fn check(
    field: &'static str,
    value: f64,
    lo: f64,
    hi: f64,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if (lo..=hi).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}
