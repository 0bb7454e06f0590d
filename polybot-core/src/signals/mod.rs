//! Indicator signal producers.
//!
//! Each producer maps a window of bars (oldest → newest) to exactly one
//! `IndicatorSignal`. Producers never fail: a window that is too short for
//! the indicator yields a neutral "insufficient data" reading.

pub mod bollinger;
pub mod ema_cross;
pub mod macd;
pub mod rsi;

pub use bollinger::{BollingerParams, BollingerPosition};
pub use ema_cross::{EmaCross, EmaCrossParams};
pub use macd::{MacdMomentum, MacdParams};
pub use rsi::{RsiParams, RsiReversion};

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::IndicatorConfig;
use crate::domain::{Bar, IndicatorSignal};

/// Strength added when the tracked difference changed sign within the last
/// three bars.
pub const CROSSOVER_BONUS: f64 = 0.3;

/// Relative magnitude below which a difference of averages counts as zero.
/// Keeps float residue on a flat series from reading as a trend.
pub const FLAT_TOLERANCE: f64 = 1e-9;

/// Largest lookback any producer accepts. Longer periods are clamped here
/// and rejected by `StrategyConfig::validate`.
pub const MAX_PERIOD: usize = 10_000;

/// Parameter names read as lookback periods.
pub const PERIOD_PARAMS: [&str; 4] = ["period", "fast", "slow", "signal"];

/// A pure mapping from a bar window to one directional reading.
pub trait SignalProducer: Send + Sync {
    /// Display name carried on every reading (e.g. "RSI").
    fn name(&self) -> &str;

    /// Bars needed before the reading stops being "insufficient data".
    /// Shorter windows are answered without computing any series.
    fn min_bars(&self) -> usize;

    fn evaluate(&self, bars: &[Bar]) -> IndicatorSignal;
}

// ─── Factory ─────────────────────────────────────────────────────────

/// Registry names understood by `create_producer`.
pub const PRODUCER_NAMES: [&str; 4] = ["rsi", "macd", "bollinger", "ema_cross"];

/// Build a producer from its config. Unknown names yield `None`.
pub fn create_producer(config: &IndicatorConfig) -> Option<Box<dyn SignalProducer>> {
    let params = &config.params;
    match config.name.to_ascii_lowercase().as_str() {
        "rsi" => Some(Box::new(RsiReversion::new(RsiParams::from_params(params)))),
        "macd" => Some(Box::new(MacdMomentum::new(MacdParams::from_params(params)))),
        "bollinger" => Some(Box::new(BollingerPosition::new(
            BollingerParams::from_params(params),
        ))),
        "ema_cross" => Some(Box::new(EmaCross::new(EmaCrossParams::from_params(params)))),
        _ => None,
    }
}

/// Run every enabled indicator over `bars`, in config order.
///
/// Disabled configs and names with no matching producer are skipped, so
/// indicator lists written for newer builds still load.
pub fn evaluate_indicators(bars: &[Bar], configs: &[IndicatorConfig]) -> Vec<IndicatorSignal> {
    configs
        .iter()
        .filter(|c| c.enabled)
        .filter_map(|c| {
            let producer = create_producer(c);
            if producer.is_none() {
                debug!(indicator = %c.name, "no producer registered, skipping");
            }
            producer
        })
        .map(|p| {
            if bars.len() < p.min_bars() {
                IndicatorSignal::insufficient(p.name())
            } else {
                p.evaluate(bars)
            }
        })
        .collect()
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Extract a named f64 parameter, falling back to `default`.
pub(crate) fn param(params: &BTreeMap<String, f64>, name: &str, default: f64) -> f64 {
    params
        .get(name)
        .copied()
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// Extract a named period parameter, falling back to `default`. Periods are
/// kept within [1, MAX_PERIOD].
pub(crate) fn param_usize(params: &BTreeMap<String, f64>, name: &str, default: usize) -> usize {
    params
        .get(name)
        .copied()
        .filter(|v| v.is_finite() && *v >= 1.0)
        .map(|v| v.min(MAX_PERIOD as f64) as usize)
        .unwrap_or(default)
}

/// True when `then` and `now` have strictly opposite signs.
pub(crate) fn sign_flipped(then: f64, now: f64) -> bool {
    (then < 0.0 && now > 0.0) || (then > 0.0 && now < 0.0)
}
