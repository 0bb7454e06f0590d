//! RSI mean-reversion reading.
//!
//! Below `oversold` the market is stretched down and the reading leans UP;
//! above `overbought` it leans DOWN. Strength scales with the distance past
//! the threshold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{param, param_usize, SignalProducer};
use crate::domain::{Bar, Direction, IndicatorSignal};
use crate::indicators::{closes, from_end, rsi_of_series};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiParams {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 40.0,
            overbought: 60.0,
        }
    }
}

impl RsiParams {
    pub fn from_params(params: &BTreeMap<String, f64>) -> Self {
        let d = Self::default();
        Self {
            period: param_usize(params, "period", d.period),
            oversold: param(params, "oversold", d.oversold),
            overbought: param(params, "overbought", d.overbought),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RsiReversion {
    params: RsiParams,
}

impl RsiReversion {
    pub const NAME: &'static str = "RSI";

    pub fn new(params: RsiParams) -> Self {
        Self { params }
    }

    /// Classify an RSI value against the thresholds.
    pub fn read(&self, rsi: f64) -> IndicatorSignal {
        let RsiParams {
            oversold,
            overbought,
            ..
        } = self.params;

        if rsi < oversold && oversold > 0.0 {
            IndicatorSignal::new(
                Self::NAME,
                rsi,
                format!("oversold ({rsi:.0} < {oversold:.0})"),
                Some(Direction::Up),
                (oversold - rsi) / oversold,
            )
        } else if rsi > overbought && overbought < 100.0 {
            IndicatorSignal::new(
                Self::NAME,
                rsi,
                format!("overbought ({rsi:.0} > {overbought:.0})"),
                Some(Direction::Down),
                (rsi - overbought) / (100.0 - overbought),
            )
        } else {
            IndicatorSignal::neutral(Self::NAME, rsi, format!("neutral zone ({rsi:.0})"))
        }
    }
}

impl SignalProducer for RsiReversion {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn min_bars(&self) -> usize {
        self.params.period + 1
    }

    fn evaluate(&self, bars: &[Bar]) -> IndicatorSignal {
        let series = rsi_of_series(&closes(bars), self.params.period);
        match from_end(&series, 0) {
            Some(rsi) => self.read(rsi),
            None => IndicatorSignal::insufficient(Self::NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::make_bars;

    fn producer() -> RsiReversion {
        RsiReversion::new(RsiParams::default())
    }

    #[test]
    fn oversold_leans_up() {
        let s = producer().read(30.0);
        assert_eq!(s.bias, Some(Direction::Up));
        assert!((s.strength - 0.25).abs() < 1e-12);
    }

    #[test]
    fn overbought_leans_down() {
        let s = producer().read(70.0);
        assert_eq!(s.bias, Some(Direction::Down));
        assert!((s.strength - 0.25).abs() < 1e-12);
    }

    #[test]
    fn band_is_neutral() {
        for rsi in [40.0, 50.0, 60.0] {
            let s = producer().read(rsi);
            assert!(!s.is_directional());
            assert_eq!(s.strength, 0.0);
        }
    }

    #[test]
    fn extremes_saturate() {
        assert_eq!(producer().read(0.0).strength, 1.0);
        assert_eq!(producer().read(100.0).strength, 1.0);
    }

    #[test]
    fn falling_series_reads_oversold() {
        let closes: Vec<f64> = (0..30).map(|i| 200.0 - 1.5 * i as f64).collect();
        let s = producer().evaluate(&make_bars(&closes));
        assert_eq!(s.bias, Some(Direction::Up));
        assert_eq!(s.value, 0.0);
        assert_eq!(s.strength, 1.0);
    }

    #[test]
    fn short_window_is_insufficient() {
        let s = producer().evaluate(&make_bars(&[1.0; 14]));
        assert_eq!(s.interpretation, "insufficient data");
        assert_eq!(producer().min_bars(), 15);
    }

    #[test]
    fn params_decode_with_defaults() {
        let mut map = BTreeMap::new();
        map.insert("period".to_string(), 7.0);
        let p = RsiParams::from_params(&map);
        assert_eq!(p.period, 7);
        assert_eq!(p.oversold, 40.0);
        assert_eq!(p.overbought, 60.0);
    }
}
