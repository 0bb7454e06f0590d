//! Bollinger band-position reading.
//!
//! Position 0 is the lower band, 1 the upper. A close near either band leans
//! toward reversion to the middle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{param, param_usize, SignalProducer};
use crate::domain::{Bar, Direction, IndicatorSignal};
use crate::indicators::{band_reading, closes};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    pub period: usize,
    pub std_dev: f64,
    pub lower_zone: f64,
    pub upper_zone: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev: 2.0,
            lower_zone: 0.35,
            upper_zone: 0.65,
        }
    }
}

impl BollingerParams {
    /// Accepts `std` as an alias of `std_dev`.
    pub fn from_params(params: &BTreeMap<String, f64>) -> Self {
        let d = Self::default();
        let std_dev = param(params, "std", d.std_dev);
        Self {
            period: param_usize(params, "period", d.period),
            std_dev: param(params, "std_dev", std_dev),
            lower_zone: param(params, "lower_zone", d.lower_zone),
            upper_zone: param(params, "upper_zone", d.upper_zone),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BollingerPosition {
    params: BollingerParams,
}

impl BollingerPosition {
    pub const NAME: &'static str = "Bollinger";

    pub fn new(params: BollingerParams) -> Self {
        Self { params }
    }

    /// Classify a band position.
    pub fn read(&self, position: f64) -> IndicatorSignal {
        let BollingerParams {
            lower_zone,
            upper_zone,
            ..
        } = self.params;
        let pct = position * 100.0;

        if position < lower_zone && lower_zone > 0.0 {
            IndicatorSignal::new(
                Self::NAME,
                position,
                format!("near lower band ({pct:.0}%)"),
                Some(Direction::Up),
                (lower_zone - position) / lower_zone,
            )
        } else if position > upper_zone && upper_zone < 1.0 {
            IndicatorSignal::new(
                Self::NAME,
                position,
                format!("near upper band ({pct:.0}%)"),
                Some(Direction::Down),
                (position - upper_zone) / (1.0 - upper_zone),
            )
        } else {
            IndicatorSignal::neutral(Self::NAME, position, format!("mid band ({pct:.0}%)"))
        }
    }
}

impl SignalProducer for BollingerPosition {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn min_bars(&self) -> usize {
        self.params.period
    }

    fn evaluate(&self, bars: &[Bar]) -> IndicatorSignal {
        let values = closes(bars);
        let reading = band_reading(&values, self.params.period, self.params.std_dev);
        match (reading, values.last()) {
            (Some(bands), Some(&price)) => self.read(bands.position(price)),
            _ => IndicatorSignal::insufficient(Self::NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::make_bars;

    fn producer() -> BollingerPosition {
        BollingerPosition::new(BollingerParams::default())
    }

    #[test]
    fn lower_zone_leans_up() {
        let s = producer().read(0.0);
        assert_eq!(s.bias, Some(Direction::Up));
        assert_eq!(s.strength, 1.0);

        let half = producer().read(0.175);
        assert!((half.strength - 0.5).abs() < 1e-12);
    }

    #[test]
    fn upper_zone_leans_down() {
        let s = producer().read(0.825);
        assert_eq!(s.bias, Some(Direction::Down));
        assert!((s.strength - 0.5).abs() < 1e-12);
    }

    #[test]
    fn outside_bands_saturates() {
        assert_eq!(producer().read(1.4).strength, 1.0);
        assert_eq!(producer().read(-0.3).strength, 1.0);
    }

    #[test]
    fn flat_series_is_neutral() {
        let s = producer().evaluate(&make_bars(&[100.0; 30]));
        assert!(!s.is_directional());
        assert_eq!(s.value, 0.5);
    }

    #[test]
    fn spike_reads_upper_band() {
        let mut closes = vec![100.0; 19];
        closes.push(104.0);
        let s = producer().evaluate(&make_bars(&closes));
        assert_eq!(s.bias, Some(Direction::Down));
    }

    #[test]
    fn std_alias_is_accepted() {
        let mut map = BTreeMap::new();
        map.insert("std".to_string(), 2.5);
        assert_eq!(BollingerParams::from_params(&map).std_dev, 2.5);
        map.insert("std_dev".to_string(), 1.5);
        assert_eq!(BollingerParams::from_params(&map).std_dev, 1.5);
    }

    #[test]
    fn short_window_is_insufficient() {
        let s = producer().evaluate(&make_bars(&[100.0; 19]));
        assert_eq!(s.interpretation, "insufficient data");
    }
}
