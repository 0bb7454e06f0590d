//! MACD momentum reading.
//!
//! The histogram's sign gives the bias. Strength is the histogram as a
//! percentage of price, doubled, so a 0.5% histogram saturates. A sign flip
//! over the last three histogram values adds `CROSSOVER_BONUS`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{param_usize, sign_flipped, SignalProducer, CROSSOVER_BONUS, FLAT_TOLERANCE};
use crate::domain::{Bar, Direction, IndicatorSignal};
use crate::indicators::macd::macd_of_series;
use crate::indicators::{closes, from_end};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl MacdParams {
    pub fn from_params(params: &BTreeMap<String, f64>) -> Self {
        let d = Self::default();
        Self {
            fast: param_usize(params, "fast", d.fast),
            slow: param_usize(params, "slow", d.slow),
            signal: param_usize(params, "signal", d.signal),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MacdMomentum {
    params: MacdParams,
}

impl MacdMomentum {
    pub const NAME: &'static str = "MACD";

    pub fn new(params: MacdParams) -> Self {
        Self { params }
    }

    /// Classify the latest histogram value.
    ///
    /// `histogram_two_back` is the value two bars earlier, if warmed up.
    pub fn read(
        &self,
        histogram: f64,
        histogram_two_back: Option<f64>,
        price: f64,
    ) -> IndicatorSignal {
        if histogram.abs() <= price.abs() * FLAT_TOLERANCE {
            return IndicatorSignal::neutral(Self::NAME, histogram, "flat momentum");
        }
        let crossover = histogram_two_back.is_some_and(|then| sign_flipped(then, histogram));
        let suffix = if crossover { " (recent crossover)" } else { "" };

        let bias = if histogram > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        };

        let mut strength = (histogram.abs() / price * 100.0 * 2.0).min(1.0);
        if crossover {
            strength = (strength + CROSSOVER_BONUS).min(1.0);
        }

        let label = match bias {
            Direction::Up => "bullish momentum",
            Direction::Down => "bearish momentum",
        };
        IndicatorSignal::new(
            Self::NAME,
            histogram,
            format!("{label}{suffix}"),
            Some(bias),
            strength,
        )
    }
}

impl SignalProducer for MacdMomentum {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn min_bars(&self) -> usize {
        self.params.fast.max(self.params.slow) + self.params.signal - 1
    }

    fn evaluate(&self, bars: &[Bar]) -> IndicatorSignal {
        let values = closes(bars);
        let price = match values.last() {
            Some(&p) if p.is_finite() && p > 0.0 => p,
            _ => return IndicatorSignal::insufficient(Self::NAME),
        };

        let MacdParams { fast, slow, signal } = self.params;
        let series = macd_of_series(&values, fast, slow, signal);
        match from_end(&series.histogram, 0) {
            Some(hist) => self.read(hist, from_end(&series.histogram, 2), price),
            None => IndicatorSignal::insufficient(Self::NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::make_bars;

    fn producer() -> MacdMomentum {
        MacdMomentum::new(MacdParams::default())
    }

    #[test]
    fn histogram_sign_sets_bias() {
        let up = producer().read(0.1, Some(0.05), 100.0);
        assert_eq!(up.bias, Some(Direction::Up));
        // 0.1 / 100 * 100 * 2 = 0.2
        assert!((up.strength - 0.2).abs() < 1e-12);

        let down = producer().read(-0.1, Some(-0.2), 100.0);
        assert_eq!(down.bias, Some(Direction::Down));
    }

    #[test]
    fn crossover_adds_bonus() {
        let s = producer().read(0.1, Some(-0.05), 100.0);
        assert!((s.strength - 0.5).abs() < 1e-12);
        assert!(s.interpretation.contains("recent crossover"));
    }

    #[test]
    fn strength_saturates() {
        let s = producer().read(5.0, Some(-1.0), 100.0);
        assert_eq!(s.strength, 1.0);
    }

    #[test]
    fn zero_histogram_is_neutral() {
        assert!(!producer().read(0.0, Some(0.3), 100.0).is_directional());
    }

    #[test]
    fn flat_series_is_neutral() {
        let s = producer().evaluate(&make_bars(&[64_250.0; 60]));
        assert!(!s.is_directional());
    }

    #[test]
    fn reversal_reads_bearish() {
        let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + 0.5 * i as f64).collect();
        let top = *closes.last().unwrap();
        closes.extend((1..=15).map(|i| top - 1.5 * i as f64));
        let s = producer().evaluate(&make_bars(&closes));
        assert_eq!(s.bias, Some(Direction::Down));
        assert!(s.strength > 0.0);
    }

    #[test]
    fn short_window_is_insufficient() {
        let closes: Vec<f64> = (0..33).map(|i| 100.0 + i as f64).collect();
        assert_eq!(producer().min_bars(), 34);
        let s = producer().evaluate(&make_bars(&closes));
        assert_eq!(s.interpretation, "insufficient data");
    }
}
