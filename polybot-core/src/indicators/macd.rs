//! MACD: EMA(fast) - EMA(slow), its EMA(signal), and the histogram.
//!
//! The signal line is an EMA of the warmed-up MACD line, so the histogram's
//! first valid value sits at index slow + signal - 2.

use super::ema::ema_of_series;

/// The three MACD series, each the same length as the input.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd_of_series(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema_of_series(values, fast);
    let slow_ema = ema_of_series(values, slow);
    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema_of_series(&macd, signal);
    let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn warmup_lengths() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let s = macd_of_series(&values, 12, 26, 9);
        assert!(s.macd[24].is_nan() && s.macd[25].is_finite());
        assert!(s.histogram[32].is_nan() && s.histogram[33].is_finite());
    }

    #[test]
    fn linear_trend_has_flat_histogram() {
        // On a straight line both EMAs lag by a constant, so MACD settles to a
        // constant and the histogram decays toward zero.
        let values: Vec<f64> = (0..200).map(|i| 100.0 + 0.5 * i as f64).collect();
        let s = macd_of_series(&values, 12, 26, 9);
        assert!(s.macd[199] > 0.0);
        assert_approx(s.histogram[199], 0.0, 1e-6);
    }

    #[test]
    fn histogram_turns_with_price() {
        let mut values: Vec<f64> = (0..60).map(|i| 100.0 + 0.5 * i as f64).collect();
        let top = *values.last().unwrap();
        values.extend((1..=15).map(|i| top - 1.5 * i as f64));
        let s = macd_of_series(&values, 12, 26, 9);
        assert!(*s.histogram.last().unwrap() < 0.0);
    }

    #[test]
    fn oversized_periods_stay_in_warmup() {
        let values: Vec<f64> = (0..100).map(|i| 50.0 + (i as f64 * 0.3).cos()).collect();
        let s = macd_of_series(&values, 12, 26, usize::MAX);
        assert!(s.macd[99].is_finite());
        assert!(s.signal.iter().chain(&s.histogram).all(|v| v.is_nan()));
        let s = macd_of_series(&values, usize::MAX, usize::MAX, 9);
        assert!(s.histogram.iter().all(|v| v.is_nan()));
    }
}
