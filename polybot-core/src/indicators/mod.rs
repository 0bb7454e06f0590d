//! Indicator series used by the signal producers.
//!
//! Indicators are pure functions over close prices. Series outputs have the
//! same length as the input, with `f64::NAN` during warmup. Producers only
//! read the tail of a series, but computing the whole series keeps each
//! indicator testable against a truncated-vs-full history.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;

pub use bollinger::{band_reading, BandReading};
pub use ema::ema_of_series;
pub use macd::{macd_of_series, MacdSeries};
pub use rsi::rsi_of_series;

use crate::domain::Bar;

/// Close prices of a bar slice.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Value `back` positions before the end of a series, if present and finite.
pub fn from_end(series: &[f64], back: usize) -> Option<f64> {
    let n = series.len();
    if back >= n {
        return None;
    }
    let v = series[n - 1 - back];
    v.is_finite().then_some(v)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_end_skips_warmup() {
        let series = [f64::NAN, f64::NAN, 1.0, 2.0];
        assert_eq!(from_end(&series, 0), Some(2.0));
        assert_eq!(from_end(&series, 1), Some(1.0));
        assert_eq!(from_end(&series, 2), None);
        assert_eq!(from_end(&series, 10), None);
    }

    #[test]
    fn indicators_are_causal() {
        // Truncated-vs-full: values on the shared prefix must agree.
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0 + i as f64 * 0.05)
            .collect();
        let truncated = &closes[..50];

        let series: Vec<(&str, fn(&[f64]) -> Vec<f64>)> = vec![
            ("ema_9", |v| ema_of_series(v, 9)),
            ("rsi_14", |v| rsi_of_series(v, 14)),
            ("macd_hist", |v| macd_of_series(v, 12, 26, 9).histogram),
        ];

        for (name, compute) in &series {
            let a = compute(&closes);
            let b = compute(truncated);
            for i in 0..truncated.len() {
                if b[i].is_nan() {
                    assert!(a[i].is_nan(), "{name} warmup differs at {i}");
                } else {
                    assert_approx(a[i], b[i], DEFAULT_EPSILON);
                }
            }
        }
    }
}
