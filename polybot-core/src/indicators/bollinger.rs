//! Bollinger Bands: SMA(period) +/- multiplier * population stddev.
//!
//! Producers only need the bands at the latest bar, so there is no series
//! form. Lookback: period - 1.

/// All three bands at the last value of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandReading {
    pub lower: f64,
    pub middle: f64,
    pub upper: f64,
}

impl BandReading {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Fractional position of `price` between the bands: 0 at the lower
    /// band, 1 at the upper. Collapsed bands report the midpoint.
    pub fn position(&self, price: f64) -> f64 {
        let width = self.width();
        if width > 0.0 && width.is_finite() {
            (price - self.lower) / width
        } else {
            0.5
        }
    }
}

/// Bands over the last `period` values of `values`, or `None` when the
/// window is short or contains a gap.
pub fn band_reading(values: &[f64], period: usize, multiplier: f64) -> Option<BandReading> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    if window.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let n = period as f64;
    let middle = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|v| (v - middle).powi(2)).sum::<f64>() / n;
    let half = multiplier * variance.sqrt();

    Some(BandReading {
        lower: middle - half,
        middle,
        upper: middle + half,
    })
}
