//! Exponential Moving Average (EMA).
//!
//! EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seeded with the SMA of the first `period` values, so the first valid
//! output sits at index period-1.

/// EMA of an arbitrary series.
///
/// Leading NaNs are skipped: the seed window starts at the first finite
/// value, which lets MACD take an EMA of its own warmed-up MACD line. A NaN
/// after the seed taints the rest of the output.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 {
        return out;
    }

    let Some(start) = values.iter().position(|v| v.is_finite()) else {
        return out;
    };
    let Some(seed_end) = start.checked_add(period).filter(|&end| end <= n) else {
        return out;
    };

    let seed_window = &values[start..seed_end];
    if seed_window.iter().any(|v| !v.is_finite()) {
        return out;
    }
    let mut prev = seed_window.iter().sum::<f64>() / period as f64;
    out[seed_end - 1] = prev;

    let alpha = 2.0 / (period as f64 + 1.0);
    for i in seed_end..n {
        let x = values[i];
        if !x.is_finite() {
            break;
        }
        prev = alpha * x + (1.0 - alpha) * prev;
        out[i] = prev;
    }

    out
}
