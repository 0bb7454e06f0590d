//! Relative Strength Index (RSI), Wilder smoothing.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Seed: simple averages over the first `period` changes; then
//! avg[t] = (avg[t-1] * (period - 1) + x[t]) / period.
//! Lookback: period.

pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n <= period {
        return out;
    }

    let change = |i: usize| values[i] - values[i - 1];

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let ch = change(i);
        if !ch.is_finite() {
            return out;
        }
        avg_gain += ch.max(0.0);
        avg_loss += (-ch).max(0.0);
    }
    let p = period as f64;
    avg_gain /= p;
    avg_loss /= p;
    out[period] = rsi_from_averages(avg_gain, avg_loss);

    for i in (period + 1)..n {
        let ch = change(i);
        if !ch.is_finite() {
            break;
        }
        avg_gain = (avg_gain * (p - 1.0) + ch.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-ch).max(0.0)) / p;
        out[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    match (avg_gain == 0.0, avg_loss == 0.0) {
        (true, true) => 50.0,
        (false, true) => 100.0,
        (true, false) => 0.0,
        (false, false) => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    }
}
