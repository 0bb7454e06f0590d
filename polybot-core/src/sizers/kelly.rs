//! Fractional Kelly sizing.
//!
//! The Kelly multiplier runs from 0.25 at zero confidence to 0.5 at full
//! confidence. The stake is `EV * multiplier * capital`, capped at
//! `max_fraction * capital`.

pub fn kelly_multiplier(confidence: f64) -> f64 {
    0.25 + 0.25 * confidence.clamp(0.0, 1.0)
}

pub fn kelly_size(expected_value: f64, confidence: f64, capital: f64, max_fraction: f64) -> f64 {
    if expected_value <= 0.0 || capital <= 0.0 {
        return 0.0;
    }
    let raw = expected_value * kelly_multiplier(confidence) * capital;
    let cap = max_fraction.max(0.0) * capital;
    raw.min(cap)
}
