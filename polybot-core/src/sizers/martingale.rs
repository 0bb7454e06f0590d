//! Martingale sizing: double the stake after every consecutive loss.
//!
//! `base_fraction * capital * 2^k` for a streak of k losses, capped at
//! `MARTINGALE_CAP_FRACTION` of capital.

pub const MARTINGALE_CAP_FRACTION: f64 = 0.9;

pub fn martingale_size(base_fraction: f64, capital: f64, consecutive_losses: u32) -> f64 {
    if capital <= 0.0 || !base_fraction.is_finite() || base_fraction <= 0.0 {
        return 0.0;
    }
    // 2^k overflows to inf long after the cap binds; clamp the exponent.
    let factor = 2f64.powi(consecutive_losses.min(1023) as i32);
    (base_fraction * capital * factor).min(MARTINGALE_CAP_FRACTION * capital)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_per_loss() {
        assert!((martingale_size(0.01, 1000.0, 0) - 10.0).abs() < 1e-9);
        assert!((martingale_size(0.01, 1000.0, 1) - 20.0).abs() < 1e-9);
        assert!((martingale_size(0.01, 1000.0, 4) - 160.0).abs() < 1e-9);
    }

    #[test]
    fn capped_at_ninety_percent() {
        assert!((martingale_size(0.01, 1000.0, 7) - 900.0).abs() < 1e-9);
        assert!((martingale_size(0.01, 1000.0, 5000) - 900.0).abs() < 1e-9);
    }

    #[test]
    fn exhausted_or_invalid_is_zero() {
        assert_eq!(martingale_size(0.01, 0.0, 2), 0.0);
        assert_eq!(martingale_size(0.0, 1000.0, 2), 0.0);
        assert_eq!(martingale_size(f64::NAN, 1000.0, 2), 0.0);
    }
}
