//! Fixed sizing: the same stake every trade, set from initial capital.

/// `max_fraction * initial_capital`, never more than what is left.
pub fn fixed_size(initial_capital: f64, max_fraction: f64, capital: f64) -> f64 {
    if capital <= 0.0 {
        return 0.0;
    }
    (max_fraction.max(0.0) * initial_capital.max(0.0)).min(capital)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_ignores_current_capital() {
        assert_eq!(fixed_size(1000.0, 0.02, 1500.0), 20.0);
        assert_eq!(fixed_size(1000.0, 0.02, 700.0), 20.0);
    }

    #[test]
    fn capped_by_what_is_left() {
        assert_eq!(fixed_size(1000.0, 0.02, 12.5), 12.5);
        assert_eq!(fixed_size(1000.0, 0.02, 0.0), 0.0);
    }
}
