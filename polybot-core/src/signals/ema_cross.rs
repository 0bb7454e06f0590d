//! Fast/slow EMA crossover reading.
//!
//! The gap between the averages, as a percentage of the slow EMA, gives the
//! bias; a 2% gap saturates strength. A sign flip of the gap over the last
//! three bars adds `CROSSOVER_BONUS`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{param_usize, sign_flipped, SignalProducer, CROSSOVER_BONUS, FLAT_TOLERANCE};
use crate::domain::{Bar, Direction, IndicatorSignal};
use crate::indicators::{closes, ema_of_series, from_end};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmaCrossParams {
    pub fast: usize,
    pub slow: usize,
}

impl Default for EmaCrossParams {
    fn default() -> Self {
        Self { fast: 9, slow: 21 }
    }
}

impl EmaCrossParams {
    pub fn from_params(params: &BTreeMap<String, f64>) -> Self {
        let d = Self::default();
        Self {
            fast: param_usize(params, "fast", d.fast),
            slow: param_usize(params, "slow", d.slow),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmaCross {
    params: EmaCrossParams,
}

impl EmaCross {
    pub const NAME: &'static str = "EMA Cross";

    pub fn new(params: EmaCrossParams) -> Self {
        Self { params }
    }

    /// Classify the latest fast/slow pair. `gap_two_back` is `fast - slow`
    /// two bars earlier, if available.
    pub fn read(&self, fast: f64, slow: f64, gap_two_back: Option<f64>) -> IndicatorSignal {
        let gap = fast - slow;
        if gap.abs() <= slow.abs() * FLAT_TOLERANCE {
            return IndicatorSignal::neutral(Self::NAME, 0.0, "averages level");
        }
        let diff_pct = gap / slow * 100.0;
        let crossover = gap_two_back.is_some_and(|then| sign_flipped(then, gap));
        let suffix = if crossover { ", recent crossover" } else { "" };

        let (bias, label) = if gap > 0.0 {
            (Direction::Up, "uptrend")
        } else {
            (Direction::Down, "downtrend")
        };

        let mut strength = (diff_pct.abs() / 2.0).min(1.0);
        if crossover {
            strength = (strength + CROSSOVER_BONUS).min(1.0);
        }

        IndicatorSignal::new(
            Self::NAME,
            diff_pct,
            format!("{label} ({diff_pct:+.2}%{suffix})"),
            Some(bias),
            strength,
        )
    }
}

impl SignalProducer for EmaCross {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn min_bars(&self) -> usize {
        self.params.fast.max(self.params.slow)
    }

    fn evaluate(&self, bars: &[Bar]) -> IndicatorSignal {
        let values = closes(bars);
        let fast = ema_of_series(&values, self.params.fast);
        let slow = ema_of_series(&values, self.params.slow);
        let gap: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

        match (from_end(&fast, 0), from_end(&slow, 0)) {
            (Some(f), Some(s)) if s != 0.0 => self.read(f, s, from_end(&gap, 2)),
            _ => IndicatorSignal::insufficient(Self::NAME),
        }
    }
}
