//! Polybot Core: directional-edge scoring for binary up/down markets.
//!
//! This crate holds the pure decision pipeline:
//! - Domain types (bars, indicator readings, signals, trades, ids)
//! - Indicator series and the signal producers built on them
//! - Signal combiner, expected value and confidence, trade decision
//! - Position sizing policies (Kelly, fixed, martingale)
//! - Execution cost model (slippage, fees, take-profit settlement)
//! - Strategy configuration, presets, deterministic RNG
//!
//! Nothing here does I/O beyond `StrategyConfig::from_file`, and nothing
//! fails on bad market data: short windows read as neutral, exhausted
//! capital sizes to zero.

pub mod combiner;
pub mod config;
pub mod domain;
pub mod ev;
pub mod execution;
pub mod indicators;
pub mod presets;
pub mod rng;
pub mod signals;
pub mod sizers;

pub use combiner::{combine_signals, Combination};
pub use config::{Approach, ConfigError, DecisionPolicy, IndicatorConfig, StrategyConfig};
pub use ev::{confidence, evaluate_market, expected_value, generate_signal, RiskState};
pub use signals::evaluate_indicators;
pub use sizers::{size_position, SizingInputs, SizingPolicy};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all core domain types are Send + Sync.
    ///
    /// Independent simulations run on a rayon pool and share configs and bar
    /// slices by reference; if any type fails this check, the build breaks.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::IndicatorSignal>();
        require_sync::<domain::IndicatorSignal>();
        require_send::<domain::MarketSnapshot>();
        require_sync::<domain::MarketSnapshot>();
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();

        // ID types
        require_send::<domain::ConfigHash>();
        require_sync::<domain::ConfigHash>();
        require_send::<domain::SimulationId>();
        require_sync::<domain::SimulationId>();
        require_send::<domain::TradeId>();
        require_sync::<domain::TradeId>();

        // Configuration
        require_send::<StrategyConfig>();
        require_sync::<StrategyConfig>();
        require_send::<SizingPolicy>();
        require_sync::<SizingPolicy>();
        require_send::<execution::ExecutionModel>();
        require_sync::<execution::ExecutionModel>();

        // Pipeline values
        require_send::<Combination>();
        require_sync::<Combination>();
        require_send::<RiskState>();
        require_sync::<RiskState>();
        require_send::<Box<dyn signals::SignalProducer>>();
        require_sync::<Box<dyn signals::SignalProducer>>();
    }

    /// Architecture contract: producers see bars only.
    ///
    /// `SignalProducer::evaluate` takes `&[Bar]` and nothing else, so a
    /// reading cannot depend on capital, streaks or the market quote.
    #[test]
    fn producer_trait_has_no_risk_parameter() {
        fn _check_trait_object_builds(
            producer: &dyn signals::SignalProducer,
            bars: &[domain::Bar],
        ) -> domain::IndicatorSignal {
            producer.evaluate(bars)
        }
    }
}
