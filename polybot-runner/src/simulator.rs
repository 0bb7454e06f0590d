//! Walk-forward backtest simulator.
//!
//! A run moves through three phases:
//! - `Initialized`: configs validated, nothing evaluated yet
//! - `Stepping`: indicator readings for every decision window were computed
//!   up front (in parallel, they only read bars); the sequential pass then
//!   threads a `RunState` through `apply_step` one window at a time
//! - `Sealed`: metrics computed and the `Simulation` handed out
//!
//! Step boundaries sit at `t = window_size - 1, 2 * window_size - 1, ...`.
//! The trade placed at `t` resolves against the close at `t + window_size`:
//! UP wins iff that close is strictly above the close at `t`.

use chrono::Utc;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use polybot_core::domain::{
    Bar, Direction, IndicatorSignal, MarketSnapshot, SimulationId, Trade, TradeId, TradeResult,
};
use polybot_core::ev::{generate_signal, RiskState};
use polybot_core::execution::{contract_price, settle, ExecutionModel, MIN_CONTRACT_PRICE};
use polybot_core::rng::rng_for;
use polybot_core::signals::evaluate_indicators;
use polybot_core::{ConfigError, StrategyConfig};

use crate::data_loader::{dataset_hash, LoadError};
use crate::metrics::SimulationMetrics;
use crate::simulation::{Simulation, SCHEMA_VERSION};

/// Errors from setting up or driving a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("simulation already sealed")]
    AlreadySealed,
}

// ─── Configuration ──────────────────────────────────────────────────

/// Replay parameters, independent of the strategy being replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Bars per decision interval (15 one-minute bars = a 15-minute market).
    pub window_size: usize,
    /// Most recent bars fed to the indicators at each step.
    pub history_bars: usize,
    /// Windows shorter than this are skipped.
    pub min_lookback: usize,
    pub seed: u64,
    pub execution: ExecutionModel,
    pub asset: String,
    pub market_id: String,
    pub market_name: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            window_size: 15,
            history_bars: 100,
            min_lookback: 20,
            seed: 42,
            execution: ExecutionModel::default(),
            asset: "BTC".to_string(),
            market_id: "btc-updown-15m".to_string(),
            market_name: "Bitcoin Up or Down - 15 minutes".to_string(),
        }
    }
}

impl SimulationConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "window_size",
                value: 0.0,
                expected: "at least one bar",
            });
        }
        if self.history_bars < self.min_lookback.max(1) {
            return Err(ConfigError::OutOfRange {
                field: "history_bars",
                value: self.history_bars as f64,
                expected: "history_bars >= min_lookback",
            });
        }
        let exec = &self.execution;
        for (field, value) in [
            ("execution.impact_coefficient", exec.impact_coefficient),
            ("execution.liquidity", exec.liquidity),
            ("execution.max_noise", exec.max_noise),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    expected: "a finite, non-negative number",
                });
            }
        }
        Ok(())
    }
}

// ─── Market prices ──────────────────────────────────────────────────

/// Where the simulated market quote comes from at each step.
pub trait MarketPriceSource: Send + Sync {
    /// Implied probability of UP at `bar_index`.
    fn implied_price(&self, bar_index: usize, bar: &Bar) -> f64;
}

/// Same quote at every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantPrice(pub f64);

impl MarketPriceSource for ConstantPrice {
    fn implied_price(&self, _bar_index: usize, _bar: &Bar) -> f64 {
        self.0
    }
}

/// One quote per bar. Indices past the end reuse the last quote; an empty
/// series quotes a coin flip.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(prices: Vec<f64>) -> Self {
        Self { prices }
    }
}

impl MarketPriceSource for PriceSeries {
    fn implied_price(&self, bar_index: usize, _bar: &Bar) -> f64 {
        self.prices
            .get(bar_index)
            .or_else(|| self.prices.last())
            .copied()
            .unwrap_or(0.5)
    }
}

/// Keep a quote inside [0.01, 0.99]; NaN reads as 0.5.
pub fn clamp_market_price(price: f64) -> f64 {
    if price.is_nan() {
        0.5
    } else {
        price.clamp(MIN_CONTRACT_PRICE, 1.0 - MIN_CONTRACT_PRICE)
    }
}

// ─── Decision plan ──────────────────────────────────────────────────

/// Everything about a decision window that depends on bars alone.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    /// Index of the latest bar in the evaluation window.
    pub bar_index: usize,
    /// Index of the bar the trade resolves on.
    pub resolve_index: usize,
    pub market: MarketSnapshot,
    pub readings: Vec<IndicatorSignal>,
}

/// Step boundaries that have a full resolution bar and enough history.
pub fn step_indices(bar_count: usize, config: &SimulationConfig) -> Vec<usize> {
    let ws = config.window_size.max(1);
    (1..)
        .map(|k| k * ws - 1)
        .take_while(|&t| t + ws < bar_count)
        .filter(|&t| {
            let start = (t + 1).saturating_sub(config.history_bars);
            t + 1 - start >= config.min_lookback
        })
        .collect()
}

/// Evaluate the indicators for every decision window, in parallel.
pub fn plan_steps(
    bars: &[Bar],
    strategy: &StrategyConfig,
    config: &SimulationConfig,
    prices: &dyn MarketPriceSource,
) -> Vec<PlannedStep> {
    step_indices(bars.len(), config)
        .into_par_iter()
        .map(|t| {
            let start = (t + 1).saturating_sub(config.history_bars);
            let window = &bars[start..=t];
            let bar = &bars[t];
            PlannedStep {
                bar_index: t,
                resolve_index: t + config.window_size,
                market: MarketSnapshot {
                    timestamp: bar.timestamp,
                    market_id: format!("{}-{}", config.market_id, t),
                    market_name: config.market_name.clone(),
                    asset_price: bar.close,
                    market_price: clamp_market_price(prices.implied_price(t, bar)),
                },
                readings: evaluate_indicators(window, &strategy.indicators),
            }
        })
        .collect()
}

// ─── Sequential capital pass ────────────────────────────────────────

/// Capital and risk state threaded through the run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub capital: f64,
    pub consecutive_losses: u32,
    pub max_consecutive_losses: u32,
    pub max_position: f64,
    pub steps_evaluated: usize,
    pub trades: Vec<Trade>,
}

impl RunState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            capital: initial_capital,
            consecutive_losses: 0,
            max_consecutive_losses: 0,
            max_position: 0.0,
            steps_evaluated: 0,
            trades: Vec::new(),
        }
    }

    pub fn risk(&self) -> RiskState {
        RiskState {
            capital: self.capital,
            consecutive_losses: self.consecutive_losses,
        }
    }
}

/// Read-only inputs to `apply_step`, plus the run's noise stream.
pub struct StepContext<'a> {
    pub bars: &'a [Bar],
    pub strategy: &'a StrategyConfig,
    pub execution: &'a ExecutionModel,
    pub simulation_id: &'a SimulationId,
    pub rng: &'a mut StdRng,
}

/// Decide, size, fill and resolve one window.
///
/// A step that does not trade (no signal, policy says no, or nothing to
/// stake) only bumps `steps_evaluated`. The noise stream is drawn exactly
/// once per trade.
pub fn apply_step(mut state: RunState, step: &PlannedStep, ctx: &mut StepContext<'_>) -> RunState {
    state.steps_evaluated += 1;

    let signal = generate_signal(&step.market, step.readings.clone(), ctx.strategy, &state.risk());
    if !signal.should_trade {
        tracing::debug!(bar = step.bar_index, rationale = %signal.rationale, "no trade");
        return state;
    }
    let stake = signal.position_size;
    if stake.is_nan() || stake <= 0.0 {
        tracing::debug!(bar = step.bar_index, capital = state.capital, "nothing to stake");
        return state;
    }

    let entry_close = ctx.bars[step.bar_index].close;
    let exit_close = ctx.bars[step.resolve_index].close;
    let up = exit_close > entry_close;
    let won = match signal.direction {
        Direction::Up => up,
        Direction::Down => !up,
    };

    let fee_fraction = ctx.strategy.fee_fraction;
    let quote = contract_price(signal.direction, signal.market_price);
    let fill = ctx.execution.fill_entry(quote, stake, fee_fraction, &mut *ctx.rng);
    let payoff = settle(&fill, stake, won, ctx.strategy.take_profit, fee_fraction);

    let capital_before = state.capital;
    state.capital += payoff.net_pnl;

    let mut trade = Trade {
        id: TradeId::new(ctx.simulation_id, state.trades.len() + 1),
        simulation_id: ctx.simulation_id.clone(),
        timestamp: signal.timestamp,
        market_id: signal.market_id,
        market_name: signal.market_name,
        direction: signal.direction,
        quoted_price: fill.quoted_price,
        entry_price: fill.entry_price,
        exit_price: None,
        asset_entry_price: entry_close,
        asset_exit_price: exit_close,
        model_probability: signal.model_probability,
        expected_value: signal.expected_value,
        confidence: signal.confidence,
        position_size: stake,
        position_fraction: stake / capital_before,
        loss_streak_at_entry: state.consecutive_losses,
        result: TradeResult::Pending,
        fees: 0.0,
        slippage_cost: 0.0,
        pnl: 0.0,
        pnl_pct: 0.0,
        capital_after: 0.0,
        indicator_signals: signal.indicator_signals,
    };
    trade.resolve(&fill, &payoff, state.capital);

    if payoff.won {
        state.consecutive_losses = 0;
    } else {
        state.consecutive_losses += 1;
        state.max_consecutive_losses = state.max_consecutive_losses.max(state.consecutive_losses);
    }
    state.max_position = state.max_position.max(stake);

    if state.capital <= 0.0 && capital_before > 0.0 {
        tracing::warn!(
            bar = step.bar_index,
            capital = state.capital,
            "capital exhausted, remaining steps will not trade"
        );
    }

    state.trades.push(trade);
    state
}

// ─── Backtest driver ────────────────────────────────────────────────

/// Lifecycle of a `Backtest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationPhase {
    Initialized,
    Stepping,
    Sealed,
}

/// One strategy replayed over one bar history.
pub struct Backtest<'a> {
    strategy: &'a StrategyConfig,
    config: &'a SimulationConfig,
    bars: &'a [Bar],
    prices: &'a dyn MarketPriceSource,
    id: SimulationId,
    dataset_hash: String,
    phase: SimulationPhase,
    plan: Vec<PlannedStep>,
    cursor: usize,
    state: RunState,
    rng: StdRng,
}

impl<'a> Backtest<'a> {
    pub fn new(
        strategy: &'a StrategyConfig,
        config: &'a SimulationConfig,
        bars: &'a [Bar],
        prices: &'a dyn MarketPriceSource,
    ) -> Result<Self, RunError> {
        strategy.validate()?;
        config.validate()?;

        let config_hash = strategy.config_hash();
        let dataset_hash = dataset_hash(bars);
        let id = SimulationId::derive(&config_hash, &dataset_hash, config.seed);
        let rng = rng_for(config.seed, &format!("execution:{config_hash}"));

        Ok(Self {
            strategy,
            config,
            bars,
            prices,
            id,
            dataset_hash,
            phase: SimulationPhase::Initialized,
            plan: Vec::new(),
            cursor: 0,
            state: RunState::new(strategy.initial_capital),
            rng,
        })
    }

    pub fn id(&self) -> &SimulationId {
        &self.id
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Decision windows not yet applied.
    pub fn remaining_steps(&self) -> usize {
        self.plan.len().saturating_sub(self.cursor)
    }

    fn start(&mut self) {
        self.plan = plan_steps(self.bars, self.strategy, self.config, self.prices);
        self.phase = SimulationPhase::Stepping;
        tracing::info!(
            simulation = %self.id,
            strategy = %self.strategy.name,
            bars = self.bars.len(),
            steps = self.plan.len(),
            "simulation started"
        );
    }

    /// Apply the next decision window. Returns false once every window has
    /// been applied (or the run is sealed).
    pub fn step(&mut self) -> bool {
        match self.phase {
            SimulationPhase::Sealed => return false,
            SimulationPhase::Initialized => self.start(),
            SimulationPhase::Stepping => {}
        }
        let Some(planned) = self.plan.get(self.cursor) else {
            return false;
        };

        let mut ctx = StepContext {
            bars: self.bars,
            strategy: self.strategy,
            execution: &self.config.execution,
            simulation_id: &self.id,
            rng: &mut self.rng,
        };
        let state = std::mem::replace(&mut self.state, RunState::new(0.0));
        self.state = apply_step(state, planned, &mut ctx);
        self.cursor += 1;
        true
    }

    /// Step to the end of the history.
    pub fn run_to_end(&mut self) {
        while self.step() {}
    }

    /// Compute metrics and hand out the `Simulation`. Unapplied windows are
    /// dropped, so sealing early gives a truncated run.
    pub fn seal(&mut self) -> Result<Simulation, RunError> {
        if self.phase == SimulationPhase::Sealed {
            return Err(RunError::AlreadySealed);
        }
        self.phase = SimulationPhase::Sealed;

        let trades = std::mem::take(&mut self.state.trades);
        let initial_capital = self.strategy.initial_capital;
        let metrics = SimulationMetrics::compute(&trades, initial_capital);
        tracing::info!(
            simulation = %self.id,
            trades = metrics.total_trades,
            win_rate = metrics.win_rate,
            final_capital = self.state.capital,
            "simulation sealed"
        );

        Ok(Simulation {
            schema_version: SCHEMA_VERSION,
            id: self.id.clone(),
            created_at: Utc::now(),
            strategy: self.strategy.clone(),
            config: self.config.clone(),
            start_time: self.bars.first().map(|b| b.timestamp),
            end_time: self.bars.last().map(|b| b.timestamp),
            bar_count: self.bars.len(),
            dataset_hash: self.dataset_hash.clone(),
            initial_capital,
            final_capital: self.state.capital,
            trades,
            metrics,
            steps_evaluated: self.state.steps_evaluated,
        })
    }
}

/// Replay `strategy` over `bars` and seal the result.
pub fn run_backtest(
    strategy: &StrategyConfig,
    config: &SimulationConfig,
    bars: &[Bar],
    prices: &dyn MarketPriceSource,
) -> Result<Simulation, RunError> {
    let mut backtest = Backtest::new(strategy, config, bars, prices)?;
    backtest.run_to_end();
    backtest.seal()
}

/// Replay several strategies over the same history, in parallel.
///
/// Results come back in input order; each run owns its own state and noise
/// stream, so the output does not depend on scheduling.
pub fn run_many(
    strategies: &[StrategyConfig],
    config: &SimulationConfig,
    bars: &[Bar],
    prices: &dyn MarketPriceSource,
) -> Vec<Result<Simulation, RunError>> {
    strategies
        .par_iter()
        .map(|s| run_backtest(s, config, bars, prices))
        .collect()
}
