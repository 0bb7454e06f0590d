//! End-to-end simulation behavior: costs, flat tapes, loss streaks, capital
//! exhaustion and replay determinism.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use polybot_core::domain::{Bar, Direction, IndicatorSignal, MarketSnapshot, SimulationId};
use polybot_core::execution::ExecutionModel;
use polybot_core::presets::{preset, PRESET_IDS};
use polybot_core::rng::rng_for;
use polybot_core::{DecisionPolicy, IndicatorConfig, SizingPolicy, StrategyConfig};
use polybot_runner::{
    apply_step, flat_bars, random_walk_bars, run_backtest, run_many, ConstantPrice, PlannedStep,
    RunState, SimulationConfig,
};
use polybot_runner::simulator::StepContext;

// ── Helpers ──────────────────────────────────────────────────────────

fn ema_strategy() -> StrategyConfig {
    StrategyConfig {
        name: "EMA follower".into(),
        decision_policy: DecisionPolicy::PositiveEdge,
        indicators: vec![IndicatorConfig::new("ema_cross")],
        ..Default::default()
    }
}

fn frictionless_config() -> SimulationConfig {
    SimulationConfig {
        execution: ExecutionModel::frictionless(),
        ..Default::default()
    }
}

// ── 1. Fees ──────────────────────────────────────────────────────────

#[test]
fn fees_lower_every_result() {
    let bars = random_walk_bars(900, 64_000.0, 0.2, 17);
    let free = StrategyConfig {
        fee_fraction: 0.0,
        position_sizing: SizingPolicy::Fixed,
        ..ema_strategy()
    };
    let charged = StrategyConfig {
        fee_fraction: 0.02,
        ..free.clone()
    };
    let config = frictionless_config();
    let a = run_backtest(&free, &config, &bars, &ConstantPrice(0.5)).unwrap();
    let b = run_backtest(&charged, &config, &bars, &ConstantPrice(0.5)).unwrap();

    // Fixed stakes and identical readings: the same trades, only costlier.
    assert!(!a.trades.is_empty());
    assert_eq!(a.trades.len(), b.trades.len());
    for (x, y) in a.trades.iter().zip(&b.trades) {
        assert_eq!(x.direction, y.direction);
        assert_eq!(x.result, y.result);
        assert!(y.entry_price >= x.entry_price);
        assert!(y.pnl <= x.pnl + 1e-12);
    }
    if a.metrics.winning_trades > 0 {
        assert!(b.final_capital < a.final_capital);
    }
}

// ── 2. Flat tape ─────────────────────────────────────────────────────

#[test]
fn flat_series_never_trades() {
    let bars = flat_bars(400, 64_000.0);
    let mut strategies: Vec<StrategyConfig> =
        PRESET_IDS.iter().filter_map(|id| preset(id)).collect();
    strategies.push(ema_strategy());

    for strategy in &strategies {
        let sim =
            run_backtest(strategy, &SimulationConfig::default(), &bars, &ConstantPrice(0.5))
                .unwrap();
        assert!(sim.trades.is_empty(), "{} traded a flat tape", strategy.name);
        assert_eq!(sim.final_capital, sim.initial_capital);
        assert_eq!(sim.metrics.total_trades, 0);
        assert_eq!(sim.metrics.sharpe_ratio, None);
        assert!(sim.steps_evaluated > 0);
    }
}

#[test]
fn driftless_walk_wins_at_chance() {
    let free = StrategyConfig {
        fee_fraction: 0.0,
        position_sizing: SizingPolicy::Fixed,
        ..ema_strategy()
    };
    let charged = StrategyConfig {
        fee_fraction: 0.02,
        ..free.clone()
    };

    let (mut trades, mut wins) = (0usize, 0usize);
    for seed in 100..112 {
        let bars = random_walk_bars(3000, 64_000.0, 0.1, seed);
        let config = SimulationConfig {
            seed,
            ..frictionless_config()
        };
        let a = run_backtest(&free, &config, &bars, &ConstantPrice(0.5)).unwrap();
        let b = run_backtest(&charged, &config, &bars, &ConstantPrice(0.5)).unwrap();

        // Same readings, same outcomes; the fee only shaves the winners.
        assert_eq!(a.metrics.total_trades, b.metrics.total_trades);
        assert_eq!(a.metrics.winning_trades, b.metrics.winning_trades);
        assert!(b.metrics.total_pnl <= a.metrics.total_pnl + 1e-9);

        trades += a.metrics.total_trades;
        wins += a.metrics.winning_trades;
    }

    // Pooled win rate within four standard errors of a coin flip.
    assert!(trades > 1000, "only {trades} trades");
    let rate = wins as f64 / trades as f64;
    let se = (0.25 / trades as f64).sqrt();
    assert!((rate - 0.5).abs() < 4.0 * se, "win rate {rate:.3} over {trades} trades");
}

#[test]
fn short_history_is_skipped_not_an_error() {
    let bars = random_walk_bars(25, 100.0, 0.1, 1);
    let sim = run_backtest(
        &ema_strategy(),
        &SimulationConfig::default(),
        &bars,
        &ConstantPrice(0.5),
    )
    .unwrap();
    assert_eq!(sim.steps_evaluated, 0);
    assert!(sim.trades.is_empty());

    let empty = run_backtest(&ema_strategy(), &SimulationConfig::default(), &[], &ConstantPrice(0.5))
        .unwrap();
    assert_eq!(empty.start_time, None);
}

// ── 3. Martingale ────────────────────────────────────────────────────

#[test]
fn martingale_doubles_after_each_loss() {
    let strategy = StrategyConfig {
        position_sizing: SizingPolicy::Martingale {
            base_fraction: 0.01,
        },
        ..ema_strategy()
    };
    let bars = random_walk_bars(1500, 64_000.0, 0.2, 23);
    let sim = run_backtest(&strategy, &frictionless_config(), &bars, &ConstantPrice(0.5)).unwrap();
    assert!(sim.trades.len() > 5);

    let mut saw_streak = false;
    for t in &sim.trades {
        let expected = (0.01 * 2f64.powi(t.loss_streak_at_entry as i32)).min(0.9);
        assert!(
            (t.position_fraction - expected).abs() < 1e-9,
            "streak {} staked {}",
            t.loss_streak_at_entry,
            t.position_fraction
        );
        saw_streak |= t.loss_streak_at_entry > 0;
    }
    assert!(saw_streak);
    assert_eq!(
        sim.metrics.max_consecutive_losses as u32,
        sim.trades
            .iter()
            .map(|t| t.loss_streak_at_entry + u32::from(!t.is_winner()))
            .max()
            .unwrap_or(0)
    );
}

// ── 4. Capital exhaustion ────────────────────────────────────────────

#[test]
fn exhausted_capital_stops_trading() {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    // Every step bets UP and the price falls.
    let bars = vec![
        Bar::new(base, 100.0, 100.0, 100.0, 100.0, 1.0),
        Bar::new(base + chrono::Duration::minutes(1), 100.0, 100.0, 90.0, 90.0, 1.0),
    ];
    let step = PlannedStep {
        bar_index: 0,
        resolve_index: 1,
        market: MarketSnapshot {
            timestamp: base,
            market_id: "btc-updown-15m-0".into(),
            market_name: "BTC up?".into(),
            asset_price: 100.0,
            market_price: 0.4,
        },
        readings: vec![
            IndicatorSignal::new("RSI", 20.0, "oversold", Some(Direction::Up), 1.0),
            IndicatorSignal::new("Bollinger", 0.0, "near lower band", Some(Direction::Up), 1.0),
        ],
    };
    let strategy = StrategyConfig {
        decision_policy: DecisionPolicy::PositiveEdge,
        position_sizing: SizingPolicy::Fixed,
        initial_capital: 100.0,
        max_position_fraction: 0.5,
        ..Default::default()
    };
    let execution = ExecutionModel::frictionless();
    let sim_id = SimulationId("SIM-exhaust".into());
    let mut rng = rng_for(1, "test");
    let mut ctx = StepContext {
        bars: &bars,
        strategy: &strategy,
        execution: &execution,
        simulation_id: &sim_id,
        rng: &mut rng,
    };

    let mut state = RunState::new(100.0);
    for _ in 0..4 {
        state = apply_step(state, &step, &mut ctx);
    }

    assert_eq!(state.steps_evaluated, 4);
    assert_eq!(state.trades.len(), 2);
    assert_eq!(state.capital, 0.0);
    assert_eq!(state.consecutive_losses, 2);
    assert_eq!(state.max_position, 50.0);
    assert_eq!(state.trades[1].id.0, "SIM-exhaust-T0002");
    assert!(state.trades.iter().all(|t| t.pnl == -50.0));
}

// ── 5. Determinism ───────────────────────────────────────────────────

#[test]
fn same_seed_replays_exactly() {
    let bars = random_walk_bars(800, 64_000.0, 0.2, 5);
    let config = SimulationConfig::default();
    let a = run_backtest(&ema_strategy(), &config, &bars, &ConstantPrice(0.5)).unwrap();
    let b = run_backtest(&ema_strategy(), &config, &bars, &ConstantPrice(0.5)).unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.trades, b.trades);
    assert_eq!(a.metrics, b.metrics);

    let reseeded = SimulationConfig { seed: 7, ..config };
    let c = run_backtest(&ema_strategy(), &reseeded, &bars, &ConstantPrice(0.5)).unwrap();
    assert_ne!(a.id, c.id);
    assert_eq!(a.trades.len(), c.trades.len());
    assert!(a
        .trades
        .iter()
        .zip(&c.trades)
        .any(|(x, y)| x.entry_price != y.entry_price));
}

#[test]
fn batch_matches_individual_runs() {
    let bars = random_walk_bars(600, 64_000.0, 0.2, 8);
    let config = SimulationConfig::default();
    let mut strategies: Vec<StrategyConfig> =
        PRESET_IDS.iter().filter_map(|id| preset(id)).collect();
    strategies.push(ema_strategy());

    let batch = run_many(&strategies, &config, &bars, &ConstantPrice(0.5));
    assert_eq!(batch.len(), strategies.len());
    for (strategy, result) in strategies.iter().zip(batch) {
        let batched = result.unwrap();
        let single = run_backtest(strategy, &config, &bars, &ConstantPrice(0.5)).unwrap();
        assert_eq!(batched.strategy.name, strategy.name);
        assert_eq!(batched.trades, single.trades);
    }
}

// ── 6. Properties ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn capital_never_negative_and_stakes_fit(
        seed in 0u64..10_000,
        price in 0.2..0.8_f64,
        base_fraction in 0.01..0.1_f64,
    ) {
        let strategy = StrategyConfig {
            position_sizing: SizingPolicy::Martingale { base_fraction },
            ..ema_strategy()
        };
        let bars = random_walk_bars(400, 100.0, 0.3, seed);
        let config = SimulationConfig { seed, ..Default::default() };
        let sim = run_backtest(&strategy, &config, &bars, &ConstantPrice(price)).unwrap();

        let mut capital = sim.initial_capital;
        for t in &sim.trades {
            prop_assert!(t.position_size > 0.0);
            prop_assert!(t.position_size <= capital + 1e-9);
            prop_assert!(t.entry_price <= 0.99);
            capital = t.capital_after;
            prop_assert!(capital >= 0.0);
        }
        prop_assert!((sim.final_capital - capital).abs() < 1e-9);
    }
}
