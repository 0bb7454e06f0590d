//! Polybot CLI: backtests, one-off signals, presets and synthetic data.
//!
//! Commands:
//! - `run`: replay a strategy (TOML file or named preset) over CSV or
//!   synthetic bars and save the artifacts
//! - `signal`: evaluate the latest window of a bar file and print the
//!   `Signal` as JSON
//! - `presets`: list the built-in strategies
//! - `synthetic`: write a seeded random-walk bar file

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use polybot_core::domain::{Bar, MarketSnapshot};
use polybot_core::ev::{evaluate_market, RiskState};
use polybot_core::presets::{list_presets, preset, PRESET_IDS};
use polybot_core::StrategyConfig;
use polybot_runner::data_loader::write_csv;
use polybot_runner::{
    load_csv, random_walk_bars, run_backtest, save_artifacts, ConstantPrice, Simulation,
    SimulationConfig,
};

#[derive(Parser)]
#[command(
    name = "polybot",
    about = "Directional-edge backtesting for binary up/down markets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a strategy over historical or synthetic bars.
    Run {
        /// Path to a strategy TOML file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named preset: conservative_mean_reversion, balanced_momentum, aggressive_scalper.
        #[arg(long)]
        preset: Option<String>,

        /// CSV file of one-minute bars.
        #[arg(long)]
        bars: Option<PathBuf>,

        /// Generate this many synthetic bars instead of reading a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Constant market-implied probability of UP.
        #[arg(long, default_value_t = 0.5)]
        market_price: f64,

        /// Seed for execution noise and synthetic bars.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Bars per decision interval.
        #[arg(long, default_value_t = 15)]
        window: usize,

        /// Output directory for simulation artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Evaluate the most recent window of a bar file.
    Signal {
        /// Path to a strategy TOML file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named preset.
        #[arg(long)]
        preset: Option<String>,

        /// CSV file of one-minute bars.
        #[arg(long)]
        bars: PathBuf,

        /// Market-implied probability of UP.
        #[arg(long, default_value_t = 0.5)]
        market_price: f64,

        /// Most recent bars fed to the indicators.
        #[arg(long, default_value_t = 100)]
        history: usize,
    },
    /// List the built-in strategy presets.
    Presets,
    /// Write a seeded random-walk bar file.
    Synthetic {
        /// Number of one-minute bars.
        #[arg(long, default_value_t = 1440)]
        bars: usize,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,

        /// Starting price.
        #[arg(long, default_value_t = 64_000.0)]
        start_price: f64,

        /// Maximum absolute per-bar move, in percent.
        #[arg(long, default_value_t = 0.1)]
        step_pct: f64,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            preset,
            bars,
            synthetic,
            market_price,
            seed,
            window,
            output_dir,
        } => run_cmd(
            config,
            preset,
            bars,
            synthetic,
            market_price,
            seed,
            window,
            &output_dir,
        ),
        Commands::Signal {
            config,
            preset,
            bars,
            market_price,
            history,
        } => signal_cmd(config, preset, &bars, market_price, history),
        Commands::Presets => presets_cmd(),
        Commands::Synthetic {
            bars,
            out,
            start_price,
            step_pct,
            seed,
        } => synthetic_cmd(bars, &out, start_price, step_pct, seed),
    }
}

/// Initialise the `tracing` subscriber. `RUST_LOG` overrides the default
/// filter; `POLYBOT_LOG_JSON` switches to JSON lines.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("polybot=info"));

    if std::env::var("POLYBOT_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn resolve_strategy(
    config_path: Option<PathBuf>,
    preset_name: Option<String>,
) -> Result<StrategyConfig> {
    match (config_path, preset_name) {
        (Some(_), Some(_)) => bail!("--config and --preset are mutually exclusive"),
        (Some(path), None) => StrategyConfig::from_file(&path)
            .with_context(|| format!("failed to load strategy from {}", path.display())),
        (None, Some(name)) => match preset(&name) {
            Some(config) => Ok(config),
            None => bail!("unknown preset '{name}'. Valid: {}", PRESET_IDS.join(", ")),
        },
        (None, None) => bail!("one of --config or --preset is required"),
    }
}

fn check_market_price(price: f64) -> Result<()> {
    if !(price > 0.0 && price < 1.0) {
        bail!("--market-price must be strictly between 0 and 1, got {price}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_cmd(
    config_path: Option<PathBuf>,
    preset_name: Option<String>,
    bars_path: Option<PathBuf>,
    synthetic: Option<usize>,
    market_price: f64,
    seed: u64,
    window: usize,
    output_dir: &Path,
) -> Result<()> {
    let strategy = resolve_strategy(config_path, preset_name)?;
    check_market_price(market_price)?;

    let (bars, is_synthetic) = match (bars_path, synthetic) {
        (Some(_), Some(_)) => bail!("--bars and --synthetic are mutually exclusive"),
        (Some(path), None) => (
            load_csv(&path).with_context(|| format!("failed to load bars from {}", path.display()))?,
            false,
        ),
        (None, Some(n)) => (random_walk_bars(n, 64_000.0, 0.1, seed), true),
        (None, None) => bail!("one of --bars or --synthetic is required"),
    };
    tracing::info!(bars = bars.len(), synthetic = is_synthetic, "bars loaded");

    let sim_config = SimulationConfig {
        window_size: window,
        seed,
        ..Default::default()
    };
    let simulation = run_backtest(&strategy, &sim_config, &bars, &ConstantPrice(market_price))?;

    print_summary(&simulation, is_synthetic);

    let run_dir = save_artifacts(&simulation, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn signal_cmd(
    config_path: Option<PathBuf>,
    preset_name: Option<String>,
    bars_path: &Path,
    market_price: f64,
    history: usize,
) -> Result<()> {
    let strategy = resolve_strategy(config_path, preset_name)?;
    check_market_price(market_price)?;

    let bars = load_csv(bars_path)
        .with_context(|| format!("failed to load bars from {}", bars_path.display()))?;
    let window = latest_window(&bars, history);
    let Some(last) = window.last() else {
        bail!("no bars in {}", bars_path.display());
    };

    let market = MarketSnapshot {
        timestamp: last.timestamp,
        market_id: "cli".into(),
        market_name: strategy.name.clone(),
        asset_price: last.close,
        market_price,
    };
    let signal = evaluate_market(window, &market, &strategy, &RiskState::fresh(&strategy));
    println!("{}", serde_json::to_string_pretty(&signal)?);
    Ok(())
}

fn latest_window(bars: &[Bar], history: usize) -> &[Bar] {
    &bars[bars.len().saturating_sub(history.max(1))..]
}

fn presets_cmd() -> Result<()> {
    for p in list_presets() {
        println!("{} ({})", p.id, p.name);
        println!(
            "  approach: {:?}, min EV: {:.2}, min confidence: {:.2}",
            p.approach, p.min_ev, p.min_confidence
        );
        println!("  {}", p.description);
        println!();
    }
    Ok(())
}

fn synthetic_cmd(n: usize, out: &Path, start_price: f64, step_pct: f64, seed: u64) -> Result<()> {
    if start_price.is_nan() || start_price <= 0.0 {
        bail!("--start-price must be positive, got {start_price}");
    }
    let bars = random_walk_bars(n, start_price, step_pct, seed);
    let file = std::fs::File::create(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    write_csv(&bars, file)?;
    println!("Wrote {} bars to {}", bars.len(), out.display());
    Ok(())
}

fn print_summary(sim: &Simulation, is_synthetic: bool) {
    let m = &sim.metrics;
    println!();
    println!("=== Simulation Result ===");
    println!("Id:             {}", sim.id);
    println!("Strategy:       {}", sim.strategy.name);
    if let (Some(start), Some(end)) = (sim.start_time, sim.end_time) {
        println!("Period:         {start} to {end}");
    }
    println!("Bars:           {}", sim.bar_count);
    println!("Windows:        {}", sim.steps_evaluated);
    println!("Trades:         {}", m.total_trades);
    println!();
    println!("--- Performance ---");
    println!("Initial:        {:.2}", sim.initial_capital);
    println!("Final:          {:.2}", sim.final_capital);
    println!("Total P&L:      {:+.2} ({:+.2}%)", m.total_pnl, m.total_pnl_pct);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("  UP:           {}/{}", m.up_wins, m.up_trades);
    println!("  DOWN:         {}/{}", m.down_wins, m.down_trades);
    println!("Avg Win:        {:.2}", m.avg_win);
    println!("Avg Loss:       {:.2}", m.avg_loss);
    println!("EV expected:    {:.4}", m.avg_ev_expected);
    println!("EV realized:    {:.4}", m.avg_ev_realized);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    match m.sharpe_ratio {
        Some(s) => println!("Sharpe:         {s:.3}"),
        None => println!("Sharpe:         n/a"),
    }
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Max Consec Loss:{}", m.max_consecutive_losses);
    println!("Max Position:   {:.2}", m.max_position_used);
    if is_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}
