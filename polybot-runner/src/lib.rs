//! Polybot Runner: walk-forward simulation and everything around it.
//!
//! This crate builds on `polybot-core` to provide:
//! - The backtest simulator (parallel decision plan, sequential capital pass)
//! - Simulation metrics and the sealed `Simulation` record
//! - A storage contract with an in-memory reference store
//! - The strategy leaderboard
//! - Bar loading (CSV) and deterministic synthetic series
//! - JSON and CSV export

pub mod data_loader;
pub mod export;
pub mod leaderboard;
pub mod metrics;
pub mod simulation;
pub mod simulator;
pub mod store;

pub use data_loader::{dataset_hash, flat_bars, load_csv, random_walk_bars, read_csv, LoadError};
pub use export::{export_json, export_trades_csv, import_json, load_artifacts, save_artifacts};
pub use leaderboard::{Leaderboard, LeaderboardRow, StrategyRecord};
pub use metrics::SimulationMetrics;
pub use simulation::{Simulation, SCHEMA_VERSION};
pub use simulator::{
    apply_step, plan_steps, run_backtest, run_many, Backtest, ConstantPrice, MarketPriceSource,
    PlannedStep, PriceSeries, RunError, RunState, SimulationConfig, SimulationPhase,
};
pub use store::{InMemoryStore, SimulationStore, StoreError};
