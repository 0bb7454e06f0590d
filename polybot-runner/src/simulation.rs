//! Simulation: the sealed record of one backtest run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use polybot_core::domain::{SimulationId, Trade};
use polybot_core::StrategyConfig;

use crate::metrics::SimulationMetrics;
use crate::simulator::SimulationConfig;

/// Current schema version for persisted simulations.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Aggregate root of a run: configuration, trades and derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub id: SimulationId,
    pub created_at: DateTime<Utc>,
    pub strategy: StrategyConfig,
    pub config: SimulationConfig,

    // ── Time range ──
    /// First and last bar of the replayed history; `None` for empty input.
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub bar_count: usize,
    pub dataset_hash: String,

    // ── Capital ──
    pub initial_capital: f64,
    pub final_capital: f64,

    // ── Results ──
    pub trades: Vec<Trade>,
    pub metrics: SimulationMetrics,
    /// Decision windows evaluated (trades or not).
    pub steps_evaluated: usize,
}

impl Simulation {
    /// Final minus initial capital.
    pub fn pnl(&self) -> f64 {
        self.final_capital - self.initial_capital
    }

    /// P&L as a percentage of initial capital.
    pub fn pnl_pct(&self) -> f64 {
        if self.initial_capital > 0.0 {
            self.pnl() / self.initial_capital * 100.0
        } else {
            0.0
        }
    }

    /// Recompute metrics from the stored trade list.
    pub fn recompute_metrics(&self) -> SimulationMetrics {
        SimulationMetrics::compute(&self.trades, self.initial_capital)
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let m = &self.metrics;
        format!(
            "{} [{}]: {} trades, win rate {:.1}%, P&L {:+.2} ({:+.2}%), max DD {:.2}%",
            self.id,
            self.strategy.name,
            m.total_trades,
            m.win_rate * 100.0,
            self.pnl(),
            self.pnl_pct(),
            m.max_drawdown * 100.0,
        )
    }
}
