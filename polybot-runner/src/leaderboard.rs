//! Strategy leaderboard: per-strategy running totals across simulations.
//!
//! Records are keyed by the strategy's config hash, so re-running an
//! identical configuration accumulates into the same row. Ranking is by
//! average P&L % (best first); ties break on total P&L, then name.

use serde::{Deserialize, Serialize};

use polybot_core::domain::ConfigHash;
use polybot_core::Approach;

use crate::simulation::Simulation;

/// Running totals for one strategy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub config_hash: ConfigHash,
    pub name: String,
    pub approach: Approach,
    pub total_simulations: usize,
    pub total_trades: usize,
    pub total_wins: usize,
    pub total_pnl: f64,
    /// Mean of per-simulation P&L %.
    pub avg_pnl_pct: f64,
    /// Best per-simulation P&L %; `None` until a simulation is recorded.
    pub best_pnl_pct: Option<f64>,
}

impl StrategyRecord {
    pub fn new(config_hash: ConfigHash, name: impl Into<String>, approach: Approach) -> Self {
        Self {
            config_hash,
            name: name.into(),
            approach,
            total_simulations: 0,
            total_trades: 0,
            total_wins: 0,
            total_pnl: 0.0,
            avg_pnl_pct: 0.0,
            best_pnl_pct: None,
        }
    }

    /// Fold one sealed simulation into the totals.
    pub fn record(&mut self, simulation: &Simulation) {
        let pnl_pct = simulation.pnl_pct();
        self.total_simulations += 1;
        self.total_trades += simulation.metrics.total_trades;
        self.total_wins += simulation.metrics.winning_trades;
        self.total_pnl += simulation.pnl();

        let n = self.total_simulations as f64;
        self.avg_pnl_pct += (pnl_pct - self.avg_pnl_pct) / n;
        self.best_pnl_pct = Some(self.best_pnl_pct.map_or(pnl_pct, |b| b.max(pnl_pct)));
    }

    /// Win rate across every recorded trade (trade-weighted).
    pub fn overall_win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.total_wins as f64 / self.total_trades as f64
        }
    }
}

/// Ranked row as shown to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub name: String,
    pub approach: Approach,
    pub simulations: usize,
    pub total_trades: usize,
    pub total_pnl: f64,
    pub avg_pnl_pct: f64,
    pub best_pnl_pct: f64,
    pub win_rate: f64,
}

/// All strategy records, unbounded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    records: Vec<StrategyRecord>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a simulation to its strategy's record, creating the record on
    /// first sight.
    pub fn record(&mut self, simulation: &Simulation) {
        let hash = simulation.strategy.config_hash();
        let idx = match self.records.iter().position(|r| r.config_hash == hash) {
            Some(idx) => idx,
            None => {
                self.records.push(StrategyRecord::new(
                    hash,
                    simulation.strategy.name.clone(),
                    simulation.strategy.approach,
                ));
                self.records.len() - 1
            }
        };
        self.records[idx].record(simulation);
    }

    pub fn get(&self, hash: &ConfigHash) -> Option<&StrategyRecord> {
        self.records.iter().find(|r| &r.config_hash == hash)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ranked best first.
    pub fn ranked(&self) -> Vec<LeaderboardRow> {
        let mut sorted: Vec<&StrategyRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| {
            b.avg_pnl_pct
                .total_cmp(&a.avg_pnl_pct)
                .then_with(|| b.total_pnl.total_cmp(&a.total_pnl))
                .then_with(|| a.name.cmp(&b.name))
        });
        sorted
            .into_iter()
            .enumerate()
            .map(|(i, r)| LeaderboardRow {
                rank: i + 1,
                name: r.name.clone(),
                approach: r.approach,
                simulations: r.total_simulations,
                total_trades: r.total_trades,
                total_pnl: r.total_pnl,
                avg_pnl_pct: r.avg_pnl_pct,
                best_pnl_pct: r.best_pnl_pct.unwrap_or(0.0),
                win_rate: r.overall_win_rate(),
            })
            .collect()
    }
}
