//! Export: JSON and CSV artifacts for sealed simulations.
//!
//! - **JSON**: the full `Simulation`, schema-versioned; unknown versions are
//!   rejected on load
//! - **CSV**: the trade tape for spreadsheets and notebooks

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use polybot_core::domain::{Trade, TradeResult};

use crate::simulation::{Simulation, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `Simulation` to pretty JSON.
pub fn export_json(simulation: &Simulation) -> Result<String> {
    serde_json::to_string_pretty(simulation).context("failed to serialize Simulation to JSON")
}

/// Deserialize a `Simulation` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<Simulation> {
    let simulation: Simulation =
        serde_json::from_str(json).context("failed to deserialize Simulation from JSON")?;
    if simulation.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            simulation.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(simulation)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade tape as CSV.
///
/// Indicator readings are flattened into one `name:value` column joined
/// with `;`.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "timestamp",
        "market_id",
        "direction",
        "quoted_price",
        "entry_price",
        "exit_price",
        "asset_entry_price",
        "asset_exit_price",
        "model_probability",
        "expected_value",
        "confidence",
        "position_size",
        "position_fraction",
        "loss_streak_at_entry",
        "result",
        "fees",
        "slippage_cost",
        "pnl",
        "pnl_pct",
        "capital_after",
        "indicators",
    ])?;

    for t in trades {
        let result = match t.result {
            TradeResult::Win => "win",
            TradeResult::Loss => "loss",
            TradeResult::Pending => "pending",
        };
        let indicators = t
            .indicator_signals
            .iter()
            .map(|s| format!("{}:{:.4}", s.name, s.value))
            .collect::<Vec<_>>()
            .join(";");
        wtr.write_record([
            t.id.0.clone(),
            t.timestamp.to_rfc3339(),
            t.market_id.clone(),
            t.direction.to_string(),
            format!("{:.4}", t.quoted_price),
            format!("{:.4}", t.entry_price),
            t.exit_price.map(|p| format!("{p:.4}")).unwrap_or_default(),
            format!("{:.2}", t.asset_entry_price),
            format!("{:.2}", t.asset_exit_price),
            format!("{:.4}", t.model_probability),
            format!("{:.4}", t.expected_value),
            format!("{:.4}", t.confidence),
            format!("{:.2}", t.position_size),
            format!("{:.4}", t.position_fraction),
            t.loss_streak_at_entry.to_string(),
            result.to_string(),
            format!("{:.4}", t.fees),
            format!("{:.4}", t.slippage_cost),
            format!("{:.2}", t.pnl),
            format!("{:.4}", t.pnl_pct),
            format!("{:.2}", t.capital_after),
            indicators,
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one simulation.
///
/// Creates `{simulation_id}/` under `output_dir` containing:
/// - `simulation.json`: the full `Simulation`
/// - `trades.csv`: trade tape
///
/// Returns the path to the created directory.
pub fn save_artifacts(simulation: &Simulation, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&simulation.id.0);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("simulation.json"), export_json(simulation)?)?;
    std::fs::write(
        run_dir.join("trades.csv"),
        export_trades_csv(&simulation.trades)?,
    )?;

    tracing::info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load a `Simulation` from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<Simulation> {
    let path = dir.join("simulation.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::random_walk_bars;
    use crate::simulator::{run_backtest, ConstantPrice, SimulationConfig};
    use polybot_core::{DecisionPolicy, IndicatorConfig, StrategyConfig};

    fn traded_simulation() -> Simulation {
        let strategy = StrategyConfig {
            decision_policy: DecisionPolicy::PositiveEdge,
            indicators: vec![IndicatorConfig::new("ema_cross")],
            ..Default::default()
        };
        let bars = random_walk_bars(400, 100.0, 0.3, 21);
        run_backtest(&strategy, &SimulationConfig::default(), &bars, &ConstantPrice(0.5)).unwrap()
    }

    #[test]
    fn json_round_trip_keeps_trades() {
        let sim = traded_simulation();
        let back = import_json(&export_json(&sim).unwrap()).unwrap();
        assert_eq!(back.id, sim.id);
        assert_eq!(back.trades.len(), sim.trades.len());
        assert_eq!(back.metrics.total_trades, sim.metrics.total_trades);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut sim = traded_simulation();
        sim.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&sim).unwrap();
        assert!(import_json(&json).is_err());
    }

    #[test]
    fn missing_schema_version_defaults() {
        let sim = traded_simulation();
        let mut value: serde_json::Value = serde_json::from_str(&export_json(&sim).unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let back = import_json(&value.to_string()).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn trades_csv_has_one_row_per_trade() {
        let sim = traded_simulation();
        let csv = export_trades_csv(&sim.trades).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), sim.trades.len() + 1);
        assert!(lines[0].starts_with("id,timestamp,market_id,direction"));
        assert!(lines[1].contains("EMA Cross:"));
    }

    #[test]
    fn artifacts_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let sim = traded_simulation();
        let run_dir = save_artifacts(&sim, dir.path()).unwrap();
        assert!(run_dir.join("trades.csv").exists());
        let back = load_artifacts(&run_dir).unwrap();
        assert_eq!(back.id, sim.id);
    }
}
