//! Bar loading for the runner.
//!
//! Two sources:
//! 1. CSV files with a `timestamp,open,high,low,close,volume` header
//!    (RFC 3339 or integer Unix-millisecond timestamps)
//! 2. Deterministic synthetic series: a seeded random walk, or a flat line
//!
//! Synthetic data is for development and tests. Results produced on it are
//! only as meaningful as the walk that generated them.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

use polybot_core::domain::Bar;
use polybot_core::rng::rng_for;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read bars: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unparseable timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },

    #[error("row {row}: bar timestamps must increase ({prev} then {next})")]
    OutOfOrder {
        row: usize,
        prev: DateTime<Utc>,
        next: DateTime<Utc>,
    },

    #[error("no bars in input")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Load bars from a CSV file.
pub fn load_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let file = std::fs::File::open(path)?;
    read_csv(file)
}

/// Parse bars from any CSV reader. Rows must be in increasing time order.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars: Vec<Bar> = Vec::new();

    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::BadTimestamp {
            row: i + 1,
            value: row.timestamp.clone(),
        })?;
        if let Some(prev) = bars.last() {
            if timestamp <= prev.timestamp {
                return Err(LoadError::OutOfOrder {
                    row: i + 1,
                    prev: prev.timestamp,
                    next: timestamp,
                });
            }
        }
        bars.push(Bar::new(
            timestamp, row.open, row.high, row.low, row.close, row.volume,
        ));
    }

    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    let insane = bars.iter().filter(|b| !b.is_sane()).count();
    if insane > 0 {
        tracing::warn!(insane, total = bars.len(), "loaded bars failing OHLC sanity checks");
    }
    Ok(bars)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ms) = value.parse::<i64>() {
        return Utc.timestamp_millis_opt(ms).single();
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Write bars as CSV in the format `read_csv` accepts.
pub fn write_csv<W: std::io::Write>(bars: &[Bar], writer: W) -> Result<(), LoadError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])?;
    for b in bars {
        wtr.write_record([
            b.timestamp.to_rfc3339(),
            b.open.to_string(),
            b.high.to_string(),
            b.low.to_string(),
            b.close.to_string(),
            b.volume.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// BLAKE3 over timestamps and OHLCV values, for simulation ids.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

// ─── Synthetic series ───────────────────────────────────────────────

fn synthetic_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Seeded one-minute random walk starting at `start_price`.
///
/// Each close moves by a uniform return in ±`step_pct` percent; the same
/// seed always gives the same series.
pub fn random_walk_bars(n: usize, start_price: f64, step_pct: f64, seed: u64) -> Vec<Bar> {
    let mut rng = rng_for(seed, "synthetic:random_walk");
    let step = step_pct.abs() / 100.0;
    let start = synthetic_start();

    let mut bars = Vec::with_capacity(n);
    let mut price = start_price;
    for i in 0..n {
        let ret: f64 = if step > 0.0 {
            rng.gen_range(-step..step)
        } else {
            0.0
        };
        let open = price;
        let close = (price * (1.0 + ret)).max(f64::EPSILON);
        let wick = open.max(close) * rng.gen_range(0.0..0.0005);
        let high = open.max(close) + wick;
        let low = (open.min(close) - wick).max(f64::EPSILON);
        let volume = rng.gen_range(1.0..50.0);
        bars.push(Bar::new(
            start + chrono::Duration::minutes(i as i64),
            open,
            high,
            low,
            close,
            volume,
        ));
        price = close;
    }
    bars
}

/// `n` identical one-minute bars at `price`.
pub fn flat_bars(n: usize, price: f64) -> Vec<Bar> {
    let start = synthetic_start();
    (0..n)
        .map(|i| {
            Bar::new(
                start + chrono::Duration::minutes(i as i64),
                price,
                price,
                price,
                price,
                1.0,
            )
        })
        .collect()
}
