//! Criterion benchmarks for the decision hot path.
//!
//! Benchmarks:
//! 1. Indicator producers over a 100-bar window
//! 2. Full evaluate_market (producers + combiner + EV + sizing)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chrono::{TimeZone, Utc};
use polybot_core::domain::{Bar, MarketSnapshot};
use polybot_core::ev::{evaluate_market, RiskState};
use polybot_core::presets::preset;
use polybot_core::signals::{create_producer, PRODUCER_NAMES};
use polybot_core::IndicatorConfig;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 64_000.0 + (i as f64 * 0.17).sin() * 150.0;
            Bar::new(
                base + chrono::Duration::minutes(i as i64),
                close - 3.0,
                close + 20.0,
                close - 20.0,
                close,
                8.0,
            )
        })
        .collect()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_producers(c: &mut Criterion) {
    let bars = make_bars(100);
    let mut group = c.benchmark_group("producers");
    for name in PRODUCER_NAMES {
        let Some(producer) = create_producer(&IndicatorConfig::new(name)) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &bars, |b, bars| {
            b.iter(|| producer.evaluate(black_box(bars)))
        });
    }
    group.finish();
}

fn bench_evaluate_market(c: &mut Criterion) {
    let bars = make_bars(100);
    let Some(config) = preset("balanced_momentum") else {
        return;
    };
    let risk = RiskState::fresh(&config);
    let market = MarketSnapshot {
        timestamp: bars[99].timestamp,
        market_id: "bench".into(),
        market_name: "bench".into(),
        asset_price: bars[99].close,
        market_price: 0.5,
    };
    c.bench_function("evaluate_market/balanced_momentum", |b| {
        b.iter(|| evaluate_market(black_box(&bars), &market, &config, &risk))
    });
}

criterion_group!(benches, bench_producers, bench_evaluate_market);
criterion_main!(benches);
