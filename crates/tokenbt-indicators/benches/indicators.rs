//! Benchmarks for indicator implementations.

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokenbt_core::traits::{Indicator, MultiOutputIndicator};
use tokenbt_core::{PriceObservation, PricePanel};
use tokenbt_indicators::{BollingerBands, IndicatorEngine, RealizedVolatility, Rsi, Sma};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn generate_panel(assets: usize, days: usize) -> PricePanel {
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    let observations = (0..assets).flat_map(|a| {
        (0..days).map(move |d| {
            PriceObservation::new(
                format!("ASSET{a:03}"),
                start + Duration::days(d as i64),
                10.0 + ((d + a) as f64 * 0.1).sin(),
                1e7,
                1000.0,
            )
        })
    });
    PricePanel::from_observations(observations).unwrap()
}

fn benchmark_sma(c: &mut Criterion) {
    let mut group = c.benchmark_group("SMA");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("sma20", size), &data, |b, data| {
            let sma = Sma::new(20);
            b.iter(|| sma.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_rsi(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSI");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("rsi14", size), &data, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_volatility(c: &mut Criterion) {
    let mut group = c.benchmark_group("Volatility");

    for size in [1000, 10000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("bollinger20", size), &data, |b, data| {
            let bb = BollingerBands::new();
            b.iter(|| bb.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("realized30", size), &data, |b, data| {
            let vol = RealizedVolatility::new(30, 365.0);
            b.iter(|| vol.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("IndicatorFrame");
    group.sample_size(10);

    for assets in [10, 100].iter() {
        let panel = generate_panel(*assets, 1000);
        group.bench_with_input(BenchmarkId::new("compute", assets), &panel, |b, panel| {
            let engine = IndicatorEngine::default();
            b.iter(|| engine.compute(black_box(panel)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_sma,
    benchmark_rsi,
    benchmark_volatility,
    benchmark_frame
);
criterion_main!(benches);
