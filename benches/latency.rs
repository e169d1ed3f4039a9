use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use std::hint::black_box;
use std::str::FromStr;

use liquidity_watch::format::{format_decimal, time_elapsed, NumberLocale};
use liquidity_watch::pool::TokenAmount;

fn benchmark_formatting(c: &mut Criterion) {
    let small = Decimal::from_str("42.5").unwrap();
    let large = Decimal::from_str("98765432109.123456").unwrap();
    let amount = TokenAmount {
        amount: "98500500000".to_string(),
        decimals: 6,
        ui_amount: None,
        ui_amount_string: None,
    };

    let mut group = c.benchmark_group("balance_formatting");

    group.bench_function("format_small", |b| {
        b.iter(|| black_box(format_decimal(black_box(small), NumberLocale::EnUs)))
    });

    group.bench_function("format_large_de", |b| {
        b.iter(|| black_box(format_decimal(black_box(large), NumberLocale::DeDe)))
    });

    group.bench_function("raw_amount_to_display", |b| {
        b.iter(|| {
            let value = black_box(&amount).ui_value();
            black_box(value.map(|v| format_decimal(v, NumberLocale::EnUs)))
        })
    });

    group.finish();

    let now = Utc::now();
    let published = now - Duration::minutes(3000);
    c.bench_function("time_elapsed", |b| {
        b.iter(|| black_box(time_elapsed(black_box(published), black_box(now))))
    });
}

criterion_group!(benches, benchmark_formatting);
criterion_main!(benches);
