//! Performance benchmarks for Infra Snitch
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use infra_snitch::collector::{DryRunSource, MetricSource};
use infra_snitch::report::{
    render_console, render_json, render_markdown, Aggregator, RunMode, ServerLabel,
};
use infra_snitch::snapshot::MetricSnapshot;

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let aggregator = Aggregator::default();

    let snapshots = [
        ("dry_run", DryRunSource.collect().unwrap()),
        ("all_unavailable", MetricSnapshot::default()),
    ];

    for (name, snapshot) in snapshots.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), snapshot, |b, snapshot| {
            b.iter(|| {
                black_box(aggregator.aggregate(
                    black_box(snapshot),
                    ServerLabel::sanitize("bench"),
                    RunMode::Live,
                ))
            });
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let snapshot = DryRunSource.collect().unwrap();
    let label = ServerLabel::sanitize("bench");
    let report = Aggregator::default().aggregate(&snapshot, label, RunMode::DryRun);

    let mut group = c.benchmark_group("render");
    group.bench_function("console", |b| {
        b.iter(|| black_box(render_console(black_box(&report))))
    });
    group.bench_function("markdown", |b| {
        b.iter(|| black_box(render_markdown(black_box(&report))))
    });
    group.bench_function("json", |b| {
        b.iter(|| black_box(render_json(black_box(&report)).unwrap()))
    });
    group.finish();
}

fn bench_snapshot_parse(c: &mut Criterion) {
    let json = DryRunSource.collect().unwrap().to_json().unwrap();

    c.bench_function("snapshot_from_json", |b| {
        b.iter(|| black_box(MetricSnapshot::from_json(black_box(&json)).unwrap()))
    });
}

criterion_group!(benches, bench_evaluate, bench_render, bench_snapshot_parse);

criterion_main!(benches);
