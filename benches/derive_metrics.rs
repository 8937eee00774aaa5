//! Report pipeline benchmark suite
//!
//! Benchmarks for the in-memory stages of a report run:
//! - CSV parsing of results tables at various sizes
//! - MFU / FLOPs-per-second derivation
//! - Series grouping for both chart styles

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mfu_report::charts::{build_chart_data, Metric};
use mfu_report::metrics::{derive_metrics, MfuPolicy, DEFAULT_PEAK_FLOPS};
use mfu_report::sample::{write_sample_to, SampleConfig};
use mfu_report::table::read_results;
use mfu_report::ChartStyle;

fn sample_csv(configs: usize, batches: usize) -> Vec<u8> {
    let cfg = SampleConfig {
        configs: (0..configs).map(|i| format!("cfg-{i}")).collect(),
        batch_sizes: (0..batches as u64).map(|i| 1u64 << i).collect(),
        ..Default::default()
    };
    let mut buf = Vec::new();
    write_sample_to(&mut buf, &cfg).expect("sample csv");
    buf
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_pipeline");

    for (configs, batches) in [(2usize, 4usize), (8, 8), (32, 16)] {
        let csv = sample_csv(configs, batches);
        let rows = configs * batches * 2;
        group.throughput(Throughput::Elements(rows as u64));

        group.bench_with_input(BenchmarkId::new("read_results", rows), &csv, |b, csv| {
            b.iter(|| black_box(read_results(black_box(csv.as_slice())).expect("parse")))
        });

        let table = read_results(csv.as_slice()).expect("parse");
        group.bench_with_input(BenchmarkId::new("derive_metrics", rows), &table, |b, table| {
            b.iter(|| {
                black_box(
                    derive_metrics(black_box(table), DEFAULT_PEAK_FLOPS, MfuPolicy::RecomputeAll)
                        .expect("derive"),
                )
            })
        });

        let (derived, _) =
            derive_metrics(&table, DEFAULT_PEAK_FLOPS, MfuPolicy::RecomputeAll).expect("derive");
        for style in [ChartStyle::Bar, ChartStyle::Line] {
            group.bench_with_input(
                BenchmarkId::new(format!("build_chart_data_{style:?}"), rows),
                &derived,
                |b, derived| {
                    b.iter(|| black_box(build_chart_data(black_box(derived), Metric::Mfu, style).expect("chart")))
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
