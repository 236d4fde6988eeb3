use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ipmatch::parser::{parse_reference_text, parse_text};
use ipmatch::{run_match, MatchOptions, ReferenceIndex};
use std::hint::black_box;

// Synthetic source blob: singles, CIDRs, and ranges mixed 8:1:1
fn generate_source_text(count: usize) -> String {
    (0..count)
        .map(|i| {
            let a = (i >> 8) & 0xFF;
            let b = i & 0xFF;
            match i % 10 {
                8 => format!("10.{}.{}.0/24", a, b),
                9 => format!("10.{}.{}.1-10.{}.{}.50", a, b, a, b),
                _ => format!("10.{}.{}.{}", a, b, i % 250),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// Reference set shaped like a real inventory: many /24s, some wider
// blocks, a handful of exact addresses and ranges
fn generate_reference_text(count: usize) -> String {
    (0..count)
        .map(|i| {
            let a = (i >> 6) & 0xFF;
            let b = (i << 2) & 0xFF;
            match i % 8 {
                6 => format!("10.{}.0.0/16", a),
                7 => format!("10.{}.{}.10-10.{}.{}.90", a, b, a, b),
                5 => format!("10.{}.{}.77", a, b),
                _ => format!("10.{}.{}.0/24", a, b),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for count in [1_000, 10_000].iter() {
        let text = generate_source_text(*count);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &text, |b, text| {
            b.iter(|| {
                let (entries, stats) = parse_text(black_box(text));
                black_box((entries.len(), stats.parsed));
            });
        });
    }

    group.finish();
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for count in [500, 5_000].iter() {
        let (references, _) = parse_reference_text(&generate_reference_text(*count));
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &references,
            |b, references| {
                b.iter(|| {
                    let index = ReferenceIndex::build(black_box(references));
                    black_box(index.network_count());
                });
            },
        );
    }

    group.finish();
}

fn bench_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("match");

    let (sources, _) = parse_text(&generate_source_text(10_000));
    for ref_count in [500, 5_000].iter() {
        let (references, _) = parse_reference_text(&generate_reference_text(*ref_count));
        let index = ReferenceIndex::build(&references);

        group.throughput(Throughput::Elements(sources.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("10k_sources", ref_count),
            &index,
            |b, index| {
                b.iter(|| {
                    let results =
                        run_match(black_box(&sources), index, MatchOptions::default()).unwrap();
                    black_box(results.len());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_index_build, bench_match);
criterion_main!(benches);
