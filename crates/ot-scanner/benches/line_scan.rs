//! Benchmarks for line scanning.
//!
//! Run with: `cargo bench -p ot-scanner --bench line_scan`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ot_core::{MatchMode, PatternMode, TagConfig};
use ot_scanner::{validate, LineScanner, PatternCompiler};

// Our own source as realistic input
const SOURCE: &str = include_str!("../src/lines.rs");

fn literal_tags() -> TagConfig {
    TagConfig::builder()
        .high("FIXME, XXX")
        .normal("TODO")
        .low("@deprecated, NOTE")
        .build()
}

fn bench_compile(c: &mut Criterion) {
    let literal = literal_tags();
    let regex = TagConfig::builder()
        .high(r"FIXME|XXX")
        .normal(r"TODO(\(\w+\))?")
        .pattern_mode(PatternMode::Regex)
        .match_mode(MatchMode::IgnoreCase)
        .build();

    let mut group = c.benchmark_group("compile");
    group.bench_function("literal", |b| b.iter(|| PatternCompiler::compile(black_box(&literal))));
    group.bench_function("regex_ignore_case", |b| {
        b.iter(|| PatternCompiler::compile(black_box(&regex)));
    });
    group.finish();
}

fn bench_scan_line(c: &mut Criterion) {
    let tags = PatternCompiler::compile(&literal_tags());
    let scanner = LineScanner::new(&tags);

    let mut group = c.benchmark_group("scan_line");
    for (name, line) in [
        ("miss", "    let total = items.iter().map(|i| i.price).sum::<u64>();"),
        ("high", "    // FIXME: overflow when the basket is empty"),
        ("low", "    /// @deprecated use `checkout_v2` instead"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| scanner.scan_line(black_box(line)));
        });
    }
    group.finish();
}

fn bench_tasks(c: &mut Criterion) {
    let tags = PatternCompiler::compile(&literal_tags());
    let scanner = LineScanner::new(&tags);

    let mut group = c.benchmark_group("tasks");
    group.throughput(Throughput::Bytes(SOURCE.len() as u64));
    group.bench_function("source_file", |b| {
        b.iter(|| {
            scanner
                .tasks("lines.rs", black_box(SOURCE.as_bytes()))
                .filter_map(Result::ok)
                .count()
        });
    });
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let tags = literal_tags();
    c.bench_function("validate", |b| {
        b.iter(|| validate(black_box("TODO a TODO b"), &tags));
    });
}

criterion_group!(benches, bench_compile, bench_scan_line, bench_tasks, bench_validate);
criterion_main!(benches);
