//! Benchmarks for outline extraction.
//!
//! Run with: cargo bench
//!
//! The engine benchmarks feed synthetic text runs straight into the
//! pipeline, so they measure heading inference without PDF decoding.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdfoutline::engine::{collector, StyleProfile};
use pdfoutline::{BBox, OutlineEngine, PageRuns, RawRun, Thresholds};

/// Pages with a numbered heading, a subheading and a run of body lines each.
fn synthetic_pages(page_count: usize) -> Vec<PageRuns> {
    let mut pages = Vec::with_capacity(page_count);
    for index in 0..page_count {
        let mut page = PageRuns::letter(index);
        let mut y = 72.0;
        let mut push = |text: String, size: f32, font: &str| {
            let width = text.chars().count() as f32 * size * 0.5;
            page.push(RawRun::new(text, BBox::new(72.0, y, 72.0 + width, y + size), size, font));
            y += size * 1.6;
        };

        push(format!("{}. Section {}", index + 1, index + 1), 16.0, "Helvetica-Bold");
        for line in 0..20 {
            push(
                format!("Line {} of the body text on page {} describes the work in detail.", line, index),
                10.0,
                "Helvetica",
            );
        }
        push(format!("{}.1 Details", index + 1), 13.0, "Helvetica-Bold");
        for line in 0..15 {
            push(format!("Further notes for item {} follow the same pattern.", line), 10.0, "Helvetica");
        }
        pages.push(page);
    }
    pages
}

/// Benchmark the full engine at various document sizes.
fn bench_engine(c: &mut Criterion) {
    let engine = OutlineEngine::default();
    let mut group = c.benchmark_group("outline_engine");

    for page_count in [1, 10, 50].iter() {
        let pages = synthetic_pages(*page_count);
        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| engine.extract(black_box(&pages)));
        });
    }

    group.finish();
}

/// Benchmark block collection and the style profile on their own.
fn bench_profile(c: &mut Criterion) {
    let thresholds = Thresholds::default();
    let pages = synthetic_pages(20);

    c.bench_function("collect_blocks", |b| {
        b.iter(|| collector::collect_blocks(black_box(&pages), &thresholds));
    });

    let blocks = collector::collect_blocks(&pages, &thresholds);
    c.bench_function("style_profile", |b| {
        b.iter(|| StyleProfile::build(black_box(&blocks), pages.len(), &thresholds));
    });
}

criterion_group!(benches, bench_engine, bench_profile);
criterion_main!(benches);
