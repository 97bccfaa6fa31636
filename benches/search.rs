//! Benchmarks for the flat inner-product search path.
//!
//! Run with: `cargo bench --bench search`

use corpusdb::vector::{l2_normalize, FlatIndex};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Deterministic pseudo-embedding, normalized.
fn make_vector(seed: u64, dim: usize) -> Vec<f32> {
    let mut v: Vec<f32> = (0..dim)
        .map(|i| (seed as f32 * 0.1 + i as f32 * 0.01).sin())
        .collect();
    l2_normalize(&mut v);
    v
}

fn build_index(rows: usize, dim: usize) -> FlatIndex {
    let mut index = FlatIndex::new(dim).unwrap();
    for i in 0..rows {
        index.append(&make_vector(i as u64, dim)).unwrap();
    }
    index
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_search");
    let dim = 384;

    for rows in [1_000, 10_000, 50_000] {
        let index = build_index(rows, dim);
        let query = make_vector(rows as u64 / 2, dim);

        group.bench_with_input(BenchmarkId::new("top_10", rows), &rows, |b, _| {
            b.iter(|| index.search(black_box(&query), black_box(10)).unwrap())
        });
    }
    group.finish();
}

fn bench_append(c: &mut Criterion) {
    let dim = 384;
    let vector = make_vector(7, dim);

    c.bench_function("flat_append_384d", |b| {
        b.iter_batched(
            || FlatIndex::new(dim).unwrap(),
            |mut index| index.append(black_box(&vector)).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_search, bench_append);
criterion_main!(benches);
