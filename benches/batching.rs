use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use dynograph::dataset::rmat::{RmatArgs, RmatGenerator};
use dynograph::dataset::{Dataset, EdgeListDataset};
use dynograph::{Args, Batch, SortMode};

fn generated(num_edges: usize) -> Vec<dynograph::Edge> {
    let args = RmatArgs { a: 0.55, b: 0.15, c: 0.15, d: 0.15, num_edges: num_edges as i64, num_vertices: 1 << 12 };
    RmatGenerator::new(&args, 0x5eed).edges(num_edges, 0).unwrap()
}

fn bench_batch_views(c: &mut Criterion) {
    let edges = generated(1 << 16);
    let mut group = c.benchmark_group("Batch views (65536 edges)");

    group.bench_function("filtered", |b| {
        b.iter(|| black_box(Batch::new(&edges).filtered(black_box(1 << 15)).len()))
    });

    group.bench_function("deduplicated", |b| {
        b.iter(|| black_box(Batch::new(&edges).deduplicated().len()))
    });

    group.bench_function("num_vertices_affected", |b| {
        b.iter(|| black_box(Batch::new(&edges).num_vertices_affected()))
    });

    group.finish();
}

fn bench_prepared_batches(c: &mut Criterion) {
    let edges = generated(1 << 16);
    let mut group = c.benchmark_group("Prepared batches (64 batches of 1024)");

    for mode in [SortMode::Unsorted, SortMode::Presort, SortMode::Snapshot] {
        let args = Args::new("bench.graph.bin", 1024, 8).with_sort_mode(mode).with_window_size(0.5);
        group.bench_function(mode.to_string(), |b| {
            b.iter_batched(
                || EdgeListDataset::from_edges(&args, edges.clone()).unwrap(),
                |mut dataset| {
                    let epochs: Vec<i64> = (0..dataset.num_batches())
                        .filter(|&id| dataset.enable_algs_for_batch(id))
                        .collect();
                    for batch_id in epochs {
                        black_box(dataset.prepared_batch(batch_id, mode).unwrap().len());
                    }
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_batch_views, bench_prepared_batches);
criterion_main!(benches);
