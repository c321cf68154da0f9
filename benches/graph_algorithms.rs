//! Criterion benchmarks for the compute substrate
//!
//! Tracks:
//! - CSR construction on paged arrays
//! - Degree partitioning vs uniform partitioning
//! - Degree centrality per orientation and concurrency
//! - Huge priority queue throughput (Dijkstra)

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use trueno_compute::{
    build_pool, degree_partition, dijkstra, uniform_partition, Concurrency, CsrGraph,
    DegreeCentrality, DegreeCentralityConfig, Graph, HugeMinPriorityQueue, Orientation,
};

/// Generate scale-free graph (Barabási-Albert model approximation)
fn generate_scale_free_graph(num_nodes: u64, edges_per_node: u64) -> Vec<(u64, u64, f64)> {
    let mut edges = Vec::new();
    let mut rng_state = 12345_u64; // Simple LCG for reproducibility

    for node in 0..num_nodes {
        for _ in 0..edges_per_node {
            rng_state = rng_state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let draw = (rng_state >> 33) % num_nodes;
            // Squared draw skews targets towards low ids (hubs)
            let target = draw * draw / num_nodes;

            if target != node {
                #[allow(clippy::cast_precision_loss)]
                let weight = (rng_state % 100) as f64 / 10.0;
                edges.push((node, target, weight));
            }
        }
    }

    edges
}

/// Benchmark: CSR graph construction from edge list
fn bench_csr_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("csr_construction");

    for size in [1_000, 10_000, 100_000] {
        let edges = generate_scale_free_graph(size, 3);

        group.bench_with_input(BenchmarkId::new("from_edge_list", size), &edges, |b, edges| {
            b.iter(|| {
                let graph = CsrGraph::from_edge_list(black_box(edges)).unwrap();
                black_box(graph);
            });
        });
    }

    group.finish();
}

/// Benchmark: partitioning a skewed graph
fn bench_partitioning(c: &mut Criterion) {
    let mut group = c.benchmark_group("partitioning");
    let graph = CsrGraph::from_edge_list(&generate_scale_free_graph(100_000, 4)).unwrap();

    group.bench_function("uniform", |b| {
        b.iter(|| black_box(uniform_partition(graph.node_count(), 8, 1_000).unwrap()));
    });

    group.bench_function("degree", |b| {
        b.iter(|| black_box(degree_partition(black_box(&graph), 8, 1_000).unwrap()));
    });

    group.finish();
}

/// Benchmark: degree centrality per orientation and concurrency
fn bench_degree_centrality(c: &mut Criterion) {
    let mut group = c.benchmark_group("degree_centrality");
    let graph = CsrGraph::from_edge_list(&generate_scale_free_graph(100_000, 8)).unwrap();

    for concurrency in [1, 4] {
        let pool = build_pool(Concurrency::new(concurrency).unwrap()).unwrap();

        for (orientation, weighted) in [
            (Orientation::Natural, true),
            (Orientation::Reverse, false),
            (Orientation::Reverse, true),
            (Orientation::Undirected, false),
        ] {
            let config = DegreeCentralityConfig {
                concurrency,
                orientation,
                weighted,
                min_batch_size: 1_000,
                ..DegreeCentralityConfig::default()
            };
            let name = format!("{orientation}{}", if weighted { "_weighted" } else { "" });

            group.bench_with_input(BenchmarkId::new(name, concurrency), &config, |b, config| {
                b.iter(|| {
                    let degrees = DegreeCentrality::new(&graph, config.clone())
                        .with_pool(&pool)
                        .compute()
                        .unwrap();
                    black_box(degrees.node_count());
                });
            });
        }
    }

    group.finish();
}

/// Benchmark: huge priority queue as used by Dijkstra
fn bench_priority_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_queue");

    group.bench_function("add_pop_10k", |b| {
        b.iter(|| {
            let mut queue = HugeMinPriorityQueue::new(10_000).unwrap();
            let mut state = 7_u64;
            for element in 0..10_000 {
                state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                #[allow(clippy::cast_precision_loss)]
                let cost = (state >> 40) as f64;
                queue.add(element, cost).unwrap();
            }
            while let Some(element) = queue.pop() {
                black_box(element);
            }
        });
    });

    for size in [1_000, 10_000] {
        let graph = CsrGraph::from_edge_list(&generate_scale_free_graph(size, 3)).unwrap();

        group.bench_with_input(BenchmarkId::new("dijkstra", size), &graph, |b, graph| {
            b.iter(|| black_box(dijkstra(black_box(graph), 0).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_csr_construction,
    bench_partitioning,
    bench_degree_centrality,
    bench_priority_queue
);
criterion_main!(benches);
