//! Benchmarks for the topology builders.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};

use ink_oracle::geometry::Point;
use ink_oracle::grouping::{Granularity, build_groups};
use ink_oracle::ink::{Stroke, Trace};
use ink_oracle::topology::{DistanceGraph, TopologyKind};

/// `n` short strokes scattered over a formula-sized canvas.
fn random_trace(rng: &mut rand::rngs::StdRng, n: usize) -> Trace {
    (0..n)
        .map(|i| {
            let (x, y) = (rng.gen_range(0..50_000), rng.gen_range(0..10_000));
            let points = (0..rng.gen_range(5..40))
                .map(|k| Point::new(x + k * 37, y + rng.gen_range(-200..200)))
                .collect();
            Stroke::new(i.to_string(), points)
        })
        .collect()
}

fn bench_distance_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance_graph");
    for n in [10, 40, 120] {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let trace = random_trace(&mut rng, n);
        let clusters: Vec<Vec<Point>> = trace.iter().map(|s| s.points.clone()).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &clusters, |bench, clusters| {
            bench.iter(|| black_box(DistanceGraph::from_clusters(clusters).minimum_spanning_tree()))
        });
    }
    group.finish();
}

fn bench_builders(c: &mut Criterion) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let trace = random_trace(&mut rng, 60);
    let groups = build_groups(&trace, &[], Granularity::Stroke);

    for kind in [TopologyKind::Chain, TopologyKind::SpanningTree] {
        let builder = kind.builder();
        c.bench_function(&format!("{}_60_strokes", builder.name()), |bench| {
            bench.iter(|| black_box(builder.build(&trace, &groups, &[]).unwrap()))
        });
    }
}

criterion_group!(benches, bench_distance_graph, bench_builders);
criterion_main!(benches);
