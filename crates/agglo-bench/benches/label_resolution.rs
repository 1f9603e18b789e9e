//! Watershed seeding and post-merge label resolution, across size tiers.
#![allow(clippy::expect_used)]

use agglo_bench::{SizeTier, generate_volume};
use agglo_core::{AscendingAffinityScore, MergeEngine, NodeId, NullVisitor, QueueKind, StatKind};
use agglo_volume::{SegVolume, build_region_graph, seed};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ndarray::Array3;

struct Setup {
    affinities: agglo_volume::AffinityVolume,
    seg: SegVolume,
    region_count: usize,
    seed_ids: Vec<NodeId>,
}

fn setup(tier: SizeTier) -> Setup {
    let (affinities, ground_truth) = generate_volume(&tier.config(13));
    let region_count = ground_truth.iter().copied().max().expect("non-empty") as usize;
    let flat: Vec<u32> = ground_truth.iter().copied().collect();
    let shape = affinities.spatial_shape();
    let seg = SegVolume::from_seeds(
        Array3::from_shape_vec(shape, flat.clone()).expect("shape"),
        region_count,
    )
    .expect("valid seeds");
    Setup {
        affinities,
        seg,
        region_count,
        seed_ids: flat,
    }
}

fn bench_watershed_seed(c: &mut Criterion) {
    let mut group = c.benchmark_group("watershed_seed");

    for (name, tier) in [("S", SizeTier::Small), ("M", SizeTier::Medium), ("L", SizeTier::Large)] {
        let s = setup(tier);
        group.bench_function(BenchmarkId::new("seed", name), |b| {
            b.iter(|| {
                let _ = seed(&s.affinities, 0.3, 0.7).expect("seeding succeeds");
            });
        });
    }
    group.finish();
}

fn bench_resolve_labels(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_labels");

    for (name, tier) in [("S", SizeTier::Small), ("M", SizeTier::Medium), ("L", SizeTier::Large)] {
        let s = setup(tier);
        let mut engine = MergeEngine::new(s.region_count, StatKind::Max, AscendingAffinityScore, QueueKind::BinaryHeap);
        build_region_graph(engine.graph_mut(), &s.affinities, &s.seg);
        engine.seed_queue();
        let mut visitor = NullVisitor;
        engine.merge_until(0.5, &mut visitor);

        group.bench_function(BenchmarkId::new("full_volume", name), |b| {
            b.iter(|| {
                let _ = engine.resolve_labels(&s.seed_ids);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_watershed_seed, bench_resolve_labels);
criterion_main!(benches);
