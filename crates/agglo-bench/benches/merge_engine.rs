//! End-to-end merge-loop throughput, across size tiers and queue
//! realizations.
#![allow(clippy::expect_used)]

use agglo_bench::{SizeTier, generate_volume};
use agglo_core::{AscendingAffinityScore, MergeEngine, NullVisitor, QueueKind, StatKind};
use agglo_volume::{SegVolume, build_region_graph};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ndarray::Array3;

struct Setup {
    affinities: agglo_volume::AffinityVolume,
    seg: SegVolume,
    region_count: usize,
}

fn setup(tier: SizeTier) -> Setup {
    let (affinities, ground_truth) = generate_volume(&tier.config(7));
    let region_count = ground_truth.iter().copied().max().expect("non-empty") as usize;
    let flat: Vec<u32> = ground_truth.iter().copied().collect();
    let shape = affinities.spatial_shape();
    let seg = SegVolume::from_seeds(
        Array3::from_shape_vec(shape, flat).expect("shape"),
        region_count,
    )
    .expect("valid seeds");
    Setup {
        affinities,
        seg,
        region_count,
    }
}

fn run_to_completion(s: &Setup, queue_kind: QueueKind) -> usize {
    let mut engine = MergeEngine::new(s.region_count, StatKind::Max, AscendingAffinityScore, queue_kind);
    build_region_graph(engine.graph_mut(), &s.affinities, &s.seg);
    engine.seed_queue();
    let mut visitor = NullVisitor;
    engine.merge_until(f64::INFINITY, &mut visitor)
}

fn bench_merge_until_completion(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_until_completion");
    group.sample_size(20);

    for (name, tier) in [("S", SizeTier::Small), ("M", SizeTier::Medium), ("L", SizeTier::Large)] {
        let s = setup(tier);

        group.bench_function(BenchmarkId::new("binary_heap", name), |b| {
            b.iter(|| {
                let _ = run_to_completion(&s, QueueKind::BinaryHeap);
            });
        });

        group.bench_function(BenchmarkId::new("binning", name), |b| {
            b.iter(|| {
                let _ = run_to_completion(
                    &s,
                    QueueKind::Binning {
                        bins: 256,
                        score_min: 0.0,
                        score_max: 1.0,
                    },
                );
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_merge_until_completion);
criterion_main!(benches);
