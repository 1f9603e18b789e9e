//! Region-graph construction from a seeded volume, across size tiers.
#![allow(clippy::expect_used)]

use agglo_bench::{SizeTier, generate_volume};
use agglo_core::{AscendingAffinityScore, RegionGraph, StatKind};
use agglo_volume::{SegVolume, build_region_graph};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ndarray::Array3;

struct Setup {
    affinities: agglo_volume::AffinityVolume,
    seg: SegVolume,
    region_count: usize,
}

fn setup(tier: SizeTier) -> Setup {
    let (affinities, ground_truth) = generate_volume(&tier.config(42));
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

fn bench_build_region_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_region_graph");

    for (name, tier) in [
        ("S", SizeTier::Small),
        ("M", SizeTier::Medium),
        ("L", SizeTier::Large),
    ] {
        let s = setup(tier);
        group.bench_function(BenchmarkId::new("quantile_histogram", name), |b| {
            b.iter(|| {
                let mut graph = RegionGraph::new(
                    s.region_count,
                    StatKind::QuantileHistogram {
                        bins: 256,
                        q: 0.5,
                        lo: 0.0,
                        hi: 1.0,
                    },
                    AscendingAffinityScore,
                );
                build_region_graph(&mut graph, &s.affinities, &s.seg);
                let _ = graph.region_count();
            });
        });

        group.bench_function(BenchmarkId::new("mean", name), |b| {
            b.iter(|| {
                let mut graph = RegionGraph::new(s.region_count, StatKind::Mean, AscendingAffinityScore);
                build_region_graph(&mut graph, &s.affinities, &s.seg);
                let _ = graph.region_count();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build_region_graph);
criterion_main!(benches);
