/// Region-graph construction: routes interfacial affinities between
/// adjacent voxels of different seed ids into the region graph's edges.
///
/// For every pair of adjacent voxels with different seed ids, the
/// contributing affinity is folded into the edge between those two seed
/// ids, creating the edge on first contact (per
/// [`agglo_core::RegionGraph::observe_affinity`]) and updating its
/// statistic on every subsequent contact.
use agglo_core::{RegionGraph, Scoring, StatisticFamily};

use crate::volume::{AffinityVolume, Axis, SegVolume};

/// Builds the initial region graph for `seg` against `affinities`: every
/// voxel pair straddling a seed boundary contributes its interfacial
/// affinity to the edge between those two seeds.
pub fn build_region_graph<F: StatisticFamily, Sc: Scoring>(
    graph: &mut RegionGraph<F, Sc>,
    affinities: &AffinityVolume,
    seg: &SegVolume,
) {
    let (w, h, d) = seg.shape();
    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                let here = seg.get(x, y, z);
                if here == 0 {
                    continue;
                }
                for axis in [Axis::X, Axis::Y, Axis::Z] {
                    let Some(affinity) = affinities.neighbor_affinity(x, y, z, axis) else {
                        continue;
                    };
                    let (nx, ny, nz) = match axis {
                        Axis::X => (x + 1, y, z),
                        Axis::Y => (x, y + 1, z),
                        Axis::Z => (x, y, z + 1),
                    };
                    let there = seg.get(nx, ny, nz);
                    if there == 0 || there == here {
                        continue;
                    }
                    let (u, v) = if here < there {
                        (here, there)
                    } else {
                        (there, here)
                    };
                    graph.observe_affinity(u, v, affinity);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use agglo_core::{AscendingAffinityScore, StatKind};
    use ndarray::{Array3, Array4};

    #[test]
    fn builds_one_edge_per_seed_boundary() {
        // 2x1x1 volume split into two seeds with a single interface.
        let mut aff = Array4::<f64>::from_elem((3, 2, 1, 1), 1.0);
        aff[[0, 0, 0, 0]] = 0.3;
        let affinities = AffinityVolume::new(aff).expect("valid affinities");

        let mut data = Array3::<u32>::zeros((2, 1, 1));
        data[[0, 0, 0]] = 1;
        data[[1, 0, 0]] = 2;
        let seg = SegVolume::from_seeds(data, 2).expect("valid seg");

        let mut graph = RegionGraph::new(2, StatKind::Max, AscendingAffinityScore);
        build_region_graph(&mut graph, &affinities, &seg);

        let edge = graph.find_edge(1, 2).expect("edge should exist");
        let (_, score) = graph.recompute_score(edge);
        assert!((score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn repeated_contacts_accumulate_into_the_same_edge() {
        // 2x2x1 volume, two seeds split along x, two interface voxel pairs.
        let aff = Array4::<f64>::from_elem((3, 2, 2, 1), 0.5);
        let affinities = AffinityVolume::new(aff).expect("valid affinities");

        let mut data = Array3::<u32>::zeros((2, 2, 1));
        data[[0, 0, 0]] = 1;
        data[[0, 1, 0]] = 1;
        data[[1, 0, 0]] = 2;
        data[[1, 1, 0]] = 2;
        let seg = SegVolume::from_seeds(data, 2).expect("valid seg");

        let mut graph = RegionGraph::new(2, StatKind::Mean, AscendingAffinityScore);
        build_region_graph(&mut graph, &affinities, &seg);

        assert_eq!(graph.iter_incident(1).count(), 1);
        let edge = graph.find_edge(1, 2).expect("edge should exist");
        let (_, score) = graph.recompute_score(edge);
        // mean affinity 0.5 -> score 0.5, from two contacts.
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn background_voxels_never_contribute() {
        let aff = Array4::<f64>::from_elem((3, 2, 1, 1), 0.9);
        let affinities = AffinityVolume::new(aff).expect("valid affinities");
        let mut data = Array3::<u32>::zeros((2, 1, 1));
        data[[0, 0, 0]] = 0;
        data[[1, 0, 0]] = 1;
        let seg = SegVolume::from_seeds(data, 1).expect("valid seg");

        let mut graph = RegionGraph::new(1, StatKind::Max, AscendingAffinityScore);
        build_region_graph(&mut graph, &affinities, &seg);
        assert_eq!(graph.iter_incident(1).count(), 0);
    }
}
