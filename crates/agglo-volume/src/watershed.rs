/// Watershed seeding: thresholded-affinity oversegmentation.
///
/// Affinities `<= low` are cut, `>= high` are always merged, and the
/// remainder seeds via basin extraction. This is implemented as a
/// single-linkage agglomeration over the adjacency graph, run in two passes
/// so the `>= high` merges are unconditional before the thresholded
/// steepest-ascent pass runs: first union every `>= high` neighbor pair
/// outright, then process the remaining `(low, high)` pairs in descending
/// affinity order, unioning whichever are still in different components.
/// Descending order means the strongest remaining evidence always wins the
/// tie for which component subsumes which, which is the steepest-ascent
/// property basin extraction relies on.
use ndarray::Array3;

use crate::error::VolumeError;
use crate::volume::{AffinityVolume, Axis, SegVolume};

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        // Deterministic: lower ordinal always survives, matching the
        // region graph's own smaller-id-wins convention.
        if ra < rb {
            self.parent[rb as usize] = ra;
        } else {
            self.parent[ra as usize] = rb;
        }
    }
}

fn voxel_index(x: usize, y: usize, z: usize, w: usize, h: usize) -> usize {
    (z * h + y) * w + x
}

/// Seeds a dense segmentation from an affinity volume by thresholded
/// single-linkage agglomeration, then relabels connected components to
/// dense ids `1..=N`.
///
/// # Errors
///
/// Returns [`VolumeError::InvalidThresholds`] if `low >= high`, either is
/// non-finite, or either falls outside `[0, 1]`.
pub fn seed(affinities: &AffinityVolume, low: f64, high: f64) -> Result<SegVolume, VolumeError> {
    if !(low.is_finite() && high.is_finite())
        || !(0.0..=1.0).contains(&low)
        || !(0.0..=1.0).contains(&high)
        || low >= high
    {
        return Err(VolumeError::InvalidThresholds { low, high });
    }

    let (w, h, d) = affinities.spatial_shape();
    let n_voxels = w * h * d;
    let mut uf = UnionFind::new(n_voxels);

    let mut decisive: Vec<(usize, usize)> = Vec::new();
    let mut contested: Vec<(f64, usize, usize)> = Vec::new();

    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                let idx = voxel_index(x, y, z, w, h);
                for axis in [Axis::X, Axis::Y, Axis::Z] {
                    let Some(affinity) = affinities.neighbor_affinity(x, y, z, axis) else {
                        continue;
                    };
                    if affinity <= low {
                        continue;
                    }
                    let (nx, ny, nz) = match axis {
                        Axis::X => (x + 1, y, z),
                        Axis::Y => (x, y + 1, z),
                        Axis::Z => (x, y, z + 1),
                    };
                    let nidx = voxel_index(nx, ny, nz, w, h);
                    if affinity >= high {
                        decisive.push((idx, nidx));
                    } else {
                        contested.push((affinity, idx, nidx));
                    }
                }
            }
        }
    }

    for (a, b) in decisive {
        uf.union(a as u32, b as u32);
    }

    contested.sort_by(|lhs, rhs| rhs.0.total_cmp(&lhs.0));
    for (_, a, b) in contested {
        uf.union(a as u32, b as u32);
    }

    let mut component_of_root: Vec<u32> = vec![0; n_voxels];
    let mut next_id = 1u32;
    let mut data = Array3::<u32>::zeros((w, h, d));
    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                let idx = voxel_index(x, y, z, w, h);
                let root = uf.find(idx as u32);
                let id = if component_of_root[root as usize] == 0 {
                    let id = next_id;
                    component_of_root[root as usize] = id;
                    next_id += 1;
                    id
                } else {
                    component_of_root[root as usize]
                };
                data[[x, y, z]] = id;
            }
        }
    }

    SegVolume::from_seeds(data, (next_id - 1) as usize)
}
