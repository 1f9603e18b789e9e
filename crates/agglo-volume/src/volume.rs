/// Dense voxel array wrapping: the affinity volume and the seed/label
/// volume the core's external interfaces are specified against.
use ndarray::Array3;
use ndarray::Array4;

use crate::error::VolumeError;

/// Which of the three axis directions an affinity channel measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Affinity between a voxel and its `+x` neighbor.
    X,
    /// Affinity between a voxel and its `+y` neighbor.
    Y,
    /// Affinity between a voxel and its `+z` neighbor.
    Z,
}

/// A dense `A[3][W][H][D]` affinity volume: three channels of scalar
/// affinities in `[0, 1]`, one per axis direction, each giving the affinity
/// between a voxel and its positive neighbor along that axis.
#[derive(Debug, Clone)]
pub struct AffinityVolume {
    data: Array4<f64>,
}

impl AffinityVolume {
    /// Wraps a `(3, W, H, D)` array, validating every value is finite and in
    /// `[0, 1]`.
    pub fn new(data: Array4<f64>) -> Result<Self, VolumeError> {
        let shape = data.shape();
        if shape[0] != 3 {
            return Err(VolumeError::AffinityShapeMismatch {
                got: (shape[0], shape[1], shape[2], shape[3]),
                w: shape[1],
                h: shape[2],
                d: shape[3],
            });
        }
        for ((c, x, y, z), &value) in data.indexed_iter() {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(VolumeError::InvalidAffinity(value, (c, x, y, z)));
            }
        }
        Ok(Self { data })
    }

    /// The `(W, H, D)` spatial shape (excluding the channel axis).
    pub fn spatial_shape(&self) -> (usize, usize, usize) {
        let shape = self.data.shape();
        (shape[1], shape[2], shape[3])
    }

    /// The affinity between voxel `(x, y, z)` and its positive neighbor
    /// along `axis`. Returns `None` if the neighbor would be out of bounds.
    pub fn neighbor_affinity(&self, x: usize, y: usize, z: usize, axis: Axis) -> Option<f64> {
        let (w, h, d) = self.spatial_shape();
        let in_bounds = match axis {
            Axis::X => x + 1 < w,
            Axis::Y => y + 1 < h,
            Axis::Z => z + 1 < d,
        };
        if !in_bounds {
            return None;
        }
        let channel = match axis {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        };
        Some(self.data[[channel, x, y, z]])
    }
}

/// A dense `S[W][H][D]` seed/label volume with ids `1..=N` (`0` reserved for
/// background/unassigned), alongside the per-seed voxel counts.
#[derive(Debug, Clone)]
pub struct SegVolume {
    data: Array3<u32>,
    sizes: Vec<u64>,
}

impl SegVolume {
    /// Wraps a pre-computed seed volume, deriving `sizes` by a single sweep.
    /// `n` is the declared region count; every seed id must fall in
    /// `[0, n]`.
    pub fn from_seeds(data: Array3<u32>, n: usize) -> Result<Self, VolumeError> {
        let mut sizes = vec![0u64; n + 1];
        for ((x, y, z), &id) in data.indexed_iter() {
            if id as usize > n {
                return Err(VolumeError::SeedIdOutOfRange {
                    id,
                    at: (x, y, z),
                    n,
                });
            }
            sizes[id as usize] += 1;
        }
        Ok(Self { data, sizes })
    }

    /// The `(W, H, D)` shape.
    pub fn shape(&self) -> (usize, usize, usize) {
        let shape = self.data.shape();
        (shape[0], shape[1], shape[2])
    }

    /// The seed id at `(x, y, z)`.
    pub fn get(&self, x: usize, y: usize, z: usize) -> u32 {
        self.data[[x, y, z]]
    }

    /// Per-seed voxel counts, indexed by seed id (`sizes[0]` is the
    /// background voxel count).
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    /// The highest seed id present (the declared region count `N`, if every
    /// id `1..=N` is in fact populated).
    pub fn max_id(&self) -> u32 {
        self.sizes.len().saturating_sub(1) as u32
    }

    /// Flattens the volume into a voxel-major `Vec` in `(x, y, z)`
    /// row-major order, suitable for [`crate::metrics::rand_voi`] or
    /// [`agglo_core::MergeEngine::resolve_labels`].
    pub fn to_flat_vec(&self) -> Vec<u32> {
        self.data.iter().copied().collect()
    }

    /// Iterates `(x, y, z, seed_id)` in row-major order.
    pub fn iter_voxels(&self) -> impl Iterator<Item = ((usize, usize, usize), u32)> + '_ {
        self.data.indexed_iter().map(|(idx, &id)| (idx, id))
    }
}

/// Validates that `seg`'s spatial shape matches `affinities`'s.
///
/// [`crate::graph_build::build_region_graph`] walks voxel coordinates
/// against `seg`'s shape and indexes `affinities` at the same coordinates;
/// callers that accept a pre-supplied segmentation (rather than deriving one
/// from `affinities` via [`crate::watershed::seed`]) must check this first,
/// or a segmentation wider than the affinity volume panics on out-of-bounds
/// indexing instead of failing with a reported error.
///
/// # Errors
///
/// Returns [`VolumeError::SegShapeMismatch`] if the shapes differ.
pub fn validate_shapes(affinities: &AffinityVolume, seg: &SegVolume) -> Result<(), VolumeError> {
    let expected = affinities.spatial_shape();
    let got = seg.shape();
    if got != expected {
        let (w, h, d) = expected;
        return Err(VolumeError::SegShapeMismatch { got, w, h, d });
    }
    Ok(())
}

/// Validates that a ground-truth volume's shape matches the segmentation's,
/// before it is flattened for [`crate::metrics::rand_voi`].
///
/// # Errors
///
/// Returns [`VolumeError::GroundTruthShapeMismatch`] if the shapes differ.
pub fn validate_ground_truth_shape(
    seg: &SegVolume,
    ground_truth_shape: (usize, usize, usize),
) -> Result<(), VolumeError> {
    let seg_shape = seg.shape();
    if ground_truth_shape != seg_shape {
        return Err(VolumeError::GroundTruthShapeMismatch {
            gt: ground_truth_shape,
            seg: seg_shape,
        });
    }
    Ok(())
}
