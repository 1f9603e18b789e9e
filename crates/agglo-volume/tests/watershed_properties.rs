//! Property-based tests for watershed seeding over small random affinity
//! volumes.
#![allow(clippy::expect_used)]

use agglo_volume::{AffinityVolume, Axis, seed};
use ndarray::Array4;
use proptest::prelude::*;

/// A small random affinity volume: shape up to `4x4x3`, every value in
/// `[0, 1]`.
fn arb_volume() -> impl Strategy<Value = AffinityVolume> {
    (1usize..=4, 1usize..=4, 1usize..=3).prop_flat_map(|(w, h, d)| {
        prop::collection::vec(0.0f64..=1.0f64, 3 * w * h * d).prop_map(move |flat| {
            let data = Array4::from_shape_vec((3, w, h, d), flat).expect("shape matches");
            AffinityVolume::new(data).expect("values are already in [0, 1]")
        })
    })
}

/// A `(low, high)` threshold pair with `low < high`, both in `[0, 1]`.
fn arb_thresholds() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..1.0f64, 0.0f64..1.0f64).prop_map(|(a, b)| {
        if a < b {
            (a, b)
        } else if a > b {
            (b, a)
        } else {
            (a, (b + 0.01).min(1.0))
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Seeding never drops or duplicates a voxel: the region sizes always
    /// sum to exactly the volume's voxel count.
    #[test]
    fn sizes_sum_to_voxel_count(vol in arb_volume(), (low, high) in arb_thresholds()) {
        let seg = seed(&vol, low, high).expect("valid thresholds always succeed");
        let (w, h, d) = vol.spatial_shape();
        let total: u64 = seg.sizes().iter().sum();
        prop_assert_eq!(total, (w * h * d) as u64);
    }

    /// Every assigned seed id lies in the dense range `1..=max_id`, and
    /// `max_id` matches the number of reported sizes.
    #[test]
    fn seed_ids_are_dense(vol in arb_volume(), (low, high) in arb_thresholds()) {
        let seg = seed(&vol, low, high).expect("valid thresholds always succeed");
        let max_id = seg.max_id();
        prop_assert_eq!(seg.sizes().len(), max_id as usize + 1);
        for (_, id) in seg.iter_voxels() {
            prop_assert!(id >= 1 && id <= max_id);
        }
    }

    /// Any neighbor pair with affinity `>= high` always ends up in the same
    /// region: the unconditional union pass is never overridden by the
    /// later contested pass.
    #[test]
    fn high_affinity_neighbors_always_share_a_region(vol in arb_volume(), (low, high) in arb_thresholds()) {
        let seg = seed(&vol, low, high).expect("valid thresholds always succeed");
        let (w, h, d) = vol.spatial_shape();
        for z in 0..d {
            for y in 0..h {
                for x in 0..w {
                    for axis in [Axis::X, Axis::Y, Axis::Z] {
                        let Some(affinity) = vol.neighbor_affinity(x, y, z, axis) else {
                            continue;
                        };
                        if affinity < high {
                            continue;
                        }
                        let (nx, ny, nz) = match axis {
                            Axis::X => (x + 1, y, z),
                            Axis::Y => (x, y + 1, z),
                            Axis::Z => (x, y, z + 1),
                        };
                        prop_assert_eq!(seg.get(x, y, z), seg.get(nx, ny, nz));
                    }
                }
            }
        }
    }
}
