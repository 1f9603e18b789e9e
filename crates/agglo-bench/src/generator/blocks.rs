//! Ground-truth block partitioning.
use ndarray::Array3;

/// Partitions a `(w, h, d)` volume into a `blocks_per_axis`-cubed grid of
/// cuboid blocks, each voxel labeled with its block's dense `1..=N` id.
///
/// Purely a function of the volume shape: no randomness involved, so the
/// same partition is reused by every `noise` variation of the affinity
/// volume built over it.
pub fn assign_blocks(w: usize, h: usize, d: usize, blocks_per_axis: usize) -> Array3<u32> {
    let mut labels = Array3::<u32>::zeros((w, h, d));
    for z in 0..d {
        let bz = block_index(z, d, blocks_per_axis);
        for y in 0..h {
            let by = block_index(y, h, blocks_per_axis);
            for x in 0..w {
                let bx = block_index(x, w, blocks_per_axis);
                let id = bz * blocks_per_axis * blocks_per_axis + by * blocks_per_axis + bx + 1;
                labels[[x, y, z]] = id as u32;
            }
        }
    }
    labels
}

fn block_index(coord: usize, extent: usize, blocks_per_axis: usize) -> usize {
    let span = extent.div_ceil(blocks_per_axis);
    (coord / span).min(blocks_per_axis - 1)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn produces_dense_ids_up_to_cube() {
        let labels = assign_blocks(8, 8, 8, 2);
        let max = labels.iter().copied().max().expect("non-empty");
        assert_eq!(max, 8);
        assert!(labels.iter().all(|&id| id >= 1 && id <= 8));
    }

    #[test]
    fn single_block_covers_whole_volume() {
        let labels = assign_blocks(5, 5, 5, 1);
        assert!(labels.iter().all(|&id| id == 1));
    }
}
