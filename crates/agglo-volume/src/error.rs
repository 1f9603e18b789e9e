/// Precondition errors for the external collaborators: watershed seeding,
/// region-graph construction, and ground-truth evaluation.
///
/// Sits at an I/O/array boundary rather than in the hot algorithmic core, so
/// (per the ambient-stack design) it uses `thiserror` rather than the
/// hand-rolled `Display` impls [`agglo_core::error::CoreError`] uses.
use thiserror::Error;

/// All precondition violations the volume-adapter layer can report.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VolumeError {
    /// The affinity volume's shape did not match the declared `(3, W, H, D)`.
    #[error("affinity volume shape {got:?} does not match declared (3, {w}, {h}, {d})")]
    AffinityShapeMismatch {
        /// The shape actually observed.
        got: (usize, usize, usize, usize),
        /// Declared width.
        w: usize,
        /// Declared height.
        h: usize,
        /// Declared depth.
        d: usize,
    },

    /// The segmentation volume's shape did not match the declared `(W, H, D)`.
    #[error("segmentation volume shape {got:?} does not match declared ({w}, {h}, {d})")]
    SegShapeMismatch {
        /// The shape actually observed.
        got: (usize, usize, usize),
        /// Declared width.
        w: usize,
        /// Declared height.
        h: usize,
        /// Declared depth.
        d: usize,
    },

    /// The ground-truth volume's shape did not match the predicted
    /// segmentation's shape.
    #[error("ground truth shape {gt:?} does not match segmentation shape {seg:?}")]
    GroundTruthShapeMismatch {
        /// Ground-truth volume shape.
        gt: (usize, usize, usize),
        /// Segmentation volume shape.
        seg: (usize, usize, usize),
    },

    /// A flattened predicted-label array and ground-truth array passed to
    /// [`crate::metrics::rand_voi`] had different lengths.
    #[error("predicted labels ({predicted} voxels) and ground truth ({ground_truth} voxels) have different lengths")]
    LabelCountMismatch {
        /// Length of the predicted-label slice.
        predicted: usize,
        /// Length of the ground-truth slice.
        ground_truth: usize,
    },

    /// An affinity value outside `[0, 1]` or non-finite was encountered.
    #[error("affinity value {0} at index {1:?} is not finite in [0, 1]")]
    InvalidAffinity(f64, (usize, usize, usize, usize)),

    /// `aff_low` was not strictly less than `aff_high`, or either was
    /// non-finite / outside `[0, 1]`.
    #[error("invalid watershed thresholds: low={low}, high={high} (require 0 <= low < high <= 1)")]
    InvalidThresholds {
        /// The rejected low threshold.
        low: f64,
        /// The rejected high threshold.
        high: f64,
    },

    /// A seed id in the segmentation volume exceeded the declared region
    /// count `N`.
    #[error("seed id {id} at index {at:?} exceeds declared region count {n}")]
    SeedIdOutOfRange {
        /// The offending id.
        id: u32,
        /// Its location.
        at: (usize, usize, usize),
        /// The declared region count.
        n: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_thresholds_message_contains_values() {
        let e = VolumeError::InvalidThresholds {
            low: 0.9,
            high: 0.1,
        };
        let msg = e.to_string();
        assert!(msg.contains("0.9"));
        assert!(msg.contains("0.1"));
    }

    #[test]
    fn seed_id_out_of_range_message_contains_id_and_n() {
        let e = VolumeError::SeedIdOutOfRange {
            id: 50,
            at: (1, 2, 3),
            n: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("50"));
        assert!(msg.contains("10"));
    }
}
