/// Ground-truth evaluation: Rand and Variation-of-Information split/merge
/// indices, computed from a predicted label volume and a ground-truth volume
/// of identical shape.
///
/// Independent of the merge engine: this module only consumes the two
/// flat label arrays the caller already has in hand (typically the result of
/// [`agglo_core::MergeEngine::resolve_labels`] and a loaded [`crate::volume::SegVolume`]),
/// via the standard contingency-table definitions.
use std::collections::HashMap;

use crate::error::VolumeError;

/// The four split/merge components of a segmentation comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandVoi {
    /// Rand split error: probability two voxels sharing a predicted label
    /// fall into different ground-truth labels.
    pub rand_split: f64,
    /// Rand merge error: probability two voxels sharing a ground-truth label
    /// fall into different predicted labels.
    pub rand_merge: f64,
    /// Variation-of-information split component: `H(ground_truth | predicted)`.
    pub voi_split: f64,
    /// Variation-of-information merge component: `H(predicted | ground_truth)`.
    pub voi_merge: f64,
}

/// Computes `(rand_split, rand_merge, voi_split, voi_merge)` for a predicted
/// labeling against a ground-truth labeling of the same voxel count.
///
/// Background (id `0`) voxels are excluded from both labelings before the
/// contingency table is built, matching the convention that `0` means
/// unassigned rather than a genuine segment.
///
/// # Errors
///
/// Returns [`VolumeError::LabelCountMismatch`] if the two slices differ
/// in length (the flattened voxel count must match; callers are responsible
/// for reshaping consistently).
pub fn rand_voi(predicted: &[u32], ground_truth: &[u32]) -> Result<RandVoi, VolumeError> {
    if predicted.len() != ground_truth.len() {
        return Err(VolumeError::LabelCountMismatch {
            predicted: predicted.len(),
            ground_truth: ground_truth.len(),
        });
    }

    let mut contingency: HashMap<(u32, u32), u64> = HashMap::new();
    let mut pred_marginal: HashMap<u32, u64> = HashMap::new();
    let mut gt_marginal: HashMap<u32, u64> = HashMap::new();
    let mut total: u64 = 0;

    for (&p, &g) in predicted.iter().zip(ground_truth.iter()) {
        if p == 0 || g == 0 {
            continue;
        }
        *contingency.entry((p, g)).or_insert(0) += 1;
        *pred_marginal.entry(p).or_insert(0) += 1;
        *gt_marginal.entry(g).or_insert(0) += 1;
        total += 1;
    }

    if total == 0 {
        return Ok(RandVoi {
            rand_split: 0.0,
            rand_merge: 0.0,
            voi_split: 0.0,
            voi_merge: 0.0,
        });
    }

    let n = total as f64;
    let pairs = |c: u64| -> f64 {
        let c = c as f64;
        c * (c - 1.0) / 2.0
    };

    let sum_pairs_joint: f64 = contingency.values().copied().map(pairs).sum();
    let sum_pairs_pred: f64 = pred_marginal.values().copied().map(pairs).sum();
    let sum_pairs_gt: f64 = gt_marginal.values().copied().map(pairs).sum();

    // Rand merge error: pairs sharing a ground-truth label but split across
    // predicted labels, normalized by pairs sharing a ground-truth label.
    let rand_merge = if sum_pairs_gt > 0.0 {
        (sum_pairs_gt - sum_pairs_joint) / sum_pairs_gt
    } else {
        0.0
    };
    // Rand split error: pairs sharing a predicted label but split across
    // ground-truth labels, normalized by pairs sharing a predicted label.
    let rand_split = if sum_pairs_pred > 0.0 {
        (sum_pairs_pred - sum_pairs_joint) / sum_pairs_pred
    } else {
        0.0
    };

    let entropy = |counts: &HashMap<u32, u64>| -> f64 {
        counts
            .values()
            .map(|&c| {
                let p = c as f64 / n;
                if p > 0.0 { -p * p.log2() } else { 0.0 }
            })
            .sum::<f64>()
    };

    let h_pred = entropy(&pred_marginal);
    let h_gt = entropy(&gt_marginal);
    let h_joint: f64 = contingency
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            if p > 0.0 { -p * p.log2() } else { 0.0 }
        })
        .sum();
    let mutual_information = h_pred + h_gt - h_joint;

    // H(ground_truth | predicted): uncertainty about the ground truth that
    // remains given the prediction -- high when the prediction over-merges
    // (one predicted region spans several ground-truth ones).
    let voi_split = (h_gt - mutual_information).max(0.0);
    // H(predicted | ground_truth): uncertainty about the prediction given
    // the ground truth -- high when the prediction over-splits.
    let voi_merge = (h_pred - mutual_information).max(0.0);

    Ok(RandVoi {
        rand_split,
        rand_merge,
        voi_split,
        voi_merge,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn identical_labelings_have_zero_error() {
        let labels = vec![1, 1, 2, 2, 3, 3];
        let r = rand_voi(&labels, &labels).expect("same length");
        assert!(r.rand_split.abs() < 1e-9);
        assert!(r.rand_merge.abs() < 1e-9);
        assert!(r.voi_split.abs() < 1e-9);
        assert!(r.voi_merge.abs() < 1e-9);
    }

    #[test]
    fn fully_merged_prediction_has_zero_merge_error() {
        // Ground truth splits into two regions; prediction collapses both
        // into one. Every pair sharing the ground-truth label is still
        // together in the prediction, so rand_merge and voi_merge are zero.
        let predicted = vec![1, 1, 1, 1];
        let ground_truth = vec![1, 1, 2, 2];
        let r = rand_voi(&predicted, &ground_truth).expect("same length");
        assert!(r.rand_merge.abs() < 1e-9);
        assert!(r.voi_merge.abs() < 1e-9);
        assert!(r.rand_split > 0.0, "predicted merges distinct gt regions");
        assert!(r.voi_split > 0.0);
    }

    #[test]
    fn fully_split_prediction_has_zero_split_error() {
        let predicted = vec![1, 2, 3, 4];
        let ground_truth = vec![1, 1, 1, 1];
        let r = rand_voi(&predicted, &ground_truth).expect("same length");
        assert!(r.rand_split.abs() < 1e-9);
        assert!(r.voi_split.abs() < 1e-9);
        assert!(r.rand_merge > 0.0);
        assert!(r.voi_merge > 0.0);
    }

    #[test]
    fn background_voxels_are_excluded() {
        let predicted = vec![0, 1, 1, 0];
        let ground_truth = vec![0, 1, 1, 0];
        let r = rand_voi(&predicted, &ground_truth).expect("same length");
        assert!(r.rand_split.abs() < 1e-9);
        assert!(r.rand_merge.abs() < 1e-9);
    }

    #[test]
    fn mismatched_length_is_an_error() {
        let err = rand_voi(&[1, 2], &[1, 2, 3]);
        assert!(matches!(err, Err(VolumeError::LabelCountMismatch { .. })));
    }
}
