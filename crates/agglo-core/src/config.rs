/// Merge-engine construction configuration.
///
/// A plain, caller-constructed struct passed to
/// [`crate::engine::MergeEngine::new`]: configuration in, owned engine out,
/// rather than a growing constructor parameter list. Resource-exhaustion
/// handling (the vector-backed quantile's degrade-to-histogram fallback) is
/// selected here, up front, instead of surfacing as a runtime error.
use crate::queue::QueueKind;
use crate::stats::StatKind;

/// Configuration for one [`crate::engine::MergeEngine`] run.
///
/// # Defaults
///
/// [`Default`] matches the workspace's fixed defaults: a 256-bin histogram
/// quantile at the median, sourced over `[0, 1]`, with a plain binary-heap
/// queue. Anti-merge constraints are not part of this struct: they are
/// supplied once, directly to session construction (`InitParams::unmerge_list`
/// in `agglo-cli`), so there is exactly one place a caller can set them
/// rather than two that must agree.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Which statistic family accumulates each edge's affinity evidence,
    /// and how it is parameterized (quantile, bin count, range, ...).
    ///
    /// Default: [`StatKind::QuantileHistogram`] with 256 bins over
    /// `[0, 1]` at `q = 0.5`.
    pub stat_kind: StatKind,

    /// Which priority-queue realization backs the merge loop.
    ///
    /// Default: [`QueueKind::BinaryHeap`].
    pub queue_kind: QueueKind,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stat_kind: StatKind::QuantileHistogram {
                bins: 256,
                q: 0.5,
                lo: 0.0,
                hi: 1.0,
            },
            queue_kind: QueueKind::default(),
        }
    }
}
