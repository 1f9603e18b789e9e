/// Iterative region-merging engine for 3-D affinity-graph agglomeration.
///
/// This crate owns the hard engineering described by the agglomeration
/// design: the dynamically maintained region graph, the priority-queue
/// discipline that survives edge-score invalidation under merging, the
/// statistics provider plugged into a scoring function, the merge-history
/// visitor, and the anti-merge constraint tracker.
///
/// Seeding (watershed), voxel-array wrapping, and ground-truth metrics are
/// external collaborators and live in `agglo-volume`; this crate only
/// specifies the interfaces it needs from them.
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod queue;
pub mod score;
pub mod stats;
pub mod unmerge;
pub mod visitor;

pub use config::EngineConfig;
pub use engine::MergeEngine;
pub use error::CoreError;
pub use graph::{EdgeId, NodeId, RegionGraph};
pub use queue::{BinaryHeapQueue, BinningQueue, MergeQueue, QueueEntry, QueueKind};
pub use score::{AscendingAffinityScore, Scoring};
pub use stats::{Stat, StatKind, StatisticFamily};
pub use unmerge::{GroupId, UnmergeTracker};
pub use visitor::{ConstrainedVisitor, HistoryVisitor, MergeRecord, NullVisitor, Visitor};

/// Returns the current version of the agglo-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn version_is_semver() {
        let v = version();
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "version should have 3 parts: {v}");
        for part in parts {
            part.parse::<u32>().expect("each part should be a number");
        }
    }
}
