/// Merge-loop observation and validation hooks.
///
/// Presented as a capability set rather than an inheritance hierarchy, the
/// same way [`crate::stats::StatisticFamily`] is: the merge engine calls
/// every hook at the point described in its doc comment, and a visitor that
/// doesn't care about a given hook simply accepts the default no-op/always
/// valid implementation.
use crate::graph::{EdgeId, NodeId};
use crate::unmerge::UnmergeTracker;

/// One completed merge: the two endpoints as the engine resolved them at
/// merge time, the survivor, and the edge's score at the instant of merge.
pub type MergeRecord = (NodeId, NodeId, NodeId, f64);

/// Observes and can veto candidate merges as the merge loop runs.
///
/// Every method has a default implementation so a visitor only needs to
/// override the hooks it cares about.
pub trait Visitor {
    /// Called immediately after a candidate entry is popped from the
    /// queue, before staleness is checked.
    fn on_pop(&mut self, _edge: EdgeId, _snapshot_score: f64) {}

    /// Called when a popped entry refers to an edge that no longer exists
    /// (both endpoints already absorbed into the same survivor, or deleted
    /// as a rejected candidate).
    fn on_deleted_edge_found(&mut self, _edge: EdgeId) {}

    /// Called when a popped entry's snapshot score no longer matches the
    /// edge's current score (a fresher entry for the same edge exists or
    /// will be pushed).
    fn on_stale_edge_found(&mut self, _edge: EdgeId, _snapshot: f64, _current: f64) {}

    /// Asked before performing a candidate merge of live roots `u` and
    /// `v`. Returning `false` rejects the merge and deletes the edge so it
    /// is never retried.
    fn is_valid_merge(&mut self, _u: NodeId, _v: NodeId) -> bool {
        true
    }

    /// Called after a merge has been performed.
    fn on_merge(&mut self, _a: NodeId, _b: NodeId, _survivor: NodeId, _score: f64) {}
}

/// A visitor that does nothing and rejects nothing; the default for runs
/// that don't need history or constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVisitor;

impl Visitor for NullVisitor {}

/// Appends every completed merge to an ordered history. The merge-history
/// stream the external API surface returns.
#[derive(Debug, Clone, Default)]
pub struct HistoryVisitor {
    history: Vec<MergeRecord>,
}

impl HistoryVisitor {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// The merges recorded so far, in the order they were performed.
    pub fn history(&self) -> &[MergeRecord] {
        &self.history
    }

    /// Consumes the visitor, returning the recorded history.
    pub fn into_history(self) -> Vec<MergeRecord> {
        self.history
    }
}

impl Visitor for HistoryVisitor {
    fn on_merge(&mut self, a: NodeId, b: NodeId, survivor: NodeId, score: f64) {
        self.history.push((a, b, survivor, score));
    }
}

/// Wraps a [`HistoryVisitor`] and delegates validation and constraint
/// bookkeeping to an owned [`UnmergeTracker`], so a single visitor both
/// records history and honors anti-merge constraints.
#[derive(Debug, Clone, Default)]
pub struct ConstrainedVisitor {
    history: HistoryVisitor,
    tracker: UnmergeTracker,
}

impl ConstrainedVisitor {
    /// Wraps a fresh history recorder around `tracker`.
    pub fn new(tracker: UnmergeTracker) -> Self {
        Self {
            history: HistoryVisitor::new(),
            tracker,
        }
    }

    /// The merges recorded so far.
    pub fn history(&self) -> &[MergeRecord] {
        self.history.history()
    }

    /// Consumes the visitor, returning the recorded history.
    pub fn into_history(self) -> Vec<MergeRecord> {
        self.history.into_history()
    }
}

impl Visitor for ConstrainedVisitor {
    fn is_valid_merge(&mut self, u: NodeId, v: NodeId) -> bool {
        self.tracker.is_valid_merge(u, v)
    }

    fn on_merge(&mut self, a: NodeId, b: NodeId, survivor: NodeId, score: f64) {
        self.tracker.on_merge(a, b, survivor);
        self.history.on_merge(a, b, survivor, score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_visitor_records_merges_in_order() {
        let mut v = HistoryVisitor::new();
        v.on_merge(2, 3, 2, 0.1);
        v.on_merge(1, 2, 1, 0.3);
        assert_eq!(v.history(), &[(2, 3, 2, 0.1), (1, 2, 1, 0.3)]);
    }

    #[test]
    fn null_visitor_accepts_every_merge() {
        let mut v = NullVisitor;
        assert!(v.is_valid_merge(1, 2));
    }

    #[test]
    fn constrained_visitor_rejects_forbidden_pair_and_still_records_allowed_ones() {
        let tuples = vec![vec![vec![1], vec![3]]];
        let tracker = UnmergeTracker::from_tuples(&tuples);
        let mut v = ConstrainedVisitor::new(tracker);
        assert!(v.is_valid_merge(1, 2));
        v.on_merge(1, 2, 1, 0.2);
        assert!(!v.is_valid_merge(1, 3));
        assert_eq!(v.history(), &[(1, 2, 1, 0.2)]);
    }
}
