/// Anti-merge constraint tracking.
///
/// Enforces mutual-exclusion constraints supplied as *anti-group tuples*:
/// each tuple lists two or more *coherent groups*, each group a list of
/// seed ids that must stay together, but groups within the same tuple must
/// never end up in the same final region. A seed id may participate in
/// several tuples at once, hence in several groups.
///
/// Owned by [`crate::engine::MergeEngine`] for the lifetime of the run (a
/// plain field, never a process-global).
use std::collections::HashMap;

use crate::graph::NodeId;

/// A coherent group's identity: the first seed id of the group it was
/// built from, per the deterministic-group-id convention.
pub type GroupId = NodeId;

/// Tracks which coherent groups a seed belongs to, and which groups are
/// mutually exclusive with which, across the life of a merge run.
///
/// Both operations short-circuit to a no-op/always-valid answer when the
/// caller supplied no constraints, so a constraint-free run pays no cost
/// beyond one branch per call.
#[derive(Debug, Clone, Default)]
pub struct UnmergeTracker {
    seg_to_groups: HashMap<NodeId, Vec<GroupId>>,
    group_to_antis: HashMap<GroupId, Vec<GroupId>>,
}

impl UnmergeTracker {
    /// An empty tracker: every merge is valid, `on_merge` is a no-op.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tracker from the caller-supplied anti-group tuples. Each
    /// tuple is a list of coherent groups; each group a list of seed ids.
    /// Within a tuple, every pair of groups becomes mutually exclusive.
    pub fn from_tuples(tuples: &[Vec<Vec<NodeId>>]) -> Self {
        let mut tracker = Self::new();
        for tuple in tuples {
            let group_ids: Vec<GroupId> = tuple
                .iter()
                .filter_map(|group| group.first().copied())
                .collect();
            for (group, &group_id) in tuple.iter().zip(group_ids.iter()) {
                for &seed in group {
                    tracker
                        .seg_to_groups
                        .entry(seed)
                        .or_default()
                        .push(group_id);
                }
            }
            for (i, &gi) in group_ids.iter().enumerate() {
                for &gj in group_ids.iter().skip(i + 1) {
                    tracker.group_to_antis.entry(gi).or_default().push(gj);
                    tracker.group_to_antis.entry(gj).or_default().push(gi);
                }
            }
        }
        tracker
    }

    /// `true` if this tracker holds no constraints.
    pub fn is_empty(&self) -> bool {
        self.seg_to_groups.is_empty()
    }

    fn groups_of(&self, n: NodeId) -> &[GroupId] {
        self.seg_to_groups.get(&n).map_or(&[], Vec::as_slice)
    }

    /// `true` if merging `a` and `b` would not place mutually-exclusive
    /// groups into the same region. `O(|groups(a)| * |groups(b)|)`.
    pub fn is_valid_merge(&self, a: NodeId, b: NodeId) -> bool {
        if self.is_empty() {
            return true;
        }
        let (groups_a, groups_b) = (self.groups_of(a), self.groups_of(b));
        for &ga in groups_a {
            let Some(antis) = self.group_to_antis.get(&ga) else {
                continue;
            };
            if groups_b.iter().any(|gb| antis.contains(gb)) {
                return false;
            }
        }
        true
    }

    /// Records that `a` and `b` were merged into `survivor`: the union of
    /// their group memberships now applies to `survivor`. Duplicate group
    /// entries are harmless; [`Self::is_valid_merge`] remains correct with
    /// them present.
    pub fn on_merge(&mut self, a: NodeId, b: NodeId, survivor: NodeId) {
        if self.is_empty() {
            return;
        }
        let mut merged = self.groups_of(a).to_vec();
        merged.extend_from_slice(self.groups_of(b));
        if merged.is_empty() {
            return;
        }
        self.seg_to_groups.insert(survivor, merged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_allows_everything() {
        let t = UnmergeTracker::new();
        assert!(t.is_valid_merge(1, 2));
    }

    #[test]
    fn single_tuple_two_groups_forbids_cross_merge() {
        let tuples = vec![vec![vec![1, 2], vec![3, 4]]];
        let t = UnmergeTracker::from_tuples(&tuples);
        assert!(!t.is_valid_merge(1, 3));
        assert!(!t.is_valid_merge(2, 4));
        assert!(t.is_valid_merge(1, 2));
        assert!(t.is_valid_merge(3, 4));
    }

    #[test]
    fn three_way_tuple_all_pairs_forbidden() {
        let tuples = vec![vec![vec![1], vec![2], vec![3]]];
        let t = UnmergeTracker::from_tuples(&tuples);
        assert!(!t.is_valid_merge(1, 2));
        assert!(!t.is_valid_merge(1, 3));
        assert!(!t.is_valid_merge(2, 3));
    }

    #[test]
    fn on_merge_propagates_group_membership_transitively() {
        // A-B-C chain, A and C forbidden together. Merge B into A first,
        // then the survivor (A) must still refuse C.
        let tuples = vec![vec![vec![1], vec![3]]];
        let mut t = UnmergeTracker::from_tuples(&tuples);
        assert!(t.is_valid_merge(1, 2));
        t.on_merge(1, 2, 1);
        assert!(!t.is_valid_merge(1, 3));
    }

    #[test]
    fn seed_in_multiple_tuples_tracks_all_groups() {
        let tuples = vec![vec![vec![1], vec![2]], vec![vec![1], vec![3]]];
        let t = UnmergeTracker::from_tuples(&tuples);
        assert!(!t.is_valid_merge(1, 2));
        assert!(!t.is_valid_merge(1, 3));
        assert!(t.is_valid_merge(2, 3));
    }

    #[test]
    fn unrelated_seeds_are_unconstrained() {
        let tuples = vec![vec![vec![1], vec![2]]];
        let t = UnmergeTracker::from_tuples(&tuples);
        assert!(t.is_valid_merge(5, 6));
    }
}
