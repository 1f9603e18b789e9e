/// The region graph: node/edge store with per-edge merge callbacks.
///
/// Nodes are dense integer ids in `[1, N]`; id `0` is reserved for
/// background/unassigned voxels and is never inserted into the graph.
/// Backed by [`petgraph::stable_graph::StableUnGraph`]: node indices stay
/// valid across removal, so `merge_nodes` can redirect or delete incident
/// edges and remove the absorbed node without re-keying any incidence
/// structure.
///
/// `petgraph`'s `StableGraph` does reuse freed index slots on a later
/// insert, though, and this graph's lifecycle promise is stronger than
/// that: queue entries must be able to tell a genuinely new edge apart from
/// a stale reference to a deleted one, even if they land on the same
/// `EdgeIndex` slot. So [`EdgeId`] is a separate monotonically increasing
/// serial, independent of petgraph's own index, minted once per edge for
/// the life of the graph and never reused.
use std::collections::HashMap;
use std::fmt;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;

use crate::error::CoreError;
use crate::score::Scoring;
use crate::stats::StatisticFamily;

/// A dense region identifier in `[1, N]`. `0` is reserved.
pub type NodeId = u32;

/// An opaque, never-reused handle to an edge between two regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[cfg(test)]
impl EdgeId {
    /// Builds an [`EdgeId`] directly from a serial, for use in tests of
    /// sibling modules (queue ordering, visitor plumbing) that need
    /// well-known ids without constructing a whole graph.
    pub(crate) fn for_test(serial: u64) -> Self {
        Self(serial)
    }
}

struct EdgeRecord<Stat> {
    id: EdgeId,
    stat: Stat,
    score: f64,
    version: u64,
}

/// Node/edge store for the live region set, genericized over the
/// statistic family and scoring function it was constructed with.
pub struct RegionGraph<F: StatisticFamily, Sc: Scoring> {
    graph: StableUnGraph<NodeId, EdgeRecord<F::Stat>, u32>,
    index_of: Vec<NodeIndex<u32>>,
    edge_index: HashMap<EdgeId, EdgeIndex<u32>>,
    parent: Vec<NodeId>,
    next_edge_serial: u64,
    family: F,
    scoring: Sc,
}

impl<F: StatisticFamily, Sc: Scoring> RegionGraph<F, Sc> {
    /// Creates a graph with `n` live singleton regions, ids `1..=n`.
    pub fn new(n: usize, family: F, scoring: Sc) -> Self {
        let mut graph = StableUnGraph::default();
        let mut index_of = Vec::with_capacity(n + 1);
        index_of.push(NodeIndex::end()); // id 0 is unused
        let mut parent = Vec::with_capacity(n + 1);
        parent.push(0);
        for id in 1..=n as NodeId {
            index_of.push(graph.add_node(id));
            parent.push(id);
        }
        Self {
            graph,
            index_of,
            edge_index: HashMap::new(),
            parent,
            next_edge_serial: 0,
            family,
            scoring,
        }
    }

    /// The number of regions this graph was constructed with (live + dead).
    pub fn region_count(&self) -> usize {
        self.parent.len().saturating_sub(1)
    }

    /// `true` if `n` is within `[1, N]` and has not yet been absorbed by a
    /// merge.
    pub fn is_live(&self, n: NodeId) -> bool {
        (n as usize) < self.parent.len() && n != 0 && self.parent[n as usize] == n
    }

    fn node_index(&self, n: NodeId) -> Option<NodeIndex<u32>> {
        self.index_of.get(n as usize).copied()
    }

    /// Returns the representative (live root) of `x`'s merge chain, with
    /// path compression (iterative path-halving), and the survivor
    /// tie-break fixed to "smaller id" rather than union-by-rank.
    pub fn resolve(&mut self, x: NodeId) -> NodeId {
        if x == 0 || (x as usize) >= self.parent.len() {
            return x;
        }
        let mut cur = x;
        while self.parent[cur as usize] != cur {
            let grandparent = self.parent[self.parent[cur as usize] as usize];
            self.parent[cur as usize] = grandparent;
            cur = grandparent;
        }
        cur
    }

    /// Returns the live edge between `u` and `v`, if one exists.
    pub fn find_edge(&self, u: NodeId, v: NodeId) -> Option<EdgeId> {
        let (iu, iv) = (self.node_index(u)?, self.node_index(v)?);
        let idx = self.graph.find_edge(iu, iv)?;
        self.graph.edge_weight(idx).map(|rec| rec.id)
    }

    fn mint_edge(&mut self, u: NodeId, v: NodeId, stat: F::Stat) -> EdgeId {
        let id = EdgeId(self.next_edge_serial);
        self.next_edge_serial += 1;
        let record = EdgeRecord {
            id,
            stat,
            score: f64::INFINITY,
            version: 0,
        };
        let iu = self.index_of[u as usize];
        let iv = self.index_of[v as usize];
        let idx = self.graph.add_edge(iu, iv, record);
        self.edge_index.insert(id, idx);
        id
    }

    /// Creates a new edge between live, distinct nodes `u` and `v` carrying
    /// `stat` as its initial statistic.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SelfMerge`] if `u == v`, [`CoreError::NodeNotLive`]
    /// if either endpoint is not live, or [`CoreError::DuplicateEdge`] if an
    /// edge between them already exists.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, stat: F::Stat) -> Result<EdgeId, CoreError> {
        if u == v {
            return Err(CoreError::SelfMerge(u));
        }
        if !self.is_live(u) {
            return Err(CoreError::NodeNotLive(u));
        }
        if !self.is_live(v) {
            return Err(CoreError::NodeNotLive(v));
        }
        if self.find_edge(u, v).is_some() {
            return Err(CoreError::DuplicateEdge(u, v));
        }
        Ok(self.mint_edge(u, v, stat))
    }

    /// Finds or creates the edge between `u` and `v` and folds `affinity`
    /// into its statistic. Used by region-graph construction, where the
    /// same seed pair is contacted by many adjacent voxel pairs.
    pub fn observe_affinity(&mut self, u: NodeId, v: NodeId, affinity: f64) -> EdgeId {
        if let Some(id) = self.find_edge(u, v) {
            let idx = self.edge_index[&id];
            if let Some(rec) = self.graph.edge_weight_mut(idx) {
                self.family.observe(&mut rec.stat, affinity);
                rec.version += 1;
            }
            id
        } else {
            let mut stat = self.family.empty();
            self.family.observe(&mut stat, affinity);
            self.mint_edge(u, v, stat)
        }
    }

    /// Recomputes an edge's cached score from its current statistic.
    /// Bumps the edge's version only when the score actually changed,
    /// which lets unaffected queue entries self-heal instead of being
    /// needlessly invalidated. Returns `(old_score, new_score)`.
    pub fn recompute_score(&mut self, edge: EdgeId) -> (f64, f64) {
        let Some(&idx) = self.edge_index.get(&edge) else {
            return (f64::NAN, f64::NAN);
        };
        let Some(rec) = self.graph.edge_weight_mut(idx) else {
            return (f64::NAN, f64::NAN);
        };
        let value = self.family.value(&rec.stat);
        let new_score = self.scoring.score(value);
        let old_score = rec.score;
        if (new_score - old_score).abs() > f64::EPSILON {
            rec.score = new_score;
            rec.version += 1;
        }
        (old_score, new_score)
    }

    /// `true` if `edge` still refers to a live edge in the graph.
    pub fn edge_exists(&self, edge: EdgeId) -> bool {
        self.edge_index.contains_key(&edge)
    }

    /// The edge's cached score (as of the last [`Self::recompute_score`]
    /// or creation).
    pub fn score(&self, edge: EdgeId) -> f64 {
        self.edge_index
            .get(&edge)
            .and_then(|idx| self.graph.edge_weight(*idx))
            .map_or(f64::NAN, |rec| rec.score)
    }

    /// The edge's current version tag, bumped on every statistic mutation
    /// and every score change.
    pub fn version(&self, edge: EdgeId) -> u64 {
        self.edge_index
            .get(&edge)
            .and_then(|idx| self.graph.edge_weight(*idx))
            .map_or(0, |rec| rec.version)
    }

    /// The `(u, v)` endpoints of a live edge.
    pub fn endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        let idx = *self.edge_index.get(&edge)?;
        let (a, b) = self.graph.edge_endpoints(idx)?;
        Some((self.graph[a], self.graph[b]))
    }

    /// Deletes a live edge outright (used when a candidate merge is
    /// rejected or already transitively satisfied, so it is never
    /// retried).
    pub fn delete_edge(&mut self, edge: EdgeId) {
        if let Some(idx) = self.edge_index.remove(&edge) {
            self.graph.remove_edge(idx);
        }
    }

    /// Yields the live edges incident to a live node.
    pub fn iter_incident(&self, n: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let idx = self.node_index(n);
        idx.into_iter()
            .flat_map(move |idx| self.graph.edges(idx).map(|e| e.weight().id))
    }

    /// Every currently live edge, in no specified order.
    pub fn all_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edge_index.keys().copied()
    }

    /// Merges `u` and `v`. The survivor is deterministically the smaller
    /// id. Redirects or combines the loser's incident edges onto the
    /// survivor, deletes the `(survivor, loser)` self-loop, and records the
    /// parent link `loser -> survivor`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SelfMerge`] if `u == v`, or
    /// [`CoreError::NodeNotLive`] if either is not a live root.
    pub fn merge_nodes(&mut self, u: NodeId, v: NodeId) -> Result<NodeId, CoreError> {
        if u == v {
            return Err(CoreError::SelfMerge(u));
        }
        if !self.is_live(u) {
            return Err(CoreError::NodeNotLive(u));
        }
        if !self.is_live(v) {
            return Err(CoreError::NodeNotLive(v));
        }
        let (survivor, loser) = if u < v { (u, v) } else { (v, u) };

        let loser_idx = self.index_of[loser as usize];
        let incident: Vec<(EdgeId, NodeId)> = self
            .graph
            .edges(loser_idx)
            .map(|e| {
                let other = if e.source() == loser_idx {
                    e.target()
                } else {
                    e.source()
                };
                (e.weight().id, self.graph[other])
            })
            .collect();

        for (edge_id, w) in incident {
            let idx = self.edge_index[&edge_id];
            if w == survivor {
                self.edge_index.remove(&edge_id);
                self.graph.remove_edge(idx);
                continue;
            }
            if let Some(existing) = self.find_edge(survivor, w) {
                let loser_stat = self.graph.edge_weight(idx).map(|r| r.stat.clone());
                if let Some(loser_stat) = loser_stat {
                    let existing_idx = self.edge_index[&existing];
                    if let Some(rec) = self.graph.edge_weight_mut(existing_idx) {
                        self.family.combine(&mut rec.stat, &loser_stat);
                        rec.version += 1;
                    }
                }
                self.edge_index.remove(&edge_id);
                self.graph.remove_edge(idx);
            } else {
                self.edge_index.remove(&edge_id);
                if let Some(rec) = self.graph.remove_edge(idx) {
                    let survivor_idx = self.index_of[survivor as usize];
                    let w_idx = self.index_of[w as usize];
                    let new_idx = self.graph.add_edge(survivor_idx, w_idx, rec);
                    self.edge_index.insert(edge_id, new_idx);
                }
            }
        }

        self.graph.remove_node(loser_idx);
        self.parent[loser as usize] = survivor;
        Ok(survivor)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::score::AscendingAffinityScore;
    use crate::stats::StatKind;

    fn fam() -> StatKind {
        StatKind::Max
    }

    fn fresh(n: usize) -> RegionGraph<StatKind, AscendingAffinityScore> {
        RegionGraph::new(n, fam(), AscendingAffinityScore)
    }

    #[test]
    fn new_graph_has_live_singletons() {
        let g = fresh(3);
        assert!(g.is_live(1));
        assert!(g.is_live(2));
        assert!(g.is_live(3));
        assert!(!g.is_live(0));
        assert!(!g.is_live(4));
    }

    #[test]
    fn add_edge_then_find() {
        let mut g = fresh(2);
        let stat = fam().empty();
        let e = g.add_edge(1, 2, stat).expect("add_edge should succeed");
        assert_eq!(g.find_edge(1, 2), Some(e));
        assert_eq!(g.find_edge(2, 1), Some(e));
    }

    #[test]
    fn add_edge_rejects_self_loop() {
        let mut g = fresh(2);
        let stat = fam().empty();
        assert_eq!(g.add_edge(1, 1, stat), Err(CoreError::SelfMerge(1)));
    }

    #[test]
    fn add_edge_rejects_duplicate() {
        let mut g = fresh(2);
        g.add_edge(1, 2, fam().empty()).expect("first add succeeds");
        let err = g.add_edge(1, 2, fam().empty());
        assert_eq!(err, Err(CoreError::DuplicateEdge(1, 2)));
    }

    #[test]
    fn observe_affinity_creates_then_accumulates() {
        let family = StatKind::Mean;
        let mut g = RegionGraph::new(2, family.clone(), AscendingAffinityScore);
        let e1 = g.observe_affinity(1, 2, 0.2);
        let e2 = g.observe_affinity(1, 2, 0.8);
        assert_eq!(e1, e2, "second contact should reuse the same edge");
    }

    #[test]
    fn merge_redirects_non_conflicting_edge() {
        let mut g = fresh(3);
        g.add_edge(1, 2, fam().empty()).expect("add 1-2");
        let e23 = g
            .add_edge(2, 3, fam().empty())
            .expect("add 2-3");
        let survivor = g.merge_nodes(1, 2).expect("merge 1,2");
        assert_eq!(survivor, 1);
        assert!(!g.is_live(2));
        assert_eq!(g.resolve(2), 1);
        // the 2-3 edge must have been redirected onto survivor 1, keeping
        // its identity (never resurrected, never re-created from scratch).
        assert_eq!(g.find_edge(1, 3), Some(e23));
    }

    #[test]
    fn merge_combines_parallel_edges() {
        let family = StatKind::Max;
        let mut g = RegionGraph::new(3, family.clone(), AscendingAffinityScore);
        let mut low = family.empty();
        family.observe(&mut low, 0.2);
        g.add_edge(1, 2, low).expect("add 1-2");
        let mut high_13 = family.empty();
        family.observe(&mut high_13, 0.9);
        g.add_edge(1, 3, high_13).expect("add 1-3");
        let mut high_23 = family.empty();
        family.observe(&mut high_23, 0.7);
        g.add_edge(2, 3, high_23).expect("add 2-3");

        g.merge_nodes(1, 2).expect("merge 1,2");
        // 1-3 and 2-3 should now be combined into a single edge 1-3.
        let e13 = g.find_edge(1, 3).expect("combined edge should exist");
        assert_eq!(g.iter_incident(1).count(), 1);
        let (_, new_val) = g.recompute_score(e13);
        // score = 1 - max(0.9, 0.7) = 0.1
        assert!((new_val - 0.1).abs() < 1e-9);
    }

    #[test]
    fn merge_deletes_self_loop() {
        let mut g = fresh(2);
        g.add_edge(1, 2, fam().empty()).expect("add 1-2");
        g.merge_nodes(1, 2).expect("merge 1,2");
        assert_eq!(g.iter_incident(1).count(), 0);
    }

    #[test]
    fn merge_rejects_self_merge() {
        let mut g = fresh(2);
        assert_eq!(g.merge_nodes(1, 1), Err(CoreError::SelfMerge(1)));
    }

    #[test]
    fn merge_rejects_dead_node() {
        let mut g = fresh(3);
        g.add_edge(1, 2, fam().empty()).expect("add 1-2");
        g.merge_nodes(1, 2).expect("merge 1,2");
        assert_eq!(g.merge_nodes(2, 3), Err(CoreError::NodeNotLive(2)));
    }

    #[test]
    fn survivor_is_always_smaller_id() {
        let mut g = fresh(2);
        g.add_edge(1, 2, fam().empty()).expect("add 1-2");
        assert_eq!(g.merge_nodes(2, 1).expect("merge"), 1);
    }

    #[test]
    fn resolve_compresses_chains() {
        let mut g = fresh(3);
        g.add_edge(1, 2, fam().empty()).expect("add 1-2");
        g.add_edge(1, 3, fam().empty()).expect("add 1-3");
        g.merge_nodes(1, 2).expect("merge 1,2");
        g.merge_nodes(1, 3).expect("merge 1,3");
        assert_eq!(g.resolve(2), 1);
        assert_eq!(g.resolve(3), 1);
    }

    #[test]
    fn deleted_edge_is_not_resurrected() {
        let mut g = fresh(2);
        let e = g.add_edge(1, 2, fam().empty()).expect("add 1-2");
        g.delete_edge(e);
        assert!(!g.edge_exists(e));
        assert_eq!(g.find_edge(1, 2), None);
    }

    #[test]
    fn no_duplicate_edge_after_both_sides_present() {
        // u-w and v-w both exist before merging u and v; afterwards there
        // must be exactly one edge between survivor and w.
        let mut g = fresh(3);
        g.add_edge(1, 2, fam().empty()).expect("add 1-2");
        g.add_edge(1, 3, fam().empty()).expect("add 1-3");
        g.add_edge(2, 3, fam().empty()).expect("add 2-3");
        g.merge_nodes(1, 2).expect("merge 1,2");
        assert_eq!(g.iter_incident(1).count(), 1);
    }
}
