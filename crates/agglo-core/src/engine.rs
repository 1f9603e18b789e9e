/// Orchestrates pop → validate → merge → update: the iterative
/// region-merging engine itself.
///
/// Owns the region graph and the priority queue for its lifetime. The
/// visitor and, through it, any
/// [`crate::unmerge::UnmergeTracker`] are supplied per call rather than
/// stored, so a caller controls their lifetime explicitly and can resume a
/// run across multiple [`MergeEngine::merge_until`] calls while reusing the
/// same visitor to preserve its accumulated state (recorded history,
/// unmerge-tracker group memberships).
use crate::graph::{EdgeId, NodeId, RegionGraph};
use crate::queue::{MergeQueue, QueueEntry, QueueKind};
use crate::score::{AscendingAffinityScore, Scoring};
use crate::stats::StatisticFamily;
use crate::visitor::Visitor;

/// The iterative region-merging engine: a region graph plus the priority
/// queue that drives best-first merge order over it.
pub struct MergeEngine<F: StatisticFamily, Sc: Scoring = AscendingAffinityScore> {
    graph: RegionGraph<F, Sc>,
    queue: Box<dyn MergeQueue + Send>,
    merges_performed: usize,
}

impl<F: StatisticFamily, Sc: Scoring> MergeEngine<F, Sc> {
    /// Creates an engine over `n` singleton regions (ids `1..=n`), with the
    /// given statistic family, scoring function, and queue realization. The
    /// graph starts edgeless; call [`Self::graph_mut`] to build it (via
    /// `add_edge`/`observe_affinity`), then [`Self::seed_queue`] once
    /// construction is complete.
    pub fn new(n: usize, family: F, scoring: Sc, queue_kind: QueueKind) -> Self {
        Self {
            graph: RegionGraph::new(n, family, scoring),
            queue: queue_kind.build(),
            merges_performed: 0,
        }
    }

    /// Read access to the region graph, for callers that want to inspect
    /// edges between construction and the first merge run.
    pub fn graph(&self) -> &RegionGraph<F, Sc> {
        &self.graph
    }

    /// Mutable access to the region graph, used by region-graph
    /// construction (`add_edge`/`observe_affinity`) before the first call
    /// to [`Self::seed_queue`].
    pub fn graph_mut(&mut self) -> &mut RegionGraph<F, Sc> {
        &mut self.graph
    }

    /// Seeds the priority queue with one entry per edge currently in the
    /// graph, computing each edge's initial score from its statistic. Call
    /// once, after graph construction and before the first
    /// [`Self::merge_until`].
    pub fn seed_queue(&mut self) {
        let edges: Vec<EdgeId> = self.graph.all_edges().collect();
        for edge in edges {
            let (_, score) = self.graph.recompute_score(edge);
            self.queue.push(QueueEntry {
                score,
                edge_id: edge,
                version: self.graph.version(edge),
            });
        }
    }

    /// The total number of merges performed across every call to
    /// [`Self::merge_until`] on this engine so far.
    pub fn merges_performed(&self) -> usize {
        self.merges_performed
    }

    /// Runs the merge loop: pop the best candidate, validate it, merge it,
    /// update affected scores, repeat, until the queue drains or the best
    /// remaining live edge's score exceeds `threshold`. Resumable: a later
    /// call with a larger threshold continues from where this one stopped.
    ///
    /// Returns the number of merges performed in *this* call.
    pub fn merge_until<V: Visitor>(&mut self, threshold: f64, visitor: &mut V) -> usize {
        let mut performed = 0usize;
        loop {
            let Some(entry) = self.queue.pop() else {
                break;
            };
            visitor.on_pop(entry.edge_id, entry.score);

            if !self.graph.edge_exists(entry.edge_id) {
                visitor.on_deleted_edge_found(entry.edge_id);
                continue;
            }

            let current_version = self.graph.version(entry.edge_id);
            if current_version != entry.version {
                let current = self.graph.score(entry.edge_id);
                visitor.on_stale_edge_found(entry.edge_id, entry.score, current);
                self.queue.push(QueueEntry {
                    score: current,
                    edge_id: entry.edge_id,
                    version: current_version,
                });
                continue;
            }

            if entry.score > threshold {
                // Not yet ready: this is still the best remaining live
                // edge, just worse than the limit. Push it back so a
                // future call with a larger threshold can resume here.
                self.queue.push(entry);
                break;
            }

            let Some((u, v)) = self.graph.endpoints(entry.edge_id) else {
                continue;
            };
            let ru = self.graph.resolve(u);
            let rv = self.graph.resolve(v);
            if ru == rv {
                // Already merged transitively by an earlier candidate.
                self.graph.delete_edge(entry.edge_id);
                continue;
            }

            if !visitor.is_valid_merge(ru, rv) {
                self.graph.delete_edge(entry.edge_id);
                continue;
            }

            let Ok(survivor) = self.graph.merge_nodes(ru, rv) else {
                continue;
            };

            let incident: Vec<EdgeId> = self.graph.iter_incident(survivor).collect();
            for edge in incident {
                let (old_score, new_score) = self.graph.recompute_score(edge);
                if new_score < old_score {
                    self.queue.push(QueueEntry {
                        score: new_score,
                        edge_id: edge,
                        version: self.graph.version(edge),
                    });
                }
            }

            visitor.on_merge(ru, rv, survivor, entry.score);
            performed += 1;
        }
        self.merges_performed += performed;
        performed
    }

    /// Segmentation extraction: remaps every seed id through the
    /// parent-link forest to its live root. Id `0` (background) maps to
    /// itself. `O(V)` given path compression.
    pub fn resolve_labels(&mut self, seed_ids: &[NodeId]) -> Vec<NodeId> {
        seed_ids
            .iter()
            .map(|&id| if id == 0 { 0 } else { self.graph.resolve(id) })
            .collect()
    }

    /// Exports the current live edge set with freshly recomputed scores,
    /// in no specified order. For visualization or further processing by
    /// callers who want the post-merge graph.
    pub fn extract_region_graph(&mut self) -> Vec<(NodeId, NodeId, f64)> {
        let edges: Vec<EdgeId> = self.graph.all_edges().collect();
        edges
            .into_iter()
            .filter_map(|edge| {
                let (_, score) = self.graph.recompute_score(edge);
                let (u, v) = self.graph.endpoints(edge)?;
                Some((u, v, score))
            })
            .collect()
    }
}
