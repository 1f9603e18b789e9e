/// Best-first edge queue tolerating stale scores.
///
/// Decrease-key is deliberately avoided: whenever a
/// merge lowers an edge's score a fresh entry is pushed and the old one is
/// left to be discarded on a later pop. Staleness is detected with a
/// per-edge monotonic version tag (bumped by
/// [`crate::graph::RegionGraph::recompute_score`] and
/// [`crate::graph::RegionGraph::observe_affinity`]) rather than by
/// re-comparing floating-point scores, which bounds memory: an entry whose
/// tag no longer matches the edge's current version is stale by
/// construction and dropped without a comparison.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::graph::EdgeId;

/// One queued candidate: the score and version the edge had at push time,
/// plus the edge it refers to.
///
/// Ordering is reversed from the natural `f64` order so that a
/// [`std::collections::BinaryHeap`] of these behaves as a min-heap on
/// score (ascending polarity: smaller score pops first), with ties broken
/// by the smaller edge id, matching the survivor/score tie-break fixed in
/// [`crate::graph`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueEntry {
    /// The score the edge had when this entry was pushed.
    pub score: f64,
    /// The edge this entry refers to.
    pub edge_id: EdgeId,
    /// The edge's version tag at push time.
    pub version: u64,
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        OrderedFloat(other.score)
            .cmp(&OrderedFloat(self.score))
            .then_with(|| other.edge_id.cmp(&self.edge_id))
    }
}

/// A best-first edge queue. Implementations need not support decrease-key;
/// the merge engine pushes a fresh entry on every score decrease and relies
/// on [`QueueEntry::version`] to recognize the earlier entry as stale.
pub trait MergeQueue {
    /// Pushes a candidate entry.
    fn push(&mut self, entry: QueueEntry);

    /// Pops the best (lowest-score) entry, if any. Ties are broken by the
    /// smaller edge id.
    fn pop(&mut self) -> Option<QueueEntry>;

    /// `true` if the queue holds no entries (live or stale).
    fn is_empty(&self) -> bool;

    /// The number of entries currently held, including any stale ones not
    /// yet popped.
    fn len(&self) -> usize;
}

/// A plain binary heap over `(score, edge_id)`. The default realization:
/// `O(log n)` push/pop with no score-quantization error.
#[derive(Debug, Clone, Default)]
pub struct BinaryHeapQueue {
    heap: BinaryHeap<QueueEntry>,
}

impl BinaryHeapQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MergeQueue for BinaryHeapQueue {
    fn push(&mut self, entry: QueueEntry) {
        self.heap.push(entry);
    }

    fn pop(&mut self) -> Option<QueueEntry> {
        self.heap.pop()
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// A fixed-bin bucketing queue. Scores are bucketed into `bins` buckets
/// spanning `[score_min, score_max]`; `pop` scans buckets in ascending
/// order and pops the best entry within the first non-empty one. Gives
/// amortized `O(1)` push/pop at the cost of score-quantization error
/// bounded by one bin's width, appropriate when scores are known to be
/// bounded and heap churn dominates.
#[derive(Debug, Clone)]
pub struct BinningQueue {
    bins: Vec<BinaryHeap<QueueEntry>>,
    score_min: f64,
    score_max: f64,
    len: usize,
}

impl BinningQueue {
    /// Creates an empty binning queue with `bin_count` buckets spanning
    /// `[score_min, score_max]`. `bin_count` is clamped to at least 1.
    pub fn new(bin_count: usize, score_min: f64, score_max: f64) -> Self {
        let bin_count = bin_count.max(1);
        Self {
            bins: (0..bin_count).map(|_| BinaryHeap::new()).collect(),
            score_min,
            score_max,
            len: 0,
        }
    }

    fn bin_of(&self, score: f64) -> usize {
        let bins = self.bins.len();
        if self.score_max <= self.score_min {
            return 0;
        }
        let frac = ((score - self.score_min) / (self.score_max - self.score_min)).clamp(0.0, 1.0);
        let idx = (frac * bins as f64) as usize;
        idx.min(bins - 1)
    }
}

impl MergeQueue for BinningQueue {
    fn push(&mut self, entry: QueueEntry) {
        let idx = self.bin_of(entry.score);
        self.bins[idx].push(entry);
        self.len += 1;
    }

    fn pop(&mut self) -> Option<QueueEntry> {
        for bin in &mut self.bins {
            if let Some(entry) = bin.pop() {
                self.len -= 1;
                return Some(entry);
            }
        }
        None
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Which [`MergeQueue`] realization to use. Selected once, up front, via
/// [`crate::config::EngineConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueueKind {
    /// [`BinaryHeapQueue`]: exact ordering, `O(log n)` operations.
    BinaryHeap,
    /// [`BinningQueue`]: quantized ordering, amortized `O(1)` operations.
    Binning {
        /// Number of buckets.
        bins: usize,
        /// Lower bound of the score range the buckets span.
        score_min: f64,
        /// Upper bound of the score range the buckets span.
        score_max: f64,
    },
}

impl Default for QueueKind {
    fn default() -> Self {
        Self::BinaryHeap
    }
}

impl QueueKind {
    /// Builds the queue realization this variant describes.
    pub fn build(self) -> Box<dyn MergeQueue + Send> {
        match self {
            Self::BinaryHeap => Box::new(BinaryHeapQueue::new()),
            Self::Binning {
                bins,
                score_min,
                score_max,
            } => Box::new(BinningQueue::new(bins, score_min, score_max)),
        }
    }
}
