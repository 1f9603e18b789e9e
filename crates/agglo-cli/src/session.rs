/// The explicit session store: an owned alternative to a process-wide
/// static handle registry.
///
/// `agglo-core` itself takes and returns owned values only and never
/// touches global state; this store is the one place in the workspace that
/// hands out integer handles to a non-native-shaped caller (the `serve`
/// subcommand's request loop), matching the minimum API surface
/// (`initialize`/`merge_until`/`get_region_graph`/`free`) while keeping the
/// registry itself an explicit, owned value with no `static`/`lazy_static`
/// anywhere. A [`SessionStore`] going out of scope drops every session (and,
/// through it, every per-session [`UnmergeTracker`]) on every exit path,
/// including an early `?` return: there is nothing left to leak.
use std::collections::HashMap;

use agglo_core::{
    AscendingAffinityScore, ConstrainedVisitor, EngineConfig, MergeEngine, MergeRecord, NodeId,
    UnmergeTracker,
};
use agglo_volume::{AffinityVolume, SegVolume};
use ndarray::{Array3, Array4};

use crate::error::CliError;

/// An opaque, process-local handle into a [`SessionStore`]. Never reused
/// once freed.
pub type SessionId = u64;

/// One live region-merging run: the engine, its constrained visitor (which
/// always exists, even with no anti-merge constraints -- an empty
/// [`UnmergeTracker`] short-circuits to zero overhead), and enough of the
/// original input retained to resolve final labels and compute evaluation
/// metrics once merging is done.
struct Session {
    engine: MergeEngine<agglo_core::StatKind, AscendingAffinityScore>,
    visitor: ConstrainedVisitor,
    seg: SegVolume,
    ground_truth: Option<Array3<u32>>,
    history_reported: usize,
}

/// Parameters for [`SessionStore::initialize`], corresponding directly to
/// `initialize(W, H, D, affinity_data, segmentation_data,
/// ground_truth_data?, aff_low, aff_high, find_fragments, unmerge_list?)`.
pub struct InitParams {
    /// The `(3, W, H, D)` affinity volume.
    pub affinities: Array4<f64>,
    /// A pre-supplied `(W, H, D)` seed volume. Required unless
    /// `find_fragments` is `true`.
    pub segmentation: Option<Array3<u32>>,
    /// An optional `(W, H, D)` ground-truth volume for post-run evaluation.
    pub ground_truth: Option<Array3<u32>>,
    /// The watershed `low` threshold.
    pub aff_low: f64,
    /// The watershed `high` threshold.
    pub aff_high: f64,
    /// If `true`, seed via watershed over `affinities`; if `false`, use
    /// `segmentation` directly (computing sizes only).
    pub find_fragments: bool,
    /// Anti-merge constraint tuples, as accepted by
    /// [`UnmergeTracker::from_tuples`].
    pub unmerge_list: Vec<Vec<Vec<NodeId>>>,
    /// Engine configuration: statistic family and queue realization.
    pub config: EngineConfig,
}

/// A post-merge edge export entry: `(u, v, score)`.
pub type ScoredEdge = (NodeId, NodeId, f64);

/// An owned, explicit registry of live region-merging sessions. Replaces the
/// process-wide static map the source this system is modeled on kept.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    next_id: SessionId,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of currently live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// `true` if no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Seeds (or accepts a pre-supplied) segmentation, builds the region
    /// graph, and seeds the priority queue, returning a fresh handle.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] if the affinity volume fails validation, the
    /// segmentation volume's seed ids exceed its declared range, the
    /// watershed thresholds are invalid, or the segmentation/ground-truth
    /// volumes' shapes do not match the affinity volume's.
    pub fn initialize(&mut self, params: InitParams) -> Result<SessionId, CliError> {
        let affinities = AffinityVolume::new(params.affinities)?;

        let seg = if params.find_fragments {
            agglo_volume::seed(&affinities, params.aff_low, params.aff_high)?
        } else {
            let data = params.segmentation.ok_or(CliError::MissingSegmentation)?;
            let n = data.iter().copied().max().unwrap_or(0) as usize;
            SegVolume::from_seeds(data, n)?
        };

        agglo_volume::validate_shapes(&affinities, &seg)?;
        if let Some(gt) = &params.ground_truth {
            let shape = gt.dim();
            agglo_volume::validate_ground_truth_shape(&seg, shape)?;
        }

        let n = seg.max_id() as usize;
        let mut engine = MergeEngine::new(
            n,
            params.config.stat_kind,
            AscendingAffinityScore,
            params.config.queue_kind,
        );
        agglo_volume::build_region_graph(engine.graph_mut(), &affinities, &seg);
        engine.seed_queue();

        let tracker = UnmergeTracker::from_tuples(&params.unmerge_list);
        let visitor = ConstrainedVisitor::new(tracker);

        let id = self.next_id;
        self.next_id += 1;
        self.sessions.insert(
            id,
            Session {
                engine,
                visitor,
                seg,
                ground_truth: params.ground_truth,
                history_reported: 0,
            },
        );
        Ok(id)
    }

    /// Runs the merge loop on `id` until the queue drains or the best
    /// remaining live edge's score exceeds `threshold`. Returns only the
    /// merges performed by *this* call (resumable: a later call with a
    /// larger threshold continues from where this one stopped).
    ///
    /// # Errors
    ///
    /// Returns [`CliError::UnknownSession`] if `id` does not refer to a live
    /// session.
    pub fn merge_until(&mut self, id: SessionId, threshold: f64) -> Result<Vec<MergeRecord>, CliError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(CliError::UnknownSession { id })?;
        session.engine.merge_until(threshold, &mut session.visitor);
        let history = session.visitor.history();
        let fresh = history[session.history_reported..].to_vec();
        session.history_reported = history.len();
        Ok(fresh)
    }

    /// Exports the current live edge set with freshly recomputed scores.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::UnknownSession`] if `id` does not refer to a live
    /// session.
    pub fn get_region_graph(&mut self, id: SessionId) -> Result<Vec<ScoredEdge>, CliError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(CliError::UnknownSession { id })?;
        Ok(session.engine.extract_region_graph())
    }

    /// Remaps every voxel's seed id through the parent-link forest to its
    /// live root, returning a flat `(W, H, D)` label volume.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::UnknownSession`] if `id` does not refer to a live
    /// session.
    pub fn resolve_segmentation(&mut self, id: SessionId) -> Result<Vec<NodeId>, CliError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(CliError::UnknownSession { id })?;
        let seeds = session.seg.to_flat_vec();
        Ok(session.engine.resolve_labels(&seeds))
    }

    /// Computes Rand/VOI split-merge metrics against the ground truth
    /// supplied at `initialize` time, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::UnknownSession`] if `id` does not refer to a live
    /// session, or a wrapped [`agglo_volume::VolumeError`] if the ground
    /// truth volume was a different shape than the segmentation.
    pub fn evaluate(&mut self, id: SessionId) -> Result<Option<agglo_volume::RandVoi>, CliError> {
        let predicted = self.resolve_segmentation(id)?;
        let session = self
            .sessions
            .get(&id)
            .ok_or(CliError::UnknownSession { id })?;
        let Some(gt) = &session.ground_truth else {
            return Ok(None);
        };
        let flat: Vec<NodeId> = gt.iter().copied().collect();
        Ok(Some(agglo_volume::rand_voi(&predicted, &flat)?))
    }

    /// Releases a session and everything it owns (engine, graph, queue,
    /// unmerge tracker). A no-op error on an already-freed or unknown
    /// handle: there is no leaked global state to clean up lazily.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::UnknownSession`] if `id` does not refer to a live
    /// session.
    pub fn free(&mut self, id: SessionId) -> Result<(), CliError> {
        self.sessions
            .remove(&id)
            .map(|_| ())
            .ok_or(CliError::UnknownSession { id })
    }
}
