//! Implementation of `agglo run`.
//!
//! Reads a volume file, seeds (or accepts) a segmentation, builds the region
//! graph, merges against each `--threshold` value in ascending order against
//! the same session (exercising the engine's resumability directly), and
//! prints the merge history, final labels, optional region-graph export, and
//! optional evaluation metrics.
use agglo_core::{EngineConfig, QueueKind, StatKind};
use ndarray::{Array3, Array4};

use crate::cli::{OutputFormat, QueueArg, StatArg};
use crate::error::CliError;
use crate::io::{read_volume_file, PathOrStdin, VolumeFile};
use crate::session::{InitParams, SessionStore};

/// Parsed `agglo run` arguments, gathered from the root [`crate::cli::Cli`]
/// and the `Run` subcommand variant.
pub struct RunArgs<'a> {
    pub file: &'a PathOrStdin,
    pub thresholds: &'a [f64],
    pub find_fragments: bool,
    pub stat: StatArg,
    pub quantile: f64,
    pub bins: usize,
    pub max_vector_samples: Option<usize>,
    pub queue: QueueArg,
    pub queue_bins: usize,
    pub export_graph: bool,
    pub format: OutputFormat,
    pub verbose: bool,
    pub max_file_size: u64,
}

fn stat_kind(args: &RunArgs<'_>) -> StatKind {
    match args.stat {
        StatArg::Max => StatKind::Max,
        StatArg::Mean => StatKind::Mean,
        StatArg::QuantileHistogram => StatKind::QuantileHistogram {
            bins: args.bins,
            q: args.quantile,
            lo: 0.0,
            hi: 1.0,
        },
        StatArg::QuantileVector => StatKind::QuantileVector {
            q: args.quantile,
            max_samples: args.max_vector_samples,
            fallback_bins: args.bins,
        },
    }
}

fn queue_kind(args: &RunArgs<'_>) -> QueueKind {
    match args.queue {
        QueueArg::BinaryHeap => QueueKind::BinaryHeap,
        QueueArg::Binning => QueueKind::Binning {
            bins: args.queue_bins,
            score_min: 0.0,
            score_max: 1.0,
        },
    }
}

fn to_affinities(vol: &VolumeFile) -> Result<Array4<f64>, CliError> {
    let shape = (3, vol.width, vol.height, vol.depth);
    Array4::from_shape_vec(shape, vol.affinities.clone()).map_err(|e| CliError::MalformedVolumeFile {
        source: "affinities".to_owned(),
        detail: format!("expected {} values for shape {shape:?}: {e}", 3 * vol.width * vol.height * vol.depth),
    })
}

fn to_volume3(data: Vec<u32>, vol: &VolumeFile, field: &str) -> Result<Array3<u32>, CliError> {
    let shape = (vol.width, vol.height, vol.depth);
    Array3::from_shape_vec(shape, data).map_err(|e| CliError::MalformedVolumeFile {
        source: field.to_owned(),
        detail: format!("expected {} values for shape {shape:?}: {e}", vol.width * vol.height * vol.depth),
    })
}

/// Runs the `run` command.
///
/// # Errors
///
/// Returns [`CliError`] if the volume file cannot be read or parsed, the
/// affinity/segmentation/ground-truth arrays do not match the declared
/// shape, or any engine precondition is violated.
pub fn run(args: RunArgs<'_>) -> Result<(), CliError> {
    let vol = read_volume_file(args.file, args.max_file_size)?;

    if args.verbose {
        log::info!(
            "loaded volume {}x{}x{}, find_fragments={}",
            vol.width, vol.height, vol.depth, args.find_fragments
        );
    }

    let affinities = to_affinities(&vol)?;
    let segmentation = vol
        .segmentation
        .clone()
        .map(|d| to_volume3(d, &vol, "segmentation"))
        .transpose()?;
    let ground_truth = vol
        .ground_truth
        .clone()
        .map(|d| to_volume3(d, &vol, "ground_truth"))
        .transpose()?;

    let config = EngineConfig {
        stat_kind: stat_kind(&args),
        queue_kind: queue_kind(&args),
    };

    let mut store = SessionStore::new();
    let id = store.initialize(InitParams {
        affinities,
        segmentation,
        ground_truth,
        aff_low: vol.aff_low,
        aff_high: vol.aff_high,
        find_fragments: args.find_fragments,
        unmerge_list: vol.unmerge_list,
        config,
    })?;

    let mut sorted_thresholds: Vec<f64> = args.thresholds.to_vec();
    sorted_thresholds.sort_by(|a, b| a.total_cmp(b));

    let mut all_merges = Vec::new();
    for threshold in &sorted_thresholds {
        let merges = store.merge_until(id, *threshold)?;
        if args.verbose {
            log::info!("threshold {threshold}: {} merges", merges.len());
        }
        all_merges.push((*threshold, merges));
    }

    let labels = store.resolve_segmentation(id)?;
    let graph = if args.export_graph {
        Some(store.get_region_graph(id)?)
    } else {
        None
    };
    let evaluation = store.evaluate(id)?;

    match args.format {
        OutputFormat::Human => print_human(&all_merges, &labels, graph.as_deref(), evaluation.as_ref()),
        OutputFormat::Json => print_json(&all_merges, &labels, graph.as_deref(), evaluation.as_ref())?,
    }

    store.free(id)?;
    Ok(())
}

fn print_human(
    all_merges: &[(f64, Vec<agglo_core::MergeRecord>)],
    labels: &[agglo_core::NodeId],
    graph: Option<&[(agglo_core::NodeId, agglo_core::NodeId, f64)]>,
    evaluation: Option<&agglo_volume::RandVoi>,
) {
    for (threshold, merges) in all_merges {
        println!("threshold {threshold}: {} merges", merges.len());
        for (a, b, survivor, score) in merges {
            println!("  merge {a} + {b} -> {survivor} (score {score})");
        }
    }
    println!("final labels: {} voxels", labels.len());
    if let Some(edges) = graph {
        println!("region graph: {} live edges", edges.len());
        for (u, v, score) in edges {
            println!("  {u} -- {v} (score {score})");
        }
    }
    if let Some(metrics) = evaluation {
        println!(
            "evaluation: rand_split={:.6} rand_merge={:.6} voi_split={:.6} voi_merge={:.6}",
            metrics.rand_split, metrics.rand_merge, metrics.voi_split, metrics.voi_merge
        );
    }
}

fn print_json(
    all_merges: &[(f64, Vec<agglo_core::MergeRecord>)],
    labels: &[agglo_core::NodeId],
    graph: Option<&[(agglo_core::NodeId, agglo_core::NodeId, f64)]>,
    evaluation: Option<&agglo_volume::RandVoi>,
) -> Result<(), CliError> {
    let body = serde_json::json!({
        "merges": all_merges.iter().map(|(threshold, merges)| {
            serde_json::json!({
                "threshold": threshold,
                "history": merges.iter().map(|(a, b, survivor, score)| {
                    serde_json::json!({"a": a, "b": b, "survivor": survivor, "score": score})
                }).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
        "labels": labels,
        "region_graph": graph.map(|edges| {
            edges.iter().map(|(u, v, score)| {
                serde_json::json!({"u": u, "v": v, "score": score})
            }).collect::<Vec<_>>()
        }),
        "evaluation": evaluation.map(|m| {
            serde_json::json!({
                "rand_split": m.rand_split,
                "rand_merge": m.rand_merge,
                "voi_split": m.voi_split,
                "voi_merge": m.voi_merge,
            })
        }),
    });
    let text = serde_json::to_string_pretty(&body).map_err(|e| CliError::IoError {
        source: "run".to_owned(),
        detail: format!("JSON serialization failed: {e}"),
    })?;
    println!("{text}");
    Ok(())
}
