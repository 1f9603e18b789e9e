//! Clap CLI definition: root struct, subcommands, and shared argument types.
use clap::{Parser, Subcommand, ValueEnum};

use crate::io::PathOrStdin;

/// Output format for CLI commands.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, line-oriented output (default).
    Human,
    /// A single structured JSON object.
    Json,
}

/// Which statistic family drives the scoring function.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StatArg {
    /// Maximum observed affinity.
    Max,
    /// Count-weighted mean affinity.
    Mean,
    /// Bounded-bin histogram quantile (the default: 256 bins, median).
    QuantileHistogram,
    /// Exact vector-backed quantile.
    QuantileVector,
}

/// Which priority-queue realization backs the merge loop.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum QueueArg {
    /// Plain binary heap (the default).
    BinaryHeap,
    /// Fixed-bin bucketing queue.
    Binning,
}

/// All top-level subcommands exposed by the `agglo` binary.
#[derive(Subcommand)]
pub enum Command {
    /// Print a minimal example volume-file JSON document to stdout.
    Init,

    /// Run the full pipeline once: seed (or accept a supplied segmentation),
    /// build the region graph, merge until one or more thresholds, and
    /// print the resulting labels, merge history, and (if a ground truth
    /// was supplied) evaluation metrics.
    Run {
        /// Path to a volume-file JSON document, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,

        /// Merge-until threshold. Repeatable: each value is run in
        /// ascending order against the same session, demonstrating
        /// resumability (equivalent to one `merge_until` call per value).
        #[arg(long = "threshold", value_name = "T", required = true, num_args = 1..)]
        thresholds: Vec<f64>,

        /// Run watershed seeding over the affinity volume instead of using
        /// the volume file's `segmentation` field.
        #[arg(long)]
        find_fragments: bool,

        /// Which statistic family accumulates each edge's affinity
        /// evidence.
        #[arg(long, default_value = "quantile-histogram", value_enum)]
        stat: StatArg,

        /// Quantile in `[0, 1]` (only meaningful for the two quantile
        /// statistic families).
        #[arg(long, default_value = "0.5")]
        quantile: f64,

        /// Histogram bin count (only meaningful for
        /// `--stat quantile-histogram`, or as the vector statistic's
        /// degrade-to-histogram fallback width).
        #[arg(long, default_value = "256")]
        bins: usize,

        /// Sample-count capacity before the vector-backed quantile degrades
        /// to a histogram (only meaningful for `--stat quantile-vector`;
        /// omit for unbounded/exact).
        #[arg(long)]
        max_vector_samples: Option<usize>,

        /// Which priority-queue realization to use.
        #[arg(long, default_value = "binary-heap", value_enum)]
        queue: QueueArg,

        /// Number of buckets for `--queue binning`.
        #[arg(long, default_value = "256")]
        queue_bins: usize,

        /// Also print the post-merge region graph (live edges and scores).
        #[arg(long)]
        export_graph: bool,
    },

    /// Run a stdin/stdout request loop over an explicit [`crate::session::SessionStore`],
    /// exercising the minimum API surface (`initialize`/`merge_until`/
    /// `get_region_graph`/`free`) the way a non-native caller would, one
    /// JSON request per line in, one JSON response per line out.
    Serve,
}

/// Root CLI struct for the `agglo` binary.
#[derive(Parser)]
#[command(
    name = "agglo",
    version,
    about = "Hierarchical affinity-graph agglomeration",
    long_about = "Seeds a 3-D affinity volume via watershed (or accepts a pre-supplied \
                  segmentation), builds a region adjacency graph, and iteratively merges \
                  regions in best-first order until the best remaining edge exceeds a \
                  caller-supplied threshold."
)]
pub struct Cli {
    /// Active subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Output format: human (default) or json.
    #[arg(long, short = 'f', default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Increase stderr verbosity: seeding, graph construction, and
    /// per-threshold merge counts.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Maximum input file size in bytes.
    ///
    /// Can also be set via the `AGGLO_MAX_FILE_SIZE` environment variable.
    #[arg(
        long,
        global = true,
        env = "AGGLO_MAX_FILE_SIZE",
        default_value = "268435456"
    )]
    pub max_file_size: u64,
}
