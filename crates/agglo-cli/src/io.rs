/// Volume-file reading: size enforcement plus JSON parsing into the dense
/// arrays `agglo-volume` wraps.
///
/// This module is the single entry point for filesystem and stdin I/O in the
/// `agglo` binary; `agglo-core` and `agglo-volume` never touch the
/// filesystem themselves. Disk files are size-checked via
/// `std::fs::metadata` before any read.
use std::io::Read as _;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CliError;

/// A CLI argument that is either a filesystem path or the stdin sentinel `"-"`.
#[derive(Clone, Debug)]
pub enum PathOrStdin {
    /// Read from standard input.
    Stdin,
    /// Read from the given filesystem path.
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(PathOrStdin::Stdin)
        } else {
            Ok(PathOrStdin::Path(PathBuf::from(s)))
        }
    }
}

/// The on-disk (or stdin) representation of an `initialize` call's input: a
/// dense affinity volume, an optional pre-supplied segmentation, an optional
/// ground truth for evaluation, the watershed thresholds, and anti-merge
/// constraints.
///
/// `affinities` is a flat row-major `(3, width, height, depth)` array (the
/// channel axis slowest, `z` fastest); `segmentation` and `ground_truth` are
/// flat row-major `(width, height, depth)` arrays. This mirrors the layout
/// `ndarray::Array4`/`Array3::from_shape_vec` expect directly.
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeFile {
    /// Width (`x` extent) of the volume.
    pub width: usize,
    /// Height (`y` extent) of the volume.
    pub height: usize,
    /// Depth (`z` extent) of the volume.
    pub depth: usize,
    /// Flat `(3, width, height, depth)` affinities in `[0, 1]`.
    pub affinities: Vec<f64>,
    /// A pre-supplied flat `(width, height, depth)` seed volume. When
    /// present, watershed seeding is skipped and sizes are computed
    /// directly.
    #[serde(default)]
    pub segmentation: Option<Vec<u32>>,
    /// An optional flat `(width, height, depth)` ground-truth volume for
    /// post-run evaluation.
    #[serde(default)]
    pub ground_truth: Option<Vec<u32>>,
    /// The watershed `low` threshold (ignored if `segmentation` is present).
    #[serde(default = "default_aff_low")]
    pub aff_low: f64,
    /// The watershed `high` threshold (ignored if `segmentation` is present).
    #[serde(default = "default_aff_high")]
    pub aff_high: f64,
    /// Anti-merge constraints: each tuple a list of coherent seed-id groups
    /// that must never end up in the same final region as each other.
    #[serde(default)]
    pub unmerge_list: Vec<Vec<Vec<u32>>>,
}

fn default_aff_low() -> f64 {
    0.1
}

fn default_aff_high() -> f64 {
    0.9
}

/// Reads and parses a [`VolumeFile`] from `source`, enforcing `max_size`.
///
/// # Errors
///
/// Returns [`CliError`] (exit code 2) for file-not-found, permission
/// denied, over-size input, any other I/O error, or malformed JSON.
pub fn read_volume_file(source: &PathOrStdin, max_size: u64) -> Result<VolumeFile, CliError> {
    let (label, bytes) = match source {
        PathOrStdin::Path(path) => (path.display().to_string(), read_file(path, max_size)?),
        PathOrStdin::Stdin => ("-".to_owned(), read_stdin(max_size)?),
    };
    serde_json::from_slice(&bytes).map_err(|e| CliError::MalformedVolumeFile {
        source: label,
        detail: e.to_string(),
    })
}

fn read_file(path: &PathBuf, max_size: u64) -> Result<Vec<u8>, CliError> {
    let file_size = std::fs::metadata(path)
        .map_err(|e| io_error_to_cli(&e, path))?
        .len();
    if file_size > max_size {
        return Err(CliError::FileTooLarge {
            source: path.display().to_string(),
            limit: max_size,
            actual: Some(file_size),
        });
    }
    std::fs::read(path).map_err(|e| io_error_to_cli(&e, path))
}

fn io_error_to_cli(e: &std::io::Error, path: &Path) -> CliError {
    match e.kind() {
        std::io::ErrorKind::NotFound => CliError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => CliError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => CliError::IoError {
            source: path.display().to_string(),
            detail: e.to_string(),
        },
    }
}

fn read_stdin(max_size: u64) -> Result<Vec<u8>, CliError> {
    let stdin = std::io::stdin();
    let handle = stdin.lock();
    let mut limited = handle.take(max_size);
    let mut buf: Vec<u8> = Vec::new();
    limited.read_to_end(&mut buf).map_err(|e| CliError::IoError {
        source: "-".to_owned(),
        detail: e.to_string(),
    })?;

    if buf.len() as u64 == max_size {
        let stdin2 = std::io::stdin();
        let mut handle2 = stdin2.lock();
        let mut probe = [0u8; 1];
        let extra = handle2.read(&mut probe).map_err(|e| CliError::IoError {
            source: "-".to_owned(),
            detail: e.to_string(),
        })?;
        if extra > 0 {
            return Err(CliError::FileTooLarge {
                source: "-".to_owned(),
                limit: max_size,
                actual: None,
            });
        }
    }
    Ok(buf)
}
