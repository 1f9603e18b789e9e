/// CLI error types with associated exit codes.
///
/// [`CliError`] is the top-level error type for the `agglo` binary. Every
/// variant maps to a stable exit code via [`CliError::exit_code`], using a
/// two-tier scheme:
///
/// - Exit code **2**: input failure, a volume file could not be read,
///   parsed, or is shaped inconsistently with what it claims. These
///   terminate before any session state is touched.
/// - Exit code **1**: logical failure, the session store rejected the
///   request against already-valid input (unknown handle, precondition
///   violation inside the engine itself).
use std::fmt;
use std::path::PathBuf;

use agglo_core::CoreError;
use agglo_volume::VolumeError;

/// All error conditions the `agglo` CLI can produce.
#[derive(Debug)]
pub enum CliError {
    // --- Exit code 2: input failures ---
    /// A file argument could not be found on the filesystem.
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },
    /// The process lacks permission to read a file.
    PermissionDenied {
        /// The path that could not be read.
        path: PathBuf,
    },
    /// The input exceeds the configured `--max-file-size` limit.
    FileTooLarge {
        /// A human-readable label for the source (`"-"` for stdin, or the
        /// filesystem path).
        source: String,
        /// The configured size limit in bytes.
        limit: u64,
        /// The actual size in bytes, if known.
        actual: Option<u64>,
    },
    /// A generic I/O error not covered by the more specific variants above.
    IoError {
        /// A human-readable label for the source.
        source: String,
        /// The underlying I/O error message.
        detail: String,
    },
    /// The volume file's JSON could not be parsed into the expected shape.
    MalformedVolumeFile {
        /// A human-readable label for the source.
        source: String,
        /// The underlying parse error message.
        detail: String,
    },
    /// A precondition the volume adapters enforce (shape mismatch, invalid
    /// thresholds, out-of-range seed id) was violated.
    InvalidVolume(VolumeError),

    // --- Exit code 1: logical failures ---
    /// A precondition the core engine enforces was violated.
    InvalidEngineInput(CoreError),
    /// A request referenced a session handle that does not exist (never
    /// issued, or already freed).
    UnknownSession {
        /// The offending handle.
        id: u64,
    },
    /// A `serve`-mode request line was not valid JSON-RPC-shaped input.
    MalformedRequest {
        /// The underlying parse error message.
        detail: String,
    },
    /// `initialize` was called with `find_fragments = false` but no
    /// pre-supplied segmentation.
    MissingSegmentation,
}

impl CliError {
    /// Returns the process exit code for this error: `2` for input
    /// failures, `1` for logical failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::FileTooLarge { .. }
            | Self::IoError { .. }
            | Self::MalformedVolumeFile { .. }
            | Self::InvalidVolume(_) => 2,

            Self::InvalidEngineInput(_)
            | Self::UnknownSession { .. }
            | Self::MalformedRequest { .. }
            | Self::MissingSegmentation => 1,
        }
    }

    /// A human-readable error message suitable for printing to stderr.
    pub fn message(&self) -> String {
        match self {
            Self::FileNotFound { path } => format!("error: file not found: {}", path.display()),
            Self::PermissionDenied { path } => {
                format!("error: permission denied: {}", path.display())
            }
            Self::FileTooLarge {
                source,
                limit,
                actual: Some(actual),
            } => {
                format!("error: file too large: {source} is {actual} bytes, limit is {limit} bytes")
            }
            Self::FileTooLarge {
                source,
                limit,
                actual: None,
            } => format!("error: file too large: {source} exceeded limit of {limit} bytes"),
            Self::IoError { source, detail } => {
                format!("error: I/O error reading {source}: {detail}")
            }
            Self::MalformedVolumeFile { source, detail } => {
                format!("error: could not parse volume file {source}: {detail}")
            }
            Self::InvalidVolume(e) => format!("error: invalid volume input: {e}"),
            Self::InvalidEngineInput(e) => format!("error: invalid engine input: {e}"),
            Self::UnknownSession { id } => format!("error: no session with handle {id}"),
            Self::MalformedRequest { detail } => format!("error: malformed request: {detail}"),
            Self::MissingSegmentation => {
                "error: find_fragments is false but no segmentation was supplied".to_owned()
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}

impl From<VolumeError> for CliError {
    fn from(e: VolumeError) -> Self {
        Self::InvalidVolume(e)
    }
}

impl From<CoreError> for CliError {
    fn from(e: CoreError) -> Self {
        Self::InvalidEngineInput(e)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn file_not_found_is_exit_2() {
        let e = CliError::FileNotFound {
            path: PathBuf::from("volume.json"),
        };
        assert_eq!(e.exit_code(), 2);
    }

    #[test]
    fn unknown_session_is_exit_1() {
        let e = CliError::UnknownSession { id: 7 };
        assert_eq!(e.exit_code(), 1);
        assert!(e.message().contains('7'));
    }

    #[test]
    fn invalid_volume_wraps_volume_error() {
        let e: CliError = VolumeError::InvalidThresholds {
            low: 0.9,
            high: 0.1,
        }
        .into();
        assert_eq!(e.exit_code(), 2);
        assert!(e.message().contains("0.9"));
    }

    #[test]
    fn invalid_engine_input_wraps_core_error() {
        let e: CliError = CoreError::SelfMerge(3).into();
        assert_eq!(e.exit_code(), 1);
        assert!(e.message().contains('3'));
    }

    #[test]
    fn display_matches_message() {
        let e = CliError::UnknownSession { id: 1 };
        assert_eq!(format!("{e}"), e.message());
    }

    #[test]
    fn error_trait_is_implemented() {
        let e: Box<dyn std::error::Error> = Box::new(CliError::UnknownSession { id: 1 });
        assert!(!e.to_string().is_empty());
    }
}
