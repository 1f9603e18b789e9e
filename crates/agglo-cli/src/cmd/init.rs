//! Implementation of `agglo init`.
//!
//! Prints a minimal valid volume-file JSON document to stdout: a 2x1x1
//! volume with one weak interface, ready to be piped straight into
//! `agglo run --threshold`.
use crate::error::CliError;
use crate::io::VolumeFile;

/// Runs the `init` command.
///
/// # Errors
///
/// Returns [`CliError`] only if stdout cannot be written.
pub fn run() -> Result<(), CliError> {
    let file = VolumeFile {
        width: 2,
        height: 1,
        depth: 1,
        affinities: vec![0.2, 0.2, 1.0, 1.0, 1.0, 1.0],
        segmentation: Some(vec![1, 2]),
        ground_truth: None,
        aff_low: 0.1,
        aff_high: 0.9,
        unmerge_list: Vec::new(),
    };
    let json = serde_json::to_string_pretty(&SerializableVolumeFile::from(&file)).map_err(|e| {
        CliError::IoError {
            source: "init".to_owned(),
            detail: format!("JSON serialization failed: {e}"),
        }
    })?;
    println!("{json}");
    Ok(())
}

/// `VolumeFile` only derives `Deserialize` (it is read-only input
/// elsewhere); `init` needs to go the other direction, so it mirrors the
/// same field set in a serializable shadow struct rather than adding an
/// unused `Serialize` derive to the shared input type.
#[derive(serde::Serialize)]
struct SerializableVolumeFile {
    width: usize,
    height: usize,
    depth: usize,
    affinities: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    segmentation: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ground_truth: Option<Vec<u32>>,
    aff_low: f64,
    aff_high: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unmerge_list: Vec<Vec<Vec<u32>>>,
}

impl From<&VolumeFile> for SerializableVolumeFile {
    fn from(f: &VolumeFile) -> Self {
        Self {
            width: f.width,
            height: f.height,
            depth: f.depth,
            affinities: f.affinities.clone(),
            segmentation: f.segmentation.clone(),
            ground_truth: f.ground_truth.clone(),
            aff_low: f.aff_low,
            aff_high: f.aff_high,
            unmerge_list: f.unmerge_list.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn sample_volume_round_trips_through_json() {
        let file = VolumeFile {
            width: 2,
            height: 1,
            depth: 1,
            affinities: vec![0.2, 0.2, 1.0, 1.0, 1.0, 1.0],
            segmentation: Some(vec![1, 2]),
            ground_truth: None,
            aff_low: 0.1,
            aff_high: 0.9,
            unmerge_list: Vec::new(),
        };
        let json = serde_json::to_string(&SerializableVolumeFile::from(&file)).expect("serialize");
        let parsed: VolumeFile = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.width, 2);
        assert_eq!(parsed.affinities.len(), 6);
        assert_eq!(parsed.segmentation, Some(vec![1, 2]));
    }
}
