//! Implementation of `agglo serve`.
//!
//! A newline-delimited JSON request/response loop over an explicit
//! [`SessionStore`], for callers that drive the engine as a subprocess
//! rather than linking `agglo-core` directly. One JSON request object per
//! input line, one JSON response object per output line; the loop never
//! terminates on a request error, only on end of input.
use std::io::{BufRead, Write as _};

use ndarray::{Array3, Array4};
use serde::{Deserialize, Serialize};

use crate::error::CliError;
use crate::session::{InitParams, SessionStore};

/// One request line, tagged by `op`.
#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    Initialize {
        width: usize,
        height: usize,
        depth: usize,
        affinities: Vec<f64>,
        #[serde(default)]
        segmentation: Option<Vec<u32>>,
        #[serde(default)]
        ground_truth: Option<Vec<u32>>,
        #[serde(default = "default_aff_low")]
        aff_low: f64,
        #[serde(default = "default_aff_high")]
        aff_high: f64,
        #[serde(default)]
        find_fragments: bool,
        #[serde(default)]
        unmerge_list: Vec<Vec<Vec<u32>>>,
    },
    MergeUntil {
        id: u64,
        threshold: f64,
    },
    GetRegionGraph {
        id: u64,
    },
    ResolveSegmentation {
        id: u64,
    },
    Evaluate {
        id: u64,
    },
    Free {
        id: u64,
    },
}

fn default_aff_low() -> f64 {
    0.1
}

fn default_aff_high() -> f64 {
    0.9
}

#[derive(Serialize)]
#[serde(untagged)]
enum Response {
    Ok(serde_json::Value),
    Err { error: String },
}

/// Runs the `serve` command: reads requests from stdin until EOF, writing
/// one response per line to stdout.
///
/// # Errors
///
/// Returns [`CliError`] only if stdout cannot be written; malformed or
/// rejected individual requests are reported as response lines, not process
/// errors.
pub fn run() -> Result<(), CliError> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut store = SessionStore::new();

    for line in stdin.lock().lines() {
        let line = line.map_err(|e| CliError::IoError {
            source: "stdin".to_owned(),
            detail: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&mut store, &line);
        let text = serde_json::to_string(&response).unwrap_or_else(|_| {
            "{\"error\":\"failed to serialize response\"}".to_owned()
        });
        writeln!(stdout, "{text}").map_err(|e| CliError::IoError {
            source: "stdout".to_owned(),
            detail: e.to_string(),
        })?;
    }
    Ok(())
}

fn handle_line(store: &mut SessionStore, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => return Response::Err { error: e.to_string() },
    };
    match dispatch(store, request) {
        Ok(value) => Response::Ok(value),
        Err(e) => Response::Err { error: e.message() },
    }
}

fn dispatch(store: &mut SessionStore, request: Request) -> Result<serde_json::Value, CliError> {
    match request {
        Request::Initialize {
            width,
            height,
            depth,
            affinities,
            segmentation,
            ground_truth,
            aff_low,
            aff_high,
            find_fragments,
            unmerge_list,
        } => {
            let shape4 = (3, width, height, depth);
            let affinities = Array4::from_shape_vec(shape4, affinities).map_err(|e| {
                CliError::MalformedRequest {
                    detail: format!("affinities shape mismatch: {e}"),
                }
            })?;
            let shape3 = (width, height, depth);
            let segmentation = segmentation
                .map(|d| Array3::from_shape_vec(shape3, d))
                .transpose()
                .map_err(|e| CliError::MalformedRequest {
                    detail: format!("segmentation shape mismatch: {e}"),
                })?;
            let ground_truth = ground_truth
                .map(|d| Array3::from_shape_vec(shape3, d))
                .transpose()
                .map_err(|e| CliError::MalformedRequest {
                    detail: format!("ground_truth shape mismatch: {e}"),
                })?;
            let id = store.initialize(InitParams {
                affinities,
                segmentation,
                ground_truth,
                aff_low,
                aff_high,
                find_fragments,
                unmerge_list,
                config: agglo_core::EngineConfig::default(),
            })?;
            Ok(serde_json::json!({ "id": id }))
        }
        Request::MergeUntil { id, threshold } => {
            let history = store.merge_until(id, threshold)?;
            Ok(serde_json::json!({
                "merges": history.iter().map(|(a, b, survivor, score)| {
                    serde_json::json!({"a": a, "b": b, "survivor": survivor, "score": score})
                }).collect::<Vec<_>>(),
            }))
        }
        Request::GetRegionGraph { id } => {
            let edges = store.get_region_graph(id)?;
            Ok(serde_json::json!({
                "edges": edges.iter().map(|(u, v, score)| {
                    serde_json::json!({"u": u, "v": v, "score": score})
                }).collect::<Vec<_>>(),
            }))
        }
        Request::ResolveSegmentation { id } => {
            let labels = store.resolve_segmentation(id)?;
            Ok(serde_json::json!({ "labels": labels }))
        }
        Request::Evaluate { id } => {
            let metrics = store.evaluate(id)?;
            Ok(serde_json::json!({
                "evaluation": metrics.map(|m| serde_json::json!({
                    "rand_split": m.rand_split,
                    "rand_merge": m.rand_merge,
                    "voi_split": m.voi_split,
                    "voi_merge": m.voi_merge,
                })),
            }))
        }
        Request::Free { id } => {
            store.free(id)?;
            Ok(serde_json::json!({ "freed": id }))
        }
    }
}
