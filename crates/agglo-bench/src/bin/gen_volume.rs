//! Writes a synthetic volume-file JSON fixture to disk.
//!
//! Usage: `gen-volume <small|medium|large|xlarge> [seed]`. Writes to
//! `target/bench-fixtures/<tier>.json`, in the same flat-array shape the
//! `agglo` CLI's volume-file format uses, so the fixture can be fed straight
//! into `agglo run`.
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use agglo_bench::{SizeTier, generate_volume};
use serde::Serialize;

#[derive(Serialize)]
struct VolumeFixture {
    width: usize,
    height: usize,
    depth: usize,
    affinities: Vec<f64>,
    ground_truth: Vec<u32>,
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("target")
        .join("bench-fixtures")
}

fn parse_tier(name: &str) -> Option<SizeTier> {
    match name {
        "small" => Some(SizeTier::Small),
        "medium" => Some(SizeTier::Medium),
        "large" => Some(SizeTier::Large),
        "xlarge" => Some(SizeTier::XLarge),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let tier_name = args.next().unwrap_or_else(|| "medium".to_owned());
    let tier = parse_tier(&tier_name).ok_or_else(|| format!("unknown tier: {tier_name}"))?;
    let seed: u64 = args
        .next()
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(42);

    eprintln!("Generating {tier_name} tier (seed {seed})...");
    let config = tier.config(seed);
    let (affinities, ground_truth) = generate_volume(&config);
    let (w, h, d) = affinities.spatial_shape();

    let mut flat_affinities = Vec::with_capacity(3 * w * h * d);
    for c in 0..3 {
        for x in 0..w {
            for y in 0..h {
                for z in 0..d {
                    flat_affinities.push(
                        affinities
                            .neighbor_affinity(x, y, z, axis_for(c))
                            .unwrap_or(0.5),
                    );
                }
            }
        }
    }
    let flat_gt: Vec<u32> = ground_truth.iter().copied().collect();

    let fixture = VolumeFixture {
        width: w,
        height: h,
        depth: d,
        affinities: flat_affinities,
        ground_truth: flat_gt,
    };

    let dir = fixtures_dir();
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{tier_name}.json"));
    let json = serde_json::to_string_pretty(&fixture)?;
    fs::write(&path, &json)?;

    eprintln!(
        "Wrote {} ({} voxels, {:.1} KB) to {}",
        tier_name,
        w * h * d,
        json.len() as f64 / 1024.0,
        path.display()
    );
    Ok(())
}

fn axis_for(channel: usize) -> agglo_volume::Axis {
    match channel {
        0 => agglo_volume::Axis::X,
        1 => agglo_volume::Axis::Y,
        _ => agglo_volume::Axis::Z,
    }
}
