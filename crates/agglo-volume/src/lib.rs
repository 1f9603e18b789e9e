/// Watershed seeding, voxel volume wrapping, region-graph construction, and
/// ground-truth evaluation for the `agglo-core` region-merging engine.
///
/// These are the external collaborators the core algorithm relies on but
/// never implements itself: this crate is one concrete, complete
/// implementation of those interfaces. `agglo-core` itself never
/// touches a dense voxel array.
pub mod error;
pub mod graph_build;
pub mod metrics;
pub mod volume;
pub mod watershed;

pub use error::VolumeError;
pub use graph_build::build_region_graph;
pub use metrics::{RandVoi, rand_voi};
pub use volume::{AffinityVolume, Axis, SegVolume, validate_ground_truth_shape, validate_shapes};
pub use watershed::seed;
