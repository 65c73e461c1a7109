//! TrackVisu Core - Road Scenario Geometry and Playback Model
//!
//! This library turns a compact scenario description into renderable state:
//! 1. **Track geometry**: lane layout segments become continuous per-lane
//!    point runs with eased merge/emerge transitions
//! 2. **Trajectories**: keyframed vehicle poses, interpolated with lane-change
//!    banking
//! 3. **Scenario documents**: fixed-width comma separated text, decoded
//!    fault-tolerantly with per-record diagnostics
//! 4. **Strip meshes**: triangulated road, terrain, edge and lane marking
//!    strips extruded along the lanes

pub mod codec;
pub mod design;
pub mod easing;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod scenario;
pub mod track;
pub mod trajectory;

// Re-export key types for convenience
pub use codec::{decode, encode, CodecConfig};
pub use design::{build_track_meshes, MeshKind, TrackDesign, TrackMesh};
pub use error::{CoreError, Decoded, Diagnostic};
pub use mesh::{CrossSection, NoiseParams, ProfileCurve, StripMesh, StripMeshBuilder};
pub use scenario::Scenario;
pub use track::{LanePortion, LanePortionPoint, Track, TrackSegment, MERGE_FIDELITY};
pub use trajectory::{BankingConfig, Keyframe, Pose, Trajectory, VehicleRole};
