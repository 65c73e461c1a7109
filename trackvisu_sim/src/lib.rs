//! TrackVisu Scenario Tooling
//!
//! Everything around the core model that a front end needs:
//! - **Generation**: seeded random tracks and traffic
//! - **Playback**: a clock driven player sampling every vehicle per frame
//! - **Scene**: pooled track meshes rebuilt per scenario
//! - **Export**: playback frames as JSON, meshes as Wavefront OBJ
//!
//! # Usage
//!
//! ```
//! use trackvisu_sim::{GeneratorConfig, ScenarioGenerator};
//!
//! let config = GeneratorConfig {
//!     seed: 42,
//!     segments: 10,
//!     ..Default::default()
//! };
//!
//! let scenario = ScenarioGenerator::new(config).unwrap().generate();
//! assert_eq!(scenario.track.len(), 10);
//! ```

mod exporter;
mod generator;
mod player;
mod scene;

pub use exporter::{write_obj, write_obj_file, PlaybackExport, PlaybackFrame, VehiclePose};
pub use generator::{GeneratorConfig, GeneratorError, ScenarioGenerator};
pub use player::ScenarioPlayer;
pub use scene::TrackScene;
