//! Track design - composes strip meshes for a whole track.
//!
//! Every lane portion is cut into longitudinal steps. Each step contributes
//! a road surface strip, terrain and a raised edge on sides where no lane
//! continues, and dashed lines toward neighbouring lanes. Meshes are flushed
//! once per lane portion.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::easing::lerp_vector;
use crate::mesh::{CrossSection, LongitudinalStep, ProfileCurve, StripMesh, StripMeshBuilder};
use crate::track::Track;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Dimensions and profiles of every part of the track geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackDesign {
    /// Longest step a lane portion is cut into (metres)
    pub max_segment_length: f64,

    // ----- road surface -----
    pub road_height: f64,
    pub road_perlin_factor: f64,
    pub road_perlin_scale: f64,
    pub road_profile: ProfileCurve,

    // ----- terrain -----
    pub terrain_height: f64,
    pub terrain_width: f64,
    pub terrain_perlin_factor: f64,
    pub terrain_perlin_scale: f64,
    pub terrain_left_profile: ProfileCurve,
    pub terrain_right_profile: ProfileCurve,

    // ----- road edge -----
    pub edge_height: f64,
    pub edge_width: f64,
    pub edge_left_profile: ProfileCurve,
    pub edge_right_profile: ProfileCurve,

    // ----- dashed lines -----
    /// 0.3 on highways, 0.25 in cities
    pub dashed_line_width: f64,
    pub dashed_line_height: f64,
    pub dash_length: f64,
    pub dash_gap: f64,
    pub dashed_line_profile: ProfileCurve,

    /// Seed of the Perlin noise shaping road and terrain heights
    pub noise_seed: u32,
}

impl Default for TrackDesign {
    fn default() -> Self {
        Self {
            max_segment_length: 3.0,

            road_height: 0.15,
            road_perlin_factor: 0.75,
            road_perlin_scale: 1.0,
            road_profile: ProfileCurve::smooth(vec![(0.0, 0.8), (0.5, 1.0), (1.0, 0.8)]),

            terrain_height: 5.0,
            terrain_width: 50.0,
            terrain_perlin_factor: 0.5,
            terrain_perlin_scale: 20.0,
            terrain_left_profile: ProfileCurve::smooth(vec![(0.0, 0.0), (1.0, 1.0)]),
            terrain_right_profile: ProfileCurve::smooth(vec![(0.0, 0.0), (1.0, 1.0)]),

            edge_height: 0.5,
            edge_width: 0.3,
            edge_left_profile: ProfileCurve::linear(vec![(0.0, 0.6), (0.3, 1.0), (1.0, 1.0)]),
            edge_right_profile: ProfileCurve::linear(vec![(0.0, 0.6), (0.3, 1.0), (1.0, 1.0)]),

            dashed_line_width: 0.3,
            dashed_line_height: 0.05,
            dash_length: 6.0,
            dash_gap: 12.0,
            dashed_line_profile: ProfileCurve::constant(1.0),

            noise_seed: 0,
        }
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Which part of the track a mesh belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshKind {
    Road,
    TerrainLeft,
    TerrainRight,
    EdgeLeft,
    EdgeRight,
    DashedLines,
}

impl MeshKind {
    pub fn name(&self) -> &'static str {
        match self {
            MeshKind::Road => "Main Road",
            MeshKind::TerrainLeft => "Left Terrain",
            MeshKind::TerrainRight => "Right Terrain",
            MeshKind::EdgeLeft => "Road Left Edge",
            MeshKind::EdgeRight => "Road Right Edge",
            MeshKind::DashedLines => "Dashed Line",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMesh {
    pub kind: MeshKind,
    /// Lane whose portion produced the mesh
    pub lane_index: u32,
    pub mesh: StripMesh,
}

// ============================================================================
// BUILDING
// ============================================================================

struct Builders {
    road: StripMeshBuilder,
    terrain_left: StripMeshBuilder,
    terrain_right: StripMeshBuilder,
    edge_left: StripMeshBuilder,
    edge_right: StripMeshBuilder,
    dashed_lines: StripMeshBuilder,
}

impl Builders {
    fn new(seed: u32) -> Self {
        Self {
            road: StripMeshBuilder::new(20, false).with_noise_seed(seed),
            terrain_left: StripMeshBuilder::new(30, true).with_noise_seed(seed),
            terrain_right: StripMeshBuilder::new(30, true).with_noise_seed(seed),
            edge_left: StripMeshBuilder::new(6, true),
            edge_right: StripMeshBuilder::new(6, true),
            dashed_lines: StripMeshBuilder::new(6, false),
        }
    }

    /// Moves every non-empty mesh into `out`, resetting the builders.
    fn flush(&mut self, lane_index: u32, out: &mut Vec<TrackMesh>) {
        let builders = [
            (MeshKind::Road, &mut self.road),
            (MeshKind::TerrainLeft, &mut self.terrain_left),
            (MeshKind::TerrainRight, &mut self.terrain_right),
            (MeshKind::EdgeLeft, &mut self.edge_left),
            (MeshKind::EdgeRight, &mut self.edge_right),
            (MeshKind::DashedLines, &mut self.dashed_lines),
        ];
        for (kind, builder) in builders {
            if !builder.is_empty() {
                out.push(TrackMesh {
                    kind,
                    lane_index,
                    mesh: builder.take_mesh(),
                });
            }
        }
    }
}

/// Cross sections of one build. Right-hand parts sweep toward -y.
struct Sections {
    road: CrossSection,
    terrain_left: CrossSection,
    terrain_right: CrossSection,
    edge_left: CrossSection,
    edge_right: CrossSection,
    dash_left: CrossSection,
    dash_right: CrossSection,
}

impl TrackDesign {
    fn sections(&self, lane_width: f64) -> Sections {
        let terrain = |profile: &ProfileCurve, width: f64| {
            CrossSection::new(profile.clone(), width, self.terrain_height)
                .with_noise(self.terrain_perlin_factor, self.terrain_perlin_scale)
        };
        let dash = CrossSection::new(
            self.dashed_line_profile.clone(),
            self.dashed_line_width,
            self.dashed_line_height,
        );

        Sections {
            road: CrossSection::new(self.road_profile.clone(), lane_width, self.road_height)
                .with_noise(self.road_perlin_factor, self.road_perlin_scale),
            terrain_left: terrain(&self.terrain_left_profile, self.terrain_width),
            terrain_right: terrain(&self.terrain_right_profile, -self.terrain_width),
            edge_left: CrossSection::new(self.edge_left_profile.clone(), self.edge_width, self.edge_height),
            edge_right: CrossSection::new(self.edge_right_profile.clone(), -self.edge_width, self.edge_height),
            dash_right: dash.mirrored(),
            dash_left: dash,
        }
    }

    /// Builds all meshes of `track`, in lane portion order.
    pub fn build_track_meshes(
        &self,
        track: &Track,
        lane_width: f64,
        scale: Vector3<f64>,
    ) -> Vec<TrackMesh> {
        let mut builders = Builders::new(self.noise_seed);
        let sections = self.sections(lane_width);
        let mut meshes = Vec::new();

        for portion in track.lane_portions(lane_width, scale) {
            for step in portion.steps(self.max_segment_length) {
                self.add_step(&mut builders, &sections, &step, lane_width);
            }
            builders.flush(portion.lane_index, &mut meshes);
        }

        debug!(
            "build_track_meshes: {} meshes, {} triangles",
            meshes.len(),
            meshes.iter().map(|m| m.mesh.triangle_count()).sum::<usize>()
        );

        meshes
    }

    fn add_step(
        &self,
        builders: &mut Builders,
        sections: &Sections,
        step: &LongitudinalStep,
        lane_width: f64,
    ) {
        let to_left = Vector3::new(0.0, lane_width / 2.0, 0.0);
        let left = step.start + to_left;
        let right = step.start - to_left;
        let next_left = step.end + to_left;
        let next_right = step.end - to_left;
        let point = &step.point;

        builders.road.add_cross_section(right, next_right, &sections.road);

        let edge_shift = Vector3::new(0.0, self.edge_width, 0.0);

        if point.nothing_on_left {
            builders.terrain_left.add_cross_section(
                left + edge_shift,
                next_left + edge_shift,
                &sections.terrain_left,
            );
            builders.edge_left.add_cross_section(left, next_left, &sections.edge_left);
        }
        if point.nothing_on_right {
            builders.terrain_right.add_cross_section(
                right - edge_shift,
                next_right - edge_shift,
                &sections.terrain_right,
            );
            builders.edge_right.add_cross_section(right, next_right, &sections.edge_right);
        }

        if point.road_on_left || point.road_on_right {
            self.add_dashes(builders, sections, step, &[left, next_left], &[right, next_right]);
        }
    }

    /// Dashes repeat every `dash_length + dash_gap` along x; a step adds a
    /// dash only if it starts inside the painted part of the period, and the
    /// dash is cut off where that part ends.
    fn add_dashes(
        &self,
        builders: &mut Builders,
        sections: &Sections,
        step: &LongitudinalStep,
        left: &[Vector3<f64>; 2],
        right: &[Vector3<f64>; 2],
    ) {
        let period = self.dash_length + self.dash_gap;
        if period <= 0.0 {
            return;
        }

        let start_x = right[0].x;
        let iteration = (start_x / period).floor();
        let x_in_period = start_x - iteration * period;
        if x_in_period >= self.dash_length {
            return;
        }
        let limited_x = right[1].x.min(iteration * period + self.dash_length);

        let half = Vector3::new(0.0, self.dashed_line_width / 2.0, 0.0);
        let cut = |edge: &[Vector3<f64>; 2]| {
            let span = edge[1].x - edge[0].x;
            let t = if span > 0.0 { (limited_x - edge[0].x) / span } else { 1.0 };
            let mut end = lerp_vector(&edge[0], &edge[1], t);
            end.x = limited_x;
            end
        };

        if step.point.road_on_left {
            builders
                .dashed_lines
                .add_cross_section(left[0] - half, cut(left) - half, &sections.dash_left);
        }
        if step.point.road_on_right {
            builders
                .dashed_lines
                .add_cross_section(right[0] + half, cut(right) + half, &sections.dash_right);
        }
    }
}

/// Builds the meshes of `track` with the default design.
pub fn build_track_meshes(track: &Track, lane_width: f64, scale: Vector3<f64>) -> Vec<TrackMesh> {
    TrackDesign::default().build_track_meshes(track, lane_width, scale)
}
