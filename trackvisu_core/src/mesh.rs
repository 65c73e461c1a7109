//! The MESH engine - triangulated strips extruded along lane portions.
//!
//! A strip is built step by step. Each step spans two longitudinal positions
//! (`right` and `next_right`) and is swept sideways by a signed width, split
//! into `cross_fidelity` slices whose heights follow a [`ProfileCurve`].
//!
//! When steps are declared consecutive, vertices on the seam with the
//! previous step are shared instead of duplicated so that shading stays
//! smooth. Sharing is found by exact x/y coincidence: first at the index where
//! the matching vertex is expected, then by scanning backwards.
//!
//! Triangles wind clockwise when seen from above (+z). The base winding
//! depends on the sweep direction, so it is flipped for positive widths.

use nalgebra::Vector3;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::easing::{lerp_vector, ping_pong, smoothstep};
use crate::track::{LanePortion, LanePortionPoint};

// ============================================================================
// PROFILE CURVE
// ============================================================================

/// How a profile curve blends between its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveInterpolation {
    Linear,
    /// Hermite ease between keys (flat tangents at every key)
    Smooth,
}

/// Relative height across a strip, sampled over [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCurve {
    keys: Vec<(f64, f64)>,
    interpolation: CurveInterpolation,
}

impl ProfileCurve {
    /// Creates a curve from `(position, value)` keys; keys are sorted.
    pub fn new(mut keys: Vec<(f64, f64)>, interpolation: CurveInterpolation) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            keys,
            interpolation,
        }
    }

    pub fn linear(keys: Vec<(f64, f64)>) -> Self {
        Self::new(keys, CurveInterpolation::Linear)
    }

    pub fn smooth(keys: Vec<(f64, f64)>) -> Self {
        Self::new(keys, CurveInterpolation::Smooth)
    }

    pub fn constant(value: f64) -> Self {
        Self::linear(vec![(0.0, value), (1.0, value)])
    }

    pub fn keys(&self) -> &[(f64, f64)] {
        &self.keys
    }

    /// Value at `t`, clamped to the first/last key outside their range.
    pub fn evaluate(&self, t: f64) -> f64 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        let i = self.keys.partition_point(|k| k.0 <= t).saturating_sub(1);
        let (x0, y0) = self.keys[i];
        let (x1, y1) = self.keys[i + 1];
        let span = x1 - x0;
        if span <= 0.0 {
            return y1;
        }
        let local = (t - x0) / span;

        match self.interpolation {
            CurveInterpolation::Linear => y0 + (y1 - y0) * local,
            CurveInterpolation::Smooth => smoothstep(y0, y1, local),
        }
    }
}

// ============================================================================
// CROSS SECTION
// ============================================================================

/// Multiplicative height noise applied to strip vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    /// 0 = no noise, 1 = height fully driven by noise
    pub factor: f64,

    /// World distance mapped onto one noise period
    pub scale: f64,
}

/// Profile, signed width and height of one kind of strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    pub profile: ProfileCurve,

    /// Distance swept from the right edge; negative sweeps to the right
    pub width: f64,

    pub height: f64,

    pub noise: Option<NoiseParams>,
}

impl CrossSection {
    pub fn new(profile: ProfileCurve, width: f64, height: f64) -> Self {
        Self {
            profile,
            width,
            height,
            noise: None,
        }
    }

    pub fn with_noise(mut self, factor: f64, scale: f64) -> Self {
        self.noise = Some(NoiseParams { factor, scale });
        self
    }

    /// Same section swept in the opposite direction.
    pub fn mirrored(&self) -> Self {
        Self {
            width: -self.width,
            ..self.clone()
        }
    }
}

// ============================================================================
// LONGITUDINAL STEPS
// ============================================================================

/// One piece of a lane portion no longer than the maximum step length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongitudinalStep {
    /// Point the step starts from (source of the neighbour flags)
    pub point: LanePortionPoint,
    pub start: Vector3<f64>,
    pub end: Vector3<f64>,
}

/// Splits a lane portion into steps of at most `max_length` along x.
///
/// Positions inside a pair of portion points are interpolated linearly.
pub fn longitudinal_steps(portion: &LanePortion, max_length: f64) -> Vec<LongitudinalStep> {
    let max_length = if max_length > 0.0 { max_length } else { f64::INFINITY };
    let mut steps = Vec::new();

    for pair in portion.points.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let x_start = from.position.x;
        let x_total = to.position.x;
        let span = x_total - x_start;

        let mut segment_start = x_start;
        let mut segment_end = x_start;
        while segment_end < x_total - 0.001 {
            segment_end = (segment_start + max_length).min(x_total);

            let f_start = (segment_start - x_start) / span;
            let f_end = (segment_end - x_start) / span;
            steps.push(LongitudinalStep {
                point: from,
                start: lerp_vector(&from.position, &to.position, f_start),
                end: lerp_vector(&from.position, &to.position, f_end),
            });

            segment_start += max_length;
        }
    }

    steps
}

impl LanePortion {
    /// See [`longitudinal_steps`].
    pub fn steps(&self, max_segment_length: f64) -> Vec<LongitudinalStep> {
        longitudinal_steps(self, max_segment_length)
    }
}

// ============================================================================
// STRIP MESH
// ============================================================================

/// Indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StripMesh {
    pub vertices: Vec<Vector3<f64>>,
    /// Three entries per triangle
    pub indices: Vec<u32>,
}

impl StripMesh {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corner positions of every triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [Vector3<f64>; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }

    /// UVs covering the mesh's x/y extent exactly once in each dimension.
    pub fn normalized_uvs(&self) -> Vec<[f64; 2]> {
        let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
        let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
        for v in &self.vertices {
            min_x = min_x.min(v.x);
            min_y = min_y.min(v.y);
            max_x = max_x.max(v.x);
            max_y = max_y.max(v.y);
        }

        let factor = |min: f64, max: f64| if max > min { 1.0 / (max - min) } else { 0.0 };
        let (fx, fy) = (factor(min_x, max_x), factor(min_y, max_y));

        self.vertices
            .iter()
            .map(|v| [(v.x - min_x) * fx, (v.y - min_y) * fy])
            .collect()
    }
}

/// Accumulates strip geometry for one mesh.
///
/// The accumulators are owned by the builder and handed out by
/// [`StripMeshBuilder::take_mesh`], which resets the builder for reuse.
#[derive(Debug, Clone)]
pub struct StripMeshBuilder {
    vertices: Vec<Vector3<f64>>,
    indices: Vec<u32>,
    cross_fidelity: usize,
    supports_reuse: bool,
    reuse_vertices: bool,
    noise: Perlin,
}

impl StripMeshBuilder {
    /// # Arguments
    /// * `cross_fidelity` - Slices across the strip per step
    /// * `segments_will_be_consecutive` - Allow sharing seam vertices with the previous step
    pub fn new(cross_fidelity: usize, segments_will_be_consecutive: bool) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            cross_fidelity: cross_fidelity.max(1),
            supports_reuse: segments_will_be_consecutive,
            reuse_vertices: false,
            noise: Perlin::new(0),
        }
    }

    pub fn with_noise_seed(mut self, seed: u32) -> Self {
        self.noise = Perlin::new(seed);
        self
    }

    pub fn cross_fidelity(&self) -> usize {
        self.cross_fidelity
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Stops sharing vertices with whatever was added before; call when a new
    /// lane portion starts.
    pub fn reset_vertex_reuse(&mut self) {
        self.reuse_vertices = false;
    }

    /// Copy of the geometry accumulated so far.
    pub fn mesh(&self) -> StripMesh {
        StripMesh {
            vertices: self.vertices.clone(),
            indices: self.indices.clone(),
        }
    }

    /// Hands out the accumulated geometry and resets the builder.
    pub fn take_mesh(&mut self) -> StripMesh {
        self.reuse_vertices = false;
        StripMesh {
            vertices: std::mem::take(&mut self.vertices),
            indices: std::mem::take(&mut self.indices),
        }
    }

    /// Adds one step of `section` between `right` and `next_right`.
    pub fn add_cross_section(
        &mut self,
        right: Vector3<f64>,
        next_right: Vector3<f64>,
        section: &CrossSection,
    ) {
        self.add_segment_with_curve(
            right,
            next_right,
            &section.profile,
            section.width,
            section.height,
            section.noise,
        );
    }

    /// Adds one step: `cross_fidelity` slices from the right edge toward
    /// `right + dist_to_left`, two triangles per slice.
    ///
    /// Slice heights are `height * curve(i / cross_fidelity)`, optionally
    /// multiplied by noise evaluated at the vertex's world x/y.
    pub fn add_segment_with_curve(
        &mut self,
        right_pos: Vector3<f64>,
        next_right_pos: Vector3<f64>,
        curve: &ProfileCurve,
        dist_to_left: f64,
        height: f64,
        noise: Option<NoiseParams>,
    ) {
        let n = self.cross_fidelity;
        let fragment = Vector3::new(0.0, dist_to_left / n as f64, 0.0);
        let inverted = dist_to_left > 0.0;
        let noise = noise.filter(|params| params.factor > 0.0);

        let mut right = right_pos;
        let mut next_right = next_right_pos;
        let mut previous_left = 0;
        let mut previous_next_left = 0;

        for i in 0..n {
            let base_right = height * curve.evaluate(i as f64 / n as f64);
            let base_left = height * curve.evaluate((i + 1) as f64 / n as f64);

            let left = right + fragment;
            let next_left = next_right + fragment;

            let mut z_right = base_right;
            let mut z_next_right = base_right;
            let mut z_left = base_left;
            let mut z_next_left = base_left;

            if let Some(params) = noise {
                if i == 0 {
                    z_right *= self.absolute_perlin(&right, &params);
                    z_next_right *= self.absolute_perlin(&next_right, &params);
                }
                z_left *= self.absolute_perlin(&left, &params);
                z_next_left *= self.absolute_perlin(&next_left, &params);
            }

            if i == 0 {
                let relative = self.vertices.len().checked_sub(n);

                previous_left =
                    self.add_if_not_existing(left, z_left, relative.and_then(|r| r.checked_sub(1)));
                let right_index = self.add_if_not_existing(right, z_right, relative);
                previous_next_left = self.add(next_left, z_next_left);

                self.add_existing(previous_next_left);
                self.add_existing(right_index);
                self.add(next_right, z_next_right);
            } else {
                let existing_right = previous_left;
                let existing_next_right = previous_next_left;

                let expected = self.vertices.len().checked_sub(n + 1);
                previous_left = self.add_if_not_existing(left, z_left, expected);
                self.add_existing(existing_right);
                previous_next_left = self.add(next_left, z_next_left);

                self.add_existing(previous_next_left);
                self.add_existing(existing_right);
                self.add_existing(existing_next_right);
            }

            if inverted {
                self.invert_last_two_triangles();
            }

            right += fragment;
            next_right += fragment;
        }

        self.reuse_vertices = true;
    }

    fn absolute_perlin(&self, pos: &Vector3<f64>, params: &NoiseParams) -> f64 {
        let scale = if params.scale != 0.0 { params.scale } else { 1.0 };
        let x = ping_pong(pos.x / scale, 1.0);
        let y = ping_pong(pos.y / scale, 1.0);
        let unit = ((self.noise.get([x, y]) + 1.0) * 0.5).clamp(0.0, 1.0);
        (1.0 - params.factor) + params.factor * unit
    }

    fn add(&mut self, pos: Vector3<f64>, height: f64) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vector3::new(pos.x, pos.y, height));
        self.indices.push(index);
        index
    }

    fn add_existing(&mut self, index: u32) -> u32 {
        self.indices.push(index);
        index
    }

    fn add_if_not_existing(&mut self, pos: Vector3<f64>, height: f64, expected: Option<usize>) -> u32 {
        if self.reuse_vertices && self.supports_reuse {
            if let Some(existing) = self.find_vertex_to_reuse(&pos, expected) {
                return self.add_existing(existing);
            }
        }
        self.add(pos, height)
    }

    fn find_vertex_to_reuse(&self, pos: &Vector3<f64>, expected: Option<usize>) -> Option<u32> {
        let coincides = |v: &Vector3<f64>| v.x == pos.x && v.y == pos.y;

        if let Some(index) = expected.filter(|&i| i < self.vertices.len()) {
            if coincides(&self.vertices[index]) {
                return Some(index as u32);
            }
        }

        // the most recent match is the seam of the previous step
        self.vertices.iter().rposition(coincides).map(|i| i as u32)
    }

    fn invert_last_two_triangles(&mut self) {
        let o = self.indices.len();
        self.indices.swap(o - 6, o - 4);
        self.indices.swap(o - 3, o - 1);
    }
}
