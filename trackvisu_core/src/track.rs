//! The TRACK model - longitudinally varying lane layout.
//!
//! A track is a list of segments. Each segment states which lane indices exist
//! from its longitude onward, until the next segment takes over. Lane index 0
//! is the right-most lane; lateral position grows to the left.
//!
//! [`Track::lane_portions`] turns the discrete layout into continuous
//! per-lane point runs. Where a lane ends or begins, a short eased shift
//! toward the neighbouring lane is synthesised so that the geometry does not
//! stop abruptly at the boundary.

use std::ops::Range;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::easing::lane_lerp;
use crate::error::CoreError;

/// Number of points synthesised for one merge or emerge transition.
pub const MERGE_FIDELITY: usize = 12;

/// Lane layout valid from `longitude` until the next segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSegment {
    /// Start of the segment along the track (metres)
    pub longitude: f64,

    /// Index of the right-most existing lane
    pub offset: u32,

    /// Number of existing lanes
    pub lanes: u32,
}

impl TrackSegment {
    pub fn new(longitude: f64, offset: u32, lanes: u32) -> Self {
        Self {
            longitude,
            offset,
            lanes,
        }
    }

    /// True if `lane_index` exists in this segment.
    pub fn contains_lane(&self, lane_index: i64) -> bool {
        let offset = i64::from(self.offset);
        lane_index >= offset && lane_index < offset + i64::from(self.lanes)
    }

    /// One past the left-most lane index. Widened so that any pair of
    /// decoded fields fits.
    pub fn end_lane(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.lanes)
    }
}

/// A single centreline sample of one lane at a segment boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LanePortionPoint {
    pub position: Vector3<f64>,
    pub nothing_on_right: bool,
    pub nothing_on_left: bool,
    pub road_on_right: bool,
    pub road_on_left: bool,
}

impl LanePortionPoint {
    /// Samples `lane_index` at `position`, deriving the neighbour flags from
    /// the lanes that exist in `segment`.
    pub fn new(position: Vector3<f64>, segment: &TrackSegment, lane_index: i64) -> Self {
        let offset = i64::from(segment.offset);
        let most_left_lane = offset + i64::from(segment.lanes) - 1;

        Self {
            position,
            nothing_on_right: lane_index <= offset,
            nothing_on_left: lane_index >= most_left_lane,
            road_on_right: lane_index > offset && lane_index <= most_left_lane,
            road_on_left: lane_index >= offset && lane_index < most_left_lane,
        }
    }
}

/// An uninterrupted run of points along one lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanePortion {
    pub lane_index: u32,
    pub points: Vec<LanePortionPoint>,
}

impl LanePortion {
    pub fn new(lane_index: u32) -> Self {
        Self {
            lane_index,
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Centreline positions only.
    pub fn positions(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        self.points.iter().map(|p| p.position)
    }
}

/// Ordered list of lane layout segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    segments: Vec<TrackSegment>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<TrackSegment>) -> Self {
        Self { segments }
    }

    /// Appends a segment. Longitudes are expected to be non-decreasing.
    pub fn push_segment(&mut self, longitude: f64, offset: u32, lanes: u32) {
        self.segments.push(TrackSegment::new(longitude, offset, lanes));
    }

    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns the first segment starting strictly after `longitude`, or the
    /// last segment for positions at or past the final one.
    pub fn segment_at(&self, longitude: f64) -> Result<&TrackSegment, CoreError> {
        self.segments
            .iter()
            .find(|segment| segment.longitude > longitude)
            .or_else(|| self.segments.last())
            .ok_or_else(|| CoreError::invalid_state("segment_at on a track without segments"))
    }

    /// Total lateral extent covered by any segment.
    pub fn width(&self, lane_width: f64) -> Result<f64, CoreError> {
        let min_offset = self
            .segments
            .iter()
            .map(|s| s.offset)
            .min()
            .ok_or_else(|| CoreError::invalid_state("width of a track without segments"))?;
        let max_end = self.max_lane_index();

        Ok(max_end.saturating_sub(u64::from(min_offset)) as f64 * lane_width)
    }

    /// Longitude of the last segment.
    pub fn length(&self) -> Result<f64, CoreError> {
        self.segments
            .last()
            .map(|s| s.longitude)
            .ok_or_else(|| CoreError::invalid_state("length of a track without segments"))
    }

    /// Maximum `offset + lanes` over all segments (0 for an empty track).
    pub fn max_lane_index(&self) -> u64 {
        self.segments.iter().map(TrackSegment::end_lane).max().unwrap_or(0)
    }

    /// Converts the layout into continuous per-lane point runs.
    ///
    /// Points are placed at `(longitude, lane_index * lane_width, 0)`, scaled
    /// component-wise by `scale`. A lane that disappears and comes back yields
    /// several portions.
    pub fn lane_portions(&self, lane_width: f64, scale: Vector3<f64>) -> Vec<LanePortion> {
        let mut portions = Vec::new();

        let lanes = self
            .occupied_lanes()
            .into_iter()
            .flatten()
            .map_while(|lane| u32::try_from(lane).ok());

        for lane in lanes {
            let lane_index = i64::from(lane);
            let mut current = LanePortion::new(lane);
            let mut last_segment: Option<&TrackSegment> = None;

            for segment in &self.segments {
                if segment.contains_lane(lane_index) {
                    let starts_portion = current.is_empty();
                    current.points.push(LanePortionPoint::new(
                        lane_point(segment.longitude, lane_index, lane_width, &scale),
                        segment,
                        lane_index,
                    ));

                    if starts_portion {
                        if let Some(previous) = last_segment {
                            prepend_lane_emerge(&mut current, previous, lane_width, &scale);
                        }
                    }
                } else if !current.is_empty() {
                    append_lane_merge(&mut current, segment, lane_width, &scale);
                    portions.push(std::mem::replace(&mut current, LanePortion::new(lane)));
                }

                last_segment = Some(segment);
            }

            if !current.is_empty() {
                portions.push(current);
            }
        }

        debug!(
            "lane_portions: {} segments, {} lanes -> {} portions",
            self.segments.len(),
            self.max_lane_index(),
            portions.len()
        );

        portions
    }

    /// Lane ranges covered by at least one segment, sorted and merged.
    fn occupied_lanes(&self) -> Vec<Range<u64>> {
        let mut ranges: Vec<Range<u64>> = self
            .segments
            .iter()
            .map(|s| u64::from(s.offset)..s.end_lane())
            .filter(|r| !r.is_empty())
            .collect();
        ranges.sort_by_key(|r| r.start);

        let mut merged: Vec<Range<u64>> = Vec::new();
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }
        merged
    }
}

fn lane_point(longitude: f64, lane_index: i64, lane_width: f64, scale: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(longitude, lane_index as f64 * lane_width, 0.0).component_mul(scale)
}

/// Blends the end of a lane into its neighbour in `segment`, where the lane no
/// longer exists. Right neighbour first, then left. Without any neighbour the
/// lane is continued flat up to the transition longitude.
fn append_lane_merge(
    portion: &mut LanePortion,
    segment: &TrackSegment,
    lane_width: f64,
    scale: &Vector3<f64>,
) {
    let lane_index = i64::from(portion.lane_index);
    let Some(prev_point) = portion.points.last().map(|p| p.position) else {
        return;
    };

    let neighbour = [lane_index + 1, lane_index - 1]
        .into_iter()
        .find(|&candidate| segment.contains_lane(candidate));

    let Some(neighbour) = neighbour else {
        portion.points.push(LanePortionPoint::new(
            lane_point(segment.longitude, lane_index, lane_width, scale),
            segment,
            lane_index,
        ));
        return;
    };

    let next_point = lane_point(segment.longitude, neighbour, lane_width, scale);
    for i in 1..=MERGE_FIDELITY {
        let t = i as f64 / MERGE_FIDELITY as f64;
        portion.points.push(LanePortionPoint::new(
            lane_lerp(&prev_point, &next_point, t),
            segment,
            lane_index,
        ));
    }
}

/// Prepends a shift out of the neighbouring lane of `previous`, the segment
/// before the lane starts existing. Left neighbour first, then right.
fn prepend_lane_emerge(
    portion: &mut LanePortion,
    previous: &TrackSegment,
    lane_width: f64,
    scale: &Vector3<f64>,
) {
    let lane_index = i64::from(portion.lane_index);
    let Some(next_point) = portion.points.first().map(|p| p.position) else {
        return;
    };

    let neighbour = [lane_index - 1, lane_index + 1]
        .into_iter()
        .find(|&candidate| previous.contains_lane(candidate));

    let Some(neighbour) = neighbour else {
        return;
    };

    let prev_point = lane_point(previous.longitude, neighbour, lane_width, scale);
    let emerge = (0..MERGE_FIDELITY).map(|i| {
        let t = i as f64 / MERGE_FIDELITY as f64;
        LanePortionPoint::new(lane_lerp(&prev_point, &next_point, t), previous, lane_index)
    });
    portion.points.splice(0..0, emerge);
}
