//! The TRAJECTORY model - timestamped vehicle poses and their interpolation.
//!
//! A trajectory is queried at arbitrary playback times. Between two keyframes
//! the position moves linearly along the track while the lateral (y) component
//! is eased, and a lateral move additionally banks the vehicle: it rolls into
//! the lane change during the first half and back out during the second.

use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::easing::{double_smoothstep, lane_lerp, lerp_vector, slerp};
use crate::error::CoreError;

/// Which part a vehicle plays in a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleRole {
    /// The primary (observed) vehicle
    Ego,
    /// Any other vehicle
    Traffic,
}

/// A timestamped vehicle pose sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Seconds since scenario start
    pub time: f64,

    /// Position in track coordinates (x along, y across, z up)
    pub position: Vector3<f64>,

    /// Velocity in m/s
    pub velocity: Vector3<f64>,

    /// Orientation in the vehicle model frame
    pub orientation: UnitQuaternion<f64>,
}

impl Keyframe {
    pub fn new(
        time: f64,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
    ) -> Self {
        Self {
            time,
            position,
            velocity,
            orientation,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            velocity: self.velocity,
            orientation: self.orientation,
        }
    }
}

/// Interpolated vehicle state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

/// Roll applied while a vehicle changes lanes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankingConfig {
    /// Peak roll reached halfway through the lane change (degrees)
    pub angle_degrees: f64,

    /// Forward axis of the vehicle model frame
    pub roll_axis: Unit<Vector3<f64>>,
}

impl Default for BankingConfig {
    fn default() -> Self {
        Self {
            angle_degrees: 20.0,
            roll_axis: Vector3::z_axis(),
        }
    }
}

impl BankingConfig {
    fn roll(&self, shifting_left: bool) -> UnitQuaternion<f64> {
        let sign = if shifting_left { 1.0 } else { -1.0 };
        UnitQuaternion::from_axis_angle(&self.roll_axis, sign * self.angle_degrees.to_radians())
    }
}

/// Where a query time falls within the keyframe list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeLocation {
    /// Progress from `prev` to `next` in [0, 1]
    pub ratio: f64,

    /// Index of `next`; equals the keyframe count past the end
    pub frame_index: usize,

    pub prev: Keyframe,
    pub next: Keyframe,
}

impl KeyframeLocation {
    /// True when the query lies at or past the last keyframe.
    pub fn is_past_end(&self, keyframe_count: usize) -> bool {
        self.frame_index >= keyframe_count
    }
}

/// Ordered keyframes of one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub name: String,
    pub role: VehicleRole,
    keyframes: Vec<Keyframe>,
}

impl Trajectory {
    pub fn new(name: impl Into<String>, role: VehicleRole) -> Self {
        Self {
            name: name.into(),
            role,
            keyframes: Vec::new(),
        }
    }

    pub fn ego(name: impl Into<String>) -> Self {
        Self::new(name, VehicleRole::Ego)
    }

    pub fn traffic(name: impl Into<String>) -> Self {
        Self::new(name, VehicleRole::Traffic)
    }

    /// Appends a keyframe. Times are expected to be strictly increasing.
    pub fn push_keyframe(&mut self, keyframe: Keyframe) {
        self.keyframes.push(keyframe);
    }

    pub fn add_keyframe(
        &mut self,
        time: f64,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
    ) {
        self.push_keyframe(Keyframe::new(time, position, velocity, orientation));
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn is_ego(&self) -> bool {
        self.role == VehicleRole::Ego
    }

    /// Time of the last keyframe, or 0 without keyframes.
    pub fn end_time(&self) -> f64 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    /// Finds the keyframe pair surrounding `time`.
    ///
    /// `next` is the first keyframe later than `time` and `prev` the one
    /// before it. Before the first keyframe both are the first keyframe with
    /// ratio 0; at or past the last one both are the last keyframe, the ratio
    /// is 1 and `frame_index` equals the keyframe count.
    pub fn locate(&self, time: f64) -> Result<KeyframeLocation, CoreError> {
        let first = *self
            .keyframes
            .first()
            .ok_or_else(|| CoreError::invalid_state(format!("locate on empty trajectory '{}'", self.name)))?;

        let Some(frame_index) = self.keyframes.iter().position(|k| k.time > time) else {
            let last = self.keyframes[self.keyframes.len() - 1];
            return Ok(KeyframeLocation {
                ratio: 1.0,
                frame_index: self.keyframes.len(),
                prev: last,
                next: last,
            });
        };

        if frame_index == 0 {
            return Ok(KeyframeLocation {
                ratio: 0.0,
                frame_index: 0,
                prev: first,
                next: first,
            });
        }

        let prev = self.keyframes[frame_index - 1];
        let next = self.keyframes[frame_index];
        let ratio = ((time - prev.time) / (next.time - prev.time)).clamp(0.0, 1.0);

        Ok(KeyframeLocation {
            ratio,
            frame_index,
            prev,
            next,
        })
    }

    /// Pose at `time` with the default banking.
    ///
    /// # Returns
    /// * `Ok(Some(pose))` - `time` lies before the last keyframe
    /// * `Ok(None)` - no data: `time` is at or past [`Self::end_time`]
    /// * `Err(CoreError::InvalidState)` - the trajectory has no keyframes
    pub fn interpolate(&self, time: f64) -> Result<Option<Pose>, CoreError> {
        self.interpolate_with(time, &BankingConfig::default())
    }

    /// Pose at `time` with explicit banking parameters.
    pub fn interpolate_with(
        &self,
        time: f64,
        banking: &BankingConfig,
    ) -> Result<Option<Pose>, CoreError> {
        let location = self.locate(time)?;
        if location.is_past_end(self.keyframes.len()) {
            return Ok(None);
        }

        let KeyframeLocation {
            ratio, prev, next, ..
        } = location;

        let position = lane_lerp(&prev.position, &next.position, ratio);
        let velocity = lerp_vector(&prev.velocity, &next.velocity, ratio);
        let mut orientation = slerp(&prev.orientation, &next.orientation, ratio);

        if prev.position.y != next.position.y {
            let shifting_left = prev.position.y < next.position.y;
            let angled = orientation * banking.roll(shifting_left);

            orientation = if ratio <= 0.5 {
                slerp(&prev.orientation, &angled, double_smoothstep(ratio * 2.0))
            } else {
                slerp(&angled, &next.orientation, double_smoothstep((ratio - 0.5) * 2.0))
            };
        }

        Ok(Some(Pose {
            position,
            velocity,
            orientation,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn straight() -> Trajectory {
        let mut t = Trajectory::ego("Ego");
        for i in 0..4 {
            let time = i as f64 * 2.0;
            t.add_keyframe(
                time,
                Vector3::new(time * 10.0, 0.0, 0.0),
                Vector3::new(10.0 + i as f64, 0.0, 0.0),
                UnitQuaternion::from_euler_angles(0.0, 0.1 * i as f64, 0.0),
            );
        }
        t
    }

    fn lane_change() -> Trajectory {
        let mut t = Trajectory::traffic("Traffic_1");
        t.add_keyframe(0.0, Vector3::new(0.0, 0.0, 0.0), Vector3::new(20.0, 0.0, 0.0), UnitQuaternion::identity());
        t.add_keyframe(2.0, Vector3::new(40.0, 3.5, 0.0), Vector3::new(20.0, 0.0, 0.0), UnitQuaternion::identity());
        t
    }

    #[test]
    fn test_end_time() {
        assert_eq!(Trajectory::ego("empty").end_time(), 0.0);
        assert_eq!(straight().end_time(), 6.0);
    }

    #[test]
    fn test_locate_between_keyframes() {
        let t = straight();
        let loc = t.locate(3.0).unwrap();
        assert_eq!(loc.frame_index, 2);
        assert_eq!(loc.prev.time, 2.0);
        assert_eq!(loc.next.time, 4.0);
        assert_relative_eq!(loc.ratio, 0.5);
    }

    #[test]
    fn test_locate_past_end() {
        let t = straight();
        let loc = t.locate(6.0).unwrap();
        assert_eq!(loc.frame_index, 4);
        assert_eq!(loc.ratio, 1.0);
        assert!(loc.is_past_end(t.len()));
    }

    #[test]
    fn test_locate_before_start_is_clamped() {
        let t = straight();
        let loc = t.locate(-5.0).unwrap();
        assert_eq!(loc.frame_index, 0);
        assert_eq!(loc.ratio, 0.0);
        assert_eq!(loc.prev, t.keyframes()[0]);
    }

    #[test]
    fn test_empty_trajectory_is_invalid_state() {
        let t = Trajectory::ego("empty");
        assert!(matches!(t.locate(0.0), Err(CoreError::InvalidState(_))));
        assert!(matches!(t.interpolate(0.0), Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn test_interpolate_reports_no_data_at_and_after_end() {
        let t = straight();
        assert_eq!(t.interpolate(t.end_time()).unwrap(), None);
        assert_eq!(t.interpolate(100.0).unwrap(), None);
    }

    #[test]
    fn test_interpolate_reproduces_keyframes_exactly() {
        let t = straight();
        for keyframe in &t.keyframes()[..t.len() - 1] {
            let pose = t.interpolate(keyframe.time).unwrap().unwrap();
            assert_eq!(pose, keyframe.pose());
        }

        let lc = lane_change();
        let pose = lc.interpolate(0.0).unwrap().unwrap();
        assert_eq!(pose, lc.keyframes()[0].pose());
    }

    #[test]
    fn test_interpolate_converges_at_keyframe() {
        let t = straight();
        let key = t.keyframes()[2];
        let eps = 1e-7;
        let before = t.interpolate(key.time - eps).unwrap().unwrap();
        let after = t.interpolate(key.time + eps).unwrap().unwrap();

        assert_relative_eq!(before.position, key.position, epsilon = 1e-5);
        assert_relative_eq!(after.position, key.position, epsilon = 1e-5);
        assert_relative_eq!(before.velocity, key.velocity, epsilon = 1e-5);
        assert!(before.orientation.angle_to(&key.orientation) < 1e-5);
        assert!(after.orientation.angle_to(&key.orientation) < 1e-5);
    }

    #[test]
    fn test_lateral_position_is_eased() {
        let t = lane_change();
        let quarter = t.interpolate(0.5).unwrap().unwrap();
        assert_relative_eq!(quarter.position.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(quarter.position.y, 3.5 * double_smoothstep(0.25), epsilon = 1e-9);
    }

    #[test]
    fn test_lane_change_banks_at_midpoint() {
        let t = lane_change();
        let mid = t.interpolate(1.0).unwrap().unwrap();

        // base orientation is identity, the midpoint is fully banked
        let roll = mid.orientation.angle();
        assert_relative_eq!(roll, 20f64.to_radians(), epsilon = 1e-9);
        let axis = mid.orientation.axis().unwrap();
        assert_relative_eq!(axis.into_inner(), Vector3::z(), epsilon = 1e-9);

        let start = t.interpolate(0.0).unwrap().unwrap();
        assert_eq!(start.orientation, UnitQuaternion::identity());
    }

    #[test]
    fn test_bank_direction_follows_shift() {
        let mut t = Trajectory::traffic("right");
        t.add_keyframe(0.0, Vector3::new(0.0, 3.5, 0.0), Vector3::zeros(), UnitQuaternion::identity());
        t.add_keyframe(2.0, Vector3::new(40.0, 0.0, 0.0), Vector3::zeros(), UnitQuaternion::identity());

        let mid = t.interpolate(1.0).unwrap().unwrap();
        let (_, _, yaw_like) = mid.orientation.euler_angles();
        assert!(yaw_like < 0.0);
    }

    #[test]
    fn test_no_banking_without_lateral_move() {
        let t = straight();
        let pose = t.interpolate(1.0).unwrap().unwrap();
        let expected = slerp(&t.keyframes()[0].orientation, &t.keyframes()[1].orientation, 0.5);
        assert!(pose.orientation.angle_to(&expected) < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_interpolate_stays_between_neighbours(time in 0.0f64..6.0) {
            let t = straight();
            let pose = t.interpolate(time).unwrap().unwrap();
            let loc = t.locate(time).unwrap();
            prop_assert!(pose.position.x >= loc.prev.position.x - 1e-9);
            prop_assert!(pose.position.x <= loc.next.position.x + 1e-9);
            prop_assert!(loc.ratio >= 0.0 && loc.ratio <= 1.0);
        }
    }
}
