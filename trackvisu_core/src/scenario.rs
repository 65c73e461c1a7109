//! A scenario: one track plus the trajectories driven on it.

use serde::{Deserialize, Serialize};

use crate::track::Track;
use crate::trajectory::{Trajectory, VehicleRole};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub track: Track,
    pub trajectories: Vec<Trajectory>,
}

impl Scenario {
    pub fn new(track: Track, trajectories: Vec<Trajectory>) -> Self {
        Self {
            track,
            trajectories,
        }
    }

    fn ego_index(&self) -> Option<usize> {
        self.trajectories.iter().position(|t| t.role == VehicleRole::Ego)
    }

    /// The ego trajectory: the first vehicle carrying that role.
    pub fn ego(&self) -> Option<&Trajectory> {
        self.ego_index().map(|index| &self.trajectories[index])
    }

    /// Every trajectory except the ego, in their original order. A second
    /// `Ego`-roled trajectory counts as traffic here.
    pub fn traffic(&self) -> impl Iterator<Item = &Trajectory> {
        let ego = self.ego_index();
        self.trajectories
            .iter()
            .enumerate()
            .filter(move |(index, _)| Some(*index) != ego)
            .map(|(_, trajectory)| trajectory)
    }

    /// Ego first, then every other trajectory in its original order.
    pub fn ordered_trajectories(&self) -> impl Iterator<Item = &Trajectory> {
        self.ego().into_iter().chain(self.traffic())
    }

    pub fn trajectory(&self, name: &str) -> Option<&Trajectory> {
        self.trajectories.iter().find(|t| t.name == name)
    }

    /// Longest trajectory end time; the playback duration.
    pub fn duration(&self) -> f64 {
        self.trajectories
            .iter()
            .map(Trajectory::end_time)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{UnitQuaternion, Vector3};

    fn with_end(mut t: Trajectory, end: f64) -> Trajectory {
        t.add_keyframe(0.0, Vector3::zeros(), Vector3::zeros(), UnitQuaternion::identity());
        t.add_keyframe(end, Vector3::zeros(), Vector3::zeros(), UnitQuaternion::identity());
        t
    }

    #[test]
    fn test_roles_are_explicit() {
        let scenario = Scenario::new(
            Track::new(),
            vec![
                with_end(Trajectory::traffic("Traffic_1"), 4.0),
                with_end(Trajectory::ego("Ego"), 8.0),
                with_end(Trajectory::traffic("Traffic_2"), 6.0),
            ],
        );

        assert_eq!(scenario.ego().unwrap().name, "Ego");
        let order: Vec<_> = scenario.ordered_trajectories().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["Ego", "Traffic_1", "Traffic_2"]);
        assert_eq!(scenario.duration(), 8.0);
        assert!(scenario.trajectory("Traffic_2").is_some());
    }

    #[test]
    fn test_second_ego_is_kept_as_traffic() {
        let scenario = Scenario::new(
            Track::new(),
            vec![
                Trajectory::traffic("T"),
                Trajectory::ego("A"),
                Trajectory::ego("B"),
            ],
        );

        assert_eq!(scenario.ego().unwrap().name, "A");
        let traffic: Vec<_> = scenario.traffic().map(|t| t.name.as_str()).collect();
        assert_eq!(traffic, vec!["T", "B"]);
        let order: Vec<_> = scenario.ordered_trajectories().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["A", "T", "B"]);
    }

    #[test]
    fn test_empty_scenario_duration() {
        assert_eq!(Scenario::default().duration(), 0.0);
        assert!(Scenario::default().ego().is_none());
    }
}
