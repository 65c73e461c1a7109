//! Random scenario generator.
//!
//! Produces a plausible highway scenario from a seed:
//! - A track whose offset and lane count drift over time
//! - An ego vehicle and traffic driving along it, occasionally changing
//!   lanes and speed
//!
//! All randomness comes from one ChaCha8 stream, so a seed always yields the
//! same scenario.

use nalgebra::{UnitQuaternion, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use trackvisu_core::{Scenario, Track, TrackSegment, Trajectory};

/// Reasons a generator configuration cannot produce a scenario.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    #[error("segment length must be positive, got {0}")]
    InvalidSegmentLength(f64),

    #[error("trajectory interval must be positive, got {0}")]
    InvalidInterval(f64),

    #[error("velocity range [{min}, {max}] must be positive and ordered")]
    InvalidVelocityRange { min: f64, max: f64 },

    #[error("lane range [{min}, {max}] must start at 1 and be ordered")]
    InvalidLaneRange { min: u32, max: u32 },

    #[error("at least one vehicle is needed")]
    NoVehicles,
}

/// Generation parameters. Distances in metres, velocities in m/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    // ----- sizes -----
    pub segment_length: f64,
    pub lane_width: f64,

    // ----- probabilities per track segment -----
    pub offset_change_probability: f64,
    pub lane_count_change_probability: f64,

    // ----- probabilities per trajectory step -----
    pub lane_change_probability: f64,
    pub velocity_change_probability: f64,

    // ----- generation -----
    pub vehicles: u32,
    pub segments: u32,
    /// Segments without a layout change after one happened
    pub min_continuous_lane_segments: u32,
    /// Steps a vehicle keeps its lane after changing
    pub min_continuous_lane_following: u32,
    pub trajectory_interval: f64,
    pub seed: u64,

    // ----- velocities -----
    pub min_velocity: f64,
    pub max_velocity: f64,
    pub velocity_change: f64,

    // ----- lanes -----
    pub min_lanes: u32,
    pub max_lanes: u32,
    pub max_lane_offset: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            segment_length: 25.0,
            lane_width: 3.5,
            offset_change_probability: 0.15,
            lane_count_change_probability: 0.15,
            lane_change_probability: 0.015,
            velocity_change_probability: 0.025,
            vehicles: 3,
            segments: 50,
            min_continuous_lane_segments: 4,
            min_continuous_lane_following: 4,
            trajectory_interval: 2.0,
            seed: 42,
            min_velocity: 40.0 / 3.6,
            max_velocity: 80.0 / 3.6,
            velocity_change: 10.0 / 3.6,
            min_lanes: 1,
            max_lanes: 4,
            max_lane_offset: 2,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if !is_positive(self.segment_length) {
            return Err(GeneratorError::InvalidSegmentLength(self.segment_length));
        }
        if !is_positive(self.trajectory_interval) {
            return Err(GeneratorError::InvalidInterval(self.trajectory_interval));
        }
        if !is_positive(self.min_velocity) || self.min_velocity > self.max_velocity {
            return Err(GeneratorError::InvalidVelocityRange {
                min: self.min_velocity,
                max: self.max_velocity,
            });
        }
        if self.min_lanes == 0 || self.min_lanes > self.max_lanes {
            return Err(GeneratorError::InvalidLaneRange {
                min: self.min_lanes,
                max: self.max_lanes,
            });
        }
        if self.vehicles == 0 {
            return Err(GeneratorError::NoVehicles);
        }
        Ok(())
    }
}

/// Longitudinal state of one generated vehicle.
#[derive(Debug, Clone, Copy)]
struct VehicleState {
    /// Distance from the track start
    longitude: f64,
    velocity: f64,
    lane: u32,
    /// Steps left before another lane change is allowed
    lane_hold: u32,
}

impl VehicleState {
    fn add_keyframe(&self, trajectory: &mut Trajectory, time: f64, lane_width: f64) {
        trajectory.add_keyframe(
            time,
            Vector3::new(self.longitude, f64::from(self.lane) * lane_width, 0.0),
            Vector3::new(self.velocity, 0.0, 0.0),
            UnitQuaternion::identity(),
        );
    }
}

/// Seeded scenario generator.
pub struct ScenarioGenerator {
    config: GeneratorConfig,
    rng: ChaCha8Rng,
}

impl ScenarioGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a track and one trajectory per vehicle, ego first.
    pub fn generate(&mut self) -> Scenario {
        let track = self.generate_track();
        let trajectories = self.generate_trajectories(&track);

        info!(
            "Generated scenario: seed={} segments={} vehicles={} duration={:.1}s",
            self.config.seed,
            track.len(),
            trajectories.len(),
            trajectories.first().map_or(0.0, Trajectory::end_time)
        );

        Scenario::new(track, trajectories)
    }

    fn generate_track(&mut self) -> Track {
        let cfg = self.config.clone();
        let mut track = Track::new();

        let mut offset = self.rng.gen_range(0..cfg.max_lane_offset.max(1));
        let mut lanes = self.rng.gen_range(cfg.min_lanes..cfg.max_lanes.max(cfg.min_lanes + 1));
        let mut longitude = 0.0;
        let mut hold = cfg.min_continuous_lane_segments;

        for _ in 0..cfg.segments {
            if hold == 0 {
                let mut altered = false;
                offset = self.step_uint(offset, 0, cfg.max_lane_offset, cfg.offset_change_probability, &mut altered);
                lanes = self.step_uint(lanes, cfg.min_lanes, cfg.max_lanes, cfg.lane_count_change_probability, &mut altered);
                if altered {
                    hold = cfg.min_continuous_lane_segments;
                }
            } else {
                hold -= 1;
            }

            track.push_segment(longitude, offset, lanes);
            longitude += cfg.segment_length;
        }

        debug!("Generated track: {} segments, {} lanes max", track.len(), track.max_lane_index());
        track
    }

    fn generate_trajectories(&mut self, track: &Track) -> Vec<Trajectory> {
        let cfg = self.config.clone();
        let track_length = f64::from(cfg.segments) * cfg.segment_length;

        let mut vehicles = self.initial_vehicles(track, track_length);
        let mut trajectories: Vec<Trajectory> = (0..vehicles.len())
            .map(|i| {
                if i == 0 {
                    Trajectory::ego("Ego")
                } else {
                    Trajectory::traffic(format!("Traffic_{}", i))
                }
            })
            .collect();

        for (vehicle, trajectory) in vehicles.iter().zip(trajectories.iter_mut()) {
            vehicle.add_keyframe(trajectory, 0.0, cfg.lane_width);
        }

        let mut time = 0.0;
        // one iteration per trajectory interval, until the ego leaves the track
        while vehicles[0].longitude < track_length {
            time += cfg.trajectory_interval;

            for (vehicle, trajectory) in vehicles.iter_mut().zip(trajectories.iter_mut()) {
                vehicle.velocity = self.step_float(
                    vehicle.velocity,
                    cfg.min_velocity,
                    cfg.max_velocity,
                    cfg.velocity_change_probability,
                    cfg.velocity_change,
                );
                vehicle.longitude += vehicle.velocity * cfg.trajectory_interval;

                let Some(segment) = segment_at(track, vehicle.longitude) else {
                    continue;
                };
                let (lowest, highest) = lane_bounds(&segment);

                if vehicle.lane_hold == 0 {
                    let mut altered = false;
                    vehicle.lane = self.step_uint(
                        vehicle.lane,
                        lowest,
                        highest,
                        cfg.lane_change_probability,
                        &mut altered,
                    );
                    if altered {
                        vehicle.lane_hold = cfg.min_continuous_lane_following;
                    }
                } else {
                    vehicle.lane_hold -= 1;
                }

                vehicle.lane = vehicle.lane.clamp(lowest, highest);
                vehicle.add_keyframe(trajectory, time, cfg.lane_width);
            }
        }

        trajectories
    }

    fn initial_vehicles(&mut self, track: &Track, track_length: f64) -> Vec<VehicleState> {
        let cfg = &self.config;
        let half = 0.5 * track_length;
        let mut vehicles = Vec::with_capacity(cfg.vehicles as usize);

        for index in 0..cfg.vehicles {
            let mut longitude = if half > 0.0 { self.rng.gen_range(-half..half) } else { 0.0 };
            let velocity = self.rng.gen_range(cfg.min_velocity..=cfg.max_velocity);
            if index == 0 {
                longitude = 0.0;
            }

            let lane = match segment_at(track, longitude) {
                Some(segment) => {
                    let (lowest, highest) = lane_bounds(&segment);
                    self.rng.gen_range(lowest..=highest)
                }
                None => 0,
            };

            vehicles.push(VehicleState {
                longitude,
                velocity,
                lane,
                lane_hold: cfg.min_continuous_lane_following,
            });
        }

        vehicles
    }

    /// With `probability`, moves `current` one step within [min, max].
    fn step_uint(&mut self, current: u32, min: u32, max: u32, probability: f64, altered: &mut bool) -> u32 {
        if min >= max || self.rng.gen::<f64>() >= probability {
            return current;
        }
        *altered = true;

        if current <= min {
            return min + 1;
        }
        if current >= max {
            return max - 1;
        }
        if self.rng.gen::<f64>() < 0.5 {
            current - 1
        } else {
            current + 1
        }
    }

    /// With `probability`, moves `current` by `amount`, away from a bound it
    /// is close to.
    fn step_float(&mut self, current: f64, min: f64, max: f64, probability: f64, amount: f64) -> f64 {
        if self.rng.gen::<f64>() >= probability {
            return current;
        }

        if current < min + amount {
            return current + amount;
        }
        if current > max - amount {
            return current - amount;
        }
        if self.rng.gen::<f64>() < 0.5 {
            current - amount
        } else {
            current + amount
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn segment_at(track: &Track, longitude: f64) -> Option<TrackSegment> {
    track.segment_at(longitude).ok().copied()
}

/// Lowest and highest existing lane of `segment`.
fn lane_bounds(segment: &TrackSegment) -> (u32, u32) {
    let highest = segment
        .end_lane()
        .saturating_sub(1)
        .max(u64::from(segment.offset));
    (segment.offset, u32::try_from(highest).unwrap_or(u32::MAX))
}
