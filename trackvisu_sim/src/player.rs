//! Scenario player - drives a playback cursor from a clock and samples every
//! trajectory at the cursor time.

use std::time::Duration;

use tracing::debug;

use trackvisu_core::{BankingConfig, Scenario};
use trackvisu_env::{EnvError, PlaybackClock, PlaybackCursor};

use crate::exporter::{PlaybackFrame, VehiclePose};

pub struct ScenarioPlayer<C: PlaybackClock> {
    scenario: Scenario,
    cursor: PlaybackCursor,
    clock: C,
    last_tick: Duration,
    banking: BankingConfig,
}

impl<C: PlaybackClock> ScenarioPlayer<C> {
    /// Fails if the scenario has no positive duration to play.
    pub fn new(scenario: Scenario, clock: C) -> Result<Self, EnvError> {
        let cursor = PlaybackCursor::new(scenario.duration())?;
        let last_tick = clock.now();
        Ok(Self {
            scenario,
            cursor,
            clock,
            last_tick,
            banking: BankingConfig::default(),
        })
    }

    pub fn with_banking(mut self, banking: BankingConfig) -> Self {
        self.banking = banking;
        self
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut PlaybackCursor {
        &mut self.cursor
    }

    /// Advances the cursor by the clock time elapsed since the last tick and
    /// returns the frame at the new position.
    pub fn tick(&mut self) -> PlaybackFrame {
        let now = self.clock.now();
        let dt = now.saturating_sub(self.last_tick);
        self.last_tick = now;

        if self.cursor.advance(dt) {
            debug!("Playback restarted");
        }
        self.frame_at(self.cursor.time())
    }

    /// Poses of every vehicle at `time`, ego first. Vehicles whose trajectory
    /// has ended are left out.
    pub fn frame_at(&self, time: f64) -> PlaybackFrame {
        let vehicles = self
            .scenario
            .ordered_trajectories()
            .filter_map(|trajectory| {
                let pose = trajectory.interpolate_with(time, &self.banking).ok()??;
                Some(VehiclePose::new(&trajectory.name, trajectory.role, &pose))
            })
            .collect();

        PlaybackFrame {
            time_sec: time,
            vehicles,
        }
    }

    /// One-line playback summary: time, progress and the fractional ego
    /// keyframe index.
    pub fn status(&self) -> String {
        let time = self.cursor.time();
        let percent = (self.cursor.position() * 100.0).floor();

        let ego_state = self.scenario.ego().and_then(|ego| {
            let location = ego.locate(time).ok()?;
            let state = (location.frame_index as f64 - 1.0 + location.ratio).max(0.0);
            Some(format!("{:.2}/{}", state, ego.len()))
        });

        format!(
            "Time: {:.2}s ({}%) --- Ego State: {}",
            time,
            percent,
            ego_state.as_deref().unwrap_or("-")
        )
    }
}
