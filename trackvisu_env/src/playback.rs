//! Playback cursor over a scenario's duration.
//!
//! The cursor keeps a normalized position in [0, 1]; absolute time is the
//! position times the scenario duration. Advancing is driven by elapsed
//! frame time and the playback speed factor.

use std::time::Duration;

use tracing::debug;

use crate::error::EnvError;

/// Speeds below this count as paused.
pub const MIN_PLAYING_SPEED: f64 = 0.001;

/// Length of one manual step in seconds of playback at speed 1.
pub const MANUAL_STEP_SECONDS: f64 = 0.1;

/// Supported range of fixed frame rates.
pub const MIN_FRAME_RATE: f64 = 1.0;
pub const MAX_FRAME_RATE: f64 = 1000.0;

/// Time between two frames at `fps`.
pub fn frame_interval(fps: f64) -> Result<Duration, EnvError> {
    if !(MIN_FRAME_RATE..=MAX_FRAME_RATE).contains(&fps) {
        return Err(EnvError::InvalidFrameRate(fps));
    }
    Ok(Duration::from_secs_f64(1.0 / fps))
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackCursor {
    position: f64,
    speed: f64,
    /// Last speed at which playback was running (restored on unpause)
    last_speed: f64,
    duration: f64,
    /// Restart from 0 instead of stopping at the end
    looping: bool,
    /// Snap to `n` evenly spaced keyframe steps
    snap_steps: Option<usize>,
    snap_timer: f64,
}

impl PlaybackCursor {
    pub fn new(duration: f64) -> Result<Self, EnvError> {
        validate_duration(duration)?;
        Ok(Self {
            position: 0.0,
            speed: 1.0,
            last_speed: 1.0,
            duration,
            looping: false,
            snap_steps: None,
            snap_timer: 0.0,
        })
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.speed >= MIN_PLAYING_SPEED
    }

    pub fn is_finished(&self) -> bool {
        !self.looping && self.position >= 1.0
    }

    /// Absolute playback time in seconds.
    pub fn time(&self) -> f64 {
        self.position * self.duration
    }

    pub fn set_duration(&mut self, duration: f64) -> Result<(), EnvError> {
        validate_duration(duration)?;
        self.duration = duration;
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<(), EnvError> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(EnvError::InvalidSpeed(speed));
        }
        self.speed = speed;
        if self.is_playing() {
            self.last_speed = speed;
        }
        Ok(())
    }

    /// Pauses, or resumes at the last running speed.
    pub fn toggle_pause(&mut self) {
        self.speed = if self.is_playing() { 0.0 } else { self.last_speed };
    }

    /// Restricts the cursor to `steps` evenly spaced positions (one per ego
    /// keyframe), or lifts the restriction with `None`.
    pub fn set_snap_steps(&mut self, steps: Option<usize>) -> Result<(), EnvError> {
        if let Some(n) = steps {
            if n < 2 {
                return Err(EnvError::InvalidStepCount(n));
            }
        }
        self.snap_steps = steps;
        self.snap_timer = 0.0;
        if let Some(step) = self.snap_size() {
            self.position = snap(self.position, step);
        }
        Ok(())
    }

    /// Moves to `position`, clamped to [0, 1].
    pub fn seek(&mut self, position: f64) {
        self.position = if position.is_nan() { 0.0 } else { position.clamp(0.0, 1.0) };
        if let Some(step) = self.snap_size() {
            self.position = snap(self.position, step);
        }
    }

    /// Jumps one manual step forward (`forward`) or backward.
    pub fn step(&mut self, forward: bool) {
        let size = self
            .snap_size()
            .unwrap_or(MANUAL_STEP_SECONDS * self.last_speed / self.duration);
        let target = if forward { self.position + size } else { self.position - size };
        self.seek(target);
    }

    /// Advances by `dt` of frame time at the current speed.
    ///
    /// Returns true if playback wrapped around to the start.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.is_playing() {
            return false;
        }

        let delta = dt.as_secs_f64() * self.speed / self.duration;
        let mut position = self.position + delta;

        if let Some(step) = self.snap_size() {
            position = snap(position, step);
            // stepped playback runs at double rate
            self.snap_timer += 2.0 * delta;
            if self.snap_timer > step {
                position += step;
                self.snap_timer = 0.0;
            }
        } else {
            self.snap_timer = 0.0;
        }

        if position > 1.0 {
            if self.looping {
                debug!("Playback wrapped after {:.2}s", self.duration);
                self.position = 0.0;
                return true;
            }
            position = 1.0;
        }

        self.position = position;
        false
    }

    fn snap_size(&self) -> Option<f64> {
        self.snap_steps.map(|n| 1.0 / (n - 1) as f64)
    }
}

fn validate_duration(duration: f64) -> Result<(), EnvError> {
    if duration.is_finite() && duration > 0.0 {
        Ok(())
    } else {
        Err(EnvError::InvalidDuration(duration))
    }
}

fn snap(position: f64, step: f64) -> f64 {
    ((position / step).round() * step).clamp(0.0, 1.0)
}
