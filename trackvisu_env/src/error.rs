//! Error types for the TrackVisu collaborator layer.

use thiserror::Error;

/// Errors raised by playback and pooling collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    /// Playback duration must be strictly positive and finite
    #[error("Invalid playback duration: {0}")]
    InvalidDuration(f64),

    /// Playback speed must be finite and non-negative
    #[error("Invalid playback speed: {0}")]
    InvalidSpeed(f64),

    /// Frame rate must lie within the supported range
    #[error("Invalid frame rate: {0} fps")]
    InvalidFrameRate(f64),

    /// Step snapping needs at least two keyframes
    #[error("Cannot snap to {0} steps")]
    InvalidStepCount(usize),
}
