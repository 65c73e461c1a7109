//! TrackVisu Environment Layer
//!
//! Collaborators the playback front end relies on, kept apart from the pure
//! geometry in `trackvisu_core`:
//! - **Resource pooling**: reuse of scene resources by tag across rebuilds
//! - **Time**: a wall clock and a manually advanced clock
//! - **Playback**: a normalized cursor over the scenario duration
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use trackvisu_env::{ManualClock, PlaybackClock, PlaybackCursor};
//!
//! let clock = ManualClock::new();
//! let mut cursor = PlaybackCursor::new(10.0).unwrap();
//!
//! let before = clock.now();
//! clock.advance(Duration::from_millis(500));
//! cursor.advance(clock.now() - before);
//! assert!((cursor.time() - 0.5).abs() < 1e-9);
//! ```

mod clock;
mod error;
mod playback;
mod pool;
mod types;

pub use clock::{ManualClock, PlaybackClock, SystemClock};
pub use error::EnvError;
pub use playback::{
    frame_interval, PlaybackCursor, MANUAL_STEP_SECONDS, MAX_FRAME_RATE, MIN_FRAME_RATE,
    MIN_PLAYING_SPEED,
};
pub use pool::{Pooled, ResourcePool, TaggedPool};
pub use types::{ResourceId, ResourceTag};
