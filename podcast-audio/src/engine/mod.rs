//! Audio engine - playback and recording coordinator
//!
//! **Responsibilities:**
//! - Exclusive ownership of the single player and single recorder handle
//! - Playback sub-machine (load, transport, speed, scrubbing, end of media)
//! - Recording sub-machine (start, pause/resume, stop, elapsed time)
//! - Background position tracking tied to the Playing state
//! - Derived read-only snapshots and event notification
//!
//! **Module layout:**
//! - `core`: struct, construction, snapshot, cleanup/shutdown
//! - `playback`: playback operations and the position tracker
//! - `recording`: recording operations and the progress ticker
//! - `snapshot`: derived views consumed by UI layers
//! - `task`: cancellable periodic task used by both trackers

mod core;
mod playback;
mod recording;
mod snapshot;
mod task;

pub use self::core::AudioEngine;
pub use playback::LoadOutcome;
pub use snapshot::{EngineSnapshot, PlaybackView, RecordingView};
