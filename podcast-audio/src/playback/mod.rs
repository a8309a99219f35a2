//! Playback sub-machine data
//!
//! `Empty → Loading → Paused ↔ Playing → (unload/cleanup) → Empty`.
//! Transitions are driven by `AudioEngine`; this module owns the plain state
//! record and the speed domain.

pub mod speed;
mod state;

pub use speed::{next_speed, speed_label, SPEED_STEPS};
pub use state::PlaybackState;
