//! Recording sub-machine data
//!
//! `Idle → Recording ↔ Paused → (stop) → Idle`. Elapsed time survives
//! pause/resume without double counting.

mod state;
mod stopwatch;

pub use state::RecordingState;
pub use stopwatch::Stopwatch;
