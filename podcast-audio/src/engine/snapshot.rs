//! Derived read-only views
//!
//! Plain copies taken under the sub-machine locks. Every predicate and
//! formatted string is computed from the copied fields on demand.

use crate::playback::{speed_label, PlaybackState};
use crate::recording::RecordingState;
use podcast_common::events::{PlaybackStatus, RecordingStatus};
use podcast_common::human_time::format_time;
use podcast_common::Episode;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackView {
    pub status: PlaybackStatus,
    pub episode: Option<Episode>,
    pub is_playing: bool,
    pub is_loading: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub playback_speed: f64,
    pub error: Option<String>,
    pub scrubbing: bool,
    pub finished: bool,
}

impl PlaybackView {
    pub(super) fn from_state(state: &PlaybackState) -> Self {
        Self {
            status: state.status(),
            episode: state.current_episode.clone(),
            is_playing: state.is_playing,
            is_loading: state.is_loading,
            position_ms: state.position_ms,
            duration_ms: state.duration_ms,
            playback_speed: state.playback_speed,
            error: state.error.clone(),
            scrubbing: state.scrubbing,
            finished: state.finished,
        }
    }

    /// Position/duration in `[0, 1]`; 0 while the duration is unknown
    pub fn progress(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.position_ms as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
    }

    pub fn formatted_position(&self) -> String {
        format_time(self.position_ms)
    }

    pub fn formatted_duration(&self) -> String {
        format_time(self.duration_ms)
    }

    /// Loaded, not loading, and no unrecovered error
    pub fn can_play(&self) -> bool {
        self.episode.is_some() && !self.is_loading && self.error.is_none()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// e.g. "1.5x"
    pub fn speed_label(&self) -> String {
        speed_label(self.playback_speed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordingView {
    pub status: RecordingStatus,
    /// Elapsed capture time, whole seconds
    pub duration_ms: u64,
}

impl RecordingView {
    pub(super) fn from_state(state: &RecordingState) -> Self {
        Self {
            status: state.status,
            duration_ms: state.duration_ms(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.status == RecordingStatus::Recording
    }

    pub fn formatted_duration(&self) -> String {
        format_time(self.duration_ms)
    }
}

/// Both sub-machines as seen by one observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub playback: PlaybackView,
    pub recording: RecordingView,
}

impl EngineSnapshot {
    pub fn status(&self) -> PlaybackStatus {
        self.playback.status
    }

    pub fn formatted_recording_duration(&self) -> String {
        self.recording.formatted_duration()
    }
}
