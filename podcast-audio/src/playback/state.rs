//! Playback state record

use crate::backend::PlayerStatus;
use podcast_common::events::PlaybackStatus;
use podcast_common::Episode;

/// Mutable playback state owned by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// True iff the active resource is emitting audio
    pub is_playing: bool,
    /// Playhead in milliseconds, always within `[0, duration_ms]`
    pub position_ms: u64,
    /// Total length in milliseconds, 0 when unknown or unloaded
    pub duration_ms: u64,
    /// Metadata of the loaded source
    pub current_episode: Option<Episode>,
    /// Rate multiplier, also the preference for the next load
    pub playback_speed: f64,
    /// A load is in flight; transport actions are no-ops
    pub is_loading: bool,
    /// Last unrecovered failure, cleared by a successful load
    pub error: Option<String>,
    /// Interactive drag in progress; the tracker leaves `position_ms` alone
    pub scrubbing: bool,
    /// Playhead reached the end of the media
    pub finished: bool,
}

impl PlaybackState {
    pub fn new(speed: f64) -> Self {
        Self {
            is_playing: false,
            position_ms: 0,
            duration_ms: 0,
            current_episode: None,
            playback_speed: speed,
            is_loading: false,
            error: None,
            scrubbing: false,
            finished: false,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        if self.is_loading {
            PlaybackStatus::Loading
        } else if self.current_episode.is_none() {
            PlaybackStatus::Empty
        } else if self.is_playing {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Paused
        }
    }

    /// Clamp a requested offset into `[0, duration_ms]`
    pub fn clamp_position(&self, position_ms: i64) -> u64 {
        position_ms.clamp(0, i64::try_from(self.duration_ms).unwrap_or(i64::MAX)) as u64
    }

    /// Fold a native status report in. Position is left alone while scrubbing.
    pub fn apply_status(&mut self, status: &PlayerStatus) {
        if let Some(duration_ms) = status.duration_ms {
            self.duration_ms = duration_ms;
        }
        if !self.scrubbing {
            self.position_ms = status.position_ms.min(self.duration_ms);
        }
    }

    pub fn episode_id(&self) -> Option<String> {
        self.current_episode.as_ref().map(|e| e.id.clone())
    }

    /// Drop everything tied to the loaded source, keeping the speed preference
    pub fn unload(&mut self) {
        *self = Self::new(self.playback_speed);
    }
}
