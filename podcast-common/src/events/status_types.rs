//! Playback and recording status enumerations
//!
//! Coarse states of the two engine sub-machines, as seen by observers.

use serde::{Deserialize, Serialize};

/// Playback sub-machine state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// No episode loaded
    #[default]
    Empty,
    /// Acquiring a player resource
    Loading,
    /// Loaded, not emitting audio
    Paused,
    /// Loaded and emitting audio
    Playing,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Empty => write!(f, "empty"),
            PlaybackStatus::Loading => write!(f, "loading"),
            PlaybackStatus::Paused => write!(f, "paused"),
            PlaybackStatus::Playing => write!(f, "playing"),
        }
    }
}

/// Recording sub-machine state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    /// No capture session
    #[default]
    Idle,
    /// Capturing audio
    Recording,
    /// Session open, capture suspended
    Paused,
}

impl std::fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingStatus::Idle => write!(f, "idle"),
            RecordingStatus::Recording => write!(f, "recording"),
            RecordingStatus::Paused => write!(f, "paused"),
        }
    }
}
