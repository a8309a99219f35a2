//! Episode metadata consumed by the audio engine
//!
//! Episodes are owned by the backend data layer; the engine only keeps a copy
//! of the one it has loaded so the UI can decide whether to show player
//! controls at all.

use serde::{Deserialize, Serialize};

/// A playable unit: metadata plus the audio URL to stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Backend identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Remote or local audio URL (must be non-empty to load)
    pub audio_url: String,
    /// Advertised length in milliseconds (0 when unknown)
    #[serde(default)]
    pub duration_ms: u64,
    /// Position within the podcast, if numbered
    #[serde(default)]
    pub episode_number: Option<u32>,
    /// Owning podcast identifier
    #[serde(default)]
    pub podcast_id: String,
}

impl Episode {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        audio_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            audio_url: audio_url.into(),
            duration_ms: 0,
            episode_number: None,
            podcast_id: String::new(),
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_episode_number(mut self, episode_number: u32) -> Self {
        self.episode_number = Some(episode_number);
        self
    }

    pub fn with_podcast_id(mut self, podcast_id: impl Into<String>) -> Self {
        self.podcast_id = podcast_id.into();
        self
    }

    /// True if the audio URL is usable as a load source
    pub fn has_source(&self) -> bool {
        !self.audio_url.trim().is_empty()
    }
}
