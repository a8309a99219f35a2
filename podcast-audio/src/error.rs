//! Error types for podcast-audio
//!
//! Every async engine operation reports failure to its caller through these
//! variants. The engine leaves its state consistent and queryable after any
//! of them; presentation is the UI layer's concern.

use thiserror::Error;

/// Failure categories surfaced to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing audio URL at load time
    InvalidSource,
    /// Player resource acquisition failed
    Load,
    /// A loaded resource failed during play/seek/rate change
    Playback,
    /// Capture resource could not be acquired
    RecordingStart,
    /// Failure while a recording session was active
    Recording,
    /// Caller asked for something the current state does not allow
    InvalidState,
    /// Configuration or environment problem
    Internal,
}

/// Main error type for podcast-audio
#[derive(Error, Debug)]
pub enum Error {
    /// Episode has an empty or blank audio URL
    #[error("Invalid audio source for episode {episode_id}: audio URL is empty")]
    InvalidSource { episode_id: String },

    /// Backend could not acquire a player for the URL
    #[error("Failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    /// Acquisition did not finish within the configured timeout
    #[error("Timed out after {timeout_ms}ms loading {url}")]
    LoadTimeout { url: String, timeout_ms: u64 },

    /// Loaded resource failed during a transport operation
    #[error("Playback error: {0}")]
    Playback(String),

    /// Transport action needs a loaded episode
    #[error("No episode loaded")]
    NothingLoaded,

    /// Speed multiplier must be a positive finite number
    #[error("Invalid playback speed: {0}")]
    InvalidSpeed(f64),

    /// Capture resource could not be acquired (permission/device)
    #[error("Failed to start recording: {0}")]
    RecordingStart(String),

    /// A recording session already owns the capture resource
    #[error("A recording is already in progress")]
    RecorderBusy,

    /// Playback refused because recording owns the audio session
    #[error("Cannot play while a recording is active")]
    RecordingActive,

    /// Failure during pause/resume/stop of an active recording
    #[error("Recording error: {0}")]
    Recording(String),

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors bubbled up from podcast-common
    #[error(transparent)]
    Common(#[from] podcast_common::Error),
}

impl Error {
    /// Map to the coarse failure category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidSource { .. } => ErrorKind::InvalidSource,
            Error::Load { .. } | Error::LoadTimeout { .. } => ErrorKind::Load,
            Error::Playback(_) => ErrorKind::Playback,
            Error::RecordingStart(_) => ErrorKind::RecordingStart,
            Error::Recording(_) => ErrorKind::Recording,
            Error::NothingLoaded
            | Error::InvalidSpeed(_)
            | Error::RecorderBusy
            | Error::RecordingActive => ErrorKind::InvalidState,
            Error::Config(_) | Error::Common(_) => ErrorKind::Internal,
        }
    }

    /// Check if the caller can retry (possibly with different input)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Internal)
    }
}

/// Convenience Result type using podcast-audio Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let load = Error::LoadTimeout { url: "u".into(), timeout_ms: 10 };
        assert_eq!(load.kind(), ErrorKind::Load);
        assert_eq!(Error::RecorderBusy.kind(), ErrorKind::InvalidState);
        assert_eq!(
            Error::InvalidSource { episode_id: "x".into() }.kind(),
            ErrorKind::InvalidSource
        );
    }

    #[test]
    fn test_recoverability() {
        assert!(Error::Playback("device lost".into()).is_recoverable());
        assert!(!Error::Config("bad".into()).is_recoverable());
    }

    #[test]
    fn test_display_mentions_url() {
        let err = Error::Load { url: "https://x/a.mp3".into(), reason: "404".into() };
        assert_eq!(err.to_string(), "Failed to load https://x/a.mp3: 404");
    }
}
