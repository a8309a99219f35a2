//! Event types for the podcast audio engine
//!
//! Provides the shared event definitions and the `EventBus` used by the engine
//! to notify UI layers (floating player, tab bar, recording screen) of state
//! changes. Observers re-derive their view from `AudioEngine::snapshot()` or
//! directly from event payloads; events carry no authority of their own.

mod status_types;

pub use status_types::{PlaybackStatus, RecordingStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Engine event types
///
/// Serialized with a `type` tag so they can be forwarded as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CastEvent {
    /// Playback sub-machine changed state
    PlaybackStateChanged {
        old_state: PlaybackStatus,
        new_state: PlaybackStatus,
        timestamp: DateTime<Utc>,
    },

    /// An episode finished loading and is ready to play
    EpisodeLoaded {
        episode_id: String,
        /// Duration reported by the resource (0 until known)
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Periodic playhead update, emitted by the position tracker while playing
    /// and once on every play/pause/seek.
    PlaybackProgress {
        episode_id: String,
        position_ms: u64,
        duration_ms: u64,
        playing: bool,
        timestamp: DateTime<Utc>,
    },

    /// The loaded episode played to its end
    PlaybackFinished {
        episode_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A load/play/seek operation failed
    ///
    /// `episode_id` is None when the failure left nothing loaded.
    PlaybackFailed {
        episode_id: Option<String>,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Playback rate multiplier changed
    SpeedChanged {
        speed: f64,
        timestamp: DateTime<Utc>,
    },

    /// Recording sub-machine changed state
    RecordingStateChanged {
        old_state: RecordingStatus,
        new_state: RecordingStatus,
        timestamp: DateTime<Utc>,
    },

    /// Elapsed recording time, once per second while capturing
    RecordingProgress {
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A recording session was finalized
    RecordingFinished {
        /// Artifact URI (None if nothing was captured)
        uri: Option<String>,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Both sub-machines were reset to defaults
    EngineCleanedUp { timestamp: DateTime<Utc> },

    /// Engine is being torn down at root unmount
    EngineShutdown { timestamp: DateTime<Utc> },
}

impl CastEvent {
    /// Event type name, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            CastEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            CastEvent::EpisodeLoaded { .. } => "EpisodeLoaded",
            CastEvent::PlaybackProgress { .. } => "PlaybackProgress",
            CastEvent::PlaybackFinished { .. } => "PlaybackFinished",
            CastEvent::PlaybackFailed { .. } => "PlaybackFailed",
            CastEvent::SpeedChanged { .. } => "SpeedChanged",
            CastEvent::RecordingStateChanged { .. } => "RecordingStateChanged",
            CastEvent::RecordingProgress { .. } => "RecordingProgress",
            CastEvent::RecordingFinished { .. } => "RecordingFinished",
            CastEvent::EngineCleanedUp { .. } => "EngineCleanedUp",
            CastEvent::EngineShutdown { .. } => "EngineShutdown",
        }
    }
}

/// Broadcast bus for engine events
///
/// Slow subscribers lag and lose the oldest events rather than blocking the
/// engine; progress events are superseded by the next tick anyway.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CastEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use podcast_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CastEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: CastEvent) -> Result<usize, broadcast::error::SendError<CastEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// # Examples
    ///
    /// ```
    /// use podcast_common::events::{CastEvent, EventBus};
    ///
    /// let event_bus = EventBus::new(16);
    /// event_bus.emit_lossy(CastEvent::RecordingProgress {
    ///     duration_ms: 3000,
    ///     timestamp: chrono::Utc::now(),
    /// });
    /// ```
    pub fn emit_lossy(&self, event: CastEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
