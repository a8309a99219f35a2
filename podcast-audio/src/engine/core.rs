//! Core audio engine - construction, lifecycle and snapshots
//!
//! Each sub-machine lives behind its own FIFO `tokio::sync::Mutex`, so
//! operations on it apply in call order. The two locks are never held at the
//! same time.

use super::snapshot::{EngineSnapshot, PlaybackView, RecordingView};
use super::task::ScopedTask;
use crate::backend::{AudioBackend, HandleSlot, PlayerHandle, RecorderHandle};
use crate::config::EngineConfig;
use crate::playback::PlaybackState;
use crate::recording::RecordingState;
use podcast_common::events::{CastEvent, EventBus, PlaybackStatus, RecordingStatus};
use podcast_common::time::now;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

/// Playback sub-machine: state, the live player, load generation, tracker
pub(super) struct PlaybackSlot {
    pub(super) state: PlaybackState,
    pub(super) player: HandleSlot<dyn PlayerHandle>,
    /// Bumped by every load/unload/cleanup; stale acquisitions compare against it
    pub(super) generation: u64,
    /// Present exactly while `state.is_playing`
    pub(super) tracker: Option<ScopedTask>,
}

/// Recording sub-machine: state, the live recorder, progress ticker
pub(super) struct RecordingSlot {
    pub(super) state: RecordingState,
    pub(super) recorder: HandleSlot<dyn RecorderHandle>,
    pub(super) ticker: Option<ScopedTask>,
}

/// Podcast audio engine
///
/// One instance per application, shared as `Arc<AudioEngine>`. All operations
/// take `&self`. Dropping the engine cancels its background tasks; call
/// [`AudioEngine::shutdown`] first to release native handles explicitly.
pub struct AudioEngine {
    pub(super) backend: Arc<dyn AudioBackend>,
    pub(super) config: EngineConfig,
    pub(super) events: EventBus,
    pub(super) playback: Arc<Mutex<PlaybackSlot>>,
    pub(super) recording: Arc<Mutex<RecordingSlot>>,
    /// Mirrors "a recorder is live" for the exclusivity check in `play`
    pub(super) recording_active: Arc<AtomicBool>,
}

impl AudioEngine {
    /// Create an engine over `backend`. Nothing is acquired until first use.
    pub fn new(backend: Arc<dyn AudioBackend>, config: EngineConfig) -> Self {
        info!(
            "Audio engine created (tracker {}ms, load timeout {}ms, exclusive audio: {})",
            config.position_interval_ms, config.load_timeout_ms, config.exclusive_audio
        );

        let events = EventBus::new(config.event_capacity);
        let playback = PlaybackSlot {
            state: PlaybackState::new(config.default_speed),
            player: HandleSlot::new("player"),
            generation: 0,
            tracker: None,
        };
        let recording = RecordingSlot {
            state: RecordingState::default(),
            recorder: HandleSlot::new("recorder"),
            ticker: None,
        };

        Self {
            backend,
            config,
            events,
            playback: Arc::new(Mutex::new(playback)),
            recording: Arc::new(Mutex::new(recording)),
            recording_active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Subscribe to engine events emitted after this call
    pub fn subscribe_events(&self) -> broadcast::Receiver<CastEvent> {
        self.events.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    /// Read-only projection of both sub-machines
    ///
    /// Each sub-machine is copied under its own lock; the two halves are each
    /// internally consistent.
    pub async fn snapshot(&self) -> EngineSnapshot {
        let playback = {
            let slot = self.playback.lock().await;
            PlaybackView::from_state(&slot.state)
        };
        let recording = {
            let slot = self.recording.lock().await;
            RecordingView::from_state(&slot.state)
        };
        EngineSnapshot { playback, recording }
    }

    /// Reset both sub-machines to defaults, releasing every handle
    ///
    /// Idempotent and infallible. Any in-flight load is superseded. An active
    /// recording is discarded without producing an artifact.
    pub async fn cleanup(&self) {
        {
            let mut slot = self.playback.lock().await;
            let before = slot.state.status();
            slot.generation += 1;
            slot.tracker = None;
            slot.player.release().await;
            slot.state = PlaybackState::new(self.config.default_speed);
            emit_playback_transition(&self.events, before, slot.state.status());
        }
        {
            let mut slot = self.recording.lock().await;
            let before = slot.state.status;
            slot.ticker = None;
            slot.recorder.release().await;
            slot.state.reset();
            self.recording_active.store(false, Ordering::SeqCst);
            emit_recording_transition(&self.events, before, slot.state.status);
        }

        self.events.emit_lossy(CastEvent::EngineCleanedUp { timestamp: now() });
        debug!("Audio engine cleaned up");
    }

    /// Root-teardown path: `cleanup` followed by a final `EngineShutdown` event
    pub async fn shutdown(&self) {
        info!("Shutting down audio engine");
        self.cleanup().await;
        self.events.emit_lossy(CastEvent::EngineShutdown { timestamp: now() });
        info!("Audio engine shut down");
    }
}

pub(super) fn emit_playback_transition(
    events: &EventBus,
    old: PlaybackStatus,
    new: PlaybackStatus,
) {
    if old != new {
        debug!("Playback: {} -> {}", old, new);
        events.emit_lossy(CastEvent::PlaybackStateChanged {
            old_state: old,
            new_state: new,
            timestamp: now(),
        });
    }
}

pub(super) fn emit_recording_transition(
    events: &EventBus,
    old: RecordingStatus,
    new: RecordingStatus,
) {
    if old != new {
        debug!("Recording: {} -> {}", old, new);
        events.emit_lossy(CastEvent::RecordingStateChanged {
            old_state: old,
            new_state: new,
            timestamp: now(),
        });
    }
}

/// Current playhead as a `PlaybackProgress` event (nothing if unloaded)
pub(super) fn emit_progress(events: &EventBus, state: &PlaybackState) {
    if let Some(episode_id) = state.episode_id() {
        events.emit_lossy(CastEvent::PlaybackProgress {
            episode_id,
            position_ms: state.position_ms,
            duration_ms: state.duration_ms,
            playing: state.is_playing,
            timestamp: now(),
        });
    }
}
