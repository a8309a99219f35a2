//! Playback operations
//!
//! **Responsibilities:**
//! - Load with stale-result discard (generation counter)
//! - Transport: play, pause, stop (rewind), unload, seek, skip, toggle
//! - Scrubbing and speed control
//! - Position tracker lifecycle (running exactly while Playing)

use super::core::{emit_playback_transition, emit_progress, AudioEngine, PlaybackSlot};
use super::task::ScopedTask;
use crate::backend::{BackendError, PlayerHandle, Releasable};
use crate::error::{Error, Result};
use crate::playback::{next_speed, speed::is_step};
use podcast_common::events::{CastEvent, EventBus, PlaybackStatus};
use podcast_common::time::now;
use podcast_common::Episode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Result of a load that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The episode is loaded and paused at 0
    Loaded,
    /// A later load/unload/cleanup took over; the acquired handle was released
    Superseded,
}

impl AudioEngine {
    /// Load `episode`, releasing whatever was loaded before
    ///
    /// Never starts playback. While the acquisition is in flight the engine is
    /// `Loading` and transport actions are no-ops. If another load, `unload`
    /// or `cleanup` runs before this one completes, the late handle is released
    /// and `LoadOutcome::Superseded` is returned without touching state.
    pub async fn load_episode(&self, episode: Episode) -> Result<LoadOutcome> {
        if !episode.has_source() {
            warn!("Rejecting episode {} with empty audio URL", episode.id);
            return Err(Error::InvalidSource {
                episode_id: episode.id,
            });
        }

        let generation = {
            let mut slot = self.playback.lock().await;
            let before = slot.state.status();
            slot.generation += 1;
            slot.tracker = None;
            slot.player.release().await;
            slot.state.unload();
            slot.state.is_loading = true;
            emit_playback_transition(&self.events, before, slot.state.status());
            slot.generation
        };

        let url = episode.audio_url.trim().to_string();
        info!("Loading episode {} from {}", episode.id, url);

        let opened = timeout(self.config.load_timeout(), self.backend.open_player(&url)).await;
        let acquired = match opened {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(e)) => Err(Error::Load {
                url: url.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Err(Error::LoadTimeout {
                url: url.clone(),
                timeout_ms: self.config.load_timeout_ms,
            }),
        };

        let mut slot = self.playback.lock().await;
        if slot.generation != generation {
            debug!("Load of episode {} superseded, discarding result", episode.id);
            if let Ok(handle) = acquired {
                handle.release().await;
            }
            return Ok(LoadOutcome::Superseded);
        }

        let mut handle = match acquired {
            Ok(handle) => handle,
            Err(e) => {
                error!("Load of episode {} failed: {}", episode.id, e);
                slot.state.is_loading = false;
                slot.state.error = Some(e.to_string());
                self.events.emit_lossy(CastEvent::PlaybackFailed {
                    episode_id: None,
                    message: e.to_string(),
                    timestamp: now(),
                });
                let after = slot.state.status();
                emit_playback_transition(&self.events, PlaybackStatus::Loading, after);
                return Err(e);
            }
        };

        let speed = slot.state.playback_speed;
        if let Err(e) = handle.set_rate(speed).await {
            warn!("Could not apply speed {} to {}: {}", speed, url, e);
        }
        let status = handle.status().await;
        slot.player.replace(handle).await;

        let duration_ms = status.duration_ms.unwrap_or(0);
        slot.state.is_loading = false;
        slot.state.error = None;
        slot.state.position_ms = 0;
        slot.state.duration_ms = duration_ms;
        slot.state.current_episode = Some(episode.clone());

        info!("Loaded episode {} ({}ms)", episode.id, duration_ms);
        self.events.emit_lossy(CastEvent::EpisodeLoaded {
            episode_id: episode.id,
            duration_ms,
            timestamp: now(),
        });
        emit_playback_transition(&self.events, PlaybackStatus::Loading, slot.state.status());
        Ok(LoadOutcome::Loaded)
    }

    /// Start or resume playback
    ///
    /// No-op while loading or already playing. After the media finished,
    /// playback restarts from 0.
    pub async fn play(&self) -> Result<()> {
        let mut slot = self.playback.lock().await;
        if slot.state.is_loading {
            debug!("play ignored while loading");
            return Ok(());
        }
        self.play_locked(&mut slot).await
    }

    /// Pause playback, keeping the position. No-op unless playing.
    pub async fn pause(&self) -> Result<()> {
        let mut slot = self.playback.lock().await;
        if slot.state.is_loading || !slot.state.is_playing {
            return Ok(());
        }
        self.pause_locked(&mut slot).await
    }

    /// Play if paused, pause if playing
    ///
    /// Decided and applied under one lock acquisition, so a concurrent
    /// transport call cannot land between the check and the action.
    pub async fn toggle_play_pause(&self) -> Result<()> {
        let mut slot = self.playback.lock().await;
        if slot.state.is_loading {
            debug!("toggle ignored while loading");
            return Ok(());
        }
        if slot.state.is_playing {
            self.pause_locked(&mut slot).await
        } else {
            self.play_locked(&mut slot).await
        }
    }

    async fn play_locked(&self, slot: &mut PlaybackSlot) -> Result<()> {
        if self.config.exclusive_audio && self.recording_active.load(Ordering::SeqCst) {
            return Err(Error::RecordingActive);
        }
        if slot.state.current_episode.is_none() {
            return Err(Error::NothingLoaded);
        }
        if let Some(message) = &slot.state.error {
            return Err(Error::Playback(format!("{} (reload required)", message)));
        }
        if slot.state.is_playing {
            return Ok(());
        }

        let before = slot.state.status();
        let restart = slot.state.finished;
        let outcome = match slot.player.get_mut() {
            Some(player) => start_player(player, restart).await,
            None => return Err(Error::NothingLoaded),
        };
        if let Err(e) = outcome {
            return Err(self.fail_locked(slot, e));
        }

        if restart {
            slot.state.position_ms = 0;
            slot.state.finished = false;
        }
        slot.state.is_playing = true;
        slot.tracker = Some(self.spawn_position_tracker());

        emit_playback_transition(&self.events, before, slot.state.status());
        emit_progress(&self.events, &slot.state);
        Ok(())
    }

    /// Rewind: pause and return to 0, keeping the episode loaded
    pub async fn stop(&self) -> Result<()> {
        let mut slot = self.playback.lock().await;
        if slot.state.is_loading || slot.state.current_episode.is_none() {
            return Ok(());
        }

        let before = slot.state.status();
        slot.tracker = None;
        let outcome = match slot.player.get_mut() {
            Some(player) => rewind_player(player).await,
            None => Ok(()),
        };

        slot.state.is_playing = false;
        slot.state.scrubbing = false;
        if let Err(e) = outcome {
            return Err(self.fail_locked(&mut slot, e));
        }
        slot.state.position_ms = 0;
        slot.state.finished = false;

        debug!("Playback stopped and rewound");
        emit_playback_transition(&self.events, before, slot.state.status());
        emit_progress(&self.events, &slot.state);
        Ok(())
    }

    /// Full stop: release the player and forget the episode
    ///
    /// The speed preference survives. Supersedes an in-flight load.
    pub async fn unload(&self) {
        let mut slot = self.playback.lock().await;
        let before = slot.state.status();
        slot.generation += 1;
        slot.tracker = None;
        if slot.player.release().await {
            info!("Episode unloaded");
        }
        slot.state.unload();
        emit_playback_transition(&self.events, before, slot.state.status());
    }

    /// Seek to `position_ms`, clamped into `[0, duration]`
    pub async fn seek_to(&self, position_ms: i64) -> Result<()> {
        let mut slot = self.playback.lock().await;
        if slot.state.is_loading {
            debug!("seek ignored while loading");
            return Ok(());
        }
        if slot.state.current_episode.is_none() {
            return Err(Error::NothingLoaded);
        }
        self.seek_locked(&mut slot, position_ms).await
    }

    /// Skip ahead by the configured amount
    pub async fn skip_forward(&self) -> Result<()> {
        self.skip_forward_by(self.config.skip_forward_secs).await
    }

    /// Skip back by the configured amount
    pub async fn skip_backward(&self) -> Result<()> {
        self.skip_backward_by(self.config.skip_backward_secs).await
    }

    pub async fn skip_forward_by(&self, secs: u64) -> Result<()> {
        self.skip_by(secs_to_offset(secs)).await
    }

    pub async fn skip_backward_by(&self, secs: u64) -> Result<()> {
        self.skip_by(-secs_to_offset(secs)).await
    }

    async fn skip_by(&self, offset_ms: i64) -> Result<()> {
        let mut slot = self.playback.lock().await;
        if slot.state.is_loading {
            return Ok(());
        }
        if slot.state.current_episode.is_none() {
            return Err(Error::NothingLoaded);
        }
        let from = i64::try_from(slot.state.position_ms).unwrap_or(i64::MAX);
        self.seek_locked(&mut slot, from.saturating_add(offset_ms)).await
    }

    /// Start an interactive drag; the tracker stops writing the position
    pub async fn begin_scrub(&self) {
        let mut slot = self.playback.lock().await;
        if slot.state.is_loading || slot.state.current_episode.is_none() {
            return;
        }
        slot.state.scrubbing = true;
    }

    /// Move the displayed position during a drag without seeking
    pub async fn scrub_to(&self, position_ms: i64) {
        let mut slot = self.playback.lock().await;
        if slot.state.scrubbing {
            slot.state.position_ms = slot.state.clamp_position(position_ms);
        }
    }

    /// Finish a drag by seeking to `position_ms`
    pub async fn end_scrub(&self, position_ms: i64) -> Result<()> {
        let mut slot = self.playback.lock().await;
        slot.state.scrubbing = false;
        if slot.state.is_loading || slot.state.current_episode.is_none() {
            return Ok(());
        }
        self.seek_locked(&mut slot, position_ms).await
    }

    /// Set the rate multiplier; kept as the preference for later loads
    ///
    /// Ignored while loading.
    pub async fn set_playback_speed(&self, speed: f64) -> Result<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Error::InvalidSpeed(speed));
        }

        let mut slot = self.playback.lock().await;
        if slot.state.is_loading {
            debug!("speed change ignored while loading");
            return Ok(());
        }
        self.set_speed_locked(&mut slot, speed).await
    }

    /// Advance to the next speed step, wrapping to the slowest
    ///
    /// Returns the speed in effect afterwards; while loading that is the
    /// unchanged current speed.
    pub async fn cycle_playback_speed(&self) -> Result<f64> {
        let mut slot = self.playback.lock().await;
        let current = slot.state.playback_speed;
        if slot.state.is_loading {
            debug!("speed cycle ignored while loading");
            return Ok(current);
        }
        self.set_speed_locked(&mut slot, next_speed(current)).await?;
        Ok(slot.state.playback_speed)
    }

    /// Apply `speed` to the live player and store it. A rate failure is a
    /// resource failure like any other transport error.
    async fn set_speed_locked(&self, slot: &mut PlaybackSlot, speed: f64) -> Result<()> {
        let outcome = match slot.player.get_mut() {
            Some(player) => player.set_rate(speed).await,
            None => Ok(()),
        };
        if let Err(e) = outcome {
            return Err(self.fail_locked(slot, e));
        }
        slot.state.playback_speed = speed;

        if is_step(speed) {
            debug!("Playback speed set to {}", speed);
        } else {
            debug!("Playback speed set to {} (between steps)", speed);
        }
        self.events.emit_lossy(CastEvent::SpeedChanged {
            speed,
            timestamp: now(),
        });
        Ok(())
    }

    /// Pause a playing resource. Caller holds the playback lock.
    pub(super) async fn pause_locked(&self, slot: &mut PlaybackSlot) -> Result<()> {
        let before = slot.state.status();
        slot.tracker = None;

        let outcome = match slot.player.get_mut() {
            Some(player) => match player.pause().await {
                Ok(()) => Ok(Some(player.status().await)),
                Err(e) => Err(e),
            },
            None => Ok(None),
        };

        let status = match outcome {
            Ok(status) => status,
            Err(e) => return Err(self.fail_locked(slot, e)),
        };
        if let Some(status) = status {
            slot.state.apply_status(&status);
        }
        slot.state.is_playing = false;

        emit_playback_transition(&self.events, before, slot.state.status());
        emit_progress(&self.events, &slot.state);
        Ok(())
    }

    async fn seek_locked(&self, slot: &mut PlaybackSlot, position_ms: i64) -> Result<()> {
        let target = slot.state.clamp_position(position_ms);
        let outcome = match slot.player.get_mut() {
            Some(player) => player.seek(target).await,
            None => return Err(Error::NothingLoaded),
        };
        if let Err(e) = outcome {
            return Err(self.fail_locked(slot, e));
        }

        slot.state.position_ms = target;
        if target < slot.state.duration_ms {
            slot.state.finished = false;
        }
        debug!("Seeked to {}ms", target);
        emit_progress(&self.events, &slot.state);
        Ok(())
    }

    /// Record a resource failure. The episode stays loaded; `can_play` turns
    /// false until the next successful load.
    fn fail_locked(&self, slot: &mut PlaybackSlot, cause: BackendError) -> Error {
        let before = slot.state.status();
        let message = cause.to_string();
        error!("Playback failure: {}", message);

        slot.tracker = None;
        slot.state.is_playing = false;
        slot.state.error = Some(message.clone());

        self.events.emit_lossy(CastEvent::PlaybackFailed {
            episode_id: slot.state.episode_id(),
            message: message.clone(),
            timestamp: now(),
        });
        emit_playback_transition(&self.events, before, slot.state.status());
        Error::Playback(message)
    }

    fn spawn_position_tracker(&self) -> ScopedTask {
        let slot = Arc::downgrade(&self.playback);
        let events = self.events.clone();

        ScopedTask::spawn_periodic(
            "position tracker",
            self.config.position_interval(),
            move |token| {
                let slot = slot.clone();
                let events = events.clone();
                async move {
                    let Some(shared) = slot.upgrade() else {
                        return false;
                    };
                    let mut guard = shared.lock().await;
                    if token.is_cancelled() {
                        return false;
                    }
                    let keep_running = track_position(&mut guard, &events).await;
                    keep_running
                }
            },
        )
    }
}

/// One tracker tick. Returns false once the tracker should stop.
async fn track_position(slot: &mut PlaybackSlot, events: &EventBus) -> bool {
    let status = match slot.player.get() {
        Some(player) => player.status().await,
        None => return false,
    };
    slot.state.apply_status(&status);

    if !status.finished {
        emit_progress(events, &slot.state);
        return true;
    }

    if let Some(player) = slot.player.get_mut() {
        if let Err(e) = player.pause().await {
            warn!("Pause at end of media failed: {}", e);
        }
    }
    let before = slot.state.status();
    slot.state.is_playing = false;
    slot.state.finished = true;
    // A drag in progress keeps its position; end_scrub commits it
    if !slot.state.scrubbing {
        slot.state.position_ms = slot.state.duration_ms;
    }

    let episode_id = slot.state.episode_id().unwrap_or_default();
    info!("Episode {} finished", episode_id);
    emit_progress(events, &slot.state);
    events.emit_lossy(CastEvent::PlaybackFinished {
        episode_id,
        timestamp: now(),
    });
    emit_playback_transition(events, before, slot.state.status());

    // Drops this task's own handle; nothing below may await.
    slot.tracker = None;
    false
}

async fn start_player(
    player: &mut dyn PlayerHandle,
    from_start: bool,
) -> std::result::Result<(), BackendError> {
    if from_start {
        player.seek(0).await?;
    }
    player.play().await
}

async fn rewind_player(player: &mut dyn PlayerHandle) -> std::result::Result<(), BackendError> {
    player.pause().await?;
    player.seek(0).await
}

fn secs_to_offset(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}
