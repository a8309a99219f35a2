//! Recording operations

use super::core::{emit_recording_transition, AudioEngine};
use super::task::ScopedTask;
use crate::backend::Releasable;
use crate::error::{Error, Result};
use podcast_common::events::{CastEvent, RecordingStatus};
use podcast_common::time::now;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

const RECORDING_TICK: Duration = Duration::from_secs(1);

impl AudioEngine {
    /// Acquire the recorder and begin capture with the configured format
    ///
    /// Fails with `RecorderBusy` if a session exists, or `RecordingStart` if
    /// the backend refuses (state stays Idle). With exclusive audio, playback
    /// is paused once capture has started.
    pub async fn start_recording(&self) -> Result<()> {
        {
            let mut slot = self.recording.lock().await;
            if slot.recorder.is_live() {
                return Err(Error::RecorderBusy);
            }

            let format = &self.config.recording;
            let limit = self.config.load_timeout();
            let handle = match timeout(limit, self.backend.open_recorder(format)).await {
                Ok(Ok(handle)) => handle,
                Ok(Err(e)) => {
                    error!("Could not start recording: {}", e);
                    return Err(Error::RecordingStart(e.to_string()));
                }
                Err(_) => {
                    error!("Recorder acquisition timed out");
                    return Err(Error::RecordingStart(format!(
                        "timed out after {}ms",
                        self.config.load_timeout_ms
                    )));
                }
            };

            slot.recorder.replace(handle).await;
            let before = slot.state.status;
            slot.state.begin();
            slot.ticker = Some(self.spawn_recording_ticker());
            self.recording_active.store(true, Ordering::SeqCst);

            info!(
                "Recording started ({} Hz, {} ch, {}-bit)",
                format.sample_rate, format.channels, format.bits_per_sample
            );
            emit_recording_transition(&self.events, before, slot.state.status);
        }

        if self.config.exclusive_audio {
            let mut playback = self.playback.lock().await;
            if playback.state.is_playing {
                info!("Pausing playback for recording");
                if let Err(e) = self.pause_locked(&mut playback).await {
                    warn!("Could not pause playback for recording: {}", e);
                }
            }
        }
        Ok(())
    }

    /// Suspend capture and freeze the elapsed counter. No-op unless recording.
    pub async fn pause_recording(&self) -> Result<()> {
        let mut slot = self.recording.lock().await;
        if slot.state.status != RecordingStatus::Recording {
            return Ok(());
        }
        if let Some(recorder) = slot.recorder.get_mut() {
            recorder
                .pause()
                .await
                .map_err(|e| Error::Recording(format!("pause failed: {}", e)))?;
        }

        slot.state.pause();
        debug!("Recording paused at {}ms", slot.state.duration_ms());
        emit_recording_transition(&self.events, RecordingStatus::Recording, slot.state.status);
        Ok(())
    }

    /// Continue capture from the frozen counter. No-op unless paused.
    pub async fn resume_recording(&self) -> Result<()> {
        let mut slot = self.recording.lock().await;
        if slot.state.status != RecordingStatus::Paused {
            return Ok(());
        }
        if let Some(recorder) = slot.recorder.get_mut() {
            recorder
                .resume()
                .await
                .map_err(|e| Error::Recording(format!("resume failed: {}", e)))?;
        }

        slot.state.resume();
        debug!("Recording resumed");
        emit_recording_transition(&self.events, RecordingStatus::Paused, slot.state.status);
        Ok(())
    }

    /// Finalize capture and release the recorder
    ///
    /// Returns the artifact URI, or None if nothing was captured or no session
    /// was active. The recorder is released and state reset even if
    /// finalization fails.
    pub async fn stop_recording(&self) -> Result<Option<String>> {
        let mut slot = self.recording.lock().await;
        let Some(mut recorder) = slot.recorder.take() else {
            return Ok(None);
        };

        slot.ticker = None;
        let duration_ms = slot.state.duration_ms();
        let outcome = recorder.stop().await;
        recorder.release().await;

        let before = slot.state.status;
        slot.state.reset();
        self.recording_active.store(false, Ordering::SeqCst);
        emit_recording_transition(&self.events, before, slot.state.status);

        let uri = outcome.map_err(|e| {
            error!("Recording finalization failed: {}", e);
            Error::Recording(format!("stop failed: {}", e))
        })?;

        info!("Recording stopped after {}ms", duration_ms);
        self.events.emit_lossy(CastEvent::RecordingFinished {
            uri: uri.clone(),
            duration_ms,
            timestamp: now(),
        });
        Ok(uri)
    }

    fn spawn_recording_ticker(&self) -> ScopedTask {
        let slot = Arc::downgrade(&self.recording);
        let events = self.events.clone();

        ScopedTask::spawn_periodic("recording ticker", RECORDING_TICK, move |token| {
            let slot = slot.clone();
            let events = events.clone();
            async move {
                let Some(shared) = slot.upgrade() else {
                    return false;
                };
                let guard = shared.lock().await;
                if token.is_cancelled() {
                    return false;
                }
                if guard.state.is_recording() {
                    events.emit_lossy(CastEvent::RecordingProgress {
                        duration_ms: guard.state.duration_ms(),
                        timestamp: now(),
                    });
                }
                true
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimulatedBackend;
    use crate::config::EngineConfig;

    fn engine(dir: &std::path::Path) -> (AudioEngine, Arc<SimulatedBackend>) {
        let backend = Arc::new(SimulatedBackend::new(dir));
        let engine = AudioEngine::new(backend.clone(), EngineConfig::default());
        (engine, backend)
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_busy() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, backend) = engine(dir.path());

        engine.start_recording().await.unwrap();
        assert!(matches!(engine.start_recording().await, Err(Error::RecorderBusy)));
        assert_eq!(backend.stats().live_recorders(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume_are_noops_in_wrong_state() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _backend) = engine(dir.path());

        engine.pause_recording().await.unwrap();
        engine.resume_recording().await.unwrap();
        assert_eq!(engine.snapshot().await.recording.status, RecordingStatus::Idle);

        engine.start_recording().await.unwrap();
        engine.resume_recording().await.unwrap();
        assert_eq!(engine.snapshot().await.recording.status, RecordingStatus::Recording);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _backend) = engine(dir.path());
        assert_eq!(engine.stop_recording().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _backend) = engine(dir.path());
        let mut rx = engine.subscribe_events();

        engine.start_recording().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        let mut ticks = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let CastEvent::RecordingProgress { duration_ms, .. } = event {
                ticks.push(duration_ms);
            }
        }
        assert_eq!(ticks, vec![1_000, 2_000]);
    }
}
