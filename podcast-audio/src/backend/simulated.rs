//! Clock-driven simulated backend
//!
//! Stands in for the platform player/recorder in the CLI harness and tests.
//! Playheads advance on the tokio clock, so tests running with a paused clock
//! observe exact positions. Acquisition latency and failures are configured
//! per URL, and every handle open/release is counted.

use super::{AudioBackend, BackendError, PlayerHandle, PlayerStatus, RecorderHandle, Releasable};
use crate::config::RecordingFormat;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Behaviour of one simulated audio URL
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    /// Media length in milliseconds
    pub duration_ms: u64,
    /// Time taken by `open_player`
    pub latency: Duration,
    /// If set, `open_player` fails with this reason
    pub load_failure: Option<String>,
    /// If true, `play` on the opened handle fails
    pub fail_play: bool,
    /// If true, `set_rate` on the opened handle fails
    pub fail_rate: bool,
    /// If true, the handle never reports a duration
    pub unknown_duration: bool,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self {
            duration_ms: 30 * 60 * 1000,
            latency: Duration::from_millis(50),
            load_failure: None,
            fail_play: false,
            fail_rate: false,
            unknown_duration: false,
        }
    }
}

impl SimulatedSource {
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.load_failure = Some(reason.into());
        self
    }

    pub fn failing_play(mut self) -> Self {
        self.fail_play = true;
        self
    }

    pub fn failing_rate(mut self) -> Self {
        self.fail_rate = true;
        self
    }

    pub fn without_duration(mut self) -> Self {
        self.unknown_duration = true;
        self
    }
}

/// Handle accounting shared by the backend and its handles
#[derive(Debug, Default)]
pub struct BackendStats {
    players_opened: AtomicUsize,
    players_released: AtomicUsize,
    recorders_opened: AtomicUsize,
    recorders_released: AtomicUsize,
    released_urls: Mutex<Vec<String>>,
}

impl BackendStats {
    pub fn players_opened(&self) -> usize {
        self.players_opened.load(Ordering::SeqCst)
    }

    pub fn players_released(&self) -> usize {
        self.players_released.load(Ordering::SeqCst)
    }

    /// Players opened but not yet released
    pub fn live_players(&self) -> usize {
        self.players_opened().saturating_sub(self.players_released())
    }

    pub fn recorders_opened(&self) -> usize {
        self.recorders_opened.load(Ordering::SeqCst)
    }

    pub fn live_recorders(&self) -> usize {
        self.recorders_opened()
            .saturating_sub(self.recorders_released.load(Ordering::SeqCst))
    }

    /// How many times a player bound to `url` was released
    pub fn release_count(&self, url: &str) -> usize {
        self.released_urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    fn record_player_release(&self, url: &str) {
        self.players_released.fetch_add(1, Ordering::SeqCst);
        self.released_urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
    }
}

/// Simulated backend (see module docs)
pub struct SimulatedBackend {
    sources: Mutex<HashMap<String, SimulatedSource>>,
    default_source: SimulatedSource,
    recordings_dir: PathBuf,
    recorder_denied: AtomicBool,
    stats: Arc<BackendStats>,
}

impl SimulatedBackend {
    /// Create a backend writing recording artifacts into `recordings_dir`
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            sources: Mutex::new(HashMap::new()),
            default_source: SimulatedSource::default(),
            recordings_dir: recordings_dir.into(),
            recorder_denied: AtomicBool::new(false),
            stats: Arc::new(BackendStats::default()),
        }
    }

    /// Behaviour for URLs without an explicit `with_source` entry
    pub fn with_default_source(mut self, source: SimulatedSource) -> Self {
        self.default_source = source;
        self
    }

    pub fn with_source(self, url: impl Into<String>, source: SimulatedSource) -> Self {
        self.set_source(url, source);
        self
    }

    /// Register or replace the behaviour of `url`
    pub fn set_source(&self, url: impl Into<String>, source: SimulatedSource) {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), source);
    }

    /// Make subsequent `open_recorder` calls fail with a permission error
    pub fn deny_recording(&self, denied: bool) {
        self.recorder_denied.store(denied, Ordering::SeqCst);
    }

    pub fn stats(&self) -> Arc<BackendStats> {
        Arc::clone(&self.stats)
    }

    fn source_for(&self, url: &str) -> SimulatedSource {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.default_source.clone())
    }
}

#[async_trait]
impl AudioBackend for SimulatedBackend {
    async fn open_player(&self, url: &str) -> Result<Box<dyn PlayerHandle>, BackendError> {
        let source = self.source_for(url);
        tokio::time::sleep(source.latency).await;

        if let Some(reason) = source.load_failure {
            warn!("Simulated load failure for {}: {}", url, reason);
            return Err(BackendError::Unavailable(reason));
        }

        self.stats.players_opened.fetch_add(1, Ordering::SeqCst);
        debug!("Simulated player opened: {} ({}ms)", url, source.duration_ms);
        Ok(Box::new(SimulatedPlayer {
            url: url.to_string(),
            duration_ms: source.duration_ms,
            report_duration: !source.unknown_duration,
            fail_play: source.fail_play,
            fail_rate: source.fail_rate,
            anchor_position_ms: 0,
            playing_since: None,
            rate: 1.0,
            stats: Arc::clone(&self.stats),
        }))
    }

    async fn open_recorder(
        &self,
        format: &RecordingFormat,
    ) -> Result<Box<dyn RecorderHandle>, BackendError> {
        if self.recorder_denied.load(Ordering::SeqCst) {
            return Err(BackendError::PermissionDenied("microphone access denied".to_string()));
        }

        tokio::fs::create_dir_all(&self.recordings_dir)
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let file_name = format!(
            "recording_{}_{}.{}",
            chrono::Utc::now().format("%Y%m%d_%H%M%S"),
            Uuid::new_v4().simple(),
            format.extension
        );
        let path = self.recordings_dir.join(file_name);

        self.stats.recorders_opened.fetch_add(1, Ordering::SeqCst);
        info!("Simulated recorder opened: {}", path.display());
        Ok(Box::new(SimulatedRecorder {
            path,
            format: format.clone(),
            captured: Duration::ZERO,
            capturing_since: Some(Instant::now()),
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct SimulatedPlayer {
    url: String,
    duration_ms: u64,
    report_duration: bool,
    fail_play: bool,
    fail_rate: bool,
    /// Playhead at the moment `playing_since` was taken (or while paused)
    anchor_position_ms: u64,
    playing_since: Option<Instant>,
    rate: f64,
    stats: Arc<BackendStats>,
}

impl SimulatedPlayer {
    fn position_ms(&self) -> u64 {
        match self.playing_since {
            Some(since) => {
                let advanced = since.elapsed().as_secs_f64() * 1000.0 * self.rate;
                (self.anchor_position_ms + advanced as u64).min(self.duration_ms)
            }
            None => self.anchor_position_ms,
        }
    }

    /// Fold elapsed play time into the anchor, restarting the clock if playing
    fn re_anchor(&mut self) {
        self.anchor_position_ms = self.position_ms();
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }
}

#[async_trait]
impl Releasable for SimulatedPlayer {
    async fn release(self: Box<Self>) {
        self.stats.record_player_release(&self.url);
        debug!("Simulated player released: {}", self.url);
    }
}

#[async_trait]
impl PlayerHandle for SimulatedPlayer {
    async fn play(&mut self) -> Result<(), BackendError> {
        if self.fail_play {
            return Err(BackendError::Failed(format!("output device lost for {}", self.url)));
        }
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), BackendError> {
        self.anchor_position_ms = self.position_ms();
        self.playing_since = None;
        Ok(())
    }

    async fn seek(&mut self, position_ms: u64) -> Result<(), BackendError> {
        self.anchor_position_ms = position_ms.min(self.duration_ms);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    async fn set_rate(&mut self, rate: f64) -> Result<(), BackendError> {
        if self.fail_rate {
            return Err(BackendError::Failed(format!("rate {} rejected for {}", rate, self.url)));
        }
        self.re_anchor();
        self.rate = rate;
        Ok(())
    }

    async fn status(&self) -> PlayerStatus {
        let position_ms = self.position_ms();
        let finished = self.duration_ms > 0 && position_ms >= self.duration_ms;
        PlayerStatus {
            position_ms,
            duration_ms: self.report_duration.then_some(self.duration_ms),
            playing: self.playing_since.is_some() && !finished,
            finished,
        }
    }
}

struct SimulatedRecorder {
    path: PathBuf,
    format: RecordingFormat,
    captured: Duration,
    capturing_since: Option<Instant>,
    stats: Arc<BackendStats>,
}

impl SimulatedRecorder {
    fn total_captured(&self) -> Duration {
        self.captured + self.capturing_since.map(|t| t.elapsed()).unwrap_or_default()
    }
}

/// Write `length` of silence as a WAV file
fn write_silence(
    path: PathBuf,
    format: RecordingFormat,
    length: Duration,
) -> Result<(), BackendError> {
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };
    let frames = (length.as_secs_f64() * format.sample_rate as f64) as u64;
    let samples = frames * u64::from(format.channels);

    let mut writer =
        hound::WavWriter::create(&path, spec).map_err(|e| BackendError::Failed(e.to_string()))?;
    for _ in 0..samples {
        writer
            .write_sample(0i32)
            .map_err(|e| BackendError::Failed(e.to_string()))?;
    }
    writer.finalize().map_err(|e| BackendError::Failed(e.to_string()))
}

#[async_trait]
impl Releasable for SimulatedRecorder {
    async fn release(self: Box<Self>) {
        self.stats.recorders_released.fetch_add(1, Ordering::SeqCst);
        debug!("Simulated recorder released: {}", self.path.display());
    }
}

#[async_trait]
impl RecorderHandle for SimulatedRecorder {
    async fn pause(&mut self) -> Result<(), BackendError> {
        if let Some(since) = self.capturing_since.take() {
            self.captured += since.elapsed();
        }
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), BackendError> {
        if self.capturing_since.is_none() {
            self.capturing_since = Some(Instant::now());
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<Option<String>, BackendError> {
        let length = self.total_captured();
        self.captured = length;
        self.capturing_since = None;

        if length.is_zero() {
            return Ok(None);
        }

        let path = self.path.clone();
        let format = self.format.clone();
        tokio::task::spawn_blocking(move || write_silence(path, format, length))
            .await
            .map_err(|e| BackendError::Failed(format!("writer task failed: {}", e)))??;

        info!("Recording written: {} ({:.1}s)", self.path.display(), length.as_secs_f64());
        Ok(Some(format!("file://{}", self.path.display())))
    }
}
