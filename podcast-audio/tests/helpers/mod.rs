//! Shared fixtures for podcast-audio integration tests
//!
//! - `Harness`: engine over a `SimulatedBackend` writing into a temp dir
//! - Episode fixtures with distinct URLs
//! - Event draining

#![allow(dead_code)]

use podcast_audio::backend::{BackendStats, SimulatedBackend};
use podcast_audio::{AudioEngine, EngineConfig};
use podcast_common::events::CastEvent;
use podcast_common::Episode;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::broadcast;

pub const URL_A: &str = "https://cdn.example.com/show/episode-a.mp3";
pub const URL_B: &str = "https://cdn.example.com/show/episode-b.mp3";
pub const URL_C: &str = "https://cdn.example.com/show/episode-c.mp3";

pub struct Harness {
    pub engine: Arc<AudioEngine>,
    pub backend: Arc<SimulatedBackend>,
    pub stats: Arc<BackendStats>,
    pub dir: TempDir,
}

/// Engine with default config; `setup` configures the backend's sources
pub fn harness(setup: impl FnOnce(SimulatedBackend) -> SimulatedBackend) -> Harness {
    harness_with_config(EngineConfig::default(), setup)
}

pub fn harness_with_config(
    config: EngineConfig,
    setup: impl FnOnce(SimulatedBackend) -> SimulatedBackend,
) -> Harness {
    let dir = tempfile::tempdir().expect("temp dir");
    let backend = Arc::new(setup(SimulatedBackend::new(dir.path())));
    let stats = backend.stats();
    let engine = Arc::new(AudioEngine::new(backend.clone(), config));
    Harness {
        engine,
        backend,
        stats,
        dir,
    }
}

pub fn episode(id: &str, url: &str) -> Episode {
    Episode::new(id, format!("Episode {}", id), url)
        .with_podcast_id("podcast-1")
        .with_episode_number(1)
}

pub fn episode_a() -> Episode {
    episode("a", URL_A)
}

pub fn episode_b() -> Episode {
    episode("b", URL_B)
}

pub fn episode_c() -> Episode {
    episode("c", URL_C)
}

/// Everything currently buffered on `rx`
pub fn drain(rx: &mut broadcast::Receiver<CastEvent>) -> Vec<CastEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn event_types(events: &[CastEvent]) -> Vec<&'static str> {
    events.iter().map(CastEvent::event_type).collect()
}
