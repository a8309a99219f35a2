//! Native audio resource seam
//!
//! The engine never talks to a platform player or recorder directly. It asks
//! an `AudioBackend` for exclusively-owned handles and keeps at most one of
//! each in a `HandleSlot`.
//!
//! **Responsibilities:**
//! - `AudioBackend`: acquire player/recorder handles (async, may fail)
//! - `PlayerHandle` / `RecorderHandle`: transport and capture primitives
//! - `Releasable`: explicit async release, consuming the handle
//!
//! Implementations: `SimulatedBackend` (clock-driven, used by the CLI harness
//! and tests). Platform adapters live with the mobile shell.

mod simulated;
mod slot;

pub use simulated::{BackendStats, SimulatedBackend, SimulatedSource};
pub use slot::HandleSlot;

use crate::config::RecordingFormat;
use async_trait::async_trait;
use thiserror::Error;

/// Failures reported by a backend or one of its handles
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Source could not be opened (network, codec, missing file)
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// OS refused access (microphone permission, audio focus)
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Handle-level operation failed after acquisition
    #[error("operation failed: {0}")]
    Failed(String),
}

/// Snapshot of a player's native time reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerStatus {
    /// Current playhead in milliseconds
    pub position_ms: u64,
    /// Total length, None until the resource knows it
    pub duration_ms: Option<u64>,
    /// True while the resource is emitting audio
    pub playing: bool,
    /// True once the playhead reached the end of the media
    pub finished: bool,
}

/// A native resource that must be released exactly once
#[async_trait]
pub trait Releasable: Send + Sync {
    /// Release the underlying resource. Consumes the handle.
    async fn release(self: Box<Self>);
}

/// Exclusively-owned playback resource bound to one audio URL
#[async_trait]
pub trait PlayerHandle: Releasable {
    async fn play(&mut self) -> Result<(), BackendError>;
    async fn pause(&mut self) -> Result<(), BackendError>;
    async fn seek(&mut self, position_ms: u64) -> Result<(), BackendError>;
    async fn set_rate(&mut self, rate: f64) -> Result<(), BackendError>;
    async fn status(&self) -> PlayerStatus;
}

/// Exclusively-owned capture resource
#[async_trait]
pub trait RecorderHandle: Releasable {
    async fn pause(&mut self) -> Result<(), BackendError>;
    async fn resume(&mut self) -> Result<(), BackendError>;

    /// Finalize capture. Returns the artifact URI, or None if nothing was captured.
    async fn stop(&mut self) -> Result<Option<String>, BackendError>;
}

/// Factory for native audio resources
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Acquire a player bound to `url`. The returned handle is paused at 0.
    async fn open_player(&self, url: &str) -> Result<Box<dyn PlayerHandle>, BackendError>;

    /// Acquire a recorder with the fixed encoding configuration and begin capture.
    async fn open_recorder(
        &self,
        format: &RecordingFormat,
    ) -> Result<Box<dyn RecorderHandle>, BackendError>;
}
