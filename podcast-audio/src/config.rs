//! Configuration for the podcast audio engine
//!
//! Loaded once at startup from TOML (all fields optional, built-in defaults
//! defined in code). Cannot change while the engine is running.
//!
//! # Settings Sources Priority
//!
//! 1. `--config <path>` command-line argument
//! 2. `PODCAST_AUDIO_CONFIG` environment variable
//! 3. `<platform config dir>/podcast/audio.toml`
//! 4. Built-in defaults

use crate::error::{Error, Result};
use podcast_common::config::{default_data_dir, load_toml_or_default, locate_config_file};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "PODCAST_AUDIO_CONFIG";

/// Config file name under the platform config directory
pub const CONFIG_FILE_NAME: &str = "audio.toml";

/// Allowed range for the position tracker interval
const POSITION_INTERVAL_MIN_MS: u64 = 100;
const POSITION_INTERVAL_MAX_MS: u64 = 5000;

/// Fixed capture encoding, not negotiated at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// File extension of produced artifacts
    pub extension: String,
}

impl Default for RecordingFormat {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            bits_per_sample: 16,
            extension: "wav".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Position tracker cadence while playing (clamped to 100-5000ms)
    pub position_interval_ms: u64,

    /// Upper bound on player/recorder acquisition
    pub load_timeout_ms: u64,

    /// Default skip amounts for the transport buttons
    pub skip_forward_secs: u64,
    pub skip_backward_secs: u64,

    /// Speed applied at startup and restored by cleanup
    pub default_speed: f64,

    /// Playback and recording never run at the same time
    pub exclusive_audio: bool,

    /// Event bus buffer size
    pub event_capacity: usize,

    /// Where recording artifacts are written (default: data dir/recordings)
    pub recordings_dir: Option<PathBuf>,

    pub recording: RecordingFormat,

    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            position_interval_ms: 500,
            load_timeout_ms: 15_000,
            skip_forward_secs: 30,
            skip_backward_secs: 15,
            default_speed: 1.0,
            exclusive_audio: true,
            event_capacity: 256,
            recordings_dir: None,
            recording: RecordingFormat::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Locate, load and validate the config (see module docs for priority)
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = locate_config_file(cli_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        let config: EngineConfig = load_toml_or_default(path.as_deref())?;
        config.validated()
    }

    /// Parse from a TOML string and validate
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid engine config: {}", e)))?;
        config.validated()
    }

    /// Clamp soft limits, reject values the engine cannot run with
    pub fn validated(mut self) -> Result<Self> {
        let clamped = self
            .position_interval_ms
            .clamp(POSITION_INTERVAL_MIN_MS, POSITION_INTERVAL_MAX_MS);
        if clamped != self.position_interval_ms {
            warn!(
                "position_interval_ms={} out of range, clamped to {}",
                self.position_interval_ms, clamped
            );
            self.position_interval_ms = clamped;
        }

        if !self.default_speed.is_finite() || self.default_speed <= 0.0 {
            return Err(Error::Config(format!(
                "default_speed must be positive, got {}",
                self.default_speed
            )));
        }
        if self.load_timeout_ms == 0 {
            return Err(Error::Config("load_timeout_ms must be non-zero".to_string()));
        }
        if self.recording.channels == 0 || self.recording.sample_rate == 0 {
            return Err(Error::Config(
                "recording format needs non-zero channels and sample_rate".to_string(),
            ));
        }
        if !matches!(self.recording.bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(Error::Config(format!(
                "unsupported bits_per_sample: {}",
                self.recording.bits_per_sample
            )));
        }
        Ok(self)
    }

    pub fn position_interval(&self) -> Duration {
        Duration::from_millis(self.position_interval_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Resolved recordings directory
    pub fn recordings_dir(&self) -> PathBuf {
        self.recordings_dir
            .clone()
            .unwrap_or_else(|| default_data_dir().join("recordings"))
    }
}
