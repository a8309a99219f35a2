//! # Podcast Audio Engine (podcast-audio)
//!
//! Playback and recording coordinator for the podcast app.
//!
//! **Purpose:** Own the single active player and recorder, drive their state
//! machines, track position while playing, and expose derived read-only state
//! plus events to UI layers.
//!
//! **Architecture:** `AudioEngine` over an `AudioBackend` trait object. The
//! bundled `SimulatedBackend` drives the CLI harness and tests; platform
//! backends implement the same traits.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod playback;
pub mod recording;

pub use config::EngineConfig;
pub use engine::{AudioEngine, EngineSnapshot, LoadOutcome};
pub use error::{Error, Result};
