//! # Podcast Common Library
//!
//! Shared code for the podcast audio engine and the UI layers that consume it:
//! - Episode metadata handed to the engine (`Episode`)
//! - Event types (`CastEvent` enum) and the broadcast `EventBus`
//! - Human-readable time formatting for player controls
//! - Configuration file discovery
//! - Common error type

pub mod config;
pub mod episode;
pub mod error;
pub mod events;
pub mod human_time;
pub mod time;

pub use episode::Episode;
pub use error::{Error, Result};
pub use events::{CastEvent, EventBus};
