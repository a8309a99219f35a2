//! Configuration file discovery and loading
//!
//! Config file resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`<config_dir>/podcast/<file_name>`)
//!
//! A missing file is not an error: callers fall back to built-in defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Application directory name under the platform config/data directories
pub const APP_DIR_NAME: &str = "podcast";

/// Locate a config file following the priority order above.
///
/// An explicit CLI path is returned even if it does not exist, so the caller
/// can report it; lower-priority sources are only returned if the file exists.
pub fn locate_config_file(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join(file_name))
        .filter(|p| p.exists())
}

/// Load and deserialize a TOML file, or return defaults if `path` is None.
///
/// A path that was given but cannot be read is an error; graceful fallback
/// applies only when no config source was found at all.
pub fn load_toml_or_default<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        warn!("No config file found, using built-in defaults");
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
    })?;
    let parsed = toml::from_str::<T>(&content)?;
    info!("Loaded config from {}", path.display());
    Ok(parsed)
}

/// Get OS-dependent default data directory for this application
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./podcast_data"))
}
