//! Configuration module for pipeview
//!
//! This module handles viewer configuration:
//! - Layout geometry (padding, separations, minimum node sizes)
//! - Activity synchronization (waveform batch size, signal naming)
//!
//! # Config Location
//!
//! The default configuration file lives in the platform-appropriate config
//! directory under `dev.hxyulin.pipeview`:
//!
//! - **Linux**: `~/.config/dev.hxyulin.pipeview/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.pipeview/config.toml`
//! - **Windows**: `%APPDATA%\dev.hxyulin.pipeview\config.toml`
//!
//! # Example
//!
//! ```ignore
//! use pipeview::config::ViewerConfig;
//!
//! let config = ViewerConfig::load_or_default("pipeview.toml");
//! config.save("pipeview.toml")?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{PipeViewError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.hxyulin.pipeview";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Get the default config file path
pub fn config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Complete viewer configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Layout engine settings
    #[serde(default)]
    pub layout: LayoutSettings,

    /// Activity synchronizer settings
    #[serde(default)]
    pub sync: SyncSettings,
}

impl ViewerConfig {
    /// Load a configuration file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipeViewError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            PipeViewError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        config.sync.validate()?;
        Ok(config)
    }

    /// Load a configuration file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load from the platform config directory, if a file exists there
    pub fn load_user_config() -> Self {
        match config_path() {
            Some(path) if path.exists() => Self::load_or_default(path),
            _ => Self::default(),
        }
    }

    /// Save the configuration to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PipeViewError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| PipeViewError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            PipeViewError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}
