//! Settings management for StreamKey
//!
//! Handles the persistent configuration:
//! - Stream title, category and audience type
//! - Streamlabs API token
//! - The live session started by this tool, so a later run can end it

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::{AudienceType, LiveSession};

const CONFIG_DIR_NAME: &str = "StreamKey";
const CONFIG_FILE_NAME: &str = "config.json";

/// Errors from reading or writing the config file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not determine config path")]
    PathNotAvailable,

    #[error("Could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown setting '{0}'. Supported: title, game, audience_type")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Stream title
    pub title: String,

    /// Category full name, as shown by search
    pub game: String,

    /// "0" for everyone, "1" for mature audiences
    pub audience_type: AudienceType,

    /// Streamlabs API token
    pub token: String,

    /// Stream currently live through this tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<LiveSession>,
}

impl Settings {
    /// Get the default settings file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Use the override when given, otherwise the default path
    pub fn resolve_path(override_path: Option<&Path>) -> Result<PathBuf, SettingsError> {
        match override_path {
            Some(p) => Ok(p.to_path_buf()),
            None => Self::default_path().ok_or(SettingsError::PathNotAvailable),
        }
    }

    /// Load settings, reporting unreadable or malformed files
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings, falling back to defaults when the file is missing or broken
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)?;

        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Forget the token and anything tied to it
    pub fn clear_token(&mut self) {
        self.token.clear();
        self.live = None;
    }

    /// Set a user-editable field by name
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match key {
            "title" => self.title = value.to_string(),
            "game" | "category" => self.game = value.to_string(),
            "audience_type" | "audience" => {
                self.audience_type =
                    AudienceType::parse(value).ok_or_else(|| SettingsError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    })?;
            }
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Copy with the token masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.token = crate::core::mask_token(&self.token);
        if let Some(ref mut live) = copy.live {
            live.stream_key = crate::core::mask_token(&live.stream_key);
        }
        copy
    }
}
