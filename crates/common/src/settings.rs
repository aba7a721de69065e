// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// Router Tray - Settings Module
// Application settings shared by the tray and the CLI

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Application directory name under the platform config directory
pub const APP_DIR: &str = "router-tray";

/// Get the application config directory
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
    Ok(config_dir.join(APP_DIR))
}

/// Where router passwords are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordStorage {
    /// Inline in the profile file
    File,
    /// Platform keychain
    Keyring,
}

impl Default for PasswordStorage {
    fn default() -> Self {
        PasswordStorage::Keyring
    }
}

/// Router Tray settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Profile file path
    #[serde(default = "default_routers_file")]
    pub routers_file: PathBuf,

    /// Password storage backend
    #[serde(default)]
    pub password_storage: PasswordStorage,

    /// Command launched by the "Open..." and "Add Router..." tray items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_command: Option<String>,

    /// Command used to open a router web interface.
    /// Defaults to the platform opener (xdg-open, open, explorer).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_command: Option<String>,

    /// Seconds between checks of the profile file for external changes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_routers_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("routers.toml")
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            routers_file: default_routers_file(),
            password_storage: PasswordStorage::default(),
            open_command: None,
            browser_command: None,
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl Settings {
    /// Path of the settings file
    pub fn settings_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load settings from the default location, falling back to defaults
    /// when the file does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Settings file does not exist: {}", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)?;
        settings.validate()?;

        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.routers_file.as_os_str().is_empty() {
            return Err(Error::Config("routers_file cannot be empty".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::Config(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
