//! TOML-based configuration system.
//!
//! Loads shell settings from a `config.toml` file, falling back to the
//! production values baked into the binary. Every struct implements `Default`
//! so a missing or partial config file produces the same behavior as no file
//! at all.
//!
//! ## Config file search order
//!
//! 1. `DYNAMIT_SHELL_CONFIG` environment variable (explicit override)
//! 2. Next to the executable (`<exe_dir>/config.toml`)
//! 3. Platform config directory (`~/.config/dynamit-shell/config.toml`)
//! 4. Current working directory (`./config.toml`)
//! 5. No file found → `ShellConfig::default()`

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::platform::ApiLevel;

// ─────────────────────────────────────────────────────────────────────────────
// Config structs
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub general: GeneralConfig,
    pub platform: PlatformConfig,
}

/// General application settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// URL of the remotely hosted application loaded at startup.
    pub start_url: String,
}

/// Platform posture for off-device runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Simulated host API level.
    pub api_level: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Default impls — match production values exactly
// ─────────────────────────────────────────────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            start_url: "https://avsec-it.vercel.app".to_string(),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_level: ApiLevel::R.0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config loading
// ─────────────────────────────────────────────────────────────────────────────

impl ShellConfig {
    /// Loads configuration from a TOML file. Never panics — returns defaults
    /// if no file is found or if parsing fails.
    pub fn load() -> Self {
        match find_config_path() {
            Some(path) => match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str::<ShellConfig>(&content) {
                    Ok(config) => {
                        info!(path = %path.display(), "Configuration loaded");
                        config
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                        ShellConfig::default()
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot read config, using defaults");
                    ShellConfig::default()
                }
            },
            None => {
                info!("No config file found, using defaults");
                ShellConfig::default()
            }
        }
    }

    pub fn api_level(&self) -> ApiLevel {
        ApiLevel(self.platform.api_level)
    }

    /// The start URL, parsed. The default always parses; a hand-edited file
    /// surfaces its mistake here.
    pub fn start_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.general.start_url)
    }
}

/// Searches for a config file in the standard locations.
fn find_config_path() -> Option<PathBuf> {
    // 1. Explicit env var override
    if let Ok(path) = std::env::var("DYNAMIT_SHELL_CONFIG") {
        let p = PathBuf::from(path);
        if p.is_file() {
            return Some(p);
        }
    }

    // 2. Next to the executable
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // 3. Platform config directory
    if let Some(dir) = platform_config_dir() {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // 4. Current working directory
    let p = PathBuf::from("config.toml");
    if p.is_file() {
        return Some(p);
    }

    None
}

/// Returns the platform config directory without adding a dependency.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("dynamit-shell"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .or_else(|| std::env::var("HOME").ok().map(|h| format!("{h}/.config")))
            .map(|dir| PathBuf::from(dir).join("dynamit-shell"))
    }
}
