//! Configuration file management
//!
//! Loads TOML configuration files and provides application settings.
//! Default config path: ~/.config/nvscreen/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::color::{parse_hex_color, Rgba};
use crate::constants::{DEFAULT_BACKGROUND, DEFAULT_FOREGROUND, OVERLAY_REFRESH_TIMEOUT_MS};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Appearance settings
    pub appearance: AppearanceConfig,
    /// Window overlay settings
    pub overlay: OverlayConfig,
}

/// Appearance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Workspace foreground color (RRGGBB)
    pub foreground: String,
    /// Workspace background color (RRGGBB)
    pub background: String,
}

/// Window overlay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Upper bound on how long a paint waits for fresh window layout,
    /// in milliseconds; on expiry the previous layout is reused
    pub refresh_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            appearance: AppearanceConfig::default(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            foreground: DEFAULT_FOREGROUND.to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

impl AppearanceConfig {
    /// Configured foreground, or the built-in default when malformed
    pub fn foreground_color(&self) -> Rgba {
        parse_color_or_default(&self.foreground, DEFAULT_FOREGROUND)
    }

    /// Configured background, or the built-in default when malformed
    pub fn background_color(&self) -> Rgba {
        parse_color_or_default(&self.background, DEFAULT_BACKGROUND)
    }
}

fn parse_color_or_default(hex: &str, fallback: &str) -> Rgba {
    match parse_hex_color(hex) {
        Some(color) => color,
        None => {
            warn!("Invalid color {:?}, using default {:?}", hex, fallback);
            // The built-in defaults always parse
            parse_hex_color(fallback).unwrap_or(Rgba::BLACK)
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            refresh_timeout_ms: OVERLAY_REFRESH_TIMEOUT_MS,
        }
    }
}

impl OverlayConfig {
    pub fn refresh_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.refresh_timeout_ms)
    }
}

impl Config {
    /// Get the path that would be used for loading config.
    /// Returns None if using built-in defaults.
    pub fn config_path() -> Option<PathBuf> {
        // 1. NVSCREEN_CONFIG environment variable
        if let Ok(path) = std::env::var("NVSCREEN_CONFIG") {
            let p = std::path::Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/nvscreen/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("nvscreen").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }
        }

        None
    }

    /// Load configuration with priority:
    /// 1. NVSCREEN_CONFIG environment variable
    /// 2. ~/.config/nvscreen/config.toml (user config)
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(path.to_string_lossy().as_ref()) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.appearance.foreground, DEFAULT_FOREGROUND);
        assert_eq!(config.appearance.background, DEFAULT_BACKGROUND);
        assert_eq!(config.overlay.refresh_timeout_ms, OVERLAY_REFRESH_TIMEOUT_MS);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [appearance]
            background = "101010"
            "#,
        )
        .unwrap();
        assert_eq!(config.appearance.background, "101010");
        assert_eq!(config.appearance.foreground, DEFAULT_FOREGROUND);
        assert_eq!(config.overlay.refresh_timeout_ms, OVERLAY_REFRESH_TIMEOUT_MS);
    }

    #[test]
    fn test_color_accessors() {
        let mut config = Config::default();
        config.appearance.background = "#102030".to_string();
        assert_eq!(config.appearance.background_color(), Rgba::rgb(0x10, 0x20, 0x30));
        // Malformed value falls back to the built-in default
        config.appearance.foreground = "zzz".to_string();
        assert_eq!(
            config.appearance.foreground_color(),
            parse_hex_color(DEFAULT_FOREGROUND).unwrap()
        );
    }

    #[test]
    fn test_overlay_timeout_duration() {
        let config: Config = toml::from_str("[overlay]\nrefresh_timeout_ms = 120").unwrap();
        assert_eq!(
            config.overlay.refresh_timeout(),
            std::time::Duration::from_millis(120)
        );
    }
}
