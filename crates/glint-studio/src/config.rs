//! Studio configuration: `glint.toml` in the app folder, or an explicit
//! override path. Unknown fields are ignored so the file can grow without
//! breaking older builds; a missing file yields defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_scale")]
    pub scale: u32,
    #[serde(default)]
    pub fullscreen: bool,
    /// EnvFilter-style directive for the log subscriber.
    #[serde(default = "Config::default_log")]
    pub log: String,
    #[serde(default = "Config::default_tab_width")]
    pub tab_width: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scale: Self::default_scale(),
            fullscreen: false,
            log: Self::default_log(),
            tab_width: Self::default_tab_width(),
        }
    }
}

impl Config {
    fn default_scale() -> u32 {
        3
    }

    fn default_log() -> String {
        "info".to_string()
    }

    fn default_tab_width() -> u32 {
        4
    }

    /// Load from `path`; absent file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(target: "studio.config", path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(target: "studio.config", scale = config.scale, fullscreen = config.fullscreen, "config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/glint.toml")).unwrap();
        assert_eq!(config.scale, 3);
        assert!(!config.fullscreen);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glint.toml");
        std::fs::write(&path, "scale = 2\nfullscreen = true\nfuture_knob = 9\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.scale, 2);
        assert!(config.fullscreen);
    }
}
