//! Configuration management for Tiny Notepad

use crate::error::{NotepadError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "notepad.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub font: FontConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EditorConfig {
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Drop one trailing newline when writing a buffer to disk
    #[serde(default = "default_true")]
    pub strip_trailing_newline: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FontConfig {
    /// Explicit TTF/OTF file. When unset, common system fonts are probed.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            theme: default_theme(),
            history_limit: default_history_limit(),
            strip_trailing_newline: true,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_font_size() -> f32 { 14.0 }
fn default_theme() -> String { "dark".to_string() }
fn default_history_limit() -> usize { 100 }
fn default_true() -> bool { true }
fn default_width() -> f64 { 800.0 }
fn default_height() -> f64 { 600.0 }

impl AppConfig {
    /// Load configuration from `NOTEPAD_CONFIG` or notepad.toml, falling back to defaults
    pub fn load() -> Self {
        let config_path = std::env::var_os("NOTEPAD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !config_path.exists() {
            tracing::info!(path = %config_path.display(), "No config file found, using defaults");
            return AppConfig::default();
        }

        match Self::load_from(&config_path) {
            Ok(config) => {
                tracing::info!(path = %config_path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                AppConfig::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NotepadError::from_io(path, e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| NotepadError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.editor.font_size, 14.0);
        assert_eq!(config.editor.history_limit, 100);
        assert!(config.editor.strip_trailing_newline);
        assert_eq!(config.window.width, 800.0);
        assert!(config.font.path.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config = AppConfig::parse(
            r#"
            [editor]
            font_size = 18.0
            strip_trailing_newline = false

            [font]
            path = "/usr/share/fonts/TTF/Hack-Regular.ttf"
            "#,
        )
        .unwrap();

        assert_eq!(config.editor.font_size, 18.0);
        assert!(!config.editor.strip_trailing_newline);
        assert_eq!(config.editor.theme, "dark");
        assert_eq!(
            config.font.path.as_deref(),
            Some(Path::new("/usr/share/fonts/TTF/Hack-Regular.ttf"))
        );
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let err = AppConfig::parse("[editor\nfont_size = ").unwrap_err();
        assert!(matches!(err, NotepadError::Config(_)));
    }
}
