//! Configuration management for StreamTV
//!
//! Handles config file loading/saving and environment overrides.
//! Config is stored at ~/.config/streamtv/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default source-resolution endpoint
pub const DEFAULT_RESOLVER_URL: &str = "http://127.0.0.1:8787";

/// Default recommendations endpoint
pub const DEFAULT_RECOMMENDATIONS_URL: &str = "http://127.0.0.1:8787";

/// Default capacity of the ambient color cache
pub const DEFAULT_AMBIENT_CACHE: usize = 64;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the source-resolution service
    pub resolver_url: String,
    /// Base URL of the recommendations service
    pub recommendations_url: String,
    /// User locale used for default caption selection (e.g. "en", "ar")
    pub locale: String,
    /// Ordered server preferences passed to resolution
    pub server_preferences: Vec<String>,
    /// Preferred provider, if any
    pub provider: Option<String>,
    /// Number of artwork colors kept in memory
    pub ambient_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolver_url: DEFAULT_RESOLVER_URL.to_string(),
            recommendations_url: DEFAULT_RECOMMENDATIONS_URL.to_string(),
            locale: "en".to_string(),
            server_preferences: Vec::new(),
            provider: None,
            ambient_cache_size: DEFAULT_AMBIENT_CACHE,
        }
    }
}

impl Config {
    /// Get config file path (~/.config/streamtv/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("streamtv").join("config.toml"))
    }

    /// Load config from the default path, or defaults if not found
    pub fn load() -> Self {
        Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
            .with_env()
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Apply environment overrides
    pub fn with_env(mut self) -> Self {
        if let Ok(locale) = std::env::var("STREAMTV_LOCALE") {
            if !locale.is_empty() {
                self.locale = locale;
            }
        }
        self
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    /// Save config to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Primary language subtag of the locale ("pt-BR" -> "pt")
    pub fn language(&self) -> &str {
        self.locale
            .split(['-', '_'])
            .next()
            .unwrap_or(self.locale.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.locale, "en");
        assert!(config.server_preferences.is_empty());
        assert_eq!(config.ambient_cache_size, DEFAULT_AMBIENT_CACHE);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("locale = \"ar\"\nserver_preferences = [\"a\", \"b\"]")
            .unwrap();
        assert_eq!(config.locale, "ar");
        assert_eq!(config.server_preferences, vec!["a", "b"]);
        assert_eq!(config.resolver_url, DEFAULT_RESOLVER_URL);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("streamtv-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        let config = Config {
            locale: "pt-BR".into(),
            provider: Some("alpha".into()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path);
        assert_eq!(loaded.locale, "pt-BR");
        assert_eq!(loaded.language(), "pt");
        assert_eq!(loaded.provider.as_deref(), Some("alpha"));
        let _ = std::fs::remove_dir_all(dir);
    }
}
