//! Collaborator interfaces consumed by the player core
//!
//! - `TextLookup`: localized strings with `{param}` substitution
//! - `Notifier`: user-visible notifications
//! - `SettingsStore`: key/value persistence for preferences
//! - `PlayerCallbacks`: events reported back to the embedding UI

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

use crate::models::{EpisodeRef, Severity, SubtitleSettings};

// =============================================================================
// Text lookup
// =============================================================================

/// Localized text source
pub trait TextLookup: Send + Sync {
    fn text(&self, key: &str, params: &[(&str, &str)]) -> String;
}

/// Built-in English catalog
#[derive(Debug, Clone)]
pub struct StaticText {
    entries: HashMap<&'static str, &'static str>,
}

impl Default for StaticText {
    fn default() -> Self {
        let entries = [
            ("player.no_sources", "No playable source found for {title}"),
            ("player.resolve_failed", "Could not load stream: {error}"),
            ("player.provider", "Playing from {provider}"),
            ("player.quality", "Quality"),
            ("player.speed", "Playback speed"),
            ("player.subtitles", "Subtitles"),
            ("player.subtitles_off", "Off"),
            ("player.subtitle_appearance", "Subtitle appearance"),
            ("player.settings", "Settings"),
            ("player.pip", "Picture in picture"),
            ("player.recommendations", "More like this"),
            ("player.font_size", "Font size"),
            ("player.background", "Background"),
            ("player.edge", "Edge"),
            ("player.position", "Position"),
        ]
        .into_iter()
        .collect();
        Self { entries }
    }
}

impl TextLookup for StaticText {
    fn text(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = self.entries.get(key).copied().unwrap_or(key);
        interpolate(template, params)
    }
}

/// Replace `{name}` placeholders with their values
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
}

// =============================================================================
// Notifications
// =============================================================================

/// Sink for user-visible notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Notifier that keeps every message (used by the TUI toast line and tests)
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<(String, Severity)> {
        self.messages().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((message.to_string(), severity));
        }
    }
}

// =============================================================================
// Settings persistence
// =============================================================================

/// Errors from settings persistence
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to serialize setting '{0}': {1}")]
    Encode(String, String),
    #[error("Failed to write settings file: {0}")]
    Io(#[from] std::io::Error),
}

/// Key/value preference storage, values stored as JSON
pub trait SettingsStore: Send + Sync {
    fn read_raw(&self, key: &str) -> Option<serde_json::Value>;
    fn write_raw(&self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
}

/// Typed read with a default for missing or malformed values
pub fn read_setting<T: DeserializeOwned>(store: &dyn SettingsStore, key: &str, default: T) -> T {
    match store.read_raw(key) {
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(key, error = %e, "ignoring malformed setting");
            default
        }),
        None => default,
    }
}

/// Typed write
pub fn write_setting<T: Serialize>(
    store: &dyn SettingsStore,
    key: &str,
    value: &T,
) -> Result<(), SettingsError> {
    let value = serde_json::to_value(value)
        .map_err(|e| SettingsError::Encode(key.to_string(), e.to_string()))?;
    store.write_raw(key, value)
}

/// Settings kept in memory only
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn read_raw(&self, key: &str) -> Option<serde_json::Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn write_raw(&self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
        Ok(())
    }
}

/// Settings persisted as a JSON document on disk
///
/// Stored at ~/.config/streamtv/settings.json by default.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl FileSettingsStore {
    /// Default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("streamtv").join("settings.json"))
    }

    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn flush(&self, values: &HashMap<String, serde_json::Value>) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(values)
            .map_err(|e| SettingsError::Encode("*".into(), e.to_string()))?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }
}

impl SettingsStore for FileSettingsStore {
    fn read_raw(&self, key: &str) -> Option<serde_json::Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn write_raw(&self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        let snapshot = match self.values.lock() {
            Ok(mut values) => {
                values.insert(key.to_string(), value);
                values.clone()
            }
            Err(_) => return Ok(()),
        };
        self.flush(&snapshot)
    }
}

/// Settings key for caption appearance
pub const SUBTITLE_SETTINGS_KEY: &str = "subtitle_settings";

/// Load caption appearance once per session
pub fn load_subtitle_settings(store: &dyn SettingsStore) -> SubtitleSettings {
    read_setting(store, SUBTITLE_SETTINGS_KEY, SubtitleSettings::default()).clamped()
}

/// Persist caption appearance after an explicit update
pub fn save_subtitle_settings(
    store: &dyn SettingsStore,
    settings: &SubtitleSettings,
) -> Result<(), SettingsError> {
    write_setting(store, SUBTITLE_SETTINGS_KEY, &settings.clamped())
}

// =============================================================================
// Host callbacks
// =============================================================================

/// Events reported to the embedding UI
pub trait PlayerCallbacks: Send + Sync {
    fn provider_selected(&self, _provider: &str) {}
    fn fetch_state_changed(&self, _fetching: bool) {}
    fn episode_selected(&self, _episode: EpisodeRef) {}
}

/// Callbacks that ignore everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl PlayerCallbacks for NoopCallbacks {}
