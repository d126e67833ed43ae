//! StreamTV - remote-control media player core
//!
//! Everything a lean-back player needs to be driven from a five-key remote:
//! spatial focus with a pointer fallback, an epoch-guarded playback session,
//! caption conversion and sync, and the overlay with its panels.
//!
//! # Modules
//!
//! - `focus` - Spatial navigation, cursor mode and input dispatch
//! - `player` - Playback session reducer and its async driver
//! - `captions` - SubRip conversion, blob lifetimes, cue sync
//! - `overlay` - Overlay visibility, panels and tiered focus
//! - `api` - Resolver and recommendation clients
//! - `ambient` - Backdrop tint sampled from artwork
//! - `ui` - ratatui rendering
//! - `app` - The mounted player tying it all together

pub mod ambient;
pub mod api;
pub mod app;
pub mod captions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod focus;
pub mod models;
pub mod overlay;
pub mod player;
pub mod services;
pub mod ui;

// Re-export commonly used types
pub use models::{
    EpisodeRef, Item, MediaType, Rect, Resolution, ResolveRequest, Severity, StreamLink,
    SubtitleDescriptor, SubtitleSettings,
};

pub use api::{HttpRecommendations, HttpSourceResolver};
pub use app::PlayerApp;
pub use config::Config;
pub use focus::{CursorModeController, Dispatch, InputDispatcher, SpatialNavigator, UiTree};
pub use overlay::{OverlayStateMachine, PlayerOverlay};
pub use player::{PlaybackSession, SessionCommand, SessionDriver, SessionEffect};
