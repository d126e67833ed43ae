//! Terminal rendering of the player
//!
//! Keyboard-first, drawn with ratatui.

pub mod layout;
pub mod overlay;
pub mod theme;

pub use layout::{overlay_layout, OverlayLayout};
pub use overlay::{format_time, render};
pub use theme::Theme;
