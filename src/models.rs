//! Data structures shared across StreamTV
//!
//! Organized by domain:
//! - **Geometry**: rectangles and directions used by focus navigation
//! - **Catalog**: items, media types and resolution requests
//! - **Sources**: stream links and subtitle descriptors returned by resolution
//! - **Subtitles**: user-facing caption appearance settings
//! - **Notifications**: severity levels for user-visible messages

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Geometry
// =============================================================================

/// Axis-aligned rectangle in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point of the rectangle
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// A zero-area rectangle never receives focus
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether the point lies inside (edges inclusive on the top/left side)
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Directional input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Map an arrow key to a direction
    pub fn from_key(code: crossterm::event::KeyCode) -> Option<Self> {
        use crossterm::event::KeyCode;
        match code {
            KeyCode::Up => Some(Direction::Up),
            KeyCode::Down => Some(Direction::Down),
            KeyCode::Left => Some(Direction::Left),
            KeyCode::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Media type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    Tv,
}

impl MediaType {
    /// Path segment used by the catalog services
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movie => write!(f, "Movie"),
            MediaType::Tv => write!(f, "TV Show"),
        }
    }
}

/// A playable catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub artwork_url: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, media_type: MediaType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            media_type,
            title: title.into(),
            year: None,
            overview: String::new(),
            artwork_url: None,
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year_str = self.year.map(|y| format!(" ({})", y)).unwrap_or_default();
        write!(f, "{}{} [{}]", self.title, year_str, self.media_type)
    }
}

/// Season/episode pair for TV items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub season: u16,
    pub episode: u16,
}

impl fmt::Display for EpisodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

/// Everything the source-resolution service needs for one lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveRequest {
    pub item_id: String,
    pub media_type: MediaType,
    pub episode: Option<EpisodeRef>,
    pub provider: Option<String>,
    pub server_preferences: Vec<String>,
}

// =============================================================================
// Sources
// =============================================================================

/// A playable rendition returned by source resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLink {
    pub url: String,
    /// Quality label such as "1080p" or "auto"
    pub quality: String,
    pub provider: String,
}

impl StreamLink {
    /// Manifest-based sources go through the adaptive engine
    pub fn is_manifest(&self) -> bool {
        is_manifest_url(&self.url)
    }
}

/// Whether a URL points to an HLS manifest (query string and fragment ignored)
pub fn is_manifest_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".m3u8")
}

/// Raw caption track offered by the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleDescriptor {
    pub language: String,
    pub source_url: String,
    pub display_label: String,
}

/// Result of one resolution call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub links: Vec<StreamLink>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleDescriptor>,
    /// Provider that actually produced the links
    pub provider: String,
}

// =============================================================================
// Subtitle appearance
// =============================================================================

/// Caption edge rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeStyle {
    None,
    #[default]
    DropShadow,
    Outline,
}

impl EdgeStyle {
    /// Next style in the appearance menu cycle
    pub fn next(self) -> Self {
        match self {
            EdgeStyle::None => EdgeStyle::DropShadow,
            EdgeStyle::DropShadow => EdgeStyle::Outline,
            EdgeStyle::Outline => EdgeStyle::None,
        }
    }
}

impl fmt::Display for EdgeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeStyle::None => write!(f, "none"),
            EdgeStyle::DropShadow => write!(f, "drop-shadow"),
            EdgeStyle::Outline => write!(f, "outline"),
        }
    }
}

/// User caption appearance preferences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSettings {
    pub font_size_percent: u16,
    pub background_opacity_percent: u8,
    pub edge_style: EdgeStyle,
    pub vertical_position_percent: u8,
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            font_size_percent: 100,
            background_opacity_percent: 50,
            edge_style: EdgeStyle::DropShadow,
            vertical_position_percent: 90,
        }
    }
}

impl SubtitleSettings {
    pub const MIN_FONT_SIZE: u16 = 50;
    pub const MAX_FONT_SIZE: u16 = 200;

    /// Clamp every field into its valid range
    pub fn clamped(self) -> Self {
        Self {
            font_size_percent: self
                .font_size_percent
                .clamp(Self::MIN_FONT_SIZE, Self::MAX_FONT_SIZE),
            background_opacity_percent: self.background_opacity_percent.min(100),
            edge_style: self.edge_style,
            vertical_position_percent: self.vertical_position_percent.min(100),
        }
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// Severity of a user-visible notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_center_and_contains() {
        let r = Rect::new(100.0, 100.0, 50.0, 50.0);
        assert_eq!(r.center(), (125.0, 125.0));
        assert!(r.contains(100.0, 149.0));
        assert!(!r.contains(150.0, 120.0));
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).is_empty());
    }

    #[test]
    fn test_manifest_detection() {
        assert!(is_manifest_url("https://cdn.example/master.m3u8"));
        assert!(is_manifest_url("https://cdn.example/Master.M3U8?token=abc"));
        assert!(!is_manifest_url("https://cdn.example/movie.mp4"));
        assert!(!is_manifest_url("https://cdn.example/movie.mp4?x=.m3u8"));
    }

    #[test]
    fn test_subtitle_settings_clamped() {
        let s = SubtitleSettings {
            font_size_percent: 400,
            background_opacity_percent: 150,
            edge_style: EdgeStyle::Outline,
            vertical_position_percent: 101,
        }
        .clamped();
        assert_eq!(s.font_size_percent, 200);
        assert_eq!(s.background_opacity_percent, 100);
        assert_eq!(s.vertical_position_percent, 100);
    }

    #[test]
    fn test_edge_style_cycle() {
        assert_eq!(EdgeStyle::None.next(), EdgeStyle::DropShadow);
        assert_eq!(EdgeStyle::Outline.next(), EdgeStyle::None);
    }

    #[test]
    fn test_episode_display() {
        let ep = EpisodeRef {
            season: 1,
            episode: 5,
        };
        assert_eq!(ep.to_string(), "S01E05");
    }
}
