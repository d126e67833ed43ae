//! Neon palette for the player overlay
//!
//! Colors plus the style helpers the overlay widgets share.

use ratatui::style::{Color, Modifier, Style};

use crate::ambient::Rgb;
use crate::models::{EdgeStyle, Severity, SubtitleSettings};

pub struct Theme;

impl Theme {
    // ═══════════════════════════════════════════════════════════════════════
    // PALETTE
    // ═══════════════════════════════════════════════════════════════════════

    /// Background: #0a0a0f (deep black-blue)
    pub const BACKGROUND: Color = Color::Rgb(0x0a, 0x0a, 0x0f);

    /// Primary: #00fff2 (cyan neon)
    pub const PRIMARY: Color = Color::Rgb(0x00, 0xff, 0xf2);

    /// Secondary: #ff00ff (magenta)
    pub const SECONDARY: Color = Color::Rgb(0xff, 0x00, 0xff);

    /// Highlight: #ff0080 (hot pink)
    pub const HIGHLIGHT: Color = Color::Rgb(0xff, 0x00, 0x80);

    /// Text: #e0e0e0 (soft white)
    pub const TEXT: Color = Color::Rgb(0xe0, 0xe0, 0xe0);

    /// Dim: #404050 (muted)
    pub const DIM: Color = Color::Rgb(0x40, 0x40, 0x50);

    pub const SUCCESS: Color = Color::Rgb(0x00, 0xff, 0x00);
    pub const WARNING: Color = Color::Rgb(0xff, 0xaa, 0x00);
    pub const ERROR: Color = Color::Rgb(0xff, 0x00, 0x40);

    /// Panels and cards
    pub const BACKGROUND_LIGHT: Color = Color::Rgb(0x14, 0x14, 0x1e);

    pub const BORDER: Color = Color::Rgb(0x00, 0x80, 0x78);
    pub const BORDER_FOCUSED: Color = Self::PRIMARY;

    // ═══════════════════════════════════════════════════════════════════════
    // STYLES
    // ═══════════════════════════════════════════════════════════════════════

    pub fn text() -> Style {
        Style::default().fg(Self::TEXT)
    }

    /// Focused element (inverted with primary color)
    pub fn highlighted() -> Style {
        Style::default()
            .fg(Self::BACKGROUND)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Currently active option in a list
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dimmed() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border(focused: bool) -> Style {
        if focused {
            Style::default().fg(Self::BORDER_FOCUSED)
        } else {
            Style::default().fg(Self::BORDER)
        }
    }

    pub fn panel() -> Style {
        Style::default().bg(Self::BACKGROUND_LIGHT).fg(Self::TEXT)
    }

    /// Filled part of the progress bar
    pub fn progress_bar() -> Style {
        Style::default().fg(Self::SECONDARY).bg(Self::DIM)
    }

    pub fn severity(severity: Severity) -> Style {
        let color = match severity {
            Severity::Info => Self::PRIMARY,
            Severity::Success => Self::SUCCESS,
            Severity::Warning => Self::WARNING,
            Severity::Error => Self::ERROR,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Quality badge color by label
    pub fn quality(label: &str) -> Style {
        let label = label.to_ascii_lowercase();
        let color = if label.contains("2160") || label.contains("4k") {
            Self::SECONDARY
        } else if label.contains("1080") {
            Self::PRIMARY
        } else if label.contains("720") {
            Self::SUCCESS
        } else {
            Self::DIM
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Caption text styled from the user's appearance settings
    ///
    /// Without a fill the text sits directly on the tinted backdrop.
    pub fn caption(settings: &SubtitleSettings, backdrop: Rgb) -> Style {
        // Terminals cannot blend, so opacity picks between no fill and a solid one
        let mut style = if settings.background_opacity_percent >= 50 {
            Style::default().fg(Self::TEXT).bg(Color::Black)
        } else {
            Style::default().fg(Self::readable_on(dimmed(backdrop)))
        };
        if settings.font_size_percent >= 150 {
            style = style.add_modifier(Modifier::BOLD);
        }
        match settings.edge_style {
            EdgeStyle::None => style,
            EdgeStyle::DropShadow => style.add_modifier(Modifier::ITALIC),
            EdgeStyle::Outline => style.add_modifier(Modifier::UNDERLINED),
        }
    }

    /// Backdrop tinted toward the artwork color
    pub fn backdrop(color: Rgb) -> Color {
        let Rgb(r, g, b) = dimmed(color);
        Color::Rgb(r, g, b)
    }

    /// Text color with the better contrast against `bg`
    pub fn readable_on(bg: Rgb) -> Color {
        let light = contrast_ratio((0xe0, 0xe0, 0xe0), (bg.0, bg.1, bg.2));
        let dark = contrast_ratio((0x0a, 0x0a, 0x0f), (bg.0, bg.1, bg.2));
        if light >= dark {
            Self::TEXT
        } else {
            Self::BACKGROUND
        }
    }
}

// Keep the backdrop dark so overlay text stays readable
fn dimmed(color: Rgb) -> Rgb {
    let dim = |c: u8| (c as u16 * 2 / 5) as u8;
    Rgb(dim(color.0), dim(color.1), dim(color.2))
}

/// Relative luminance of an sRGB color (WCAG 2.x)
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    fn channel(c: u8) -> f64 {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
}

/// WCAG contrast ratio between two colors, 1.0 to 21.0
pub fn contrast_ratio(fg: (u8, u8, u8), bg: (u8, u8, u8)) -> f64 {
    let l1 = relative_luminance(fg.0, fg.1, fg.2);
    let l2 = relative_luminance(bg.0, bg.1, bg.2);
    let (hi, lo) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
    (hi + 0.05) / (lo + 0.05)
}
