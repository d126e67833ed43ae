//! Tiered focus map of the playback overlay
//!
//! Top tier: info block followed by the controls row. Middle tier: the
//! progress bar. Bottom tier: the recommendations row.

/// Buttons of the controls row, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    PlayPause,
    Subtitles,
    Settings,
    Pip,
}

impl Control {
    pub const ALL: [Control; 4] = [
        Control::PlayPause,
        Control::Subtitles,
        Control::Settings,
        Control::Pip,
    ];
}

/// One focusable spot of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayFocus {
    Info,
    Control(Control),
    Progress,
    Recommendation(usize),
}

impl OverlayFocus {
    /// The top tier row, left to right
    pub const TOP_ROW: [OverlayFocus; 5] = [
        OverlayFocus::Info,
        OverlayFocus::Control(Control::PlayPause),
        OverlayFocus::Control(Control::Subtitles),
        OverlayFocus::Control(Control::Settings),
        OverlayFocus::Control(Control::Pip),
    ];

    pub fn is_top(&self) -> bool {
        matches!(self, OverlayFocus::Info | OverlayFocus::Control(_))
    }
}

/// Result of a horizontal move
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Horizontal {
    Moved(OverlayFocus),
    /// At the row boundary; focus stays put
    Clamped,
    /// On the progress bar: seek by this many seconds instead
    Seek(f64),
}

/// Result of a vertical move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Moved(OverlayFocus),
    /// Up from the top tier
    HideOverlay,
    Clamped,
}

/// Position tracking across tiers
///
/// Each tier remembers where focus last was so moving back into it lands on
/// the same element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusMap {
    current: Option<OverlayFocus>,
    last_top: OverlayFocus,
    last_rec: usize,
    recommendations: usize,
}

impl Default for FocusMap {
    fn default() -> Self {
        Self {
            current: None,
            last_top: OverlayFocus::Control(Control::PlayPause),
            last_rec: 0,
            recommendations: 0,
        }
    }
}

impl FocusMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<OverlayFocus> {
        self.current
    }

    pub fn recommendation_count(&self) -> usize {
        self.recommendations
    }

    /// Update the length of the recommendations row
    pub fn set_recommendations(&mut self, count: usize) {
        self.recommendations = count;
        if count == 0 {
            self.last_rec = 0;
            if matches!(self.current, Some(OverlayFocus::Recommendation(_))) {
                self.current = Some(OverlayFocus::Progress);
            }
        } else {
            self.last_rec = self.last_rec.min(count - 1);
            if let Some(OverlayFocus::Recommendation(i)) = self.current {
                self.current = Some(OverlayFocus::Recommendation(i.min(count - 1)));
            }
        }
    }

    pub fn focus(&mut self, target: OverlayFocus) {
        match target {
            OverlayFocus::Recommendation(i) if i >= self.recommendations => return,
            OverlayFocus::Recommendation(i) => self.last_rec = i,
            t if t.is_top() => self.last_top = t,
            _ => {}
        }
        self.current = Some(target);
    }

    pub fn blur(&mut self) {
        self.current = None;
    }

    /// Focus the last-used top tier element
    pub fn restore_top(&mut self) {
        self.current = Some(self.last_top);
    }

    pub fn move_vertical(&mut self, down: bool) -> Vertical {
        let Some(current) = self.current else {
            self.restore_top();
            return Vertical::Moved(self.last_top);
        };
        let next = match (current, down) {
            (c, true) if c.is_top() => Some(OverlayFocus::Progress),
            (OverlayFocus::Progress, true) if self.recommendations > 0 => {
                Some(OverlayFocus::Recommendation(self.last_rec))
            }
            (OverlayFocus::Progress, true) | (OverlayFocus::Recommendation(_), true) => None,
            (c, false) if c.is_top() => return Vertical::HideOverlay,
            (OverlayFocus::Progress, false) => Some(self.last_top),
            (OverlayFocus::Recommendation(_), false) => Some(OverlayFocus::Progress),
            _ => None,
        };
        match next {
            Some(target) => {
                self.focus(target);
                Vertical::Moved(target)
            }
            None => Vertical::Clamped,
        }
    }

    pub fn move_horizontal(&mut self, right: bool, seek_step: f64) -> Horizontal {
        let Some(current) = self.current else {
            return Horizontal::Clamped;
        };
        let next = match current {
            OverlayFocus::Progress => {
                return Horizontal::Seek(if right { seek_step } else { -seek_step });
            }
            OverlayFocus::Recommendation(i) => {
                let j = if right { i + 1 } else { i.wrapping_sub(1) };
                (j < self.recommendations).then_some(OverlayFocus::Recommendation(j))
            }
            top => {
                let row = &OverlayFocus::TOP_ROW;
                let i = row.iter().position(|f| *f == top).unwrap_or(0);
                let j = if right { i + 1 } else { i.wrapping_sub(1) };
                row.get(j).copied()
            }
        };
        match next {
            Some(target) => {
                self.focus(target);
                Horizontal::Moved(target)
            }
            None => Horizontal::Clamped,
        }
    }
}
