//! Overlay visibility and side panels
//!
//! Settings and the subtitle chooser are mutually exclusive. Panel timers
//! (exit animation, post-open focus, auto-hide) are deadlines checked by
//! [`OverlayStateMachine::tick`] and re-armed whenever they are restarted.

use std::time::{Duration, Instant};
use tracing::debug;

use super::focus_map::{FocusMap, OverlayFocus};

/// Exit animation of a closing panel
pub const PANEL_EXIT: Duration = Duration::from_millis(300);
/// Delay before the first panel control takes focus
pub const PANEL_FOCUS_DELAY: Duration = Duration::from_millis(50);
/// Inactivity before the overlay hides during playback
pub const AUTO_HIDE: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    None,
    Settings,
    Subtitles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsView {
    #[default]
    Main,
    Speed,
    Quality,
    SubtitleSettings,
}

impl SettingsView {
    /// Entries of the main settings list, in display order
    pub const MAIN_ENTRIES: [SettingsView; 3] = [
        SettingsView::Speed,
        SettingsView::Quality,
        SettingsView::SubtitleSettings,
    ];
}

/// Observable overlay state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayState {
    pub overlay_visible: bool,
    pub active_panel: Panel,
    pub settings_sub_view: SettingsView,
    pub recs_focused: bool,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self {
            overlay_visible: true,
            active_panel: Panel::None,
            settings_sub_view: SettingsView::Main,
            recs_focused: false,
        }
    }
}

/// Overlay state plus its timers and focus positions
#[derive(Debug, Clone)]
pub struct OverlayStateMachine {
    state: OverlayState,
    map: FocusMap,
    /// Focused control inside the open panel
    panel_focus: Option<usize>,
    /// Control that opened the current panel
    opener: Option<OverlayFocus>,
    exit_deadline: Option<Instant>,
    focus_deadline: Option<Instant>,
    hide_deadline: Option<Instant>,
}

impl Default for OverlayStateMachine {
    fn default() -> Self {
        let mut map = FocusMap::new();
        map.restore_top();
        Self {
            state: OverlayState::default(),
            map,
            panel_focus: None,
            opener: None,
            exit_deadline: None,
            focus_deadline: None,
            hide_deadline: None,
        }
    }
}

impl OverlayStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn focus_map(&self) -> &FocusMap {
        &self.map
    }

    pub fn focus_map_mut(&mut self) -> &mut FocusMap {
        &mut self.map
    }

    /// Focus of the main map; `None` while a panel has focus or after blur
    pub fn focused(&self) -> Option<OverlayFocus> {
        if self.state.active_panel == Panel::None {
            self.map.current()
        } else {
            None
        }
    }

    pub fn panel_focus(&self) -> Option<usize> {
        self.panel_focus
    }

    /// Whether a panel is sliding out
    pub fn is_closing(&self) -> bool {
        self.exit_deadline.is_some()
    }

    pub fn focus(&mut self, target: OverlayFocus) {
        self.map.focus(target);
        self.sync_recs_focus();
    }

    // -------------------------------------------------------------------------
    // Visibility
    // -------------------------------------------------------------------------

    /// Show the overlay and restart the auto-hide timer
    pub fn show(&mut self, now: Instant) {
        if !self.state.overlay_visible {
            debug!("overlay shown");
            self.state.overlay_visible = true;
            if self.map.current().is_none() {
                self.map.restore_top();
            }
            self.sync_recs_focus();
        }
        self.touch(now);
    }

    /// Hide the overlay and blur its focus
    pub fn hide(&mut self) {
        if self.state.active_panel != Panel::None {
            return;
        }
        debug!("overlay hidden");
        self.state.overlay_visible = false;
        self.map.blur();
        self.hide_deadline = None;
        self.sync_recs_focus();
    }

    /// Record user activity
    pub fn touch(&mut self, now: Instant) {
        self.hide_deadline = Some(now + AUTO_HIDE);
    }

    // -------------------------------------------------------------------------
    // Panels
    // -------------------------------------------------------------------------

    /// Open a panel; the other one closes if open
    pub fn open_panel(&mut self, panel: Panel, now: Instant) {
        if panel == Panel::None || self.state.active_panel == panel {
            return;
        }
        if self.state.active_panel == Panel::None {
            self.opener = self.map.current();
        }
        debug!(?panel, replaced = ?self.state.active_panel, "panel opened");
        self.state.overlay_visible = true;
        self.state.active_panel = panel;
        self.state.settings_sub_view = SettingsView::Main;
        self.exit_deadline = None;
        self.panel_focus = None;
        self.focus_deadline = Some(now + PANEL_FOCUS_DELAY);
        self.hide_deadline = None;
    }

    /// Enter a settings sub-view
    pub fn open_sub_view(&mut self, view: SettingsView, now: Instant) {
        if self.state.active_panel != Panel::Settings {
            return;
        }
        self.state.settings_sub_view = view;
        self.panel_focus = None;
        self.focus_deadline = Some(now + PANEL_FOCUS_DELAY);
    }

    /// Back out of a sub-view, or close the panel from its main view
    pub fn back(&mut self, now: Instant) {
        match self.state.active_panel {
            Panel::None => {}
            Panel::Settings if self.state.settings_sub_view != SettingsView::Main => {
                let previous = self.state.settings_sub_view;
                self.state.settings_sub_view = SettingsView::Main;
                // Land back on the entry that led into the sub-view
                self.panel_focus = SettingsView::MAIN_ENTRIES
                    .iter()
                    .position(|v| *v == previous);
                self.focus_deadline = None;
            }
            _ => self.close_panel(now),
        }
    }

    /// Close the active panel and return focus to its opener
    pub fn close_panel(&mut self, now: Instant) {
        if self.state.active_panel == Panel::None {
            return;
        }
        debug!(panel = ?self.state.active_panel, "panel closed");
        self.state.active_panel = Panel::None;
        self.panel_focus = None;
        self.focus_deadline = None;
        self.exit_deadline = Some(now + PANEL_EXIT);
        match self.opener.take() {
            Some(target) => self.map.focus(target),
            None => self.map.restore_top(),
        }
        self.sync_recs_focus();
        self.touch(now);
    }

    /// Move focus inside the open panel with wraparound
    pub fn cycle_panel_focus(&mut self, forward: bool, len: usize) {
        if len == 0 {
            self.panel_focus = None;
            return;
        }
        self.focus_deadline = None;
        self.panel_focus = Some(match self.panel_focus {
            None if forward => 0,
            None => len - 1,
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
        });
    }

    /// Clamp panel focus after the option list changed
    pub fn clamp_panel_focus(&mut self, len: usize) {
        if let Some(i) = self.panel_focus {
            self.panel_focus = if len == 0 { None } else { Some(i.min(len - 1)) };
        }
    }

    /// Fire elapsed timers
    pub fn tick(&mut self, now: Instant, playing: bool) {
        if self.exit_deadline.is_some_and(|d| now >= d) {
            self.exit_deadline = None;
            if self.state.active_panel == Panel::None {
                self.state.settings_sub_view = SettingsView::Main;
            }
        }
        if self.focus_deadline.is_some_and(|d| now >= d) {
            self.focus_deadline = None;
            if self.state.active_panel != Panel::None && self.panel_focus.is_none() {
                self.panel_focus = Some(0);
            }
        }
        if !playing {
            return;
        }
        let idle = self.hide_deadline.is_some_and(|d| now >= d);
        if idle && self.state.overlay_visible && self.state.active_panel == Panel::None {
            self.hide();
        }
    }

    pub(super) fn sync_recs_focus(&mut self) {
        self.state.recs_focused = matches!(self.map.current(), Some(OverlayFocus::Recommendation(_)));
    }
}
