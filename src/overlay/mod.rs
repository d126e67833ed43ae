//! Playback overlay
//!
//! - State: visibility, mutually exclusive panels and their timers
//! - Focus map: tiered focus traversal of the overlay body
//!
//! [`PlayerOverlay`] turns keys into overlay transitions and queues the
//! resulting player commands for the shell to apply.

pub mod focus_map;
pub mod state;

use crossterm::event::{KeyCode, KeyEvent};
use std::time::Instant;
use tracing::debug;

pub use focus_map::{Control, FocusMap, Horizontal, OverlayFocus, Vertical};
pub use state::{
    OverlayState, OverlayStateMachine, Panel, SettingsView, AUTO_HIDE, PANEL_EXIT,
    PANEL_FOCUS_DELAY,
};

use crate::focus::ScreenKeys;
use crate::models::SubtitleSettings;
use crate::player::{PLAYBACK_RATES, SEEK_STEP};

/// Requests the overlay makes of the player
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand {
    TogglePlay,
    SeekBy(f64),
    SetPlaybackRate(f64),
    SelectQuality(String),
    /// `None` turns captions off
    SelectCaption(Option<String>),
    AdjustSubtitles(SubtitleAdjust),
    TogglePip,
    OpenRecommendation(usize),
}

/// Rows of the subtitle appearance view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppearanceRow {
    FontSize,
    Background,
    Edge,
    Position,
}

impl AppearanceRow {
    pub const ALL: [AppearanceRow; 4] = [
        AppearanceRow::FontSize,
        AppearanceRow::Background,
        AppearanceRow::Edge,
        AppearanceRow::Position,
    ];
}

/// One step of a subtitle appearance change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleAdjust {
    FontSize(i16),
    Background(i16),
    CycleEdge,
    Position(i16),
}

impl SubtitleAdjust {
    pub const FONT_STEP: i16 = 10;
    pub const BACKGROUND_STEP: i16 = 10;
    pub const POSITION_STEP: i16 = 5;

    fn for_row(row: AppearanceRow, increase: bool) -> Self {
        let sign = if increase { 1 } else { -1 };
        match row {
            AppearanceRow::FontSize => SubtitleAdjust::FontSize(sign * Self::FONT_STEP),
            AppearanceRow::Background => SubtitleAdjust::Background(sign * Self::BACKGROUND_STEP),
            AppearanceRow::Edge => SubtitleAdjust::CycleEdge,
            AppearanceRow::Position => SubtitleAdjust::Position(sign * Self::POSITION_STEP),
        }
    }

    /// Apply the step, keeping every field in range
    pub fn apply(self, settings: SubtitleSettings) -> SubtitleSettings {
        fn step_u8(value: u8, delta: i16) -> u8 {
            (value as i16 + delta).clamp(0, 100) as u8
        }
        let mut next = settings;
        match self {
            SubtitleAdjust::FontSize(d) => {
                next.font_size_percent = (settings.font_size_percent as i32 + d as i32).clamp(
                    SubtitleSettings::MIN_FONT_SIZE as i32,
                    SubtitleSettings::MAX_FONT_SIZE as i32,
                ) as u16;
            }
            SubtitleAdjust::Background(d) => {
                next.background_opacity_percent = step_u8(settings.background_opacity_percent, d);
            }
            SubtitleAdjust::CycleEdge => next.edge_style = settings.edge_style.next(),
            SubtitleAdjust::Position(d) => {
                next.vertical_position_percent = step_u8(settings.vertical_position_percent, d);
            }
        }
        next.clamped()
    }
}

/// Data the panels list, refreshed by the shell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayOptions {
    /// Quality labels in resolver order
    pub qualities: Vec<String>,
    /// (language, label) of each converted caption track
    pub captions: Vec<(String, String)>,
    pub recommendations: usize,
}

/// Key handling for the playback overlay
#[derive(Debug, Clone, Default)]
pub struct PlayerOverlay {
    machine: OverlayStateMachine,
    options: OverlayOptions,
    commands: Vec<OverlayCommand>,
}

impl PlayerOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OverlayState {
        self.machine.state()
    }

    pub fn machine(&self) -> &OverlayStateMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut OverlayStateMachine {
        &mut self.machine
    }

    pub fn options(&self) -> &OverlayOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: OverlayOptions) {
        if options == self.options {
            return;
        }
        self.machine
            .focus_map_mut()
            .set_recommendations(options.recommendations);
        self.machine.sync_recs_focus();
        self.options = options;
        let len = self.panel_len();
        self.machine.clamp_panel_focus(len);
    }

    /// Commands queued since the last call
    pub fn take_commands(&mut self) -> Vec<OverlayCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn tick(&mut self, now: Instant, playing: bool) {
        self.machine.tick(now, playing);
    }

    /// Number of focusable controls in the open panel view
    pub fn panel_len(&self) -> usize {
        let state = self.machine.state();
        match state.active_panel {
            Panel::None => 0,
            Panel::Subtitles => 1 + self.options.captions.len(),
            Panel::Settings => match state.settings_sub_view {
                SettingsView::Main => SettingsView::MAIN_ENTRIES.len(),
                SettingsView::Speed => PLAYBACK_RATES.len(),
                SettingsView::Quality => self.options.qualities.len(),
                SettingsView::SubtitleSettings => AppearanceRow::ALL.len(),
            },
        }
    }

    /// Activate an element of the overlay body (key or pointer)
    pub fn activate(&mut self, target: OverlayFocus, now: Instant) {
        self.machine.focus(target);
        self.machine.touch(now);
        match target {
            OverlayFocus::Info => {}
            OverlayFocus::Control(Control::PlayPause) | OverlayFocus::Progress => {
                self.commands.push(OverlayCommand::TogglePlay)
            }
            OverlayFocus::Control(Control::Subtitles) => {
                self.machine.open_panel(Panel::Subtitles, now)
            }
            OverlayFocus::Control(Control::Settings) => self.machine.open_panel(Panel::Settings, now),
            OverlayFocus::Control(Control::Pip) => self.commands.push(OverlayCommand::TogglePip),
            OverlayFocus::Recommendation(i) => {
                self.commands.push(OverlayCommand::OpenRecommendation(i))
            }
        }
    }

    /// Activate the panel control at `index`
    pub fn activate_panel_item(&mut self, index: usize, now: Instant) {
        if index >= self.panel_len() {
            return;
        }
        let state = self.machine.state();
        match (state.active_panel, state.settings_sub_view) {
            (Panel::None, _) => {}
            (Panel::Subtitles, _) => {
                let language = index
                    .checked_sub(1)
                    .and_then(|i| self.options.captions.get(i))
                    .map(|(language, _)| language.clone());
                self.commands.push(OverlayCommand::SelectCaption(language));
                self.machine.close_panel(now);
            }
            (Panel::Settings, SettingsView::Main) => {
                self.machine
                    .open_sub_view(SettingsView::MAIN_ENTRIES[index], now);
            }
            (Panel::Settings, SettingsView::Speed) => {
                self.commands
                    .push(OverlayCommand::SetPlaybackRate(PLAYBACK_RATES[index]));
                self.machine.back(now);
            }
            (Panel::Settings, SettingsView::Quality) => {
                let label = self.options.qualities[index].clone();
                self.commands.push(OverlayCommand::SelectQuality(label));
                self.machine.back(now);
            }
            (Panel::Settings, SettingsView::SubtitleSettings) => {
                if AppearanceRow::ALL[index] == AppearanceRow::Edge {
                    self.commands
                        .push(OverlayCommand::AdjustSubtitles(SubtitleAdjust::CycleEdge));
                }
            }
        }
    }

    fn handle_panel_key(&mut self, code: KeyCode, now: Instant) {
        let len = self.panel_len();
        match code {
            KeyCode::Esc | KeyCode::Backspace => self.machine.back(now),
            KeyCode::Tab | KeyCode::Down => self.machine.cycle_panel_focus(true, len),
            KeyCode::BackTab | KeyCode::Up => self.machine.cycle_panel_focus(false, len),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(i) = self.machine.panel_focus() {
                    self.activate_panel_item(i, now);
                }
            }
            KeyCode::Left | KeyCode::Right => {
                let state = self.machine.state();
                let on_appearance = state.active_panel == Panel::Settings
                    && state.settings_sub_view == SettingsView::SubtitleSettings;
                let row = self
                    .machine
                    .panel_focus()
                    .and_then(|i| AppearanceRow::ALL.get(i).copied());
                if let (true, Some(row)) = (on_appearance, row) {
                    let adjust = SubtitleAdjust::for_row(row, code == KeyCode::Right);
                    self.commands.push(OverlayCommand::AdjustSubtitles(adjust));
                }
            }
            // Panels are modal
            _ => {}
        }
    }

    fn handle_body_key(&mut self, code: KeyCode, now: Instant) -> bool {
        self.machine.touch(now);
        match code {
            KeyCode::Up | KeyCode::Down => {
                let moved = self.machine.focus_map_mut().move_vertical(code == KeyCode::Down);
                match moved {
                    Vertical::HideOverlay => self.machine.hide(),
                    Vertical::Moved(_) => self.machine.sync_recs_focus(),
                    Vertical::Clamped => {}
                }
                true
            }
            KeyCode::Left | KeyCode::Right => {
                let moved = self
                    .machine
                    .focus_map_mut()
                    .move_horizontal(code == KeyCode::Right, SEEK_STEP);
                if let Horizontal::Seek(delta) = moved {
                    self.commands.push(OverlayCommand::SeekBy(delta));
                }
                true
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                match self.machine.focused() {
                    Some(target) => self.activate(target, now),
                    None => self.commands.push(OverlayCommand::TogglePlay),
                }
                true
            }
            KeyCode::Esc => {
                self.machine.hide();
                true
            }
            _ => false,
        }
    }

    fn handle_hidden_key(&mut self, code: KeyCode, now: Instant) -> bool {
        match code {
            KeyCode::Down => {
                self.machine.show(now);
                true
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.commands.push(OverlayCommand::TogglePlay);
                true
            }
            _ => false,
        }
    }
}

impl ScreenKeys for PlayerOverlay {
    fn handle_key(&mut self, key: &KeyEvent, now: Instant) -> bool {
        let state = self.machine.state();
        let handled = if state.active_panel != Panel::None {
            self.handle_panel_key(key.code, now);
            true
        } else if state.overlay_visible {
            self.handle_body_key(key.code, now)
        } else {
            self.handle_hidden_key(key.code, now)
        };
        if handled {
            debug!(key = ?key.code, state = ?self.machine.state(), "overlay key");
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EdgeStyle;
    use crossterm::event::KeyModifiers;
    use std::time::Duration;

    fn press(overlay: &mut PlayerOverlay, code: KeyCode, now: Instant) -> bool {
        overlay.handle_key(&KeyEvent::new(code, KeyModifiers::NONE), now)
    }

    fn overlay() -> PlayerOverlay {
        let mut o = PlayerOverlay::new();
        o.set_options(OverlayOptions {
            qualities: vec!["1080p".into(), "720p".into()],
            captions: vec![("en".into(), "English".into()), ("ar".into(), "Arabic".into())],
            recommendations: 3,
        });
        o
    }

    #[test]
    fn test_progress_bar_seeks_by_five_seconds() {
        let now = Instant::now();
        let mut o = overlay();
        press(&mut o, KeyCode::Down, now);
        press(&mut o, KeyCode::Left, now);
        press(&mut o, KeyCode::Right, now);
        assert_eq!(
            o.take_commands(),
            vec![OverlayCommand::SeekBy(-5.0), OverlayCommand::SeekBy(5.0)]
        );
    }

    #[test]
    fn test_up_from_top_hides_and_enter_toggles_while_hidden() {
        let now = Instant::now();
        let mut o = overlay();
        assert!(press(&mut o, KeyCode::Up, now));
        assert!(!o.state().overlay_visible);
        assert!(press(&mut o, KeyCode::Enter, now));
        assert!(!o.state().overlay_visible);
        assert_eq!(o.take_commands(), vec![OverlayCommand::TogglePlay]);
        assert!(press(&mut o, KeyCode::Down, now));
        assert!(o.state().overlay_visible);
        assert_eq!(
            o.machine().focused(),
            Some(OverlayFocus::Control(Control::PlayPause))
        );
    }

    #[test]
    fn test_recs_focus_tracks_bottom_tier() {
        let now = Instant::now();
        let mut o = overlay();
        press(&mut o, KeyCode::Down, now);
        press(&mut o, KeyCode::Down, now);
        assert!(o.state().recs_focused);
        press(&mut o, KeyCode::Right, now);
        press(&mut o, KeyCode::Enter, now);
        assert_eq!(o.take_commands(), vec![OverlayCommand::OpenRecommendation(1)]);
        press(&mut o, KeyCode::Up, now);
        assert!(!o.state().recs_focused);
    }

    #[test]
    fn test_quality_selection_through_settings() {
        let now = Instant::now();
        let mut o = overlay();
        o.activate(OverlayFocus::Control(Control::Settings), now);
        assert_eq!(o.state().active_panel, Panel::Settings);
        // Quality is the second entry of the main list
        press(&mut o, KeyCode::Down, now);
        press(&mut o, KeyCode::Down, now);
        press(&mut o, KeyCode::Enter, now);
        assert_eq!(o.state().settings_sub_view, SettingsView::Quality);
        o.tick(now + PANEL_FOCUS_DELAY, true);
        press(&mut o, KeyCode::Up, now);
        press(&mut o, KeyCode::Enter, now);
        assert_eq!(
            o.take_commands(),
            vec![OverlayCommand::SelectQuality("720p".into())]
        );
        assert_eq!(o.state().settings_sub_view, SettingsView::Main);
        press(&mut o, KeyCode::Esc, now);
        assert_eq!(o.state().active_panel, Panel::None);
        assert_eq!(
            o.machine().focused(),
            Some(OverlayFocus::Control(Control::Settings))
        );
    }

    #[test]
    fn test_subtitle_chooser_selects_and_closes() {
        let now = Instant::now();
        let mut o = overlay();
        o.activate(OverlayFocus::Control(Control::Subtitles), now);
        o.tick(now + PANEL_FOCUS_DELAY, true);
        press(&mut o, KeyCode::Tab, now);
        press(&mut o, KeyCode::Tab, now);
        press(&mut o, KeyCode::Enter, now);
        assert_eq!(
            o.take_commands(),
            vec![OverlayCommand::SelectCaption(Some("ar".into()))]
        );
        assert_eq!(o.state().active_panel, Panel::None);
    }

    #[test]
    fn test_opening_one_panel_closes_the_other() {
        let now = Instant::now();
        let mut o = overlay();
        o.activate(OverlayFocus::Control(Control::Subtitles), now);
        o.activate_panel_item(0, now + Duration::from_millis(1));
        o.take_commands();
        o.activate(OverlayFocus::Control(Control::Subtitles), now);
        o.machine_mut().open_panel(Panel::Settings, now);
        assert_eq!(o.state().active_panel, Panel::Settings);
    }

    #[test]
    fn test_panel_swallows_navigation_keys() {
        let now = Instant::now();
        let mut o = overlay();
        o.activate(OverlayFocus::Control(Control::Settings), now);
        assert!(press(&mut o, KeyCode::Char('x'), now));
        assert!(press(&mut o, KeyCode::Left, now));
        assert!(o.take_commands().is_empty());
    }

    #[test]
    fn test_appearance_adjustments() {
        let now = Instant::now();
        let mut o = overlay();
        o.activate(OverlayFocus::Control(Control::Settings), now);
        o.machine_mut()
            .open_sub_view(SettingsView::SubtitleSettings, now);
        o.tick(now + PANEL_FOCUS_DELAY, true);
        press(&mut o, KeyCode::Right, now);
        press(&mut o, KeyCode::Down, now);
        press(&mut o, KeyCode::Down, now);
        press(&mut o, KeyCode::Enter, now);
        assert_eq!(
            o.take_commands(),
            vec![
                OverlayCommand::AdjustSubtitles(SubtitleAdjust::FontSize(10)),
                OverlayCommand::AdjustSubtitles(SubtitleAdjust::CycleEdge),
            ]
        );
    }

    #[test]
    fn test_subtitle_adjust_clamps() {
        let settings = SubtitleSettings {
            font_size_percent: 195,
            background_opacity_percent: 5,
            edge_style: EdgeStyle::Outline,
            vertical_position_percent: 98,
        };
        let s = SubtitleAdjust::FontSize(10).apply(settings);
        assert_eq!(s.font_size_percent, 200);
        let s = SubtitleAdjust::Background(-10).apply(s);
        assert_eq!(s.background_opacity_percent, 0);
        let s = SubtitleAdjust::Position(5).apply(s);
        assert_eq!(s.vertical_position_percent, 100);
        let s = SubtitleAdjust::CycleEdge.apply(s);
        assert_eq!(s.edge_style, EdgeStyle::None);
    }
}
