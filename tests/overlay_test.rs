//! Overlay behaviour through the key interface
//!
//! Tier traversal, panel exclusivity and back-out, and the timers that
//! move focus into panels and hide the overlay while playing.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use streamtv::focus::ScreenKeys;
use streamtv::overlay::{
    Control, OverlayCommand, OverlayFocus, OverlayOptions, Panel, PlayerOverlay, SettingsView,
    AUTO_HIDE, PANEL_EXIT, PANEL_FOCUS_DELAY,
};

fn press(overlay: &mut PlayerOverlay, code: KeyCode, now: Instant) -> bool {
    overlay.handle_key(&KeyEvent::new(code, KeyModifiers::NONE), now)
}

fn overlay_with_recs(recommendations: usize) -> PlayerOverlay {
    let mut overlay = PlayerOverlay::new();
    overlay.set_options(OverlayOptions {
        qualities: vec!["720p".into(), "1080p".into()],
        captions: vec![("en".into(), "English".into()), ("ar".into(), "Arabic".into())],
        recommendations,
    });
    overlay
}

#[test]
fn test_tiers_walk_down_and_back_up() {
    let mut o = overlay_with_recs(3);
    let now = Instant::now();

    // Opens visible with play/pause focused
    assert!(o.state().overlay_visible);
    assert_eq!(o.machine().focused(), Some(OverlayFocus::Control(Control::PlayPause)));

    press(&mut o, KeyCode::Down, now);
    assert_eq!(o.machine().focused(), Some(OverlayFocus::Progress));
    press(&mut o, KeyCode::Up, now);
    assert_eq!(o.machine().focused(), Some(OverlayFocus::Control(Control::PlayPause)));
    press(&mut o, KeyCode::Right, now);
    assert_eq!(o.machine().focused(), Some(OverlayFocus::Control(Control::Subtitles)));

    press(&mut o, KeyCode::Down, now);
    assert_eq!(o.machine().focused(), Some(OverlayFocus::Progress));

    // Left/Right on the progress bar seek instead of moving
    press(&mut o, KeyCode::Right, now);
    press(&mut o, KeyCode::Left, now);
    assert_eq!(
        o.take_commands(),
        vec![OverlayCommand::SeekBy(5.0), OverlayCommand::SeekBy(-5.0)]
    );

    press(&mut o, KeyCode::Down, now);
    assert_eq!(o.machine().focused(), Some(OverlayFocus::Recommendation(0)));
    assert!(o.state().recs_focused);
    press(&mut o, KeyCode::Left, now);
    assert_eq!(o.machine().focused(), Some(OverlayFocus::Recommendation(0)));

    press(&mut o, KeyCode::Up, now);
    assert_eq!(o.machine().focused(), Some(OverlayFocus::Progress));
    press(&mut o, KeyCode::Up, now);
    // Top tier remembers where it was left
    assert_eq!(o.machine().focused(), Some(OverlayFocus::Control(Control::Subtitles)));

    press(&mut o, KeyCode::Up, now);
    assert!(!o.state().overlay_visible);
    assert_eq!(o.machine().focused(), None);
}

#[test]
fn test_hidden_overlay_keys() {
    let mut o = overlay_with_recs(0);
    let now = Instant::now();
    press(&mut o, KeyCode::Esc, now);
    assert!(!o.state().overlay_visible);

    assert!(press(&mut o, KeyCode::Enter, now));
    assert_eq!(o.take_commands(), vec![OverlayCommand::TogglePlay]);
    assert!(!o.state().overlay_visible);

    assert!(!press(&mut o, KeyCode::Left, now));

    assert!(press(&mut o, KeyCode::Down, now));
    assert!(o.state().overlay_visible);
}

#[test]
fn test_panels_are_exclusive_and_restore_opener() {
    let mut o = overlay_with_recs(0);
    let t0 = Instant::now();

    o.activate(OverlayFocus::Control(Control::Settings), t0);
    assert_eq!(o.state().active_panel, Panel::Settings);
    assert_eq!(o.machine().focused(), None);

    o.activate(OverlayFocus::Control(Control::Subtitles), t0);
    assert_eq!(o.state().active_panel, Panel::Subtitles);
    // Captions off plus one row per track
    assert_eq!(o.panel_len(), 3);

    // First control takes focus after a short delay
    o.tick(t0 + PANEL_FOCUS_DELAY / 2, true);
    assert_eq!(o.machine().panel_focus(), None);
    o.tick(t0 + PANEL_FOCUS_DELAY, true);
    assert_eq!(o.machine().panel_focus(), Some(0));

    press(&mut o, KeyCode::Esc, t0 + Duration::from_millis(100));
    assert_eq!(o.state().active_panel, Panel::None);
    assert_eq!(o.machine().focused(), Some(OverlayFocus::Control(Control::Settings)));
}

#[test]
fn test_settings_sub_view_back_out() {
    let mut o = overlay_with_recs(0);
    let t0 = Instant::now();
    o.activate(OverlayFocus::Control(Control::Settings), t0);
    o.tick(t0 + PANEL_FOCUS_DELAY, true);

    let speed = SettingsView::MAIN_ENTRIES
        .iter()
        .position(|v| *v == SettingsView::Speed)
        .unwrap();
    for _ in 0..speed {
        press(&mut o, KeyCode::Down, t0);
    }
    press(&mut o, KeyCode::Enter, t0);
    assert_eq!(o.state().settings_sub_view, SettingsView::Speed);

    press(&mut o, KeyCode::Esc, t0);
    assert_eq!(o.state().settings_sub_view, SettingsView::Main);
    assert_eq!(o.machine().panel_focus(), Some(speed));
    assert_eq!(o.state().active_panel, Panel::Settings);

    press(&mut o, KeyCode::Esc, t0);
    assert_eq!(o.state().active_panel, Panel::None);
    assert!(o.machine().is_closing());
    o.tick(t0 + PANEL_EXIT, true);
    assert!(!o.machine().is_closing());
}

#[test]
fn test_choosing_a_rate_returns_to_main() {
    let mut o = overlay_with_recs(0);
    let t0 = Instant::now();
    o.activate(OverlayFocus::Control(Control::Settings), t0);
    o.machine_mut().open_sub_view(SettingsView::Speed, t0);
    o.tick(t0 + PANEL_FOCUS_DELAY, true);

    // 0.5x, 0.75x, 1x
    press(&mut o, KeyCode::Down, t0);
    press(&mut o, KeyCode::Down, t0);
    press(&mut o, KeyCode::Enter, t0);

    assert_eq!(o.take_commands(), vec![OverlayCommand::SetPlaybackRate(1.0)]);
    assert_eq!(o.state().settings_sub_view, SettingsView::Main);
}

#[test]
fn test_subtitle_choice_closes_panel() {
    let mut o = overlay_with_recs(0);
    let t0 = Instant::now();
    o.activate(OverlayFocus::Control(Control::Subtitles), t0);
    o.activate_panel_item(2, t0);

    assert_eq!(o.take_commands(), vec![OverlayCommand::SelectCaption(Some("ar".into()))]);
    assert_eq!(o.state().active_panel, Panel::None);
}

#[test]
fn test_panel_swallows_unrelated_keys() {
    let mut o = overlay_with_recs(0);
    let t0 = Instant::now();
    o.activate(OverlayFocus::Control(Control::Settings), t0);
    assert!(press(&mut o, KeyCode::Char('x'), t0));
    assert!(press(&mut o, KeyCode::Left, t0));
    assert!(o.take_commands().is_empty());
}

#[test]
fn test_auto_hide_only_while_playing_without_panel() {
    let mut o = overlay_with_recs(0);
    let t0 = Instant::now();
    press(&mut o, KeyCode::Down, t0);

    o.tick(t0 + AUTO_HIDE, false);
    assert!(o.state().overlay_visible);

    o.activate(OverlayFocus::Control(Control::Settings), t0);
    o.tick(t0 + AUTO_HIDE * 2, true);
    assert!(o.state().overlay_visible);

    let t1 = t0 + AUTO_HIDE * 2;
    press(&mut o, KeyCode::Esc, t1);
    o.tick(t1 + AUTO_HIDE - Duration::from_millis(1), true);
    assert!(o.state().overlay_visible);
    o.tick(t1 + AUTO_HIDE, true);
    assert!(!o.state().overlay_visible);
}
