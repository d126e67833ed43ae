//! Player overlay rendering
//!
//! Draws the backdrop, caption band, overlay tiers, the open panel and the
//! pointer-emulation cursor from a [`PlayerApp`].

use ratatui::layout::{Alignment, Rect as CellRect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, LineGauge, Paragraph};
use ratatui::Frame;
use std::time::Instant;

use super::theme::Theme;
use crate::app::PlayerApp;
use crate::models::Rect;
use crate::overlay::{AppearanceRow, Control, OverlayFocus, Panel, SettingsView};
use crate::player::{MediaSurface, PLAYBACK_RATES};

/// Format seconds as HH:MM:SS or MM:SS
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Convert a layout rectangle to terminal cells, clipped to `area`
fn cells(rect: Rect, area: CellRect) -> CellRect {
    let x = rect.x.max(0.0).round() as u16;
    let y = rect.y.max(0.0).round() as u16;
    let w = rect.width.max(0.0).round() as u16;
    let h = rect.height.max(0.0).round() as u16;
    CellRect::new(x, y, w, h).intersection(area)
}

pub fn render<S: MediaSurface>(frame: &mut Frame, app: &PlayerApp<S>, now: Instant) {
    let area = frame.area();
    let backdrop = Theme::backdrop(app.backdrop());
    frame.render_widget(Block::default().style(Style::default().bg(backdrop)), area);

    render_status(frame, app, area);
    render_captions(frame, app, area);

    let layout = app.layout();
    let state = app.overlay().state();
    if state.overlay_visible {
        let focused = app.overlay().machine().focused();
        for (target, rect) in &layout.body {
            let cell = cells(*rect, area);
            let is_focused = focused == Some(*target);
            match target {
                OverlayFocus::Info => render_info(frame, app, cell),
                OverlayFocus::Control(control) => render_control(frame, app, *control, cell, is_focused),
                OverlayFocus::Progress => render_progress(frame, app, cell, is_focused),
                OverlayFocus::Recommendation(i) => render_recommendation(frame, app, *i, cell, is_focused),
            }
        }
    }

    if let Some(panel) = layout.panel {
        render_panel(frame, app, cells(panel, area), area);
    }

    render_cursor(frame, app, area, now);
}

fn render_status<S: MediaSurface>(frame: &mut Frame, app: &PlayerApp<S>, area: CellRect) {
    let Some((message, severity)) = app.notifier().last() else {
        return;
    };
    let line = Line::from(Span::styled(message, Theme::severity(severity)));
    let row = CellRect::new(area.x, area.y, area.width, 1.min(area.height));
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), row);
}

fn render_captions<S: MediaSurface>(frame: &mut Frame, app: &PlayerApp<S>, area: CellRect) {
    let lines = app.session().cues().active_lines();
    if lines.is_empty() {
        return;
    }
    let style = Theme::caption(app.subtitle_settings(), app.backdrop());
    let text: Vec<Line> = lines
        .iter()
        .flat_map(|cue| cue.lines())
        .map(|l| Line::from(Span::styled(l.to_string(), style)))
        .collect();
    frame.render_widget(
        Paragraph::new(text).alignment(Alignment::Center),
        cells(app.layout().captions, area),
    );
}

fn render_info<S: MediaSurface>(frame: &mut Frame, app: &PlayerApp<S>, cell: CellRect) {
    let state = app.session().state();
    let title = state
        .item
        .as_ref()
        .map(|i| match state.episode {
            Some(ep) => format!("{} · {}", i.title, ep),
            None => i.title.clone(),
        })
        .unwrap_or_default();

    let mut detail = Vec::new();
    if let Some(provider) = &state.resolved_provider {
        detail.push(Span::styled(
            app.session().text().text("player.provider", &[("provider", provider.as_str())]),
            Theme::dimmed(),
        ));
        detail.push(Span::raw("  "));
    }
    if let Some(quality) = &state.active_quality {
        detail.push(Span::styled(quality.clone(), Theme::quality(quality)));
    }
    if state.is_buffering {
        detail.push(Span::styled("  buffering…", Theme::dimmed()));
    }
    if let Some(error) = &state.error {
        detail = vec![Span::styled(error.clone(), Theme::severity(crate::models::Severity::Error))];
    }

    let text = vec![
        Line::from(Span::styled(title, Theme::title())),
        Line::from(detail),
    ];
    frame.render_widget(Paragraph::new(text), cell);
}

fn render_control<S: MediaSurface>(
    frame: &mut Frame,
    app: &PlayerApp<S>,
    control: Control,
    cell: CellRect,
    focused: bool,
) {
    let text = app.session().text();
    let label = match control {
        Control::PlayPause if app.session().state().is_playing => "❚❚ Pause".to_string(),
        Control::PlayPause => "▶ Play".to_string(),
        Control::Subtitles => text.text("player.subtitles", &[]),
        Control::Settings => text.text("player.settings", &[]),
        Control::Pip if app.pip() => "PiP ●".to_string(),
        Control::Pip => "PiP".to_string(),
    };
    let style = if focused { Theme::highlighted() } else { Theme::text() };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border(focused));
    frame.render_widget(
        Paragraph::new(Span::styled(label, style))
            .alignment(Alignment::Center)
            .block(block),
        cell,
    );
}

fn render_progress<S: MediaSurface>(frame: &mut Frame, app: &PlayerApp<S>, cell: CellRect, focused: bool) {
    let state = app.session().state();
    let ratio = if state.duration > 0.0 {
        (state.current_time / state.duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let label = format!(
        "{} / {}",
        format_time(state.current_time),
        format_time(state.duration)
    );
    let label_style = if focused { Theme::highlighted() } else { Theme::text() };
    let gauge = LineGauge::default()
        .ratio(ratio)
        .label(Span::styled(label, label_style))
        .filled_style(Theme::progress_bar())
        .unfilled_style(Theme::dimmed());
    frame.render_widget(gauge, cell);
}

fn render_recommendation<S: MediaSurface>(
    frame: &mut Frame,
    app: &PlayerApp<S>,
    index: usize,
    cell: CellRect,
    focused: bool,
) {
    let Some(item) = app.session().state().recommendations.get(index) else {
        return;
    };
    let title = match item.year {
        Some(year) => format!("{} ({})", item.title, year),
        None => item.title.clone(),
    };
    let style = if focused { Theme::selected() } else { Theme::text() };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border(focused));
    frame.render_widget(Paragraph::new(Span::styled(title, style)).block(block), cell);
}

/// Rows of the open panel, with a marker for the active option
fn panel_rows<S: MediaSurface>(app: &PlayerApp<S>) -> (String, Vec<(String, bool)>) {
    let text = app.session().text();
    let session = app.session();
    let options = app.overlay().options();
    let state = app.overlay().state();
    match (state.active_panel, state.settings_sub_view) {
        (Panel::None, _) => (String::new(), Vec::new()),
        (Panel::Subtitles, _) => {
            let selected = session.selected_caption();
            let mut rows = vec![(text.text("player.subtitles_off", &[]), selected.is_none())];
            rows.extend(
                options
                    .captions
                    .iter()
                    .map(|(lang, label)| (label.clone(), selected == Some(lang.as_str()))),
            );
            (text.text("player.subtitles", &[]), rows)
        }
        (Panel::Settings, SettingsView::Main) => {
            let rows = SettingsView::MAIN_ENTRIES
                .iter()
                .map(|view| {
                    let label = match view {
                        SettingsView::Speed => text.text("player.speed", &[]),
                        SettingsView::Quality => text.text("player.quality", &[]),
                        _ => text.text("player.subtitle_appearance", &[]),
                    };
                    (label, false)
                })
                .collect();
            (text.text("player.settings", &[]), rows)
        }
        (Panel::Settings, SettingsView::Speed) => {
            let rate = session.state().playback_rate;
            let rows = PLAYBACK_RATES
                .iter()
                .map(|r| (format!("{}x", r), (r - rate).abs() < f64::EPSILON))
                .collect();
            (text.text("player.speed", &[]), rows)
        }
        (Panel::Settings, SettingsView::Quality) => {
            let active = session.state().active_quality.as_deref();
            let rows = options
                .qualities
                .iter()
                .map(|q| (q.clone(), active == Some(q.as_str())))
                .collect();
            (text.text("player.quality", &[]), rows)
        }
        (Panel::Settings, SettingsView::SubtitleSettings) => {
            let s = app.subtitle_settings();
            let rows = AppearanceRow::ALL
                .iter()
                .map(|row| {
                    let row = match row {
                        AppearanceRow::FontSize => {
                            format!("{}  ◀ {}% ▶", text.text("player.font_size", &[]), s.font_size_percent)
                        }
                        AppearanceRow::Background => format!(
                            "{}  ◀ {}% ▶",
                            text.text("player.background", &[]),
                            s.background_opacity_percent
                        ),
                        AppearanceRow::Edge => {
                            format!("{}  {}", text.text("player.edge", &[]), s.edge_style)
                        }
                        AppearanceRow::Position => format!(
                            "{}  ◀ {}% ▶",
                            text.text("player.position", &[]),
                            s.vertical_position_percent
                        ),
                    };
                    (row, false)
                })
                .collect();
            (text.text("player.subtitle_appearance", &[]), rows)
        }
    }
}

fn render_panel<S: MediaSurface>(frame: &mut Frame, app: &PlayerApp<S>, cell: CellRect, area: CellRect) {
    let (title, rows) = panel_rows(app);
    frame.render_widget(Clear, cell);
    let block = Block::default()
        .title(Span::styled(format!(" {} ", title), Theme::title()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border(true))
        .style(Theme::panel());
    frame.render_widget(block, cell);

    let focus = app.overlay().machine().panel_focus();
    for (i, ((label, active), rect)) in rows.into_iter().zip(&app.layout().panel_items).enumerate() {
        let marker = if active { "● " } else { "  " };
        let style = if focus == Some(i) {
            Theme::highlighted()
        } else if active {
            Theme::selected()
        } else {
            Theme::text()
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!("{}{}", marker, label), style)),
            cells(*rect, area),
        );
    }
}

fn render_cursor<S: MediaSurface>(frame: &mut Frame, app: &PlayerApp<S>, area: CellRect, now: Instant) {
    let cursor = app.dispatcher().cursor();
    if !cursor.is_armed() {
        return;
    }
    let (x, y) = cursor.position();
    let cell = cells(Rect::new(x, y, 1.0, 1.0), area);
    let style = if cursor.click_effect_active(now) {
        Style::default().fg(Theme::HIGHLIGHT).add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(Theme::PRIMARY).add_modifier(Modifier::BOLD)
    };
    frame.render_widget(Paragraph::new(Span::styled("◆", style)), cell);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(65.4), "01:05");
        assert_eq!(format_time(3725.0), "01:02:05");
        assert_eq!(format_time(-3.0), "00:00");
    }

    #[test]
    fn test_cells_clip_to_area() {
        let area = CellRect::new(0, 0, 80, 24);
        let cell = cells(Rect::new(70.0, 20.0, 20.0, 10.0), area);
        assert_eq!(cell, CellRect::new(70, 20, 10, 4));
    }
}
