//! Geometry of the overlay, in terminal cells
//!
//! Rendering and the focus tree both read positions from here, so the
//! cursor hits exactly what is drawn.

use crate::models::Rect;
use crate::overlay::{OverlayFocus, OverlayState, Panel};

pub const CONTROL_WIDTH: f64 = 12.0;
pub const REC_WIDTH: f64 = 22.0;
pub const PANEL_WIDTH: f64 = 32.0;
const MARGIN: f64 = 2.0;
const GAP: f64 = 1.0;

/// Placed overlay elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayLayout {
    /// Body elements in document order
    pub body: Vec<(OverlayFocus, Rect)>,
    /// First recommendation that fits on screen
    pub first_rec: usize,
    /// Panel frame, when one is open
    pub panel: Option<Rect>,
    /// One row per panel control
    pub panel_items: Vec<Rect>,
    /// Band where captions are drawn
    pub captions: Rect,
}

impl OverlayLayout {
    pub fn rect_of(&self, target: OverlayFocus) -> Option<Rect> {
        self.body
            .iter()
            .find(|(f, _)| *f == target)
            .map(|(_, r)| *r)
    }
}

/// Lay the overlay out inside `viewport`
///
/// `focused_rec` keeps the recommendations row scrolled so that entry stays
/// visible.
pub fn overlay_layout(
    viewport: Rect,
    state: &OverlayState,
    recommendations: usize,
    focused_rec: usize,
    panel_len: usize,
    caption_position_percent: u8,
) -> OverlayLayout {
    let w = viewport.width;
    let h = viewport.height;
    let mut layout = OverlayLayout::default();

    let travel = (h - 3.0).max(0.0);
    let band_y = viewport.y + travel * caption_position_percent.min(100) as f64 / 100.0;
    layout.captions = Rect::new(
        viewport.x + MARGIN,
        band_y,
        (w - 2.0 * MARGIN).max(0.0),
        3.0,
    );

    if state.overlay_visible {
        let top_y = viewport.y + h - 11.0;
        let controls_w = 4.0 * (CONTROL_WIDTH + GAP);
        let info_w = (w - 2.0 * MARGIN - controls_w - GAP).max(0.0);
        layout
            .body
            .push((OverlayFocus::Info, Rect::new(viewport.x + MARGIN, top_y, info_w, 3.0)));
        let mut x = viewport.x + w - MARGIN - controls_w;
        for target in &OverlayFocus::TOP_ROW[1..] {
            layout
                .body
                .push((*target, Rect::new(x, top_y, CONTROL_WIDTH, 3.0)));
            x += CONTROL_WIDTH + GAP;
        }

        layout.body.push((
            OverlayFocus::Progress,
            Rect::new(viewport.x + MARGIN, top_y + 4.0, (w - 2.0 * MARGIN).max(0.0), 2.0),
        ));

        let per_row = (((w - 2.0 * MARGIN) / (REC_WIDTH + GAP)).floor() as usize).max(1);
        layout.first_rec = (focused_rec + 1).saturating_sub(per_row);
        let rec_y = top_y + 7.0;
        for (slot, i) in (layout.first_rec..recommendations).take(per_row).enumerate() {
            let x = viewport.x + MARGIN + slot as f64 * (REC_WIDTH + GAP);
            layout
                .body
                .push((OverlayFocus::Recommendation(i), Rect::new(x, rec_y, REC_WIDTH, 3.0)));
        }

        // Captions move up out of the way of the controls
        if layout.captions.y + layout.captions.height > top_y {
            layout.captions.y = (top_y - 3.0).max(viewport.y);
        }
    }

    if state.active_panel != Panel::None {
        let panel = Rect::new(
            viewport.x + (w - PANEL_WIDTH - 1.0).max(0.0),
            viewport.y + 1.0,
            PANEL_WIDTH.min(w),
            (h - 2.0).max(0.0),
        );
        layout.panel_items = (0..panel_len)
            .map(|i| Rect::new(panel.x + 1.0, panel.y + 2.0 + i as f64, panel.width - 2.0, 1.0))
            .collect();
        layout.panel = Some(panel);
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Control;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 120.0, 40.0)
    }

    #[test]
    fn test_tiers_are_stacked() {
        let layout = overlay_layout(viewport(), &OverlayState::default(), 3, 0, 0, 90);
        let top = layout.rect_of(OverlayFocus::Control(Control::PlayPause)).unwrap();
        let progress = layout.rect_of(OverlayFocus::Progress).unwrap();
        let rec = layout.rect_of(OverlayFocus::Recommendation(0)).unwrap();
        assert!(top.y < progress.y && progress.y < rec.y);
        assert!(rec.y + rec.height <= 40.0);
    }

    #[test]
    fn test_recommendations_scroll_to_focus() {
        let layout = overlay_layout(viewport(), &OverlayState::default(), 20, 12, 0, 90);
        assert!(layout.rect_of(OverlayFocus::Recommendation(12)).is_some());
        assert!(layout.rect_of(OverlayFocus::Recommendation(0)).is_none());
    }

    #[test]
    fn test_hidden_overlay_has_no_body() {
        let state = OverlayState {
            overlay_visible: false,
            ..OverlayState::default()
        };
        let layout = overlay_layout(viewport(), &state, 3, 0, 0, 90);
        assert!(layout.body.is_empty());
        assert!(layout.panel.is_none());
    }

    #[test]
    fn test_panel_rows() {
        let state = OverlayState {
            active_panel: Panel::Settings,
            ..OverlayState::default()
        };
        let layout = overlay_layout(viewport(), &state, 0, 0, 3, 90);
        assert_eq!(layout.panel_items.len(), 3);
        let (x, y) = layout.panel_items[2].center();
        assert!(layout.panel.unwrap().contains(x, y));
    }
}
