//! Top-level keyboard handling
//!
//! One decision per keypress: the cursor controller sees the key first,
//! then the active screen (e.g. the player overlay), then spatial
//! navigation for arrows and native activation for Enter/Space. An arrow
//! that disarms the cursor skips the screen and goes straight to spatial
//! navigation.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use std::time::Instant;
use tracing::debug;

use super::cursor::{CursorDecision, CursorModeController};
use super::graph::{FocusId, FocusSurface};
use super::spatial::{NavOutcome, SpatialNavigator};
use crate::models::{Direction, Rect};

/// A screen that wants keys before spatial navigation does
pub trait ScreenKeys {
    /// Return true when the key was handled
    fn handle_key(&mut self, key: &KeyEvent, now: Instant) -> bool;
}

/// Outcome of dispatching one keypress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Cursor mode was armed by this press
    CursorArmed,
    /// Cursor click on the topmost element under the pointer (if any)
    CursorClick(Option<FocusId>),
    /// Consumed without further effect
    Consumed,
    /// The active screen handled the key
    Screen,
    /// Spatial navigation moved focus
    Moved(FocusId),
    /// The focused element was activated
    Activated(FocusId),
    /// Nobody handled the key
    Unhandled,
}

/// Composes cursor mode and spatial navigation
#[derive(Debug, Clone)]
pub struct InputDispatcher {
    cursor: CursorModeController,
    navigator: SpatialNavigator,
}

impl InputDispatcher {
    pub fn new(viewport: Rect) -> Self {
        Self {
            cursor: CursorModeController::new(viewport),
            navigator: SpatialNavigator::new(),
        }
    }

    pub fn cursor(&self) -> &CursorModeController {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut CursorModeController {
        &mut self.cursor
    }

    /// Fire lapsed timers
    pub fn tick(&mut self, now: Instant) {
        self.cursor.tick(now);
    }

    /// Resize without losing cursor state
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.cursor.set_viewport(viewport);
    }

    fn navigate<S: FocusSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        direction: Direction,
    ) -> Dispatch {
        match self.navigator.navigate(surface, direction) {
            NavOutcome::Moved(id) => Dispatch::Moved(id),
            NavOutcome::Unchanged => Dispatch::Consumed,
        }
    }

    /// Route one key event
    pub fn dispatch<S: FocusSurface + ?Sized>(
        &mut self,
        key: KeyEvent,
        now: Instant,
        surface: &mut S,
        screen: Option<&mut dyn ScreenKeys>,
    ) -> Dispatch {
        // Only presses count (releases show up on some platforms)
        if key.kind != KeyEventKind::Press {
            return Dispatch::Unhandled;
        }

        match self.cursor.on_key(key.code, now) {
            CursorDecision::Armed => return Dispatch::CursorArmed,
            CursorDecision::Swallowed => return Dispatch::Consumed,
            CursorDecision::Click { x, y } => {
                let hit = surface.element_at(x, y);
                if let Some(id) = hit {
                    debug!(target = %id, x, y, "cursor click");
                    surface.activate(id);
                }
                return Dispatch::CursorClick(hit);
            }
            // The screen never sees the disarming arrow
            CursorDecision::Disarmed => {
                if let Some(direction) = Direction::from_key(key.code) {
                    return self.navigate(surface, direction);
                }
            }
            CursorDecision::Pass => {}
        }

        if let Some(screen) = screen {
            if screen.handle_key(&key, now) {
                return Dispatch::Screen;
            }
        }

        if let Some(direction) = Direction::from_key(key.code) {
            return self.navigate(surface, direction);
        }

        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => match surface.focused() {
                Some(id) => {
                    surface.activate(id);
                    Dispatch::Activated(id)
                }
                None => Dispatch::Unhandled,
            },
            _ => Dispatch::Unhandled,
        }
    }
}
