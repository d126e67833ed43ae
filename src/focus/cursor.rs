//! Pointer-emulation cursor mode
//!
//! Three Enter presses, each within 500 ms of the previous one, arm a
//! virtual cursor. While armed, arrows disarm it (and fall through to
//! spatial navigation), Enter clicks whatever sits under the cursor, and
//! every other key is swallowed.
//!
//! Time is passed in explicitly so the state machine is deterministic.

use crossterm::event::KeyCode;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::Rect;

/// Rolling window between consecutive Enter presses
pub const PRESS_WINDOW: Duration = Duration::from_millis(500);

/// Length of the visual click pulse
pub const CLICK_EFFECT: Duration = Duration::from_millis(400);

/// Presses needed to arm the cursor
pub const ARM_PRESSES: u8 = 3;

/// Observable phase of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    Idle,
    Counting(u8),
    Armed,
}

/// Cursor bookkeeping owned by the input dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct CursorState {
    pub armed: bool,
    pub position: (f64, f64),
    pub click_effect_until: Option<Instant>,
    pub pending_press_count: u8,
    pub press_window_deadline: Option<Instant>,
}

/// What the dispatcher should do with a keypress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorDecision {
    /// Not ours: continue normal handling
    Pass,
    /// Third Enter armed the cursor; the key is consumed
    Armed,
    /// An arrow disarmed the cursor; the same key continues to navigation
    Disarmed,
    /// Enter while armed: click at this point; the key is consumed
    Click { x: f64, y: f64 },
    /// Armed and the key means nothing to the cursor; consumed
    Swallowed,
}

/// Triple-Enter state machine
#[derive(Debug, Clone)]
pub struct CursorModeController {
    state: CursorState,
}

impl CursorModeController {
    /// Cursor starts at the center of the viewport
    pub fn new(viewport: Rect) -> Self {
        Self {
            state: CursorState {
                armed: false,
                position: viewport.center(),
                click_effect_until: None,
                pending_press_count: 0,
                press_window_deadline: None,
            },
        }
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state.armed
    }

    pub fn position(&self) -> (f64, f64) {
        self.state.position
    }

    /// Current phase, after expiring a lapsed press window
    pub fn phase(&mut self, now: Instant) -> CursorPhase {
        self.expire(now);
        if self.state.armed {
            CursorPhase::Armed
        } else if self.state.pending_press_count > 0 {
            CursorPhase::Counting(self.state.pending_press_count)
        } else {
            CursorPhase::Idle
        }
    }

    /// Move the virtual pointer (host-driven, e.g. from a pointer device)
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.state.position = (x, y);
    }

    /// Keep the pointer inside a resized viewport; armed state and press count survive
    pub fn set_viewport(&mut self, viewport: Rect) {
        let (x, y) = self.state.position;
        let x = x.min(viewport.x + viewport.width).max(viewport.x);
        let y = y.min(viewport.y + viewport.height).max(viewport.y);
        self.state.position = (x, y);
    }

    pub fn click_effect_active(&self, now: Instant) -> bool {
        self.state.click_effect_until.is_some_and(|until| now < until)
    }

    /// Fire lapsed timers
    pub fn tick(&mut self, now: Instant) {
        self.expire(now);
        if self
            .state
            .click_effect_until
            .is_some_and(|until| now >= until)
        {
            self.state.click_effect_until = None;
        }
    }

    fn expire(&mut self, now: Instant) {
        if self
            .state
            .press_window_deadline
            .is_some_and(|deadline| now >= deadline)
        {
            self.state.pending_press_count = 0;
            self.state.press_window_deadline = None;
        }
    }

    fn reset_count(&mut self) {
        self.state.pending_press_count = 0;
        self.state.press_window_deadline = None;
    }

    /// Feed one keypress through the state machine
    pub fn on_key(&mut self, code: KeyCode, now: Instant) -> CursorDecision {
        self.expire(now);

        if self.state.armed {
            return match code {
                KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                    debug!("cursor mode disarmed by arrow key");
                    self.state.armed = false;
                    CursorDecision::Disarmed
                }
                KeyCode::Enter => {
                    self.state.click_effect_until = Some(now + CLICK_EFFECT);
                    let (x, y) = self.state.position;
                    CursorDecision::Click { x, y }
                }
                _ => CursorDecision::Swallowed,
            };
        }

        if code != KeyCode::Enter {
            // Any other key breaks a run of consecutive presses
            self.reset_count();
            return CursorDecision::Pass;
        }

        self.state.pending_press_count += 1;
        self.state.press_window_deadline = Some(now + PRESS_WINDOW);

        if self.state.pending_press_count >= ARM_PRESSES {
            debug!("cursor mode armed");
            self.reset_count();
            self.state.armed = true;
            CursorDecision::Armed
        } else {
            CursorDecision::Pass
        }
    }
}
