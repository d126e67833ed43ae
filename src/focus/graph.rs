//! Focus capability interface and per-decision snapshots
//!
//! The navigator never touches a UI toolkit directly. Hosts implement
//! [`FocusSurface`] and every navigation decision takes a fresh
//! [`FocusGraph`] snapshot of it, so geometry is never cached across frames.

use serde::Serialize;
use std::fmt;

use crate::models::Rect;

/// Stable identity of a UI element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FocusId(pub u64);

impl fmt::Display for FocusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Subtree that bounds a navigation decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The whole document
    Document,
    /// Content of an open modal (or any other subtree root)
    Subtree(FocusId),
}

/// How an element is brought into view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOptions {
    pub smooth: bool,
    pub centered: bool,
}

impl ScrollOptions {
    /// Smooth scroll that centers the element in the viewport
    pub const SMOOTH_CENTER: ScrollOptions = ScrollOptions {
        smooth: true,
        centered: true,
    };
}

/// Capability interface a UI toolkit implements for focus navigation
pub trait FocusSurface {
    /// Focusable elements inside `scope`, in document order
    fn focusable_ids(&self, scope: Scope) -> Vec<FocusId>;

    fn bounding_box(&self, id: FocusId) -> Option<Rect>;

    /// False when the element or one of its ancestors is hidden
    fn is_visible(&self, id: FocusId) -> bool;

    fn is_disabled(&self, id: FocusId) -> bool;

    /// Element that currently holds focus, if any
    fn focused(&self) -> Option<FocusId>;

    fn focus(&mut self, id: FocusId);

    /// Drop focus entirely
    fn blur(&mut self);

    fn scroll_into_view(&mut self, id: FocusId, options: ScrollOptions);

    /// Root of the open modal, which becomes the navigation scope
    fn modal_root(&self) -> Option<FocusId>;

    /// Topmost element under a viewport point
    fn element_at(&self, x: f64, y: f64) -> Option<FocusId>;

    /// Synthetic activation (click) of an element
    fn activate(&mut self, id: FocusId);
}

/// A focusable element as seen at snapshot time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusTarget {
    pub id: FocusId,
    pub rect: Rect,
}

/// Ephemeral snapshot of the focusable elements in one scope
#[derive(Debug, Clone, Default)]
pub struct FocusGraph {
    targets: Vec<FocusTarget>,
    current: Option<FocusId>,
}

impl FocusGraph {
    /// Snapshot the active scope: the open modal, or the whole document
    pub fn snapshot<S: FocusSurface + ?Sized>(surface: &S) -> Self {
        let scope = surface
            .modal_root()
            .map(Scope::Subtree)
            .unwrap_or(Scope::Document);
        Self::snapshot_in(surface, scope)
    }

    /// Snapshot an explicit scope
    pub fn snapshot_in<S: FocusSurface + ?Sized>(surface: &S, scope: Scope) -> Self {
        let targets = surface
            .focusable_ids(scope)
            .into_iter()
            .filter(|&id| surface.is_visible(id) && !surface.is_disabled(id))
            .filter_map(|id| {
                surface
                    .bounding_box(id)
                    .filter(|rect| !rect.is_empty())
                    .map(|rect| FocusTarget { id, rect })
            })
            .collect();

        Self {
            targets,
            current: surface.focused(),
        }
    }

    /// Build a graph from pre-computed targets
    pub fn from_targets(targets: Vec<FocusTarget>, current: Option<FocusId>) -> Self {
        Self { targets, current }
    }

    /// Candidates in document order
    pub fn targets(&self) -> &[FocusTarget] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, id: FocusId) -> Option<&FocusTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// The focused element, only if it is itself a candidate
    pub fn current_target(&self) -> Option<&FocusTarget> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn current(&self) -> Option<FocusId> {
        self.current
    }
}
