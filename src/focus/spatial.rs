//! Directional focus navigation
//!
//! Picks the next focus target from rectangle centers. Candidates must lie
//! in the half-plane of travel; among those, displacement perpendicular to
//! the travel axis costs twice as much as displacement along it. Ties keep
//! the candidate that comes first in document order.

use tracing::debug;

use super::graph::{FocusGraph, FocusId, FocusSurface, ScrollOptions};
use crate::models::{Direction, Rect};

/// Result of one navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Focus moved to this element
    Moved(FocusId),
    /// Nothing qualified; focus is unchanged
    Unchanged,
}

/// Cost of moving from `from` to `to` in `direction`, or `None` when `to`
/// lies outside the half-plane of travel
pub fn directional_cost(direction: Direction, from: &Rect, to: &Rect) -> Option<f64> {
    let (fx, fy) = from.center();
    let (tx, ty) = to.center();
    let dx = tx - fx;
    let dy = ty - fy;

    match direction {
        Direction::Right if dx > 0.0 => Some(2.0 * dy.abs() + dx),
        Direction::Left if dx < 0.0 => Some(2.0 * dy.abs() + dx.abs()),
        Direction::Down if dy > 0.0 => Some(2.0 * dx.abs() + dy),
        Direction::Up if dy < 0.0 => Some(2.0 * dx.abs() + dy.abs()),
        _ => None,
    }
}

/// Stateless spatial navigator
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialNavigator;

impl SpatialNavigator {
    pub fn new() -> Self {
        Self
    }

    /// Choose the next target in `graph` without touching any UI
    pub fn next_target(&self, graph: &FocusGraph, direction: Direction) -> Option<FocusId> {
        let Some(current) = graph.current_target() else {
            // Nothing focusable is focused yet: start from the first candidate
            return graph.targets().first().map(|t| t.id);
        };

        let mut best: Option<(FocusId, f64)> = None;
        for candidate in graph.targets() {
            if candidate.id == current.id {
                continue;
            }
            let Some(cost) = directional_cost(direction, &current.rect, &candidate.rect) else {
                continue;
            };
            // Strict comparison keeps the earliest candidate on ties
            if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                best = Some((candidate.id, cost));
            }
        }

        best.map(|(id, _)| id)
    }

    /// Snapshot the surface, pick a target, then focus and center it
    pub fn navigate<S: FocusSurface + ?Sized>(
        &self,
        surface: &mut S,
        direction: Direction,
    ) -> NavOutcome {
        let graph = FocusGraph::snapshot(surface);
        match self.next_target(&graph, direction) {
            Some(id) => {
                debug!(target = %id, %direction, "spatial focus move");
                surface.focus(id);
                surface.scroll_into_view(id, ScrollOptions::SMOOTH_CENTER);
                NavOutcome::Moved(id)
            }
            None => NavOutcome::Unchanged,
        }
    }
}
