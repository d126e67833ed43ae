//! Remote-control focus navigation
//!
//! - Graph: focus capability interface and per-decision snapshots
//! - Tree: in-memory element tree implementing the capability
//! - Spatial: directional next-target selection
//! - Cursor: triple-Enter pointer emulation
//! - Dispatcher: one routing decision per keypress

pub mod cursor;
pub mod dispatcher;
pub mod graph;
pub mod spatial;
pub mod tree;

pub use cursor::{CursorDecision, CursorModeController, CursorPhase, CursorState};
pub use dispatcher::{Dispatch, InputDispatcher, ScreenKeys};
pub use graph::{FocusGraph, FocusId, FocusSurface, FocusTarget, Scope, ScrollOptions};
pub use spatial::{NavOutcome, SpatialNavigator};
pub use tree::UiTree;
