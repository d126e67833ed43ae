//! In-memory retained UI tree
//!
//! A small element tree implementing [`FocusSurface`]. The terminal player
//! lays its widgets out into one of these each frame, and tests build them
//! by hand. Document order is depth-first pre-order; later elements paint
//! on top of earlier ones.

use std::collections::HashMap;

use super::graph::{FocusId, FocusSurface, Scope, ScrollOptions};
use crate::models::Rect;

#[derive(Debug, Clone)]
struct Node {
    parent: Option<FocusId>,
    children: Vec<FocusId>,
    label: String,
    rect: Rect,
    focusable: bool,
    hidden: bool,
    disabled: bool,
}

/// Element tree with focus, modal and activation bookkeeping
#[derive(Debug, Clone)]
pub struct UiTree {
    nodes: HashMap<FocusId, Node>,
    root: FocusId,
    next_id: u64,
    focused: Option<FocusId>,
    modal: Option<FocusId>,
    viewport: Rect,
    scroll_log: Vec<(FocusId, ScrollOptions)>,
    activations: Vec<FocusId>,
}

impl UiTree {
    /// Create a tree whose root covers the viewport
    pub fn new(viewport: Rect) -> Self {
        let root = FocusId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                parent: None,
                children: Vec::new(),
                label: "root".into(),
                rect: viewport,
                focusable: false,
                hidden: false,
                disabled: false,
            },
        );

        Self {
            nodes,
            root,
            next_id: 1,
            focused: None,
            modal: None,
            viewport,
            scroll_log: Vec::new(),
            activations: Vec::new(),
        }
    }

    pub fn root(&self) -> FocusId {
        self.root
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Append a non-focusable container under `parent`
    pub fn add_container(&mut self, parent: FocusId, label: &str, rect: Rect) -> FocusId {
        self.insert(parent, label, rect, false)
    }

    /// Append a focusable element under `parent`
    pub fn add_focusable(&mut self, parent: FocusId, label: &str, rect: Rect) -> FocusId {
        self.insert(parent, label, rect, true)
    }

    fn insert(&mut self, parent: FocusId, label: &str, rect: Rect, focusable: bool) -> FocusId {
        let id = FocusId(self.next_id);
        self.next_id += 1;
        let parent = if self.nodes.contains_key(&parent) {
            parent
        } else {
            self.root
        };
        self.nodes.insert(
            id,
            Node {
                parent: Some(parent),
                children: Vec::new(),
                label: label.to_string(),
                rect,
                focusable,
                hidden: false,
                disabled: false,
            },
        );
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    /// Remove an element and its subtree; focus inside it is dropped
    pub fn remove(&mut self, id: FocusId) {
        if id == self.root {
            return;
        }
        let subtree = self.preorder(id);
        if let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|&c| c != id);
            }
        }
        for node in subtree {
            self.nodes.remove(&node);
            if self.focused == Some(node) {
                self.focused = None;
            }
            if self.modal == Some(node) {
                self.modal = None;
            }
        }
    }

    pub fn set_rect(&mut self, id: FocusId, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.rect = rect;
        }
    }

    pub fn set_hidden(&mut self, id: FocusId, hidden: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.hidden = hidden;
        }
    }

    pub fn set_disabled(&mut self, id: FocusId, disabled: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.disabled = disabled;
        }
    }

    /// Restrict navigation to the subtree rooted at `id`
    pub fn open_modal(&mut self, id: FocusId) {
        if self.nodes.contains_key(&id) {
            self.modal = Some(id);
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn label(&self, id: FocusId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.label.as_str())
    }

    /// First element carrying `label`, in document order
    pub fn find(&self, label: &str) -> Option<FocusId> {
        self.preorder(self.root)
            .into_iter()
            .find(|id| self.label(*id) == Some(label))
    }

    /// Scroll requests issued so far, oldest first
    pub fn scroll_log(&self) -> &[(FocusId, ScrollOptions)] {
        &self.scroll_log
    }

    /// Drain synthetic activations for the host to act on
    pub fn take_activations(&mut self) -> Vec<FocusId> {
        std::mem::take(&mut self.activations)
    }

    fn preorder(&self, from: FocusId) -> Vec<FocusId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }
}

impl FocusSurface for UiTree {
    fn focusable_ids(&self, scope: Scope) -> Vec<FocusId> {
        let from = match scope {
            Scope::Document => self.root,
            Scope::Subtree(id) => id,
        };
        self.preorder(from)
            .into_iter()
            .filter(|id| self.nodes.get(id).is_some_and(|n| n.focusable))
            .collect()
    }

    fn bounding_box(&self, id: FocusId) -> Option<Rect> {
        self.nodes.get(&id).map(|n| n.rect)
    }

    fn is_visible(&self, id: FocusId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.nodes.get(&current) {
                Some(node) if node.hidden => return false,
                Some(node) => cursor = node.parent,
                None => return false,
            }
        }
        true
    }

    fn is_disabled(&self, id: FocusId) -> bool {
        self.nodes.get(&id).map(|n| n.disabled).unwrap_or(true)
    }

    fn focused(&self) -> Option<FocusId> {
        self.focused
    }

    fn focus(&mut self, id: FocusId) {
        if self.nodes.contains_key(&id) {
            self.focused = Some(id);
        }
    }

    fn blur(&mut self) {
        self.focused = None;
    }

    fn scroll_into_view(&mut self, id: FocusId, options: ScrollOptions) {
        self.scroll_log.push((id, options));
    }

    fn modal_root(&self) -> Option<FocusId> {
        self.modal
    }

    fn element_at(&self, x: f64, y: f64) -> Option<FocusId> {
        self.preorder(self.root)
            .into_iter()
            .filter(|&id| id != self.root && self.is_visible(id))
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| !n.rect.is_empty() && n.rect.contains(x, y))
            })
            .last()
    }

    fn activate(&mut self, id: FocusId) {
        if self.nodes.contains_key(&id) && !self.is_disabled(id) {
            self.activations.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> UiTree {
        UiTree::new(Rect::new(0.0, 0.0, 1920.0, 1080.0))
    }

    #[test]
    fn test_document_order_is_preorder() {
        let mut t = tree();
        let row = t.add_container(t.root(), "row", Rect::new(0.0, 0.0, 500.0, 100.0));
        let a = t.add_focusable(row, "a", Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = t.add_focusable(t.root(), "b", Rect::new(0.0, 200.0, 50.0, 50.0));
        let c = t.add_focusable(row, "c", Rect::new(60.0, 0.0, 50.0, 50.0));
        assert_eq!(t.focusable_ids(Scope::Document), vec![a, c, b]);
        assert_eq!(t.focusable_ids(Scope::Subtree(row)), vec![a, c]);
    }

    #[test]
    fn test_hidden_ancestor_hides_children() {
        let mut t = tree();
        let row = t.add_container(t.root(), "row", Rect::new(0.0, 0.0, 500.0, 100.0));
        let a = t.add_focusable(row, "a", Rect::new(0.0, 0.0, 50.0, 50.0));
        assert!(t.is_visible(a));
        t.set_hidden(row, true);
        assert!(!t.is_visible(a));
    }

    #[test]
    fn test_element_at_returns_topmost() {
        let mut t = tree();
        let back = t.add_focusable(t.root(), "back", Rect::new(0.0, 0.0, 200.0, 200.0));
        let front = t.add_focusable(t.root(), "front", Rect::new(50.0, 50.0, 50.0, 50.0));
        assert_eq!(t.element_at(60.0, 60.0), Some(front));
        assert_eq!(t.element_at(10.0, 10.0), Some(back));
        assert_eq!(t.element_at(1000.0, 1000.0), None);
    }

    #[test]
    fn test_remove_drops_focus() {
        let mut t = tree();
        let a = t.add_focusable(t.root(), "a", Rect::new(0.0, 0.0, 50.0, 50.0));
        t.focus(a);
        t.remove(a);
        assert_eq!(t.focused(), None);
        assert!(t.focusable_ids(Scope::Document).is_empty());
    }

    #[test]
    fn test_disabled_elements_are_not_activated() {
        let mut t = tree();
        let a = t.add_focusable(t.root(), "a", Rect::new(0.0, 0.0, 50.0, 50.0));
        t.set_disabled(a, true);
        t.activate(a);
        assert!(t.take_activations().is_empty());
    }
}
