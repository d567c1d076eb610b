//! An in-memory [`UiHost`].
//!
//! Elements live in an arena, in the order they were spawned, which is
//! also their document order. Everything the navigator does to the UI
//! (focus, clicks, key presses, window commands) is applied or recorded,
//! so the tree doubles as a test fixture and as the host of headless apps.
use crate::{
    host::{ElementKind, HostError, UiHost},
    synthetic::SyntheticKeyPress,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

#[derive(Debug, Clone)]
struct Node {
    parent: Option<ElementId>,
    kind: ElementKind,
    modal: bool,
    dialog: bool,
    disabled: bool,
    removed: bool,
}

#[derive(Debug, Clone)]
pub struct ElementTree {
    nodes: Vec<Node>,
    focused: Option<ElementId>,
    dispatched: Vec<SyntheticKeyPress<ElementId>>,
    clicks: Vec<ElementId>,
    window_visible: bool,
    window_broken: bool,
}
impl Default for ElementTree {
    fn default() -> Self {
        let root = Node {
            parent: None,
            kind: ElementKind::Container,
            modal: false,
            dialog: false,
            disabled: false,
            removed: false,
        };
        ElementTree {
            nodes: vec![root],
            focused: None,
            dispatched: Vec::new(),
            clicks: Vec::new(),
            window_visible: true,
            window_broken: false,
        }
    }
}
impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(id.0).filter(|node| !node.removed)
    }

    fn push(&mut self, parent: ElementId, kind: ElementKind, modal: bool) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            kind,
            modal,
            dialog: modal,
            disabled: false,
            removed: false,
        });
        id
    }

    pub fn spawn(&mut self, parent: ElementId, kind: ElementKind) -> ElementId {
        self.push(parent, kind, false)
    }

    /// Spawn an open modal dialog container.
    pub fn spawn_modal(&mut self, parent: ElementId) -> ElementId {
        self.push(parent, ElementKind::Container, true)
    }

    /// Spawn a non-modal dialog container (e.g. an alert toast).
    pub fn spawn_dialog(&mut self, parent: ElementId) -> ElementId {
        let id = self.push(parent, ElementKind::Container, false);
        self.nodes[id.0].dialog = true;
        id
    }

    /// Remove `id` and all its descendants.
    ///
    /// Focus is dropped if it was inside the removed subtree.
    pub fn remove(&mut self, id: ElementId) {
        if id == self.root() {
            return;
        }
        let doomed: Vec<_> = (0..self.nodes.len())
            .map(ElementId)
            .filter(|&e| self.is_descendant(e, id))
            .collect();
        for e in doomed {
            self.nodes[e.0].removed = true;
        }
        if self.focused.map_or(false, |f| self.node(f).is_none()) {
            self.focused = None;
        }
    }

    pub fn set_disabled(&mut self, id: ElementId, disabled: bool) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.disabled = disabled;
        }
    }

    /// Focus as a pointer or the user would, bypassing the navigator.
    pub fn set_focused(&mut self, id: Option<ElementId>) {
        self.focused = id.filter(|&e| self.node(e).is_some());
    }

    /// Make window commands fail from now on.
    pub fn break_window(&mut self) {
        self.window_broken = true;
    }

    pub fn dispatched(&self) -> &[SyntheticKeyPress<ElementId>] {
        &self.dispatched
    }

    pub fn take_dispatched(&mut self) -> Vec<SyntheticKeyPress<ElementId>> {
        std::mem::take(&mut self.dispatched)
    }

    pub fn clicks(&self) -> &[ElementId] {
        &self.clicks
    }

    pub fn is_window_visible(&self) -> bool {
        self.window_visible
    }

    /// Whether `element` is `ancestor` or below it.
    fn is_descendant(&self, element: ElementId, ancestor: ElementId) -> bool {
        let mut current = Some(element);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id.0).and_then(|n| n.parent);
        }
        false
    }

    fn set_window(&mut self, visible: bool) -> Result<(), HostError> {
        if self.window_broken {
            let action = if visible { "show" } else { "hide" };
            return Err(HostError::Window {
                action,
                reason: "window manager unavailable".to_owned(),
            });
        }
        self.window_visible = visible;
        Ok(())
    }
}

impl UiHost for ElementTree {
    type Element = ElementId;

    fn root(&self) -> ElementId {
        ElementId(0)
    }

    fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    fn kind(&self, element: ElementId) -> ElementKind {
        self.node(element).map_or(ElementKind::Container, |n| n.kind)
    }

    fn is_in_dialog(&self, element: ElementId) -> bool {
        let mut current = self.node(element).map(|_| element);
        while let Some(id) = current {
            let Some(node) = self.node(id) else {
                return false;
            };
            if node.dialog {
                return true;
            }
            current = node.parent;
        }
        false
    }

    fn modals(&self) -> Vec<ElementId> {
        let open = |(i, node): (usize, &Node)| (node.modal && !node.removed).then_some(ElementId(i));
        self.nodes.iter().enumerate().filter_map(open).collect()
    }

    fn focusables_of(&self, container: ElementId) -> Vec<ElementId> {
        let reachable = |(i, node): (usize, &Node)| {
            let id = ElementId(i);
            let candidate = !node.removed && !node.disabled && node.kind.is_focusable();
            (candidate && id != container && self.is_descendant(id, container)).then_some(id)
        };
        self.nodes.iter().enumerate().filter_map(reachable).collect()
    }

    fn focus(&mut self, element: ElementId) {
        self.set_focused(Some(element));
    }

    fn click(&mut self, element: ElementId) {
        if self.node(element).is_some() {
            self.clicks.push(element);
        }
    }

    fn dispatch_key(&mut self, press: SyntheticKeyPress<ElementId>) {
        self.dispatched.push(press);
    }

    fn hide_window(&mut self) -> Result<(), HostError> {
        self.set_window(false)
    }

    fn show_window(&mut self) -> Result<(), HostError> {
        self.set_window(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ElementKind::*;

    #[test]
    fn focusables_in_document_order() {
        let mut tree = ElementTree::new();
        let modal = tree.spawn_modal(tree.root());
        let row = tree.spawn(modal, Container);
        let a = tree.spawn(row, Button);
        let outside = tree.spawn(tree.root(), Button);
        let b = tree.spawn(modal, Range);
        let c = tree.spawn(row, Link);
        tree.set_disabled(c, true);

        assert_eq!(tree.focusables_of(modal), vec![a, b]);
        assert_eq!(tree.modals(), vec![modal]);
        assert!(tree.is_in_dialog(a));
        assert!(!tree.is_in_dialog(outside));
    }

    #[test]
    fn removing_drops_focus_and_modal() {
        let mut tree = ElementTree::new();
        let modal = tree.spawn_modal(tree.root());
        let ok = tree.spawn(modal, Button);
        tree.set_focused(Some(ok));

        tree.remove(modal);
        assert_eq!(tree.focused(), None);
        assert!(tree.modals().is_empty());
        tree.set_focused(Some(ok));
        assert_eq!(tree.focused(), None);
    }
}
