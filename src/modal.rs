//! Move focus inside the topmost open modal.
//!
//! The host UI decides which modals are open; the router only keeps track
//! of the element it last selected in the current one. Focusable elements
//! are looked up on every action, so modals can change their content
//! freely between two presses.
use std::fmt;

use bevy::log::trace;
use non_empty_vec::NonEmpty;

use crate::{
    events::NavigationAction,
    focus::arrow_key,
    host::{ElementKind, UiHost},
    synthetic::{reemit, SyntheticKey, SyntheticKeyPress},
};

/// What [`ModalRouter::route`] did with an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome<E> {
    /// No modal is open, nothing was done.
    Unhandled,
    /// The modal has no focusable elements.
    Stayed,
    Focused(E),
    Clicked(E),
    Reemitted(SyntheticKeyPress<E>),
}

/// Focus tracking for the topmost modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalRouter<E> {
    modal: Option<E>,
    selected: Option<E>,
}
impl<E> Default for ModalRouter<E> {
    fn default() -> Self {
        ModalRouter {
            modal: None,
            selected: None,
        }
    }
}
impl<E: Copy + Eq + fmt::Debug> ModalRouter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The element last focused by the router in the current modal.
    pub fn selected(&self) -> Option<E> {
        self.selected
    }

    pub fn reset(&mut self) {
        self.modal = None;
        self.selected = None;
    }

    /// Handle `action` inside the topmost modal of `host`.
    ///
    /// - Back always re-emits Escape, modals close themselves on it.
    /// - Confirm clicks the selected element, or re-emits Enter.
    /// - Directions re-emit arrow keys to a focused text field (and
    ///   left/right to a focused slider), otherwise they move the
    ///   selection through the modal's focusable elements, without
    ///   wrapping.
    pub fn route<H>(&mut self, host: &mut H, action: NavigationAction) -> RouteOutcome<E>
    where
        H: UiHost<Element = E>,
    {
        use NavigationAction::{Back, Confirm, Down, Left, Right, Up};

        if action == Back {
            return RouteOutcome::Reemitted(reemit(host, SyntheticKey::Escape, false));
        }
        let Some(&modal) = host.modals().last() else {
            self.reset();
            return RouteOutcome::Unhandled;
        };
        if self.modal != Some(modal) {
            trace!("Tracking new modal {modal:?}");
            self.modal = Some(modal);
            self.selected = None;
        }
        let focused_kind = host.focused().map(|element| host.kind(element));
        match action {
            Confirm => {
                let live = self.selected.filter(|e| host.focusables_of(modal).contains(e));
                match live {
                    Some(element) => {
                        host.focus(element);
                        host.click(element);
                        RouteOutcome::Clicked(element)
                    }
                    None => RouteOutcome::Reemitted(reemit(host, SyntheticKey::Enter, false)),
                }
            }
            Up | Down | Left | Right => {
                let slider = focused_kind == Some(ElementKind::Range);
                if focused_kind == Some(ElementKind::TextInput)
                    || (slider && matches!(action, Left | Right))
                {
                    return RouteOutcome::Reemitted(reemit(host, arrow_key(action), false));
                }
                let Ok(focusables) = NonEmpty::try_from(host.focusables_of(modal)) else {
                    return RouteOutcome::Stayed;
                };
                let last = focusables.len().get() - 1;
                let current = self
                    .selected
                    .and_then(|selected| focusables.iter().position(|&e| e == selected));
                let next = match (current, action) {
                    (None, _) => 0,
                    (Some(i), Up | Left) => i.saturating_sub(1),
                    (Some(i), _) => (i + 1).min(last),
                };
                let target = focusables[next];
                host.focus(target);
                self.selected = Some(target);
                RouteOutcome::Focused(target)
            }
            _ => RouteOutcome::Unhandled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{ElementId, ElementTree};
    use ElementKind::*;
    use NavigationAction::*;

    fn dialog() -> (ElementTree, ElementId, [ElementId; 3]) {
        let mut tree = ElementTree::new();
        let modal = tree.spawn_modal(tree.root());
        let buttons = [
            tree.spawn(modal, Button),
            tree.spawn(modal, Button),
            tree.spawn(modal, Button),
        ];
        (tree, modal, buttons)
    }

    #[test]
    fn moves_without_wrapping() {
        let (mut tree, _, [a, b, c]) = dialog();
        let mut router = ModalRouter::new();

        assert_eq!(router.route(&mut tree, Down), RouteOutcome::Focused(a));
        assert_eq!(router.route(&mut tree, Down), RouteOutcome::Focused(b));
        assert_eq!(router.route(&mut tree, Right), RouteOutcome::Focused(c));
        assert_eq!(router.route(&mut tree, Down), RouteOutcome::Focused(c));
        assert_eq!(router.route(&mut tree, Up), RouteOutcome::Focused(b));
        assert_eq!(tree.focused(), Some(b));
    }

    #[test]
    fn confirm_clicks_selection_or_reemits_enter() {
        let (mut tree, _, [a, b, _]) = dialog();
        let mut router = ModalRouter::new();

        let RouteOutcome::Reemitted(press) = router.route(&mut tree, Confirm) else {
            panic!("expected Enter to be re-emitted");
        };
        assert_eq!(press.key, SyntheticKey::Enter);

        router.route(&mut tree, Down);
        router.route(&mut tree, Down);
        assert_eq!(router.route(&mut tree, Confirm), RouteOutcome::Clicked(b));
        assert_eq!(tree.clicks(), &[b]);

        tree.remove(b);
        assert!(matches!(router.route(&mut tree, Confirm), RouteOutcome::Reemitted(_)));
        assert_eq!(router.route(&mut tree, Down), RouteOutcome::Focused(a));
    }

    #[test]
    fn new_modal_resets_selection() {
        let (mut tree, _, [a, b, _]) = dialog();
        let mut router = ModalRouter::new();
        router.route(&mut tree, Down);
        router.route(&mut tree, Down);
        assert_eq!(router.selected(), Some(b));

        let nested = tree.spawn_modal(tree.root());
        let ok = tree.spawn(nested, Button);
        assert_eq!(router.route(&mut tree, Down), RouteOutcome::Focused(ok));

        tree.remove(nested);
        assert_eq!(router.route(&mut tree, Down), RouteOutcome::Focused(a));
    }

    #[test]
    fn text_fields_and_sliders_get_arrow_keys() {
        let mut tree = ElementTree::new();
        let modal = tree.spawn_modal(tree.root());
        let field = tree.spawn(modal, TextInput);
        let volume = tree.spawn(modal, Range);
        let mut router = ModalRouter::new();

        tree.set_focused(Some(field));
        let RouteOutcome::Reemitted(press) = router.route(&mut tree, Up) else {
            panic!("expected an arrow key");
        };
        assert_eq!((press.key, press.target), (SyntheticKey::ArrowUp, field));

        tree.set_focused(Some(volume));
        let RouteOutcome::Reemitted(press) = router.route(&mut tree, Left) else {
            panic!("expected an arrow key");
        };
        assert_eq!((press.key, press.target), (SyntheticKey::ArrowLeft, volume));
        assert_eq!(router.route(&mut tree, Down), RouteOutcome::Focused(field));
    }

    #[test]
    fn without_modal() {
        let mut tree = ElementTree::new();
        let mut router = ModalRouter::new();
        assert_eq!(router.route(&mut tree, Down), RouteOutcome::Unhandled);

        let RouteOutcome::Reemitted(press) = router.route(&mut tree, Back) else {
            panic!("Back always re-emits Escape");
        };
        assert_eq!(press.key, SyntheticKey::Escape);

        let empty = tree.spawn_modal(tree.root());
        tree.spawn(empty, Container);
        assert_eq!(router.route(&mut tree, Down), RouteOutcome::Stayed);
    }
}
