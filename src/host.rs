//! The boundary with the UI that renders the launcher.
use std::fmt;

use crate::synthetic::SyntheticKeyPress;

/// What a host UI element is, as far as navigation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Button,
    Link,
    /// Single or multi-line text entry.
    TextInput,
    /// A slider, adjusted with left/right arrow keys.
    Range,
    /// Any other element explicitly part of the tab order.
    TabStop,
    /// Not focusable.
    Container,
}
impl ElementKind {
    pub fn is_focusable(self) -> bool {
        !matches!(self, ElementKind::Container)
    }
}

/// A fire-and-forget host command failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("could not {action} the launcher window: {reason}")]
    Window { action: &'static str, reason: String },
}

/// Query and focus primitives of the host UI.
///
/// Implement this for the UI toolkit rendering the launcher.
/// [`ElementTree`](crate::headless::ElementTree) is an in-memory
/// implementation.
///
/// All element lists are in document order.
pub trait UiHost {
    type Element: Copy + Eq + fmt::Debug + 'static;

    /// Fallback target for synthetic key presses.
    fn root(&self) -> Self::Element;

    /// The element with real UI focus, if any.
    fn focused(&self) -> Option<Self::Element>;

    fn kind(&self, element: Self::Element) -> ElementKind;

    /// Whether `element` is inside a dialog or alert-dialog.
    fn is_in_dialog(&self, element: Self::Element) -> bool;

    /// All currently open modal containers.
    fn modals(&self) -> Vec<Self::Element>;

    /// Focusable, enabled descendants of `container`.
    fn focusables_of(&self, container: Self::Element) -> Vec<Self::Element>;

    fn focus(&mut self, element: Self::Element);

    /// Activate `element` as a pointer click would.
    fn click(&mut self, element: Self::Element);

    /// Deliver a key press to its target element.
    fn dispatch_key(&mut self, press: SyntheticKeyPress<Self::Element>);

    fn hide_window(&mut self) -> Result<(), HostError> {
        Ok(())
    }

    fn show_window(&mut self) -> Result<(), HostError> {
        Ok(())
    }
}
