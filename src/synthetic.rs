//! Re-express navigation as key presses on the focused host element.
//!
//! Text fields, sliders and third-party list widgets already react to keys,
//! so instead of teaching each of them about gamepads, we send them keys.
//! Presses go to the focused element, not to a global listener, otherwise
//! focus-scoped widgets never see them.
use bevy::input::keyboard::KeyCode;
use bevy::log::trace;

use crate::{host::UiHost, normalize::KeyPress};

/// Keys the re-emitter knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticKey {
    Enter,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Backspace,
    Space,
    Shift,
    /// Switches the on-screen keyboard to its symbols layout.
    Symbols,
}
impl SyntheticKey {
    /// The physical key this stands for.
    pub fn key_code(self) -> KeyCode {
        use SyntheticKey::*;
        match self {
            Enter => KeyCode::Enter,
            Escape => KeyCode::Escape,
            ArrowUp => KeyCode::ArrowUp,
            ArrowDown => KeyCode::ArrowDown,
            ArrowLeft => KeyCode::ArrowLeft,
            ArrowRight => KeyCode::ArrowRight,
            Backspace => KeyCode::Backspace,
            Space => KeyCode::Space,
            Shift => KeyCode::ShiftLeft,
            Symbols => KeyCode::AltRight,
        }
    }
}

/// A key press created by the launcher, never by a physical keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticKeyPress<E> {
    pub key: SyntheticKey,
    pub shift: bool,
    pub target: E,
}
impl<E> SyntheticKeyPress<E> {
    /// How this press looks to a key listener: always untrusted.
    pub fn as_key_press(&self) -> KeyPress {
        KeyPress {
            key: self.key.key_code(),
            shift: self.shift,
            is_trusted: false,
        }
    }
}

/// Send `key` to the focused element, or to the root if nothing has focus.
pub fn reemit<H: UiHost>(host: &mut H, key: SyntheticKey, shift: bool) -> SyntheticKeyPress<H::Element> {
    let target = host.focused().unwrap_or_else(|| host.root());
    reemit_to(host, target, key, shift)
}

/// Send `key` to `target`.
pub fn reemit_to<H: UiHost>(
    host: &mut H,
    target: H::Element,
    key: SyntheticKey,
    shift: bool,
) -> SyntheticKeyPress<H::Element> {
    let press = SyntheticKeyPress { key, shift, target };
    trace!("Re-emitting {key:?} to {target:?}");
    host.dispatch_key(press);
    press
}
