//! The semantic event vocabulary shared by every input source.
use std::{fmt, str::FromStr, time::Duration};

use bevy::ecs::event::Event;

use crate::device::InputDeviceType;

/// A device-agnostic navigation intent.
///
/// The four `Vk*` actions are shortcuts for the on-screen keyboard, bound to
/// the gamepad bumpers and triggers by default.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum NavigationAction {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Back,
    Menu,
    QuickSettings,
    ToggleOverlay,
    VkBackspace,
    VkShift,
    VkSpace,
    VkSymbols,
}
impl NavigationAction {
    /// Every action, in declaration order.
    pub const ALL: [NavigationAction; 13] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Confirm,
        Self::Back,
        Self::Menu,
        Self::QuickSettings,
        Self::ToggleOverlay,
        Self::VkBackspace,
        Self::VkShift,
        Self::VkSpace,
        Self::VkSymbols,
    ];

    /// The canonical name, as accepted by the native channel.
    pub fn name(self) -> &'static str {
        use NavigationAction::*;
        match self {
            Up => "up",
            Down => "down",
            Left => "left",
            Right => "right",
            Confirm => "confirm",
            Back => "back",
            Menu => "menu",
            QuickSettings => "quick_settings",
            ToggleOverlay => "toggle_overlay",
            VkBackspace => "vk_backspace",
            VkShift => "vk_shift",
            VkSpace => "vk_space",
            VkSymbols => "vk_symbols",
        }
    }
}
impl fmt::Display for NavigationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A native action name that doesn't match any [`NavigationAction`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown navigation action `{0}`")]
pub struct UnknownAction(pub String);

impl FromStr for NavigationAction {
    type Err = UnknownAction;

    /// Case-insensitive, `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        NavigationAction::ALL
            .into_iter()
            .find(|action| action.name() == normalized)
            .ok_or_else(|| UnknownAction(s.to_owned()))
    }
}

/// Where a [`NavigationEvent`] came from.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum InputSource {
    Gamepad,
    Keyboard,
    Mouse,
    /// The host platform's out-of-band navigation channel.
    Native,
}

/// One meaningful user action, whatever device produced it.
///
/// Events are created by the [`Normalizer`](crate::normalize::Normalizer)
/// and delivered to every subscriber before the input call returns.
/// `timestamp` is the time elapsed since the navigator's clock origin
/// (bevy's `Time::elapsed` in the plugin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Event)]
pub struct NavigationEvent {
    pub action: NavigationAction,
    pub source: InputSource,
    pub timestamp: Duration,
}
impl NavigationEvent {
    pub fn new(action: NavigationAction, source: InputSource, timestamp: Duration) -> Self {
        NavigationEvent {
            action,
            source,
            timestamp,
        }
    }
}

/// What the launcher is asked to do, sent by the navigation plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Event)]
pub enum LauncherRequest {
    /// Start the library item at this index.
    Launch(usize),
    SelectSidebar(usize),
    /// Quit the running game.
    Quit,
    /// Step the quick-settings slider by `-1` or `+1`.
    AdjustSlider(i32),
}

/// An action name from the host platform's navigation channel.
///
/// Send it to have the navigation plugin parse and apply it.
#[derive(Debug, Clone, PartialEq, Eq, Event)]
pub struct NativeNavSignal(pub String);

/// The user switched to another kind of input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Event)]
pub struct DeviceChanged(pub InputDeviceType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_native_names() {
        assert_eq!("UP".parse(), Ok(NavigationAction::Up));
        assert_eq!("quick-settings".parse(), Ok(NavigationAction::QuickSettings));
        assert_eq!(
            " Toggle_Overlay ".parse(),
            Ok(NavigationAction::ToggleOverlay)
        );
        assert_eq!(
            "jump".parse::<NavigationAction>(),
            Err(UnknownAction("jump".to_owned()))
        );
    }
}
