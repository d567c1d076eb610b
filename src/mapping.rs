//! Default input bindings and timing constants.
use std::time::Duration;

use bevy::{ecs::system::Resource, input::keyboard::KeyCode};

use crate::events::NavigationAction;

/// Button indices of the standard gamepad layout.
///
/// Snapshots handed to the normalizer index their `buttons` with these.
pub mod pad {
    pub const SOUTH: usize = 0;
    pub const EAST: usize = 1;
    pub const WEST: usize = 2;
    pub const NORTH: usize = 3;
    pub const LEFT_BUMPER: usize = 4;
    pub const RIGHT_BUMPER: usize = 5;
    pub const LEFT_TRIGGER: usize = 6;
    pub const RIGHT_TRIGGER: usize = 7;
    pub const SELECT: usize = 8;
    pub const START: usize = 9;
    pub const LEFT_STICK: usize = 10;
    pub const RIGHT_STICK: usize = 11;
    pub const DPAD_UP: usize = 12;
    pub const DPAD_DOWN: usize = 13;
    pub const DPAD_LEFT: usize = 14;
    pub const DPAD_RIGHT: usize = 15;
    pub const GUIDE: usize = 16;
    /// Number of buttons in the standard layout.
    pub const BUTTON_COUNT: usize = 17;

    pub const LEFT_STICK_X: usize = 0;
    pub const LEFT_STICK_Y: usize = 1;
    pub const RIGHT_STICK_X: usize = 2;
    pub const RIGHT_STICK_Y: usize = 3;
    /// Some controllers report their D-pad as this axis pair. The bevy
    /// plugin never fills it, bevy reads the D-pad as buttons.
    pub const DPAD_X: usize = 6;
    pub const DPAD_Y: usize = 7;

    /// Number of controller slots checked each poll.
    pub const SLOTS: usize = 4;
}

/// Control default launcher input bindings and timings.
///
/// Insert your own before adding the plugin to override it.
#[derive(Debug, Clone, Resource)]
pub struct InputMapping {
    /// Keyboard keys and the action they map to.
    pub keys: Vec<(KeyCode, NavigationAction)>,
    /// Standard-layout button indices and the action they fire on press.
    pub buttons: Vec<(usize, NavigationAction)>,
    /// Analog trigger button indices, each latched on its own.
    pub triggers: Vec<(usize, NavigationAction)>,
    /// `(x, y)` axis index pairs read for directional moves, first wins.
    /// Positive y points down.
    pub move_axes: Vec<(usize, usize)>,
    /// Stick excursion past which an axis counts as a direction.
    pub deadzone: f32,
    /// Trigger value past which a trigger counts as pressed.
    pub trigger_threshold: f32,
    /// Minimum time between two axis-triggered moves.
    pub axis_repeat: Duration,
    /// Minimum time between two wheel-triggered moves.
    pub wheel_debounce: Duration,
    /// Minimum time between two accepted actions, all sources combined.
    pub action_debounce: Duration,
    /// Period of the input-device identity poll.
    pub identity_poll: Duration,
}
impl Default for InputMapping {
    fn default() -> Self {
        use NavigationAction::*;
        InputMapping {
            keys: vec![
                (KeyCode::ArrowUp, Up),
                (KeyCode::ArrowDown, Down),
                (KeyCode::ArrowLeft, Left),
                (KeyCode::ArrowRight, Right),
                (KeyCode::Enter, Confirm),
                (KeyCode::NumpadEnter, Confirm),
                (KeyCode::Escape, Back),
                (KeyCode::Backspace, Back),
                (KeyCode::ContextMenu, Menu),
                (KeyCode::F1, Menu),
                (KeyCode::F2, QuickSettings),
            ],
            buttons: vec![
                (pad::SOUTH, Confirm),
                (pad::EAST, Back),
                (pad::WEST, Menu),
                (pad::NORTH, QuickSettings),
                (pad::DPAD_UP, Up),
                (pad::DPAD_DOWN, Down),
                (pad::DPAD_LEFT, Left),
                (pad::DPAD_RIGHT, Right),
                (pad::SELECT, QuickSettings),
                (pad::START, Menu),
                (pad::GUIDE, ToggleOverlay),
                (pad::LEFT_BUMPER, VkBackspace),
                (pad::RIGHT_BUMPER, VkSpace),
            ],
            triggers: vec![(pad::LEFT_TRIGGER, VkShift), (pad::RIGHT_TRIGGER, VkSymbols)],
            move_axes: vec![
                (pad::LEFT_STICK_X, pad::LEFT_STICK_Y),
                (pad::DPAD_X, pad::DPAD_Y),
            ],
            deadzone: 0.5,
            trigger_threshold: 0.5,
            axis_repeat: Duration::from_millis(100),
            wheel_debounce: Duration::from_millis(150),
            action_debounce: Duration::from_millis(75),
            identity_poll: Duration::from_millis(100),
        }
    }
}
impl InputMapping {
    pub fn key_action(&self, key: KeyCode) -> Option<NavigationAction> {
        self.keys.iter().find(|(k, _)| *k == key).map(|(_, a)| *a)
    }
}
