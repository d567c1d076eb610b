//! Track which kind of device the user is currently holding.
use std::time::Duration;

use bevy::log::debug;

use crate::{
    bus::{Listeners, SubscriptionId},
    normalize::{GamepadSlots, KeyPress},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputDeviceType {
    Gamepad,
    #[default]
    Keyboard,
    Mouse,
    Unknown,
}

/// The single current [`InputDeviceType`].
///
/// Only real input changes it. Observers are called on actual changes,
/// never when the same device is reported twice.
pub struct DeviceTracker {
    current: InputDeviceType,
    changed_at: Duration,
    observers: Listeners<InputDeviceType>,
    axis_threshold: f32,
    disposed: bool,
}
impl DeviceTracker {
    /// Start as [`InputDeviceType::Keyboard`].
    ///
    /// A stick past `axis_threshold` counts as gamepad activity.
    pub fn new(axis_threshold: f32) -> Self {
        DeviceTracker {
            current: InputDeviceType::default(),
            changed_at: Duration::ZERO,
            observers: Listeners::new(),
            axis_threshold,
            disposed: false,
        }
    }

    pub fn current(&self) -> InputDeviceType {
        self.current
    }

    /// When [`Self::current`] last changed.
    pub fn changed_at(&self) -> Duration {
        self.changed_at
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&InputDeviceType) + 'static) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn key_down(&mut self, press: &KeyPress, now: Duration) {
        if press.is_trusted {
            self.set(InputDeviceType::Keyboard, now);
        }
    }

    pub fn mouse_moved(&mut self, is_trusted: bool, now: Duration) {
        if is_trusted {
            self.set(InputDeviceType::Mouse, now);
        }
    }

    /// Switch to gamepad if any connected controller is being used.
    pub fn poll_gamepads(&mut self, slots: &GamepadSlots, now: Duration) {
        let threshold = self.axis_threshold;
        let active = slots.iter().flatten().any(|pad| {
            pad.buttons.iter().any(|button| button.pressed)
                || pad.axes.iter().any(|axis| axis.abs() > threshold)
        });
        if active {
            self.set(InputDeviceType::Gamepad, now);
        }
    }

    /// Drop all observers and ignore input from now on.
    pub fn dispose(&mut self) {
        self.observers.clear();
        self.disposed = true;
    }

    fn set(&mut self, device: InputDeviceType, now: Duration) {
        if self.disposed || device == self.current {
            return;
        }
        debug!("Input device changed: {:?} -> {device:?}", self.current);
        self.current = device;
        self.changed_at = now;
        self.observers.publish(&device);
    }
}
