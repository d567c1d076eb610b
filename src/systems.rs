//! Systems feeding bevy input to the [`Navigator`] and sending its outputs
//! as bevy events.
//!
//! They all take the navigator as a [`NonSendMut`] resource, it holds
//! plain closures and `Rc`s. They run in [`NavigationSystems`], see
//! [`GenericLauncherNavigationPlugin`] for how they are scheduled.
//!
//! [`NavigationSystems`]: crate::NavigationSystems
//! [`GenericLauncherNavigationPlugin`]: crate::GenericLauncherNavigationPlugin
use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use bevy::ecs::system::SystemParam;
use bevy::input::{
    gamepad::{Gamepad, GamepadAxis, GamepadAxisType, GamepadButton, GamepadButtonType, Gamepads},
    keyboard::{KeyCode, KeyboardInput},
    mouse::MouseWheel,
    Axis, ButtonInput, ButtonState as KeyState,
};
use bevy::prelude::*;
use bevy::window::{CursorMoved, WindowFocused};

use crate::{
    device::InputDeviceType,
    events::{DeviceChanged, LauncherRequest, NativeNavSignal, NavigationEvent},
    focus::LibraryLayout,
    host::UiHost,
    mapping::pad,
    navigator::Navigator,
    normalize::{ButtonState, GamepadSlots, GamepadSnapshot, KeyPress},
};

/// bevy's name for each [`pad`] button, in index order.
const PAD_BUTTONS: [GamepadButtonType; pad::BUTTON_COUNT] = [
    GamepadButtonType::South,
    GamepadButtonType::East,
    GamepadButtonType::West,
    GamepadButtonType::North,
    GamepadButtonType::LeftTrigger,
    GamepadButtonType::RightTrigger,
    GamepadButtonType::LeftTrigger2,
    GamepadButtonType::RightTrigger2,
    GamepadButtonType::Select,
    GamepadButtonType::Start,
    GamepadButtonType::LeftThumb,
    GamepadButtonType::RightThumb,
    GamepadButtonType::DPadUp,
    GamepadButtonType::DPadDown,
    GamepadButtonType::DPadLeft,
    GamepadButtonType::DPadRight,
    GamepadButtonType::Mode,
];

/// Stick axes and whether bevy's direction must be flipped: bevy's y
/// points up, ours down.
///
/// bevy has no D-pad axis, its backends report the D-pad as buttons, so
/// [`pad::DPAD_X`] and [`pad::DPAD_Y`] stay at rest here. Only snapshots
/// built by hand through the core API fill them.
const PAD_AXES: [(usize, GamepadAxisType, bool); 4] = [
    (pad::LEFT_STICK_X, GamepadAxisType::LeftStickX, false),
    (pad::LEFT_STICK_Y, GamepadAxisType::LeftStickY, true),
    (pad::RIGHT_STICK_X, GamepadAxisType::RightStickX, false),
    (pad::RIGHT_STICK_Y, GamepadAxisType::RightStickY, true),
];

/// Everything bevy knows about connected controllers.
#[derive(SystemParam)]
pub struct GamepadInput<'w> {
    gamepads: Res<'w, Gamepads>,
    buttons: Res<'w, ButtonInput<GamepadButton>>,
    button_axes: Res<'w, Axis<GamepadButton>>,
    axes: Res<'w, Axis<GamepadAxis>>,
}
impl<'w> GamepadInput<'w> {
    /// Snapshot of the first [`pad::SLOTS`] controllers.
    pub fn slots(&self) -> GamepadSlots {
        let mut slots = GamepadSlots::default();
        for gamepad in self.gamepads.iter() {
            if let Some(slot) = slots.get_mut(gamepad.id) {
                *slot = Some(self.snapshot(gamepad));
            }
        }
        slots
    }

    fn snapshot(&self, gamepad: Gamepad) -> GamepadSnapshot {
        let button = |kind| {
            let button = GamepadButton::new(gamepad, kind);
            let pressed = self.buttons.pressed(button);
            let digital = if pressed { 1.0 } else { 0.0 };
            ButtonState {
                pressed,
                value: self.button_axes.get(button).unwrap_or(digital),
            }
        };
        let mut snapshot = GamepadSnapshot {
            buttons: PAD_BUTTONS.into_iter().map(button).collect(),
            axes: vec![0.0; pad::DPAD_Y + 1],
        };
        for (index, kind, flip) in PAD_AXES {
            let value = self.axes.get(GamepadAxis::new(gamepad, kind)).unwrap_or(0.0);
            snapshot.axes[index] = if flip { -value } else { value };
        }
        snapshot
    }
}

/// Outputs of the navigator callbacks, waiting for [`send_outputs`].
#[derive(Default)]
struct Outbox {
    events: VecDeque<NavigationEvent>,
    requests: VecDeque<LauncherRequest>,
    devices: VecDeque<InputDeviceType>,
}

/// Shared queue of navigator outputs, a non-send resource.
#[derive(Default, Clone)]
pub struct NavigationOutbox(Rc<RefCell<Outbox>>);
impl NavigationOutbox {
    /// Route every output of `navigator` into this outbox.
    pub fn connect<H: UiHost>(&self, navigator: &mut Navigator<H>) {
        let outbox = self.0.clone();
        navigator.subscribe(move |event| outbox.borrow_mut().events.push_back(*event));
        let outbox = self.0.clone();
        navigator.subscribe_device(move |device| outbox.borrow_mut().devices.push_back(*device));

        let push = |outbox: &Rc<RefCell<Outbox>>, request: LauncherRequest| {
            outbox.borrow_mut().requests.push_back(request);
        };
        let outbox = self.0.clone();
        navigator.on_launch(move |index| push(&outbox, LauncherRequest::Launch(index)));
        let outbox = self.0.clone();
        navigator.on_sidebar_select(move |i| push(&outbox, LauncherRequest::SelectSidebar(i)));
        let outbox = self.0.clone();
        navigator.on_quit(move || push(&outbox, LauncherRequest::Quit));
    }

    /// Also turn quick-settings left/right into [`LauncherRequest::AdjustSlider`].
    pub fn connect_slider<H: UiHost>(&self, navigator: &mut Navigator<H>) {
        let outbox = self.0.clone();
        navigator.on_adjust_slider(move |step| {
            outbox.borrow_mut().requests.push_back(LauncherRequest::AdjustSlider(step));
        });
    }
}

pub fn sync_layout<H: UiHost + 'static>(
    mut navigator: NonSendMut<Navigator<H>>,
    layout: Res<LibraryLayout>,
) {
    if layout.is_changed() {
        navigator.set_layout(layout.clone());
    }
}

pub fn window_focus<H: UiHost + 'static>(
    mut navigator: NonSendMut<Navigator<H>>,
    mut focus_events: EventReader<WindowFocused>,
) {
    for event in focus_events.read() {
        navigator.set_window_focused(event.focused);
    }
}

/// Real key presses, as reported by the windowing backend.
pub fn keyboard_input<H: UiHost + 'static>(
    mut navigator: NonSendMut<Navigator<H>>,
    mut key_events: EventReader<KeyboardInput>,
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let shift = keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    for event in key_events.read() {
        if event.state != KeyState::Pressed {
            continue;
        }
        let press = KeyPress {
            key: event.key_code,
            shift,
            is_trusted: true,
        };
        navigator.key_press(press, time.elapsed());
    }
}

pub fn mouse_input<H: UiHost + 'static>(
    mut navigator: NonSendMut<Navigator<H>>,
    mut wheel_events: EventReader<MouseWheel>,
    mut cursor_events: EventReader<CursorMoved>,
    time: Res<Time>,
) {
    let now = time.elapsed();
    if cursor_events.read().count() > 0 {
        navigator.mouse_moved(now);
    }
    for wheel in wheel_events.read() {
        // Scrolling down is a negative y in bevy.
        let delta = if wheel.y != 0.0 { -wheel.y } else { wheel.x };
        navigator.mouse_wheel(delta, now);
    }
}

pub fn native_input<H: UiHost + 'static>(
    mut navigator: NonSendMut<Navigator<H>>,
    mut signals: EventReader<NativeNavSignal>,
    time: Res<Time>,
) {
    for NativeNavSignal(name) in signals.read() {
        navigator.native(name, time.elapsed());
    }
}

pub fn gamepad_navigation<H: UiHost + 'static>(
    mut navigator: NonSendMut<Navigator<H>>,
    gamepads: GamepadInput,
    time: Res<Time>,
) {
    navigator.poll_gamepads(&gamepads.slots(), time.elapsed());
}

pub fn gamepad_identity<H: UiHost + 'static>(
    mut navigator: NonSendMut<Navigator<H>>,
    gamepads: GamepadInput,
    time: Res<Time>,
) {
    navigator.poll_device_identity(&gamepads.slots(), time.elapsed());
}

pub fn send_outputs(
    outbox: NonSend<NavigationOutbox>,
    mut nav_events: EventWriter<NavigationEvent>,
    mut requests: EventWriter<LauncherRequest>,
    mut devices: EventWriter<DeviceChanged>,
) {
    let mut outbox = outbox.0.borrow_mut();
    nav_events.send_batch(outbox.events.drain(..));
    requests.send_batch(outbox.requests.drain(..));
    devices.send_batch(outbox.devices.drain(..).map(DeviceChanged));
}
