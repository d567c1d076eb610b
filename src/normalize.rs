//! Turn raw keyboard, wheel, gamepad and native signals into
//! [`NavigationEvent`]s.
//!
//! The [`Normalizer`] is only listening while it has subscribers: the first
//! [`Normalizer::subscribe`] sets its sources up, the last
//! [`Normalizer::unsubscribe`] tears them down and clears the gamepad edge
//! state. While torn down, every input method is a no-op.
use std::time::Duration;

use bevy::input::keyboard::KeyCode;
use bevy::log::{debug, trace};

use crate::{
    bus::{Listeners, SubscriptionId},
    events::{InputSource, NavigationAction, NavigationEvent},
    mapping::{pad, InputMapping},
    timing::Cooldown,
};

/// A key-press notification from the platform.
///
/// `is_trusted` is `false` for presses created by
/// [`synthetic`](crate::synthetic), those are never translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: KeyCode,
    pub shift: bool,
    pub is_trusted: bool,
}
impl KeyPress {
    /// A real key press from a physical keyboard.
    pub fn real(key: KeyCode) -> Self {
        KeyPress {
            key,
            shift: false,
            is_trusted: true,
        }
    }
}

/// Where the host UI's focus is when a key is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyTarget {
    pub in_text_field: bool,
    pub in_dialog: bool,
}

/// State of a single analog or digital gamepad button.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ButtonState {
    pub pressed: bool,
    /// Analog value in `0.0..=1.0`, `1.0` or `0.0` for digital buttons.
    pub value: f32,
}
impl ButtonState {
    pub fn digital(pressed: bool) -> Self {
        ButtonState {
            pressed,
            value: if pressed { 1.0 } else { 0.0 },
        }
    }
}

/// One controller's state, indexed following [`pad`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GamepadSnapshot {
    pub buttons: Vec<ButtonState>,
    /// Axis values in `-1.0..=1.0`, positive y pointing down.
    pub axes: Vec<f32>,
}
impl GamepadSnapshot {
    /// A controller at rest with the standard layout.
    pub fn idle() -> Self {
        GamepadSnapshot {
            buttons: vec![ButtonState::default(); pad::BUTTON_COUNT],
            axes: vec![0.0; 4],
        }
    }
    pub fn pressing(mut self, button: usize) -> Self {
        if let Some(state) = self.buttons.get_mut(button) {
            *state = ButtonState::digital(true);
        }
        self
    }
    pub fn with_axis(mut self, axis: usize, value: f32) -> Self {
        if self.axes.len() <= axis {
            self.axes.resize(axis + 1, 0.0);
        }
        self.axes[axis] = value;
        self
    }
    pub fn with_button_value(mut self, button: usize, value: f32) -> Self {
        if let Some(state) = self.buttons.get_mut(button) {
            *state = ButtonState {
                pressed: value > 0.0,
                value,
            };
        }
        self
    }
    fn pressed(&self, button: usize) -> bool {
        self.buttons.get(button).map_or(false, |b| b.pressed)
    }
    fn value(&self, button: usize) -> f32 {
        self.buttons.get(button).map_or(0.0, |b| b.value)
    }
}

/// Up to [`pad::SLOTS`] controller slots, `None` when disconnected.
pub type GamepadSlots = [Option<GamepadSnapshot>; pad::SLOTS];

/// Edge detection state for the first connected controller.
#[derive(Debug, Default)]
struct GamepadEdges {
    buttons: Vec<bool>,
    triggers: Vec<bool>,
}
impl GamepadEdges {
    fn clear(&mut self) {
        self.buttons.clear();
        self.triggers.clear();
    }
}

pub struct Normalizer {
    mapping: InputMapping,
    listeners: Listeners<NavigationEvent>,
    edges: GamepadEdges,
    axis_moves: Cooldown,
    wheel: Cooldown,
    window_focused: bool,
}
impl Normalizer {
    pub fn new(mapping: InputMapping) -> Self {
        Normalizer {
            axis_moves: Cooldown::new(mapping.axis_repeat),
            wheel: Cooldown::new(mapping.wheel_debounce),
            mapping,
            listeners: Listeners::new(),
            edges: GamepadEdges::default(),
            window_focused: true,
        }
    }

    pub fn mapping(&self) -> &InputMapping {
        &self.mapping
    }

    /// Whether any subscriber is currently listening.
    pub fn is_active(&self) -> bool {
        !self.listeners.is_empty()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&NavigationEvent) + 'static) -> SubscriptionId {
        if self.listeners.is_empty() {
            debug!("First navigation subscriber, starting input sources");
            self.reset_sources();
        }
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        if self.listeners.unsubscribe(id) && self.listeners.is_empty() {
            debug!("Last navigation subscriber left, stopping input sources");
            self.reset_sources();
        }
    }

    fn reset_sources(&mut self) {
        self.edges.clear();
        self.axis_moves.reset();
        self.wheel.reset();
    }

    /// The gamepad path only runs while the launcher window has focus.
    pub fn set_window_focused(&mut self, focused: bool) {
        if focused && !self.window_focused {
            self.edges.clear();
            self.axis_moves.reset();
        }
        self.window_focused = focused;
    }

    fn emit(&mut self, action: NavigationAction, source: InputSource, now: Duration) -> NavigationEvent {
        let event = NavigationEvent::new(action, source, now);
        trace!("{source:?} emitted {action}");
        self.listeners.publish(&event);
        event
    }

    /// Translate a key press.
    ///
    /// Synthetic presses and presses while the focus is in a text field or
    /// a dialog are left to the host UI.
    pub fn key_press(
        &mut self,
        press: KeyPress,
        target: KeyTarget,
        now: Duration,
    ) -> Option<NavigationEvent> {
        if !self.is_active() || !press.is_trusted || target.in_text_field || target.in_dialog {
            return None;
        }
        let action = self.mapping.key_action(press.key)?;
        Some(self.emit(action, InputSource::Keyboard, now))
    }

    /// Translate a wheel scroll, positive `delta` scrolling down/right.
    pub fn mouse_wheel(&mut self, delta: f32, now: Duration) -> Option<NavigationEvent> {
        if !self.is_active() || delta == 0.0 || delta.is_nan() {
            return None;
        }
        if !self.wheel.try_fire(now) {
            return None;
        }
        let action = if delta > 0.0 {
            NavigationAction::Right
        } else {
            NavigationAction::Left
        };
        Some(self.emit(action, InputSource::Mouse, now))
    }

    /// Pass through an action decided by the host platform.
    pub fn native(&mut self, name: &str, now: Duration) -> Option<NavigationEvent> {
        if !self.is_active() {
            return None;
        }
        match name.parse() {
            Ok(action) => Some(self.emit(action, InputSource::Native, now)),
            Err(err) => {
                debug!("Dropping native navigation signal: {err}");
                None
            }
        }
    }

    /// One frame of the gamepad loop.
    ///
    /// Reads the first connected slot. Buttons fire on press, triggers on
    /// crossing the threshold upward, axes at most once per
    /// [`InputMapping::axis_repeat`] while held past the deadzone.
    pub fn poll_gamepads(&mut self, slots: &GamepadSlots, now: Duration) -> Vec<NavigationEvent> {
        let mut events = Vec::new();
        if !self.is_active() || !self.window_focused {
            return events;
        }
        let Some(pad) = slots.iter().find_map(Option::as_ref) else {
            self.edges.clear();
            self.axis_moves.reset();
            return events;
        };
        let mut fired = Vec::new();

        let button_count = pad.buttons.len();
        self.edges.buttons.resize(button_count, false);
        for &(button, action) in &self.mapping.buttons {
            if button >= button_count {
                continue;
            }
            let pressed = pad.pressed(button);
            if pressed && !self.edges.buttons[button] {
                fired.push(action);
            }
            self.edges.buttons[button] = pressed;
        }

        self.edges.triggers.resize(self.mapping.triggers.len(), false);
        for (i, &(button, action)) in self.mapping.triggers.iter().enumerate() {
            let over = pad.value(button) > self.mapping.trigger_threshold;
            if over && !self.edges.triggers[i] {
                fired.push(action);
            }
            self.edges.triggers[i] = over;
        }

        if let Some(direction) = self.axis_direction(pad) {
            if self.axis_moves.try_fire(now) {
                fired.push(direction);
            }
        }

        for action in fired {
            events.push(self.emit(action, InputSource::Gamepad, now));
        }
        events
    }

    fn axis_direction(&self, pad: &GamepadSnapshot) -> Option<NavigationAction> {
        use NavigationAction::{Down, Left, Right, Up};
        let deadzone = self.mapping.deadzone;
        self.mapping.move_axes.iter().find_map(|&(x, y)| {
            let x = pad.axes.get(x).copied().unwrap_or(0.0);
            let y = pad.axes.get(y).copied().unwrap_or(0.0);
            match () {
                () if x.abs() <= deadzone && y.abs() <= deadzone => None,
                () if x.abs() >= y.abs() => Some(if x > 0.0 { Right } else { Left }),
                () => Some(if y > 0.0 { Down } else { Up }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use NavigationAction::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn listening() -> (Normalizer, Rc<RefCell<Vec<NavigationEvent>>>) {
        let mut normalizer = Normalizer::new(InputMapping::default());
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);
        normalizer.subscribe(move |event| sink.borrow_mut().push(*event));
        (normalizer, received)
    }

    fn slot(pad: GamepadSnapshot) -> GamepadSlots {
        [None, Some(pad), None, None]
    }

    fn actions(events: &[NavigationEvent]) -> Vec<NavigationAction> {
        events.iter().map(|e| e.action).collect()
    }

    #[test]
    fn keyboard_translates_real_presses_only() {
        let (mut normalizer, received) = listening();
        let target = KeyTarget::default();
        let synthetic = KeyPress {
            is_trusted: false,
            ..KeyPress::real(KeyCode::Enter)
        };

        assert_eq!(normalizer.key_press(synthetic, target, ms(0)), None);
        let event = normalizer.key_press(KeyPress::real(KeyCode::Enter), target, ms(0));
        assert_eq!(event.map(|e| e.action), Some(Confirm));
        assert_eq!(event.map(|e| e.source), Some(InputSource::Keyboard));
        assert_eq!(normalizer.key_press(KeyPress::real(KeyCode::KeyZ), target, ms(0)), None);
        assert_eq!(received.borrow().len(), 1);
    }

    #[test]
    fn keyboard_leaves_text_fields_and_dialogs_alone() {
        let (mut normalizer, _) = listening();
        let up = KeyPress::real(KeyCode::ArrowUp);
        let in_field = KeyTarget {
            in_text_field: true,
            in_dialog: false,
        };
        let in_dialog = KeyTarget {
            in_text_field: false,
            in_dialog: true,
        };
        assert_eq!(normalizer.key_press(up, in_field, ms(0)), None);
        assert_eq!(normalizer.key_press(up, in_dialog, ms(0)), None);
    }

    #[test]
    fn wheel_is_debounced() {
        let (mut normalizer, _) = listening();
        assert_eq!(normalizer.mouse_wheel(3.0, ms(0)).map(|e| e.action), Some(Right));
        assert_eq!(normalizer.mouse_wheel(3.0, ms(40)), None);
        assert_eq!(normalizer.mouse_wheel(-1.0, ms(149)), None);
        assert_eq!(normalizer.mouse_wheel(-1.0, ms(150)).map(|e| e.action), Some(Left));
    }

    #[test]
    fn buttons_fire_on_press_edge() {
        let (mut normalizer, _) = listening();
        let held = slot(GamepadSnapshot::idle().pressing(pad::SOUTH));

        assert_eq!(actions(&normalizer.poll_gamepads(&held, ms(0))), vec![Confirm]);
        assert!(normalizer.poll_gamepads(&held, ms(16)).is_empty());
        assert!(normalizer.poll_gamepads(&slot(GamepadSnapshot::idle()), ms(32)).is_empty());
        assert_eq!(actions(&normalizer.poll_gamepads(&held, ms(48))), vec![Confirm]);
    }

    #[test]
    fn first_connected_slot_wins() {
        let (mut normalizer, _) = listening();
        let slots = [
            None,
            None,
            Some(GamepadSnapshot::idle().pressing(pad::EAST)),
            Some(GamepadSnapshot::idle().pressing(pad::SOUTH)),
        ];
        assert_eq!(actions(&normalizer.poll_gamepads(&slots, ms(0))), vec![Back]);
        assert!(normalizer.poll_gamepads(&[None, None, None, None], ms(16)).is_empty());
    }

    #[test]
    fn short_snapshots_are_ignored_silently() {
        let (mut normalizer, _) = listening();
        let tiny = GamepadSnapshot {
            buttons: vec![ButtonState::digital(true)],
            axes: Vec::new(),
        };
        assert_eq!(actions(&normalizer.poll_gamepads(&slot(tiny), ms(0))), vec![Confirm]);
    }

    #[test]
    fn triggers_latch_on_rising_edge() {
        let (mut normalizer, _) = listening();
        let half = |v| slot(GamepadSnapshot::idle().with_button_value(pad::LEFT_TRIGGER, v));

        assert!(normalizer.poll_gamepads(&half(0.4), ms(0)).is_empty());
        assert_eq!(actions(&normalizer.poll_gamepads(&half(0.7), ms(16))), vec![VkShift]);
        assert!(normalizer.poll_gamepads(&half(1.0), ms(32)).is_empty());
        assert!(normalizer.poll_gamepads(&half(0.2), ms(48)).is_empty());
        assert_eq!(actions(&normalizer.poll_gamepads(&half(0.9), ms(64))), vec![VkShift]);
    }

    #[test]
    fn held_stick_repeats_at_axis_interval() {
        let (mut normalizer, _) = listening();
        let right = slot(GamepadSnapshot::idle().with_axis(pad::LEFT_STICK_X, 0.9));
        let mut fired = Vec::new();
        for frame in 0..20 {
            fired.extend(normalizer.poll_gamepads(&right, ms(frame * 16)));
        }
        // 0..=304ms: moves at 0, 112, 224
        assert_eq!(actions(&fired), vec![Right, Right, Right]);
    }

    #[test]
    fn stick_inside_deadzone_is_ignored() {
        let (mut normalizer, _) = listening();
        let drift = slot(
            GamepadSnapshot::idle()
                .with_axis(pad::LEFT_STICK_X, 0.5)
                .with_axis(pad::LEFT_STICK_Y, -0.3),
        );
        assert!(normalizer.poll_gamepads(&drift, ms(0)).is_empty());
        let up = slot(GamepadSnapshot::idle().with_axis(pad::LEFT_STICK_Y, -0.8));
        assert_eq!(actions(&normalizer.poll_gamepads(&up, ms(10))), vec![Up]);
    }

    #[test]
    fn dpad_axes_count_as_directions() {
        let (mut normalizer, _) = listening();
        let down = slot(GamepadSnapshot::idle().with_axis(pad::DPAD_Y, 1.0));
        assert_eq!(actions(&normalizer.poll_gamepads(&down, ms(0))), vec![Down]);
    }

    #[test]
    fn native_passes_through() {
        let (mut normalizer, received) = listening();
        let event = normalizer.native("TOGGLE_OVERLAY", ms(5));
        assert_eq!(
            event,
            Some(NavigationEvent::new(ToggleOverlay, InputSource::Native, ms(5)))
        );
        assert_eq!(normalizer.native("teleport", ms(6)), None);
        assert_eq!(received.borrow().len(), 1);
    }

    #[test]
    fn unfocused_window_suspends_gamepad_only() {
        let (mut normalizer, _) = listening();
        let held = slot(GamepadSnapshot::idle().pressing(pad::SOUTH));
        normalizer.set_window_focused(false);
        assert!(normalizer.poll_gamepads(&held, ms(0)).is_empty());
        assert!(normalizer.native("back", ms(0)).is_some());
        normalizer.set_window_focused(true);
        assert_eq!(actions(&normalizer.poll_gamepads(&held, ms(16))), vec![Confirm]);
    }

    #[test]
    fn sources_stop_with_last_subscriber() {
        let mut normalizer = Normalizer::new(InputMapping::default());
        let held = slot(GamepadSnapshot::idle().pressing(pad::SOUTH));
        assert!(normalizer.poll_gamepads(&held, ms(0)).is_empty());

        let first = normalizer.subscribe(|_| {});
        let second = normalizer.subscribe(|_| {});
        assert_eq!(normalizer.poll_gamepads(&held, ms(16)).len(), 1);
        normalizer.unsubscribe(first);
        assert!(normalizer.is_active());
        normalizer.unsubscribe(second);
        assert!(!normalizer.is_active());
        assert_eq!(normalizer.native("up", ms(32)), None);

        // Edge state was cleared on teardown: still-held button fires again.
        normalizer.subscribe(|_| {});
        assert_eq!(normalizer.poll_gamepads(&held, ms(48)).len(), 1);
    }
}
