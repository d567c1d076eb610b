//! The [`Navigator`], wiring every component together.
//!
//! Inputs come in through the `key_press`, `mouse_wheel`,
//! `poll_gamepads`... methods. The navigator is itself a subscriber of its
//! [`Normalizer`]: events are queued in an inbox as they are published and
//! applied to the [`FocusMachine`] once the input call returned, so the
//! focus machine sees them in the same order as every other subscriber.
use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

use bevy::log::{debug, trace, warn};

use crate::{
    bus::SubscriptionId,
    device::{DeviceTracker, InputDeviceType},
    events::NavigationEvent,
    focus::{Effect, FocusArea, FocusMachine, LibraryLayout, NavState},
    host::{ElementKind, UiHost},
    mapping::InputMapping,
    modal::ModalRouter,
    normalize::{GamepadSlots, KeyPress, KeyTarget, Normalizer},
    synthetic::reemit,
};

type Inbox = Rc<RefCell<VecDeque<NavigationEvent>>>;

/// Launcher actions the navigator triggers.
#[derive(Default)]
struct Callbacks {
    launch: Option<Box<dyn FnMut(usize)>>,
    select_sidebar: Option<Box<dyn FnMut(usize)>>,
    quit: Option<Box<dyn FnMut()>>,
    adjust_slider: Option<Box<dyn FnMut(i32)>>,
}

pub struct Navigator<H: UiHost> {
    host: H,
    normalizer: Normalizer,
    tracker: DeviceTracker,
    machine: FocusMachine,
    router: ModalRouter<H::Element>,
    layout: LibraryLayout,
    callbacks: Callbacks,
    inbox: Inbox,
    link: Option<SubscriptionId>,
}
impl<H: UiHost> Navigator<H> {
    pub fn new(host: H, mapping: InputMapping) -> Self {
        let tracker = DeviceTracker::new(mapping.deadzone);
        let machine = FocusMachine::new(mapping.action_debounce);
        let mut normalizer = Normalizer::new(mapping);
        let inbox = Inbox::default();
        let sink = Rc::clone(&inbox);
        let link = normalizer.subscribe(move |event| sink.borrow_mut().push_back(*event));
        Navigator {
            host,
            normalizer,
            tracker,
            machine,
            router: ModalRouter::new(),
            layout: LibraryLayout::default(),
            callbacks: Callbacks::default(),
            inbox,
            link: Some(link),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
    pub fn mapping(&self) -> &InputMapping {
        self.normalizer.mapping()
    }

    pub fn on_launch(&mut self, callback: impl FnMut(usize) + 'static) {
        self.callbacks.launch = Some(Box::new(callback));
    }
    pub fn on_sidebar_select(&mut self, callback: impl FnMut(usize) + 'static) {
        self.callbacks.select_sidebar = Some(Box::new(callback));
    }
    pub fn on_quit(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.quit = Some(Box::new(callback));
    }
    /// With this set, left/right in quick-settings adjust its slider.
    pub fn on_adjust_slider(&mut self, callback: impl FnMut(i32) + 'static) {
        self.callbacks.adjust_slider = Some(Box::new(callback));
        self.layout.adjusts_slider = true;
    }

    pub fn layout(&self) -> &LibraryLayout {
        &self.layout
    }

    /// Replace the library layout, clamping the selection to it.
    pub fn set_layout(&mut self, mut layout: LibraryLayout) {
        layout.adjusts_slider = self.callbacks.adjust_slider.is_some();
        self.machine.fit_layout(&layout);
        self.layout = layout;
    }

    pub fn state(&self) -> &NavState {
        self.machine.state()
    }
    pub fn focus_area(&self) -> FocusArea {
        self.state().focus_area
    }
    pub fn active_index(&self) -> usize {
        self.state().active_index
    }
    pub fn sidebar_index(&self) -> usize {
        self.state().sidebar_index
    }
    pub fn is_sidebar_open(&self) -> bool {
        self.state().overlays.sidebar
    }
    pub fn set_focus_area(&mut self, area: FocusArea) {
        self.machine.set_focus_area(area);
    }
    /// Select `index`, clamped to the current layout.
    pub fn set_active_index(&mut self, index: usize) {
        self.machine.set_active_index(index, &self.layout);
    }
    pub fn set_sidebar_open(&mut self, open: bool) {
        self.machine.set_sidebar_open(open);
    }

    pub fn current_device(&self) -> InputDeviceType {
        self.tracker.current()
    }

    /// Receive every [`NavigationEvent`], before the navigator applies it.
    pub fn subscribe(&mut self, callback: impl FnMut(&NavigationEvent) + 'static) -> SubscriptionId {
        self.normalizer.subscribe(callback)
    }
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.normalizer.unsubscribe(id);
    }
    /// Be told when the user switches to another kind of device.
    pub fn subscribe_device(
        &mut self,
        callback: impl FnMut(&InputDeviceType) + 'static,
    ) -> SubscriptionId {
        self.tracker.subscribe(callback)
    }
    pub fn unsubscribe_device(&mut self, id: SubscriptionId) {
        self.tracker.unsubscribe(id);
    }

    /// A text field got focus: gamepad users get the virtual keyboard.
    ///
    /// Returns whether the focus moved to the virtual keyboard.
    pub fn text_field_focused(&mut self) -> bool {
        let gamepad = self.tracker.current() == InputDeviceType::Gamepad;
        if gamepad {
            self.machine.set_focus_area(FocusArea::VirtualKeyboard);
        }
        gamepad
    }

    /// Stop reacting to input. Other subscribers keep the normalizer alive.
    pub fn shutdown(&mut self) {
        if let Some(link) = self.link.take() {
            self.normalizer.unsubscribe(link);
        }
        self.tracker.dispose();
        self.inbox.borrow_mut().clear();
    }

    pub fn key_press(&mut self, press: KeyPress, now: Duration) -> Option<NavigationEvent> {
        self.tracker.key_down(&press, now);
        let target = match self.host.focused() {
            Some(focused) => KeyTarget {
                in_text_field: self.host.kind(focused) == ElementKind::TextInput,
                in_dialog: self.host.is_in_dialog(focused),
            },
            None => KeyTarget::default(),
        };
        let event = self.normalizer.key_press(press, target, now);
        self.drain();
        event
    }

    pub fn mouse_wheel(&mut self, delta: f32, now: Duration) -> Option<NavigationEvent> {
        let event = self.normalizer.mouse_wheel(delta, now);
        self.drain();
        event
    }

    /// The pointer moved on its own, not because the UI scrolled.
    pub fn mouse_moved(&mut self, now: Duration) {
        self.tracker.mouse_moved(true, now);
    }

    /// One frame of the gamepad navigation loop.
    pub fn poll_gamepads(&mut self, slots: &GamepadSlots, now: Duration) -> Vec<NavigationEvent> {
        let events = self.normalizer.poll_gamepads(slots, now);
        self.drain();
        events
    }

    /// Check whether a controller is in use, see [`InputMapping::identity_poll`].
    pub fn poll_device_identity(&mut self, slots: &GamepadSlots, now: Duration) {
        self.tracker.poll_gamepads(slots, now);
    }

    pub fn native(&mut self, name: &str, now: Duration) -> Option<NavigationEvent> {
        let event = self.normalizer.native(name, now);
        self.drain();
        event
    }

    pub fn set_window_focused(&mut self, focused: bool) {
        self.normalizer.set_window_focused(focused);
    }

    fn drain(&mut self) {
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(event) = next else { break };
            self.apply(&event);
        }
    }

    fn apply(&mut self, event: &NavigationEvent) {
        let dialog_open = !self.host.modals().is_empty();
        let Some(effects) = self.machine.handle(event, &self.layout, dialog_open) else {
            return;
        };
        for effect in effects {
            self.run(effect);
        }
    }

    fn run(&mut self, effect: Effect) {
        let callbacks = &mut self.callbacks;
        match effect {
            Effect::Launch(index) => match &mut callbacks.launch {
                Some(launch) => launch(index),
                None => debug!("No launch callback for item {index}"),
            },
            Effect::SelectSidebar(index) => match &mut callbacks.select_sidebar {
                Some(select) => select(index),
                None => debug!("No sidebar callback for item {index}"),
            },
            Effect::Quit => match &mut callbacks.quit {
                Some(quit) => quit(),
                None => debug!("No quit callback"),
            },
            Effect::AdjustSlider(step) => {
                if let Some(adjust) = &mut callbacks.adjust_slider {
                    adjust(step);
                }
            }
            Effect::Reemit { key, shift } => {
                reemit(&mut self.host, key, shift);
            }
            Effect::Route(action) => {
                let outcome = self.router.route(&mut self.host, action);
                trace!("Routed {action} in modal: {outcome:?}");
            }
            Effect::HideWindow => {
                if let Err(err) = self.host.hide_window() {
                    warn!("{err}");
                }
            }
            Effect::ShowWindow => {
                if let Err(err) = self.host.show_window() {
                    warn!("{err}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use bevy::input::keyboard::KeyCode;

    use super::*;
    use crate::{
        events::NavigationAction,
        headless::ElementTree,
        mapping::pad,
        normalize::GamepadSnapshot,
        synthetic::SyntheticKey,
    };

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn navigator(item_count: usize) -> Navigator<ElementTree> {
        let mut navigator = Navigator::new(ElementTree::new(), InputMapping::default());
        navigator.set_layout(LibraryLayout::flat(item_count).with_sidebar(3));
        navigator
    }

    fn recorded<T: 'static>() -> (Rc<RefCell<Vec<T>>>, impl FnMut(T) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |value| sink.borrow_mut().push(value))
    }

    /// Press `keys` 100ms apart, starting at `start`.
    fn press(navigator: &mut Navigator<ElementTree>, start: u64, keys: &[KeyCode]) -> u64 {
        let mut now = start;
        for &key in keys {
            navigator.key_press(KeyPress::real(key), ms(now));
            now += 100;
        }
        now
    }

    #[test]
    fn browse_library_with_keyboard() {
        let mut nav = navigator(5);
        let (launched, on_launch) = recorded::<usize>();
        nav.on_launch(on_launch);
        let up = [Some(GamepadSnapshot::idle().pressing(pad::DPAD_UP)), None, None, None];

        nav.poll_gamepads(&up, ms(0));
        assert_eq!(nav.focus_area(), FocusArea::Hero);
        assert_eq!(nav.active_index(), 0);

        let now = press(&mut nav, 100, &[KeyCode::ArrowDown]);
        assert_eq!(nav.focus_area(), FocusArea::Library);

        let now = press(&mut nav, now, &[KeyCode::ArrowRight; 6]);
        assert_eq!(nav.active_index(), 4);

        press(&mut nav, now, &[KeyCode::Enter]);
        assert_eq!(*launched.borrow(), vec![4]);
    }

    #[test]
    fn reemitted_keys_do_not_loop() {
        let mut nav = navigator(5);
        let (events, mut on_event) = recorded::<NavigationAction>();
        nav.subscribe(move |event: &NavigationEvent| on_event(event.action));
        nav.set_focus_area(FocusArea::Search);

        press(&mut nav, 0, &[KeyCode::ArrowDown]);
        let dispatched = nav.host_mut().take_dispatched();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].key, SyntheticKey::ArrowDown);

        for (i, synthetic) in dispatched.iter().enumerate() {
            let now = ms(1000 + 100 * i as u64);
            assert_eq!(nav.key_press(synthetic.as_key_press(), now), None);
        }
        assert!(nav.host().dispatched().is_empty());
        assert_eq!(*events.borrow(), vec![NavigationAction::Down]);
    }

    #[test]
    fn confirm_in_dialog_never_launches() {
        let mut nav = navigator(5);
        let (launched, on_launch) = recorded::<usize>();
        nav.on_launch(on_launch);
        let tree = nav.host_mut();
        let modal = tree.spawn_modal(tree.root());
        let ok = tree.spawn(modal, ElementKind::Button);

        let confirm = [Some(GamepadSnapshot::idle().pressing(pad::SOUTH)), None, None, None];
        let down = [Some(GamepadSnapshot::idle().pressing(pad::DPAD_DOWN)), None, None, None];
        let idle = [Some(GamepadSnapshot::idle()), None, None, None];
        nav.poll_gamepads(&down, ms(0));
        nav.poll_gamepads(&idle, ms(50));
        nav.poll_gamepads(&confirm, ms(200));

        assert!(launched.borrow().is_empty());
        assert_eq!(nav.host().clicks(), &[ok]);
        assert_eq!(nav.active_index(), 0);
    }

    #[test]
    fn keys_inside_alert_stay_with_the_ui() {
        let mut nav = navigator(5);
        nav.set_focus_area(FocusArea::Library);
        let (events, mut on_event) = recorded::<NavigationAction>();
        nav.subscribe(move |event: &NavigationEvent| on_event(event.action));
        let tree = nav.host_mut();
        let alert = tree.spawn_dialog(tree.root());
        let dismiss = tree.spawn(alert, ElementKind::Button);
        tree.set_focused(Some(dismiss));

        assert_eq!(nav.key_press(KeyPress::real(KeyCode::ArrowRight), ms(0)), None);
        assert_eq!(nav.key_press(KeyPress::real(KeyCode::Enter), ms(100)), None);
        assert!(events.borrow().is_empty());
        assert_eq!(nav.active_index(), 0);
        assert!(nav.host().dispatched().is_empty());

        nav.host_mut().remove(alert);
        assert!(nav.key_press(KeyPress::real(KeyCode::ArrowRight), ms(200)).is_some());
        assert_eq!(nav.active_index(), 1);
    }

    #[test]
    fn back_closes_dialog_before_sidebar() {
        let mut nav = navigator(5);
        let now = press(&mut nav, 0, &[KeyCode::F1]);
        assert!(nav.is_sidebar_open());

        let tree = nav.host_mut();
        let modal = tree.spawn_modal(tree.root());
        tree.spawn(modal, ElementKind::Button);

        let back = [Some(GamepadSnapshot::idle().pressing(pad::EAST)), None, None, None];
        nav.poll_gamepads(&back, ms(now));
        let dispatched = nav.host().dispatched();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].key, SyntheticKey::Escape);
        assert!(nav.is_sidebar_open());

        nav.host_mut().remove(modal);
        press(&mut nav, now + 100, &[KeyCode::Escape]);
        assert!(!nav.is_sidebar_open());
        assert_eq!(nav.focus_area(), FocusArea::Hero);
    }

    #[test]
    fn sources_share_the_debounce() {
        let mut nav = navigator(5);
        nav.set_focus_area(FocusArea::Library);
        nav.key_press(KeyPress::real(KeyCode::ArrowRight), ms(1000));
        nav.mouse_wheel(1.0, ms(1040));
        assert_eq!(nav.active_index(), 1);
        nav.native("RIGHT", ms(1080));
        assert_eq!(nav.active_index(), 2);
    }

    #[test]
    fn sidebar_selection() {
        let mut nav = navigator(5);
        let (selected, on_select) = recorded::<usize>();
        nav.on_sidebar_select(on_select);
        let keys = [KeyCode::F1, KeyCode::ArrowDown, KeyCode::ArrowDown, KeyCode::ArrowDown, KeyCode::Enter];
        press(&mut nav, 0, &keys);
        assert_eq!(*selected.borrow(), vec![2]);

        press(&mut nav, 1000, &[KeyCode::ArrowRight]);
        assert!(!nav.is_sidebar_open());
        assert_eq!(nav.focus_area(), FocusArea::Library);
    }

    #[test]
    fn in_game_menu_survives_window_errors() {
        let mut nav = navigator(5);
        let (quits, mut on_quit) = recorded::<()>();
        nav.on_quit(move || on_quit(()));
        nav.set_layout(LibraryLayout {
            game_running: true,
            ..LibraryLayout::flat(5)
        });
        nav.host_mut().break_window();

        nav.native("toggle_overlay", ms(0));
        assert_eq!(nav.focus_area(), FocusArea::InGameMenu);
        assert!(nav.host().is_window_visible());

        press(&mut nav, 100, &[KeyCode::ArrowDown, KeyCode::Enter]);
        assert_eq!(quits.borrow().len(), 1);
        assert_eq!(nav.focus_area(), FocusArea::Hero);
    }

    #[test]
    fn resume_hides_window() {
        let mut nav = navigator(5);
        nav.set_layout(LibraryLayout {
            game_running: true,
            ..LibraryLayout::flat(5)
        });
        nav.native("back", ms(0));
        assert!(nav.state().overlays.in_game_menu);
        nav.native("confirm", ms(100));
        assert!(!nav.state().overlays.in_game_menu);
        assert!(!nav.host().is_window_visible());
    }

    #[test]
    fn quick_settings_slider() {
        let mut nav = navigator(5);
        let (steps, on_adjust) = recorded::<i32>();
        nav.on_adjust_slider(on_adjust);
        let keys = [KeyCode::F2, KeyCode::ArrowLeft, KeyCode::ArrowRight, KeyCode::ArrowRight];
        press(&mut nav, 0, &keys);
        assert_eq!(*steps.borrow(), vec![-1, 1, 1]);
        assert_eq!(nav.active_index(), 0);
    }

    #[test]
    fn gamepad_users_get_virtual_keyboard() {
        let mut nav = navigator(5);
        let (devices, mut on_device) = recorded::<InputDeviceType>();
        nav.subscribe_device(move |device: &InputDeviceType| on_device(*device));

        assert!(!nav.text_field_focused());
        let pressing = [None, None, Some(GamepadSnapshot::idle().pressing(pad::SOUTH)), None];
        nav.poll_device_identity(&pressing, ms(100));
        assert_eq!(nav.current_device(), InputDeviceType::Gamepad);
        assert!(nav.text_field_focused());
        assert_eq!(nav.focus_area(), FocusArea::VirtualKeyboard);

        let bumper = [Some(GamepadSnapshot::idle().pressing(pad::LEFT_BUMPER)), None, None, None];
        nav.poll_gamepads(&bumper, ms(200));
        let dispatched = nav.host().dispatched();
        assert_eq!(dispatched.last().map(|p| p.key), Some(SyntheticKey::Backspace));
        assert_eq!(*devices.borrow(), vec![InputDeviceType::Gamepad]);
    }

    #[test]
    fn unfocused_window_suspends_gamepad_only() {
        let mut nav = navigator(5);
        nav.set_focus_area(FocusArea::Library);
        nav.set_window_focused(false);
        let right = [Some(GamepadSnapshot::idle().pressing(pad::DPAD_RIGHT)), None, None, None];
        assert!(nav.poll_gamepads(&right, ms(0)).is_empty());
        nav.native("right", ms(100));
        assert_eq!(nav.active_index(), 1);

        nav.set_window_focused(true);
        assert_eq!(nav.poll_gamepads(&right, ms(200)).len(), 1);
        assert_eq!(nav.active_index(), 2);
    }

    #[test]
    fn layout_changes_clamp_selection() {
        let mut nav = navigator(10);
        nav.set_active_index(8);
        nav.set_layout(LibraryLayout::flat(3));
        assert_eq!(nav.active_index(), 2);
        nav.set_active_index(99);
        assert_eq!(nav.active_index(), 2);
    }

    #[test]
    fn shutdown_stops_navigation() {
        let mut nav = navigator(5);
        nav.set_focus_area(FocusArea::Library);
        let (events, mut on_event) = recorded::<NavigationAction>();
        nav.subscribe(move |event: &NavigationEvent| on_event(event.action));

        nav.shutdown();
        press(&mut nav, 0, &[KeyCode::ArrowRight]);
        assert_eq!(nav.active_index(), 0);
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(nav.current_device(), InputDeviceType::Keyboard);
    }
}
