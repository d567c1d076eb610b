//! The focus-area state machine.
//!
//! # Overview
//!
//! Exactly one [`FocusArea`] owns directional, confirm and back input at any
//! time. [`reduce`] is a pure function from the current [`NavState`] and one
//! [`NavigationAction`] to the next state plus the [`Effect`]s the
//! navigator must carry out (launching a game, re-emitting a key, routing
//! to the overlay focus router...).
//!
//! The state is flat: sidebar, in-game menu and quick-settings are boolean
//! [`Overlays`] flags next to the focus area, and a host dialog being open
//! is passed in by the caller. The routing code consults them as guards,
//! in this order of precedence:
//!
//! 1. A host dialog (or the generic overlay area) is open: directional,
//!    confirm and back go to the [modal router](crate::modal).
//! 2. Quick-settings is open: same, except left/right adjust its slider
//!    when the launcher supplied a slider callback.
//! 3. Otherwise the current [`FocusArea`] decides.
//!
//! Back closes the innermost open layer only, see [`reduce`].
//!
//! [`FocusMachine`] wraps the reducer with the global action debounce and
//! the disabled gate, and is the only owner of the state.
use std::time::Duration;

use bevy::ecs::system::Resource;
use bevy::log::debug;

use crate::{
    carousel::{CarouselRows, RowStep},
    events::{NavigationAction, NavigationEvent},
    synthetic::SyntheticKey,
    timing::Cooldown,
};

/// The mutually exclusive UI regions that can own navigation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FocusArea {
    /// The game grid or carousels.
    Library,
    /// The featured game panel above the library.
    #[default]
    Hero,
    TopBar,
    Sidebar,
    InGameMenu,
    QuickSettings,
    VirtualKeyboard,
    Search,
    /// Any other modal overlay.
    Overlay,
}

/// Entries of the in-game menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InGameEntry {
    #[default]
    Resume,
    Quit,
}

/// Which launcher-owned layers are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overlays {
    pub sidebar: bool,
    pub in_game_menu: bool,
    pub quick_settings: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavState {
    pub focus_area: FocusArea,
    /// Selected library item, `< item_count` whenever there are items.
    pub active_index: usize,
    pub sidebar_index: usize,
    pub in_game_entry: InGameEntry,
    pub overlays: Overlays,
}

/// What the launcher currently shows, supplied anew whenever it changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Resource)]
pub struct LibraryLayout {
    pub item_count: usize,
    pub carousels: CarouselRows,
    pub sidebar_item_count: usize,
    /// Set during blocking operations, only the virtual keyboard and
    /// overlays keep receiving input.
    pub is_disabled: bool,
    /// A game is running, the in-game menu replaces the sidebar.
    pub game_running: bool,
    /// Left/right in quick-settings adjust a slider instead of moving focus.
    pub adjusts_slider: bool,
}
impl LibraryLayout {
    /// A single flat row of `item_count` items.
    pub fn flat(item_count: usize) -> Self {
        LibraryLayout {
            item_count,
            ..Default::default()
        }
    }
    pub fn with_carousels(mut self, offsets: Vec<usize>) -> Self {
        self.carousels = CarouselRows::new(offsets);
        self
    }
    pub fn with_sidebar(mut self, sidebar_item_count: usize) -> Self {
        self.sidebar_item_count = sidebar_item_count;
        self
    }
    fn last_item(&self) -> usize {
        self.item_count.saturating_sub(1)
    }
    fn last_sidebar_item(&self) -> usize {
        self.sidebar_item_count.saturating_sub(1)
    }
}

/// Side effects requested by a transition, in the order they must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Launch(usize),
    SelectSidebar(usize),
    Quit,
    /// Send a synthetic key to the focused host element.
    Reemit { key: SyntheticKey, shift: bool },
    /// Let the modal router handle the action.
    Route(NavigationAction),
    /// Step the quick-settings slider by `-1` or `+1`.
    AdjustSlider(i32),
    HideWindow,
    ShowWindow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: NavState,
    pub effects: Vec<Effect>,
}

/// Compute the transition `action` causes from `state`.
///
/// `dialog_open` tells whether the host UI currently shows a modal dialog.
///
/// # Back
///
/// Back closes the innermost layer and nothing else:
/// 1. an open dialog (the router re-emits Escape to it),
/// 2. quick-settings,
/// 3. search or the virtual keyboard (Escape, then focus the hero),
/// 4. the sidebar,
/// 5. the in-game menu, hiding the launcher window.
///
/// With nothing open, back opens the in-game menu if a game is running,
/// otherwise it focuses the hero.
pub fn reduce(
    state: &NavState,
    layout: &LibraryLayout,
    dialog_open: bool,
    action: NavigationAction,
) -> Transition {
    let mut state = state.clone();
    state.active_index = state.active_index.min(layout.last_item());
    state.sidebar_index = state.sidebar_index.min(layout.last_sidebar_item());
    let mut reducer = Reducer {
        state,
        layout,
        dialog_open,
        effects: Vec::new(),
    };
    reducer.apply(action);
    Transition {
        state: reducer.state,
        effects: reducer.effects,
    }
}

struct Reducer<'a> {
    state: NavState,
    layout: &'a LibraryLayout,
    dialog_open: bool,
    effects: Vec<Effect>,
}
impl<'a> Reducer<'a> {
    fn area(&self) -> FocusArea {
        self.state.focus_area
    }
    fn focus(&mut self, area: FocusArea) {
        self.state.focus_area = area;
    }
    fn effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }
    fn reemit(&mut self, key: SyntheticKey) {
        self.effect(Effect::Reemit { key, shift: false });
    }

    /// A host dialog or the generic overlay area has the focus.
    fn dialog_focused(&self) -> bool {
        self.dialog_open || self.area() == FocusArea::Overlay
    }
    fn overlay_open(&self) -> bool {
        self.dialog_focused() || self.state.overlays.quick_settings
    }
    /// The layer left under whatever just closed.
    fn uncovered(&self) -> FocusArea {
        let overlays = self.state.overlays;
        if overlays.sidebar {
            FocusArea::Sidebar
        } else if overlays.in_game_menu {
            FocusArea::InGameMenu
        } else {
            FocusArea::Hero
        }
    }
    fn typing(&self) -> bool {
        matches!(self.area(), FocusArea::VirtualKeyboard | FocusArea::Search)
    }

    fn apply(&mut self, action: NavigationAction) {
        use NavigationAction::*;
        match action {
            Up | Down | Left | Right => self.directional(action),
            Confirm => self.confirm(),
            Back => self.back(),
            Menu if self.layout.game_running => self.back(),
            Menu => self.toggle_sidebar(),
            QuickSettings => self.toggle_quick_settings(),
            ToggleOverlay => self.toggle_in_game_menu(),
            VkBackspace | VkShift | VkSpace | VkSymbols => self.virtual_keyboard(action),
        }
    }

    fn confirm(&mut self) {
        use FocusArea::*;
        if self.overlay_open() {
            return self.effect(Effect::Route(NavigationAction::Confirm));
        }
        match self.area() {
            VirtualKeyboard | Search | TopBar => self.reemit(SyntheticKey::Enter),
            Library | Hero if self.layout.item_count > 0 => {
                self.effect(Effect::Launch(self.state.active_index))
            }
            Sidebar if self.layout.sidebar_item_count > 0 => {
                self.effect(Effect::SelectSidebar(self.state.sidebar_index))
            }
            InGameMenu => match self.state.in_game_entry {
                InGameEntry::Resume => self.close_in_game_menu(),
                InGameEntry::Quit => {
                    self.effect(Effect::Quit);
                    self.state.overlays.in_game_menu = false;
                    self.state.in_game_entry = InGameEntry::Resume;
                    self.focus(self.uncovered());
                }
            },
            QuickSettings | Overlay => self.effect(Effect::Route(NavigationAction::Confirm)),
            Library | Hero | Sidebar => {}
        }
    }

    fn back(&mut self) {
        use FocusArea::*;
        let overlays = self.state.overlays;
        if self.dialog_focused() {
            self.effect(Effect::Route(NavigationAction::Back));
        } else if overlays.quick_settings {
            self.state.overlays.quick_settings = false;
            self.focus(self.uncovered());
        } else if self.typing() {
            self.reemit(SyntheticKey::Escape);
            self.focus(self.uncovered());
        } else if overlays.sidebar {
            self.state.overlays.sidebar = false;
            self.focus(self.uncovered());
        } else if overlays.in_game_menu {
            self.close_in_game_menu();
        } else if self.layout.game_running {
            self.open_in_game_menu();
        } else {
            self.focus(Hero);
        }
    }

    fn toggle_sidebar(&mut self) {
        if self.overlay_open() {
            debug!("Ignoring menu while an overlay is open");
            return;
        }
        self.state.overlays.sidebar = !self.state.overlays.sidebar;
        self.focus(self.uncovered());
    }

    fn toggle_quick_settings(&mut self) {
        if self.state.overlays.quick_settings {
            self.state.overlays.quick_settings = false;
            self.focus(self.uncovered());
        } else if self.state.overlays.in_game_menu {
            debug!("Refusing to open quick-settings over the in-game menu");
        } else if self.dialog_focused() {
            debug!("Refusing to open quick-settings over a dialog");
        } else {
            self.state.overlays.quick_settings = true;
            self.focus(FocusArea::QuickSettings);
        }
    }

    fn toggle_in_game_menu(&mut self) {
        if self.state.overlays.in_game_menu {
            self.close_in_game_menu();
        } else if !self.layout.game_running {
            debug!("Ignoring overlay toggle, no game is running");
        } else if self.state.overlays.quick_settings {
            debug!("Refusing to open the in-game menu over quick-settings");
        } else {
            self.open_in_game_menu();
        }
    }

    fn open_in_game_menu(&mut self) {
        self.state.overlays.in_game_menu = true;
        self.state.in_game_entry = InGameEntry::Resume;
        self.focus(FocusArea::InGameMenu);
        self.effect(Effect::ShowWindow);
    }

    fn close_in_game_menu(&mut self) {
        self.state.overlays.in_game_menu = false;
        self.state.in_game_entry = InGameEntry::Resume;
        self.focus(self.uncovered());
        self.effect(Effect::HideWindow);
    }

    fn directional(&mut self, action: NavigationAction) {
        use FocusArea::*;
        use NavigationAction::{Down, Left, Right, Up};
        if self.overlay_open() {
            let horizontal = matches!(action, Left | Right);
            if self.state.overlays.quick_settings && horizontal && self.layout.adjusts_slider {
                let step = if action == Right { 1 } else { -1 };
                return self.effect(Effect::AdjustSlider(step));
            }
            return self.effect(Effect::Route(action));
        }
        match self.area() {
            Library | Hero => self.move_in_library(action),
            Sidebar => match action {
                Up => self.state.sidebar_index = self.state.sidebar_index.saturating_sub(1),
                Down => {
                    let next = self.state.sidebar_index + 1;
                    self.state.sidebar_index = next.min(self.layout.last_sidebar_item());
                }
                Right => {
                    self.state.overlays.sidebar = false;
                    self.focus(Library);
                }
                _ => {}
            },
            InGameMenu => match action {
                Up => self.state.in_game_entry = InGameEntry::Resume,
                Down => self.state.in_game_entry = InGameEntry::Quit,
                _ => {}
            },
            TopBar => match action {
                Down => self.focus(Hero),
                Left => self.reemit(SyntheticKey::ArrowLeft),
                Right => self.reemit(SyntheticKey::ArrowRight),
                _ => {}
            },
            Search | VirtualKeyboard => self.reemit(arrow_key(action)),
            QuickSettings | Overlay => self.effect(Effect::Route(action)),
        }
    }

    fn move_in_library(&mut self, action: NavigationAction) {
        use NavigationAction::{Down, Left, Right, Up};
        let index = self.state.active_index;
        let in_library = self.area() == FocusArea::Library;
        let layout = self.layout;
        let (carousels, count) = (&layout.carousels, layout.item_count);
        match action {
            Left => self.state.active_index = index.saturating_sub(1),
            Right => {
                self.state.active_index = (index + 1).min(layout.last_item());
                self.focus(FocusArea::Library);
            }
            Up if in_library => match carousels.step(index, RowStep::Previous, count) {
                Some(above) => self.state.active_index = above,
                None => self.focus(FocusArea::Hero),
            },
            Down if in_library => {
                if let Some(below) = carousels.step(index, RowStep::Next, count) {
                    self.state.active_index = below;
                }
            }
            Down => self.focus(FocusArea::Library),
            _ => {}
        }
    }

    fn virtual_keyboard(&mut self, action: NavigationAction) {
        if !self.typing() {
            return;
        }
        let key = match action {
            NavigationAction::VkBackspace => SyntheticKey::Backspace,
            NavigationAction::VkShift => SyntheticKey::Shift,
            NavigationAction::VkSpace => SyntheticKey::Space,
            _ => SyntheticKey::Symbols,
        };
        self.reemit(key);
    }
}

/// The arrow key matching a directional action.
pub fn arrow_key(action: NavigationAction) -> SyntheticKey {
    match action {
        NavigationAction::Up => SyntheticKey::ArrowUp,
        NavigationAction::Down => SyntheticKey::ArrowDown,
        NavigationAction::Left => SyntheticKey::ArrowLeft,
        _ => SyntheticKey::ArrowRight,
    }
}

/// Owner of the [`NavState`], gating actions before reducing them.
///
/// An action is dropped when:
/// - it arrives less than the debounce period after the last accepted
///   action, whatever their sources,
/// - navigation is disabled, unless the virtual keyboard or an overlay has
///   the focus.
#[derive(Debug, Clone)]
pub struct FocusMachine {
    state: NavState,
    debounce: Cooldown,
}
impl FocusMachine {
    pub fn new(debounce: Duration) -> Self {
        FocusMachine {
            state: NavState::default(),
            debounce: Cooldown::new(debounce),
        }
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    /// Apply `event`, returning the effects to run, `None` if dropped.
    pub fn handle(
        &mut self,
        event: &NavigationEvent,
        layout: &LibraryLayout,
        dialog_open: bool,
    ) -> Option<Vec<Effect>> {
        if !self.debounce.is_ready(event.timestamp) {
            debug!("Debounced {} from {:?}", event.action, event.source);
            return None;
        }
        let area = self.state.focus_area;
        let overlay = dialog_open || self.state.overlays.quick_settings || area == FocusArea::Overlay;
        if layout.is_disabled && !(overlay || area == FocusArea::VirtualKeyboard) {
            debug!("Navigation disabled, dropping {}", event.action);
            return None;
        }
        self.debounce.try_fire(event.timestamp);
        let Transition { state, effects } = reduce(&self.state, layout, dialog_open, event.action);
        self.state = state;
        Some(effects)
    }

    /// Bring indices back in range after the layout changed.
    pub fn fit_layout(&mut self, layout: &LibraryLayout) {
        self.state.active_index = self.state.active_index.min(layout.last_item());
        self.state.sidebar_index = self.state.sidebar_index.min(layout.last_sidebar_item());
    }

    /// Focus `area`, opening the sidebar, quick-settings or in-game menu
    /// if that's where it is.
    ///
    /// Quick-settings is modal: focusing anything else closes it. Focusing
    /// the library, hero or top bar closes every layer over them.
    pub fn set_focus_area(&mut self, area: FocusArea) {
        use FocusArea::*;
        let overlays = &mut self.state.overlays;
        overlays.quick_settings = area == QuickSettings;
        match area {
            Sidebar => overlays.sidebar = true,
            InGameMenu => overlays.in_game_menu = true,
            Library | Hero | TopBar => {
                overlays.sidebar = false;
                overlays.in_game_menu = false;
                self.state.in_game_entry = InGameEntry::Resume;
            }
            _ => {}
        }
        self.state.focus_area = area;
    }

    pub fn set_active_index(&mut self, index: usize, layout: &LibraryLayout) {
        self.state.active_index = index.min(layout.last_item());
    }

    pub fn set_sidebar_open(&mut self, open: bool) {
        self.state.overlays.sidebar = open;
        if open {
            self.state.focus_area = FocusArea::Sidebar;
        } else if self.state.focus_area == FocusArea::Sidebar {
            self.state.focus_area = if self.state.overlays.in_game_menu {
                FocusArea::InGameMenu
            } else {
                FocusArea::Hero
            };
        }
    }
}
