/*!
[`ElementTree`]: headless::ElementTree
[`FocusArea`]: focus::FocusArea
[`InputMapping`]: mapping::InputMapping
[`LauncherRequest`]: LauncherRequest
[`LibraryLayout`]: focus::LibraryLayout
[`NativeNavSignal`]: NativeNavSignal
[`NavigationEvent`]: NavigationEvent
[`NavigationSystems`]: NavigationSystems
[`Navigator`]: navigator::Navigator
[`UiHost`]: host::UiHost
*/
#![doc = include_str!("../Readme.md")]
pub mod bus;
pub mod carousel;
pub mod device;
pub mod events;
pub mod focus;
pub mod headless;
pub mod host;
pub mod mapping;
pub mod modal;
pub mod navigator;
pub mod normalize;
pub mod synthetic;
pub mod systems;
mod timing;

use std::marker::PhantomData;

use bevy::input::InputSystem;
use bevy::prelude::*;
use bevy::time::common_conditions::on_timer;
use bevy::window::{CursorMoved, WindowFocused};

pub use device::InputDeviceType;
pub use events::{
    DeviceChanged, InputSource, LauncherRequest, NativeNavSignal, NavigationAction,
    NavigationEvent,
};
pub use focus::{FocusArea, LibraryLayout};
pub use headless::ElementTree;
pub use host::{HostError, UiHost};
pub use mapping::InputMapping;
pub use navigator::Navigator;

/// The set in which the navigator reads input and sends its events.
///
/// It runs in `PreUpdate`, after bevy's [`InputSystem`]. Systems reading
/// [`NavigationEvent`] or [`LauncherRequest`] can run anywhere in `Update`
/// without lagging a frame.
///
/// Systems writing [`NativeNavSignal`]s or changing the [`LibraryLayout`]
/// should run _before_ it, for the same reason.
#[derive(Clone, Debug, Hash, PartialEq, Eq, SystemSet)]
pub struct NavigationSystems;

/// The launcher navigation plugin.
///
/// Inserts a [`Navigator`] over a default `H` as a non-send resource, and
/// the [`InputMapping`] and [`LibraryLayout`] resources if missing. To use
/// your own mapping, insert it before adding the plugin.
///
/// Requires bevy's `InputPlugin` and `TimePlugin`.
///
/// Focus area and selection are read and set through
/// `NonSendMut<Navigator<H>>`, the launcher's actions come out as
/// [`LauncherRequest`] events.
///
/// # Note on generic parameters
///
/// `H` is the UI host: implement [`UiHost`] for the UI rendering the
/// launcher. [`LauncherNavigationPlugin`] uses the in-memory
/// [`ElementTree`].
pub struct GenericLauncherNavigationPlugin<H> {
    slider: bool,
    _host: PhantomData<fn() -> H>,
}
pub type LauncherNavigationPlugin = GenericLauncherNavigationPlugin<ElementTree>;

impl<H> GenericLauncherNavigationPlugin<H> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        GenericLauncherNavigationPlugin {
            slider: false,
            _host: PhantomData,
        }
    }

    /// Left/right in quick-settings send [`LauncherRequest::AdjustSlider`]
    /// instead of moving focus.
    pub fn with_slider(mut self) -> Self {
        self.slider = true;
        self
    }
}
impl<H: UiHost + Default + 'static> Plugin for GenericLauncherNavigationPlugin<H> {
    fn build(&self, app: &mut App) {
        use systems::*;

        app.init_resource::<InputMapping>()
            .init_resource::<LibraryLayout>();
        let mapping = app
            .world
            .get_resource::<InputMapping>()
            .cloned()
            .unwrap_or_default();
        let identity_poll = mapping.identity_poll;

        let mut navigator = Navigator::new(H::default(), mapping);
        let outbox = NavigationOutbox::default();
        outbox.connect(&mut navigator);
        if self.slider {
            outbox.connect_slider(&mut navigator);
        }

        app.insert_non_send_resource(navigator)
            .insert_non_send_resource(outbox)
            .add_event::<NavigationEvent>()
            .add_event::<LauncherRequest>()
            .add_event::<NativeNavSignal>()
            .add_event::<DeviceChanged>()
            .add_event::<CursorMoved>()
            .add_event::<WindowFocused>()
            .configure_sets(PreUpdate, NavigationSystems.after(InputSystem))
            .add_systems(
                PreUpdate,
                (
                    sync_layout::<H>,
                    window_focus::<H>,
                    keyboard_input::<H>,
                    mouse_input::<H>,
                    native_input::<H>,
                    gamepad_navigation::<H>,
                    gamepad_identity::<H>.run_if(on_timer(identity_poll)),
                    send_outputs,
                )
                    .chain()
                    .in_set(NavigationSystems),
            );
    }
}
