use std::{thread, time::Duration};

use bevy::input::{
    keyboard::{Key, KeyboardInput, NativeKey},
    ButtonState, InputPlugin,
};
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;

use launcher_navigation::{
    ElementTree, LauncherNavigationPlugin, LauncherRequest, LibraryLayout, NativeNavSignal,
    Navigator,
};

/// Browse a library of three carousels with scripted key presses, open the
/// sidebar, then pretend a game runs and quit it from the in-game menu.
fn main() {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        InputPlugin,
        LogPlugin {
            level: Level::DEBUG,
            ..default()
        },
        LauncherNavigationPlugin::new(),
    ))
    .insert_resource(LibraryLayout::flat(12).with_carousels(vec![0, 5, 9]).with_sidebar(4))
    .add_systems(Update, (print_requests, print_focus));

    let browse = [
        KeyCode::ArrowDown,
        KeyCode::ArrowRight,
        KeyCode::ArrowRight,
        KeyCode::ArrowDown,
        KeyCode::ArrowDown,
        KeyCode::ArrowUp,
        KeyCode::Enter,
        KeyCode::F1,
        KeyCode::ArrowDown,
        KeyCode::Enter,
        KeyCode::Escape,
    ];
    app.update();
    for key in browse {
        press(&mut app, key);
    }

    app.world.resource_mut::<LibraryLayout>().game_running = true;
    for signal in ["toggle_overlay", "down", "confirm"] {
        app.world.send_event(NativeNavSignal(signal.to_owned()));
        step(&mut app);
    }
}

fn key_event(key_code: KeyCode, state: ButtonState) -> KeyboardInput {
    KeyboardInput {
        key_code,
        logical_key: Key::Unidentified(NativeKey::Unidentified),
        state,
        window: Entity::PLACEHOLDER,
    }
}

fn press(app: &mut App, key_code: KeyCode) {
    app.world.send_event(key_event(key_code, ButtonState::Pressed));
    step(app);
    app.world.send_event(key_event(key_code, ButtonState::Released));
}

/// Run one frame, then wait out the navigation debounce.
fn step(app: &mut App) {
    app.update();
    thread::sleep(Duration::from_millis(100));
}

fn print_requests(mut requests: EventReader<LauncherRequest>) {
    for request in requests.read() {
        info!("Launcher request: {request:?}");
    }
}

fn print_focus(navigator: NonSend<Navigator<ElementTree>>) {
    if let Some(event) = navigator.host().dispatched().last() {
        debug!("Last key sent to the UI: {:?}", event.key);
    }
    info!(
        "Focus: {:?}, selected game: {}, sidebar open: {}",
        navigator.focus_area(),
        navigator.active_index(),
        navigator.is_sidebar_open()
    );
}
