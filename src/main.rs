use bevy::prelude::*;

use reborn_arena::config::tuning::Tuning;
use reborn_arena::plugins::{
    game_plugin::GamePlugin, hud_plugin::HudPlugin, input_plugin::InputPlugin,
    render_plugin::RenderPlugin,
};

fn main() {
    let tuning = Tuning::load_or_default();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Reborn Arena".into(),
                resolution: (1280u32, 720u32).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(Time::<Fixed>::from_seconds(tuning.dt as f64))
        .insert_resource(tuning)
        .add_plugins(GamePlugin)
        .add_plugins(InputPlugin)
        .add_plugins(RenderPlugin)
        .add_plugins(HudPlugin)
        .run();
}
