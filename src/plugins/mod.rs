pub mod game_plugin;
pub mod hud_plugin;
pub mod input_plugin;
pub mod render_plugin;
