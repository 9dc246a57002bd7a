use bevy::prelude::*;

use crate::config::tuning::Tuning;
use crate::game::components::Player;
use crate::game::events::CommandMessage;
use crate::game::intent::Intent;
use crate::game::stats::types::{RebornClass, SkillKind};

/// Reads the keyboard and mouse into the player's intent and the command
/// channel. Runs in Update; the simulation consumes both in FixedUpdate.
pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (gather_intent, command_input, tuning_reload_input).chain(),
        );
    }
}

fn gather_intent(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    camera: Query<(&Camera, &GlobalTransform)>,
    mut player: Query<&mut Intent, With<Player>>,
) {
    let Ok(mut intent) = player.single_mut() else { return };

    let mut dir = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp) {
        dir.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown) {
        dir.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft) {
        dir.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight) {
        dir.x += 1.0;
    }
    intent.move_dir = dir;

    intent.fire = mouse.pressed(MouseButton::Left) || keyboard.pressed(KeyCode::Space);

    if let (Ok(window), Ok((camera, camera_tf))) = (windows.single(), camera.single()) {
        if let Some(cursor) = window.cursor_position() {
            if let Ok(world) = camera.viewport_to_world_2d(camera_tf, cursor) {
                intent.aim = world;
            }
        }
    }
}

/// Digits 1-7 spend one skill point; O/P reborn as DPS/Tank; T starts a
/// rank trial. Invalid requests are rejected inside the simulation.
fn command_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut commands_out: MessageWriter<CommandMessage>,
) {
    const SKILL_KEYS: [(KeyCode, SkillKind); 7] = [
        (KeyCode::Digit1, SkillKind::Damage),
        (KeyCode::Digit2, SkillKind::BodyDamage),
        (KeyCode::Digit3, SkillKind::Defense),
        (KeyCode::Digit4, SkillKind::MaxHp),
        (KeyCode::Digit5, SkillKind::Regen),
        (KeyCode::Digit6, SkillKind::Speed),
        (KeyCode::Digit7, SkillKind::Mobility),
    ];
    for (key, skill) in SKILL_KEYS {
        if keyboard.just_pressed(key) {
            commands_out.write(CommandMessage::SpendSkill { skill, count: 1 });
        }
    }

    if keyboard.just_pressed(KeyCode::KeyO) {
        commands_out.write(CommandMessage::Reborn { class: Some(RebornClass::Dps) });
    }
    if keyboard.just_pressed(KeyCode::KeyP) {
        commands_out.write(CommandMessage::Reborn { class: Some(RebornClass::Tank) });
    }
    if keyboard.just_pressed(KeyCode::KeyT) {
        commands_out.write(CommandMessage::StartRankTrial);
    }
}

/// Reload tuning with F5.
fn tuning_reload_input(keyboard: Res<ButtonInput<KeyCode>>, mut tuning: ResMut<Tuning>) {
    if keyboard.just_pressed(KeyCode::F5) {
        tuning.reload();
    }
}
