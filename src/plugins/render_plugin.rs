use bevy::prelude::*;

use crate::game::components::*;

/// Thin presentation layer: a camera that follows the player and simple
/// mesh visuals attached when gameplay entities appear. Owns no gameplay
/// state.
pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera);
        app.add_systems(
            Update,
            (
                attach_player_visual,
                attach_enemy_visuals,
                attach_block_visuals,
                attach_projectile_visuals,
                tint_hit_blocks,
                camera_follow,
            ),
        );
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

fn camera_follow(
    player: Query<&Transform, (With<Player>, Without<Camera2d>)>,
    mut camera: Query<&mut Transform, (With<Camera2d>, Without<Player>)>,
) {
    let Ok(player_tf) = player.single() else { return };
    for mut camera_tf in &mut camera {
        camera_tf.translation.x = player_tf.translation.x;
        camera_tf.translation.y = player_tf.translation.y;
    }
}

fn attach_player_visual(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    added: Query<(Entity, &CollisionRadius), Added<Player>>,
) {
    for (entity, radius) in &added {
        commands.entity(entity).insert((
            Mesh2d(meshes.add(Circle::new(radius.0))),
            MeshMaterial2d(materials.add(Color::srgb(0.2, 0.6, 1.0))),
        ));
    }
}

fn attach_enemy_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    added: Query<(Entity, &EnemyKind, &CollisionRadius), Added<EnemyKind>>,
) {
    for (entity, kind, radius) in &added {
        let color = match kind {
            EnemyKind::Basic => Color::srgb(0.9, 0.3, 0.3),
            EnemyKind::Ranged => Color::srgb(0.95, 0.6, 0.2),
            EnemyKind::Boss => Color::srgb(0.6, 0.1, 0.2),
        };
        commands.entity(entity).insert((
            Mesh2d(meshes.add(Circle::new(radius.0))),
            MeshMaterial2d(materials.add(color)),
        ));
    }
}

fn attach_block_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    added: Query<(Entity, &BlockKind, &CollisionRadius), Added<BlockKind>>,
) {
    for (entity, kind, radius) in &added {
        let color = match kind {
            BlockKind::Yellow => Color::srgb(0.9, 0.8, 0.2),
            BlockKind::Blue => Color::srgb(0.3, 0.5, 0.9),
            BlockKind::Purple => Color::srgb(0.6, 0.3, 0.8),
        };
        let side = radius.0 * 2.0;
        commands.entity(entity).insert((
            Mesh2d(meshes.add(Rectangle::new(side, side))),
            MeshMaterial2d(materials.add(color)),
        ));
    }
}

fn attach_projectile_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    added: Query<(Entity, &Faction, &CollisionRadius, Option<&ProjectilePayload>), Added<Projectile>>,
) {
    for (entity, faction, radius, payload) in &added {
        let color = match (faction, payload) {
            (_, Some(ProjectilePayload::Trap)) => Color::srgb(0.7, 0.2, 0.9),
            (_, Some(ProjectilePayload::Circle)) => Color::srgb(0.2, 0.9, 0.9),
            (Faction::PlayerSide, None) => Color::srgb(1.0, 1.0, 0.3),
            (Faction::EnemySide, None) => Color::srgb(1.0, 0.4, 0.2),
        };
        commands.entity(entity).insert((
            Mesh2d(meshes.add(Circle::new(radius.0))),
            MeshMaterial2d(materials.add(color)),
        ));
    }
}

/// Brighten blocks while their hit flash is live.
fn tint_hit_blocks(
    mut materials: ResMut<Assets<ColorMaterial>>,
    blocks: Query<(&BlockKind, &HitFlash, &MeshMaterial2d<ColorMaterial>), With<Block>>,
) {
    for (kind, flash, material) in &blocks {
        let Some(material) = materials.get_mut(&material.0) else { continue };
        let base = match kind {
            BlockKind::Yellow => Color::srgb(0.9, 0.8, 0.2),
            BlockKind::Blue => Color::srgb(0.3, 0.5, 0.9),
            BlockKind::Purple => Color::srgb(0.6, 0.3, 0.8),
        };
        material.color = if flash.0.is_expired() {
            base
        } else {
            Color::WHITE
        };
    }
}
