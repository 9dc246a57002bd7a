use bevy::prelude::*;

use super::components::*;
use super::events::SpawnShotMessage;
use super::intent::Intent;
use super::map::WorldMap;
use crate::config::tuning::Tuning;

/// ApplyInputSet: convert the player's intent into velocity, honoring
/// freeze, the circle-debuff slow, mobility, and block slow fields.
pub fn apply_player_intent(
    mut player: Query<
        (&Transform, &CollisionRadius, &Intent, &PlayerStatus, &PlayerEffective, &mut Velocity),
        (With<Player>, Without<Respawning>),
    >,
    blocks: Query<(&Transform, &CollisionRadius, &SlowFactor), (With<Block>, Without<Dead>, Without<Player>)>,
) {
    for (transform, radius, intent, status, effective, mut velocity) in &mut player {
        if status.is_frozen() {
            velocity.0 = Vec2::ZERO;
            continue;
        }

        // Slowest overlapping block wins.
        let pos = transform.translation.truncate();
        let mut block_slow = 1.0_f32;
        for (block_tf, block_radius, slow) in &blocks {
            let dist = pos.distance(block_tf.translation.truncate());
            if dist < radius.0 + block_radius.0 && slow.0 < block_slow {
                block_slow = slow.0;
            }
        }

        let speed = effective.0.move_speed
            * effective.0.mobility_mult.0
            * status.slow_mult
            * block_slow;
        let dir = if intent.move_dir.length_squared() > 1e-6 {
            intent.move_dir.normalize()
        } else {
            Vec2::ZERO
        };
        velocity.0 = dir * speed;
    }
}

/// ApplyInputSet: cooldown-gated player fire toward the aim point.
pub fn fire_player_weapon(
    tuning: Res<Tuning>,
    mut player: Query<
        (&Transform, &CollisionRadius, &Intent, &PlayerEffective, &mut FireCooldown),
        (With<Player>, Without<Respawning>),
    >,
    mut shots: MessageWriter<SpawnShotMessage>,
) {
    let dt = tuning.dt;
    for (transform, radius, intent, effective, mut cooldown) in &mut player {
        cooldown.0 = cooldown.0.dec(dt);
        if !intent.fire || !cooldown.0.is_expired() {
            continue;
        }

        let pos = transform.translation.truncate();
        let to_aim = intent.aim - pos;
        let dist = to_aim.length().max(1.0);
        let dir = to_aim / dist;

        shots.write(SpawnShotMessage {
            faction: Faction::PlayerSide,
            owner: None,
            position: pos + dir * radius.0,
            direction: dir,
            speed: tuning.player_shot_speed,
            damage: effective.0.projectile_damage(),
            lifetime: tuning.player_shot_lifetime,
            payload: None,
        });
        cooldown.0 = super::stats::types::Seconds::new(tuning.player_fire_cooldown);
    }
}

/// MovementSet: integrate velocity for players and enemies, clamped to the
/// map bounds.
pub fn integrate_movement(
    tuning: Res<Tuning>,
    map: Res<WorldMap>,
    mut query: Query<
        (&mut Transform, &Velocity, &CollisionRadius),
        (Without<Projectile>, Without<Dead>),
    >,
) {
    let dt = tuning.dt;
    for (mut transform, velocity, radius) in &mut query {
        let next = transform.translation.truncate() + velocity.0 * dt;
        let clamped = map.clamp_point(next, radius.0);
        transform.translation.x = clamped.x;
        transform.translation.y = clamped.y;
    }
}

/// MovementSet: integrate projectiles and tick their lifetime.
pub fn integrate_projectiles(
    tuning: Res<Tuning>,
    mut query: Query<(&mut Transform, &Velocity, &mut Lifetime), (With<Projectile>, Without<Dead>)>,
) {
    let dt = tuning.dt;
    for (mut transform, velocity, mut lifetime) in &mut query {
        transform.translation.x += velocity.0.x * dt;
        transform.translation.y += velocity.0.y * dt;
        lifetime.0 = lifetime.0.dec(dt);
    }
}

/// MovementSet: tick player status ailments and apply hp regeneration.
pub fn tick_player_status(
    tuning: Res<Tuning>,
    mut player: Query<
        (&mut PlayerStatus, &mut Health, &PlayerEffective),
        (With<Player>, Without<Respawning>),
    >,
) {
    let dt = tuning.dt;
    for (mut status, mut health, effective) in &mut player {
        status.tick(dt);
        let regen = effective.0.regen_frac * health.max * dt;
        if regen > 0.0 {
            let max = health.max;
            health.current = health.current.add_clamped(regen, max);
        }
    }
}

/// MovementSet: fade the recently-hit flash on blocks.
pub fn tick_hit_flash(tuning: Res<Tuning>, mut blocks: Query<&mut HitFlash, With<Block>>) {
    let dt = tuning.dt;
    for mut flash in &mut blocks {
        flash.0 = flash.0.dec(dt);
    }
}
