use bevy::prelude::*;
use rand::Rng;

use super::components::*;
use super::events::SpawnShotMessage;
use super::map::WorldMap;
use super::stats::types::Seconds;
use crate::config::tuning::Tuning;

/// Targeting priority shared by every enemy kind: the player when exposed
/// and in detection range, then the nearest rival enemy, then the nearest
/// block, otherwise wander.
fn choose_target(
    self_entity: Entity,
    pos: Vec2,
    detect: f32,
    map: &WorldMap,
    player: Option<(Entity, Vec2)>,
    enemies: &Query<(Entity, &Transform), (With<Enemy>, Without<Dead>)>,
    blocks: &Query<(Entity, &Transform), (With<Block>, Without<Dead>)>,
) -> Option<(Entity, Vec2)> {
    if let Some((player_entity, player_pos)) = player {
        if !map.in_safe_zone(player_pos) && pos.distance(player_pos) < detect {
            return Some((player_entity, player_pos));
        }
    }

    let nearest_enemy = enemies
        .iter()
        .filter(|(e, _)| *e != self_entity)
        .map(|(e, tf)| (e, tf.translation.truncate()))
        .filter(|(_, p)| pos.distance(*p) < detect)
        .min_by(|a, b| pos.distance(a.1).total_cmp(&pos.distance(b.1)));
    if nearest_enemy.is_some() {
        return nearest_enemy;
    }

    blocks
        .iter()
        .map(|(e, tf)| (e, tf.translation.truncate()))
        .filter(|(_, p)| pos.distance(*p) < detect)
        .min_by(|a, b| pos.distance(a.1).total_cmp(&pos.distance(b.1)))
}

/// Rotate an aim direction by an error angle drawn from the intelligence
/// roll; smarter enemies shoot straighter.
fn noisy_aim(dir: Vec2, intelligence: f32, max_noise: f32, rng: &mut GameRng) -> Vec2 {
    let spread = max_noise * (1.0 - intelligence.clamp(0.0, 1.0));
    if spread <= 0.0 {
        return dir;
    }
    let angle = rng.0.random_range(-spread..=spread);
    Vec2::from_angle(angle).rotate(dir)
}

/// AiSet: one decision pass per enemy per tick. Picks the target, sets
/// velocity by kind, and fires ranged shots. All enemy kinds use the same
/// pursuit rules; only the ranged standoff differs.
pub fn drive_enemies(
    tuning: Res<Tuning>,
    map: Res<WorldMap>,
    mut rng: ResMut<GameRng>,
    player: Query<(Entity, &Transform), (With<Player>, Without<Respawning>)>,
    enemy_positions: Query<(Entity, &Transform), (With<Enemy>, Without<Dead>)>,
    blocks: Query<(Entity, &Transform), (With<Block>, Without<Dead>)>,
    mut enemies: Query<
        (
            Entity,
            &EnemyKind,
            &Transform,
            &MoveSpeed,
            &DetectRadius,
            &Intelligence,
            &ContactDamage,
            &mut AiState,
            &mut Velocity,
        ),
        (With<Enemy>, Without<Dead>),
    >,
    mut shots: MessageWriter<SpawnShotMessage>,
) {
    let dt = tuning.dt;
    let player_info = player
        .single()
        .ok()
        .map(|(e, tf)| (e, tf.translation.truncate()));

    for (entity, kind, transform, speed, detect, intelligence, contact, mut ai, mut velocity) in
        &mut enemies
    {
        let pos = transform.translation.truncate();
        ai.attack_cooldown = ai.attack_cooldown.dec(dt);

        let target = choose_target(
            entity,
            pos,
            detect.0,
            &map,
            player_info,
            &enemy_positions,
            &blocks,
        );
        ai.target = target.map(|(e, _)| e);

        let Some((target_entity, target_pos)) = target else {
            // Wander: re-roll a direction on a short timer, drift at half
            // speed.
            ai.wander_timer = ai.wander_timer.dec(dt);
            if ai.wander_timer.is_expired() {
                let angle = rng.0.random_range(0.0..std::f32::consts::TAU);
                ai.wander_dir = Vec2::from_angle(angle);
                ai.wander_timer = Seconds::new(rng.0.random_range(1.5..3.5));
            }
            velocity.0 = ai.wander_dir * speed.0 * 0.5;
            steer_out_of_safe_zones(&map, pos, &mut velocity, speed.0);
            continue;
        };

        let to_target = target_pos - pos;
        let dist = to_target.length().max(1.0);
        let dir = to_target / dist;
        let targeting_player = player_info.map(|(e, _)| e) == Some(target_entity);

        if *kind == EnemyKind::Ranged && targeting_player {
            // Hold a standoff band around the preferred distance, strafe
            // inside it.
            let inner = tuning.ranged_standoff_distance - tuning.ranged_standoff_band;
            let outer = tuning.ranged_standoff_distance + tuning.ranged_standoff_band;
            velocity.0 = if dist > outer {
                dir * speed.0
            } else if dist < inner {
                -dir * speed.0
            } else {
                dir.perp() * speed.0 * 0.6
            };

            if ai.attack_cooldown.is_expired() {
                let aim = noisy_aim(dir, intelligence.0, tuning.aim_noise_max, &mut rng);
                shots.write(SpawnShotMessage {
                    faction: Faction::EnemySide,
                    owner: Some(entity),
                    position: pos + aim * 30.0,
                    direction: aim,
                    speed: tuning.enemy_shot_speed,
                    damage: contact.0,
                    lifetime: tuning.enemy_shot_lifetime,
                    payload: None,
                });
                ai.attack_cooldown = Seconds::new(tuning.ranged_fire_cooldown);
            }
        } else {
            velocity.0 = dir * speed.0;
        }

        steer_out_of_safe_zones(&map, pos, &mut velocity, speed.0);
    }
}

/// Enemies never fight inside a safe zone; push any that drift in back out.
fn steer_out_of_safe_zones(map: &WorldMap, pos: Vec2, velocity: &mut Velocity, speed: f32) {
    for zone in &map.safe_zones {
        if zone.contains(pos) {
            let away = (pos - zone.center).normalize_or(Vec2::X);
            velocity.0 = away * speed;
            return;
        }
    }
}

/// AiSet: boss phase transitions on hp thresholds. Phases only ever go up,
/// so a healing boss never reverts.
pub fn tick_boss_phases(
    tuning: Res<Tuning>,
    mut bosses: Query<
        (&Health, &mut BossState, &mut Mitigation, &mut MoveSpeed),
        (With<Enemy>, Without<Dead>),
    >,
) {
    for (health, mut boss, mut mitigation, mut speed) in &mut bosses {
        let fraction = health.fraction();
        if boss.phase < 2 && fraction <= tuning.boss_phase2_hp_fraction {
            boss.phase = 2;
            info!("Boss entered phase 2");
        }
        if boss.phase < 3 && fraction <= tuning.boss_phase3_hp_fraction {
            boss.phase = 3;
            mitigation.phase_dr = super::stats::types::DamageReduction::new(tuning.boss_phase3_extra_dr);
            speed.0 *= tuning.boss_phase3_speed_mult;
            // The faster trap cadence applies to the countdown already in
            // flight, not just the next reset.
            if boss.trap_cooldown.0 > tuning.boss_trap_cooldown_phase3 {
                boss.trap_cooldown = Seconds::new(tuning.boss_trap_cooldown_phase3);
            }
            info!("Boss entered phase 3");
        }
    }
}

/// AiSet: boss skill casts. Trap and circle share a lockout so the boss
/// never fires both in the same window; the circle unlocks at phase 2 and
/// the trap accelerates at phase 3.
pub fn boss_use_skills(
    tuning: Res<Tuning>,
    map: Res<WorldMap>,
    player: Query<&Transform, (With<Player>, Without<Respawning>, Without<Enemy>)>,
    mut bosses: Query<
        (Entity, &Transform, &DetectRadius, &mut BossState),
        (With<Enemy>, Without<Dead>),
    >,
    mut shots: MessageWriter<SpawnShotMessage>,
) {
    let dt = tuning.dt;
    let player_pos = player.single().ok().map(|tf| tf.translation.truncate());

    for (entity, transform, detect, mut boss) in &mut bosses {
        boss.trap_cooldown = boss.trap_cooldown.dec(dt);
        boss.circle_cooldown = boss.circle_cooldown.dec(dt);
        boss.skill_lockout = boss.skill_lockout.dec(dt);

        let Some(player_pos) = player_pos else { continue };
        if map.in_safe_zone(player_pos) {
            continue;
        }
        let pos = transform.translation.truncate();
        let to_player = player_pos - pos;
        if to_player.length() > detect.0 || !boss.skill_lockout.is_expired() {
            continue;
        }
        let dir = to_player.normalize_or(Vec2::X);

        if boss.trap_cooldown.is_expired() {
            shots.write(SpawnShotMessage {
                faction: Faction::EnemySide,
                owner: Some(entity),
                position: pos + dir * 40.0,
                direction: dir,
                speed: tuning.boss_trap_speed,
                damage: tuning.trap_damage,
                lifetime: tuning.enemy_shot_lifetime,
                payload: Some(ProjectilePayload::Trap),
            });
            let next = if boss.phase >= 3 {
                tuning.boss_trap_cooldown_phase3
            } else {
                tuning.boss_trap_cooldown
            };
            boss.trap_cooldown = Seconds::new(next);
            boss.skill_lockout = Seconds::new(tuning.boss_skill_lockout);
        } else if boss.phase >= 2 && boss.circle_cooldown.is_expired() {
            shots.write(SpawnShotMessage {
                faction: Faction::EnemySide,
                owner: Some(entity),
                position: pos + dir * 40.0,
                direction: dir,
                speed: tuning.boss_circle_speed,
                damage: tuning.circle_damage,
                lifetime: tuning.enemy_shot_lifetime,
                payload: Some(ProjectilePayload::Circle),
            });
            boss.circle_cooldown = Seconds::new(tuning.boss_circle_cooldown);
            boss.skill_lockout = Seconds::new(tuning.boss_skill_lockout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn noisy_aim_bounded_by_intelligence() {
        let mut rng = GameRng(StdRng::seed_from_u64(3));
        let dir = Vec2::X;
        for _ in 0..100 {
            let aimed = noisy_aim(dir, 0.5, 0.35, &mut rng);
            let angle = aimed.y.atan2(aimed.x).abs();
            assert!(angle <= 0.35 * 0.5 + 1e-4);
        }
    }

    #[test]
    fn perfect_intelligence_never_misses() {
        let mut rng = GameRng(StdRng::seed_from_u64(3));
        let aimed = noisy_aim(Vec2::Y, 1.0, 0.35, &mut rng);
        assert_eq!(aimed, Vec2::Y);
    }
}
