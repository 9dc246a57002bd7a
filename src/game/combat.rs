use bevy::prelude::*;
use rand::Rng;

use super::components::*;
use super::events::*;
use super::rank::RankState;
use super::spawn::{PendingKind, RespawnQueue};
use super::stats::effective::EffectiveStats;
use super::stats::types::{DamageReduction, Seconds};
use crate::config::tuning::Tuning;

// ── Player damage pipeline ──────────────────────────────────────────

/// Everything that mitigates an incoming player hit, captured before the
/// roll so the resolution itself is pure and testable.
#[derive(Debug, Clone, Copy)]
pub struct DefenseProfile {
    pub base_defense: DamageReduction,
    pub defense_debuff: f32,
    pub milestone_dr: DamageReduction,
    pub reborn_dr: DamageReduction,
    pub rank_dr: DamageReduction,
    pub ignore_chance: f32,
    /// Defense effectiveness factor while mitigating shield damage.
    pub shield_dr_factor: f32,
}

impl DefenseProfile {
    pub fn of(effective: &EffectiveStats, status: &PlayerStatus, tuning: &Tuning) -> Self {
        Self {
            base_defense: effective.defense,
            defense_debuff: status.defense_debuff,
            milestone_dr: effective.milestone_dr,
            reborn_dr: effective.reborn_dr,
            rank_dr: effective.rank_dr,
            ignore_chance: effective.ignore_hit_chance,
            shield_dr_factor: tuning.shield_dr_factor,
        }
    }

    /// Total DR: debuffed base defense composed with every extra source.
    pub fn composed_dr(&self) -> DamageReduction {
        let base = DamageReduction::new((self.base_defense.0 - self.defense_debuff).max(0.0));
        base.compose(self.milestone_dr)
            .compose(self.reborn_dr)
            .compose(self.rank_dr)
    }

    /// DR while the shield is absorbing; boosted, same cap.
    pub fn shield_dr(&self) -> DamageReduction {
        DamageReduction::new(self.composed_dr().0 * self.shield_dr_factor)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HitOutcome {
    pub ignored: bool,
    pub shield_absorbed: f32,
    pub hp_damage: f32,
}

/// Apply one incoming hit to the player: ignore roll, then shield before hp,
/// each with its own composed DR. `ignore_roll` is in [0, 1), drawn by the
/// caller so this stays deterministic.
pub fn resolve_player_hit(
    raw: f32,
    profile: &DefenseProfile,
    shield: &mut ShieldState,
    health: &mut Health,
    ignore_roll: f32,
) -> HitOutcome {
    if raw <= 0.0 {
        return HitOutcome::default();
    }
    if profile.ignore_chance > 0.0 && ignore_roll < profile.ignore_chance {
        return HitOutcome { ignored: true, ..Default::default() };
    }

    let mut remaining_raw = raw;
    let mut outcome = HitOutcome::default();

    if shield.current > 0.0 {
        let through = remaining_raw * profile.shield_dr().passthrough();
        let absorbed = through.min(shield.current);
        shield.current -= absorbed;
        outcome.shield_absorbed = absorbed;
        // Carry only the raw damage the shield could not cover.
        if through > 0.0 {
            remaining_raw *= 1.0 - absorbed / through;
        }
    }

    if remaining_raw > 0.0 {
        let hp_damage = remaining_raw * profile.composed_dr().passthrough();
        health.current = health.current.sub_clamped(hp_damage);
        outcome.hp_damage = hp_damage;
    }
    outcome
}

/// Damage through a target's mitigation (enemies and blocks).
pub fn mitigated(raw: f32, mitigation: &Mitigation) -> f32 {
    raw * mitigation.total().passthrough()
}

// ── Collision detection ─────────────────────────────────────────────

/// CollisionSet: continuous body-contact damage while radii overlap.
/// Damage is a per-second rate scaled by dt, never a one-shot impulse.
pub fn detect_contact_damage(
    tuning: Res<Tuning>,
    player: Query<
        (Entity, &Transform, &CollisionRadius, &PlayerEffective),
        (With<Player>, Without<Respawning>),
    >,
    enemies: Query<
        (Entity, &Transform, &CollisionRadius, &ContactDamage, &AiState),
        (With<Enemy>, Without<Dead>),
    >,
    blocks: Query<
        (Entity, &Transform, &CollisionRadius, &ContactDamage),
        (With<Block>, Without<Dead>),
    >,
    mut damage: MessageWriter<DamageMessage>,
) {
    let dt = tuning.dt;

    let player_info = player.single().ok();

    for (enemy_entity, enemy_tf, enemy_radius, contact, ai) in &enemies {
        let enemy_pos = enemy_tf.translation.truncate();

        // Enemy <-> player, both directions.
        if let Some((player_entity, player_tf, player_radius, effective)) = player_info {
            let player_pos = player_tf.translation.truncate();
            if enemy_pos.distance(player_pos) < enemy_radius.0 + player_radius.0 {
                damage.write(DamageMessage {
                    credit: Credit::Enemy(enemy_entity),
                    target: player_entity,
                    amount: contact.0 * dt,
                });
                damage.write(DamageMessage {
                    credit: Credit::Player,
                    target: enemy_entity,
                    amount: effective.0.contact_damage() * dt,
                });
            }
        }

        // Enemy -> its chosen target (enemy-vs-enemy / enemy-vs-block).
        if let Some(target) = ai.target {
            let target_pos = if let Ok((_, tf, radius, ..)) = enemies.get(target) {
                Some((tf.translation.truncate(), radius.0))
            } else if let Ok((_, tf, radius, _)) = blocks.get(target) {
                Some((tf.translation.truncate(), radius.0))
            } else {
                None
            };
            if let Some((pos, radius)) = target_pos {
                if enemy_pos.distance(pos) < enemy_radius.0 + radius {
                    damage.write(DamageMessage {
                        credit: Credit::Enemy(enemy_entity),
                        target,
                        amount: contact.0 * dt,
                    });
                }
            }
        }
    }

    // Player body damage vs blocks (blocks hit back via their own rate).
    if let Some((player_entity, player_tf, player_radius, effective)) = player_info {
        let player_pos = player_tf.translation.truncate();
        for (block_entity, block_tf, block_radius, contact) in &blocks {
            let block_pos = block_tf.translation.truncate();
            if player_pos.distance(block_pos) < player_radius.0 + block_radius.0 {
                damage.write(DamageMessage {
                    credit: Credit::None,
                    target: player_entity,
                    amount: contact.0 * dt,
                });
                damage.write(DamageMessage {
                    credit: Credit::Player,
                    target: block_entity,
                    amount: effective.0.contact_damage() * effective.0.block_damage_mult.0 * dt,
                });
            }
        }
    }
}

/// CollisionSet: projectile vs target, first hit wins.
pub fn detect_projectile_hits(
    mut commands: Commands,
    projectiles: Query<
        (
            Entity,
            &Transform,
            &CollisionRadius,
            &Faction,
            &ProjectileDamage,
            &ProjectileOwner,
            Option<&ProjectilePayload>,
        ),
        (With<Projectile>, Without<Dead>),
    >,
    player: Query<(Entity, &Transform, &CollisionRadius, &PlayerEffective), (With<Player>, Without<Respawning>)>,
    enemies: Query<(Entity, &Transform, &CollisionRadius), (With<Enemy>, Without<Dead>)>,
    blocks: Query<(Entity, &Transform, &CollisionRadius), (With<Block>, Without<Dead>)>,
    mut damage: MessageWriter<DamageMessage>,
    mut statuses: MessageWriter<StatusMessage>,
) {
    for (proj_entity, proj_tf, proj_radius, faction, proj_damage, owner, payload) in &projectiles {
        let proj_pos = proj_tf.translation.truncate();
        let mut hit = false;

        match faction {
            Faction::PlayerSide => {
                for (enemy_entity, enemy_tf, enemy_radius) in &enemies {
                    if proj_pos.distance(enemy_tf.translation.truncate())
                        < proj_radius.0 + enemy_radius.0
                    {
                        damage.write(DamageMessage {
                            credit: Credit::Player,
                            target: enemy_entity,
                            amount: proj_damage.0,
                        });
                        hit = true;
                        break;
                    }
                }
                if !hit {
                    let block_mult = player
                        .single()
                        .map(|(.., effective)| effective.0.block_damage_mult.0)
                        .unwrap_or(1.0);
                    for (block_entity, block_tf, block_radius) in &blocks {
                        if proj_pos.distance(block_tf.translation.truncate())
                            < proj_radius.0 + block_radius.0
                        {
                            damage.write(DamageMessage {
                                credit: Credit::Player,
                                target: block_entity,
                                amount: proj_damage.0 * block_mult,
                            });
                            hit = true;
                            break;
                        }
                    }
                }
            }
            Faction::EnemySide => {
                if let Ok((player_entity, player_tf, player_radius, _)) = player.single() {
                    if proj_pos.distance(player_tf.translation.truncate())
                        < proj_radius.0 + player_radius.0
                    {
                        damage.write(DamageMessage {
                            credit: match owner.0 {
                                Some(e) => Credit::Enemy(e),
                                None => Credit::None,
                            },
                            target: player_entity,
                            amount: proj_damage.0,
                        });
                        if let Some(payload) = payload {
                            statuses.write(StatusMessage { payload: *payload });
                        }
                        hit = true;
                    }
                }
            }
        }

        if hit {
            commands.entity(proj_entity).insert(Dead);
        }
    }
}

// ── Application ─────────────────────────────────────────────────────

/// DamageApplySet: resolve queued damage against player, enemies, and
/// blocks. Victims are marked dead here and swept later; kills are emitted
/// for the rewards pass.
pub fn apply_damage(
    mut commands: Commands,
    tuning: Res<Tuning>,
    mut rng: ResMut<GameRng>,
    mut damage_events: MessageReader<DamageMessage>,
    mut player: Query<
        (&PlayerEffective, &PlayerStatus, &mut ShieldState, &mut Health, &mut Velocity),
        (With<Player>, Without<Enemy>, Without<Block>),
    >,
    mut enemies: Query<
        (&EnemyKind, &mut Health, &Mitigation, &XpValue, Option<&TrialBoss>),
        (With<Enemy>, Without<Player>, Without<Block>, Without<Dead>),
    >,
    mut blocks: Query<
        (&BlockKind, &mut Health, &Mitigation, &XpValue, &mut HitFlash),
        (With<Block>, Without<Player>, Without<Enemy>, Without<Dead>),
    >,
    mut kills: MessageWriter<KillMessage>,
) {
    for event in damage_events.read() {
        if let Ok((effective, status, mut shield, mut health, mut velocity)) =
            player.get_mut(event.target)
        {
            if !health.current.is_alive() {
                continue;
            }
            let profile = DefenseProfile::of(&effective.0, status, &tuning);
            let roll = rng.0.random::<f32>();
            resolve_player_hit(event.amount, &profile, &mut shield, &mut health, roll);
            if !health.current.is_alive() {
                velocity.0 = Vec2::ZERO;
                commands
                    .entity(event.target)
                    .insert(Respawning(Seconds::new(tuning.player_respawn_delay)));
                kills.write(KillMessage {
                    victim: event.target,
                    victim_kind: Victim::Player,
                    credit: event.credit,
                    xp_value: 0,
                    trial_target: None,
                });
            }
            continue;
        }

        if let Ok((kind, mut health, mitigation, xp, trial)) = enemies.get_mut(event.target) {
            if !health.current.is_alive() {
                continue;
            }
            health.current = health.current.sub_clamped(mitigated(event.amount, mitigation));
            if !health.current.is_alive() {
                commands.entity(event.target).insert(Dead);
                kills.write(KillMessage {
                    victim: event.target,
                    victim_kind: Victim::Enemy(*kind),
                    credit: event.credit,
                    xp_value: xp.0,
                    trial_target: trial.map(|t| t.0),
                });
            }
            continue;
        }

        if let Ok((kind, mut health, mitigation, xp, mut flash)) = blocks.get_mut(event.target) {
            if !health.current.is_alive() {
                continue;
            }
            health.current = health.current.sub_clamped(mitigated(event.amount, mitigation));
            flash.0 = Seconds::new(tuning.block_hit_flash);
            if !health.current.is_alive() {
                commands.entity(event.target).insert(Dead);
                kills.write(KillMessage {
                    victim: event.target,
                    victim_kind: Victim::Block(*kind),
                    credit: event.credit,
                    xp_value: xp.0,
                    trial_target: None,
                });
            }
        }
    }
}

/// DamageApplySet: land boss-skill payloads on the player.
pub fn apply_status_messages(
    tuning: Res<Tuning>,
    mut status_events: MessageReader<StatusMessage>,
    mut player: Query<&mut PlayerStatus, (With<Player>, Without<Respawning>)>,
) {
    for event in status_events.read() {
        for mut status in &mut player {
            match event.payload {
                ProjectilePayload::Trap => {
                    if tuning.trap_freeze_duration > status.freeze.0 {
                        status.freeze = Seconds::new(tuning.trap_freeze_duration);
                    }
                }
                ProjectilePayload::Circle => {
                    status.slow_mult = tuning.circle_slow_mult;
                    status.defense_debuff = tuning.circle_defense_debuff;
                    status.debuff_remaining = Seconds::new(tuning.circle_debuff_duration);
                }
            }
        }
    }
}

/// DamageApplySet: materialize queued shots as projectile entities.
pub fn spawn_shots(mut commands: Commands, mut shots: MessageReader<SpawnShotMessage>) {
    for shot in shots.read() {
        let radius = match shot.payload {
            Some(ProjectilePayload::Circle) => 14.0,
            Some(ProjectilePayload::Trap) => 8.0,
            None => match shot.faction {
                Faction::PlayerSide => 5.0,
                Faction::EnemySide => 6.0,
            },
        };
        let mut entity = commands.spawn((
            Projectile,
            shot.faction,
            Transform::from_translation(shot.position.extend(0.5)),
            Velocity(shot.direction * shot.speed),
            CollisionRadius(radius),
            ProjectileDamage(shot.damage),
            ProjectileOwner(shot.owner),
            Lifetime(Seconds::new(shot.lifetime)),
        ));
        if let Some(payload) = shot.payload {
            entity.insert(payload);
        }
    }
}

// ── Rewards ─────────────────────────────────────────────────────────

/// RewardsSet: route kill credit into XP or rank power, schedule
/// repopulation, and settle rank trials.
pub fn handle_kills(
    tuning: Res<Tuning>,
    mut kill_events: MessageReader<KillMessage>,
    mut rank: ResMut<RankState>,
    mut queue: ResMut<RespawnQueue>,
    mut xp: MessageWriter<XpMessage>,
    mut power: MessageWriter<PowerMessage>,
    mut ui: MessageWriter<UiMessage>,
) {
    for kill in kill_events.read() {
        match kill.victim_kind {
            Victim::Player => continue,
            Victim::Block(kind) => {
                queue.push(PendingKind::Block(kind), tuning.block_respawn_delay);
            }
            Victim::Enemy(kind) => {
                if kill.trial_target.is_none() {
                    let delay = match kind {
                        EnemyKind::Basic => tuning.basic_respawn_delay,
                        EnemyKind::Ranged => tuning.ranged_respawn_delay,
                        EnemyKind::Boss => tuning.boss_respawn_delay,
                    };
                    queue.push(PendingKind::Enemy(kind), delay);
                }
                if kind == EnemyKind::Boss {
                    ui.write(UiMessage::new(UiNote::BossDefeated));
                }
                if let Some(target) = kill.trial_target {
                    // Only a player-credited kill passes the trial; a boss
                    // lost to another enemy aborts it without advancing.
                    if kill.credit == Credit::Player {
                        rank.on_trial_boss_defeated(target);
                        ui.write(UiMessage::new(UiNote::RankAdvanced { tier: target }));
                        info!("Rank advanced to {}", target.label());
                    } else {
                        rank.on_trial_boss_lost();
                        info!("Rank trial for {} failed: boss not defeated by the player", target.label());
                    }
                }
            }
        }

        match kill.credit {
            Credit::Player => {
                xp.write(XpMessage(kill.xp_value as f32));
            }
            Credit::Enemy(_) => {
                power.write(PowerMessage(tuning.enemy_kill_power));
            }
            Credit::None => {}
        }
    }
}

// ── Cleanup ─────────────────────────────────────────────────────────

/// CleanupSet: despawn marked-dead entities and expired projectiles.
pub fn sweep_dead(
    mut commands: Commands,
    dead: Query<Entity, With<Dead>>,
    expired: Query<(Entity, &Lifetime), (With<Projectile>, Without<Dead>)>,
) {
    for entity in &dead {
        commands.entity(entity).try_despawn();
    }
    for (entity, lifetime) in &expired {
        if lifetime.0.is_expired() {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::stats::types::Hp;

    fn no_defense_profile() -> DefenseProfile {
        DefenseProfile {
            base_defense: DamageReduction::zero(),
            defense_debuff: 0.0,
            milestone_dr: DamageReduction::zero(),
            reborn_dr: DamageReduction::zero(),
            rank_dr: DamageReduction::zero(),
            ignore_chance: 0.0,
            shield_dr_factor: 1.25,
        }
    }

    #[test]
    fn shield_absorbs_before_hp() {
        // shield=50/100, hp=80, raw hit 60 at 0% DR: shield takes 50,
        // the uncovered 10 raw carries to hp.
        let profile = no_defense_profile();
        let mut shield = ShieldState { current: 50.0, max: 100.0 };
        let mut health = Health { current: Hp::new(80.0), max: 80.0 };
        let outcome = resolve_player_hit(60.0, &profile, &mut shield, &mut health, 0.99);
        assert!(!outcome.ignored);
        assert!((outcome.shield_absorbed - 50.0).abs() < 1e-4);
        assert_eq!(shield.current, 0.0);
        assert!((outcome.hp_damage - 10.0).abs() < 1e-4);
        assert!((health.current.0 - 70.0).abs() < 1e-4);
    }

    #[test]
    fn hp_never_negative_and_shield_spared_when_covering() {
        let profile = no_defense_profile();
        let mut shield = ShieldState { current: 100.0, max: 100.0 };
        let mut health = Health { current: Hp::new(80.0), max: 80.0 };
        let outcome = resolve_player_hit(60.0, &profile, &mut shield, &mut health, 0.99);
        assert_eq!(outcome.hp_damage, 0.0);
        assert!((shield.current - 40.0).abs() < 1e-4);
        assert_eq!(health.current.0, 80.0);
    }

    #[test]
    fn shield_dr_is_boosted() {
        // 40% composed DR -> 50% while shielded: a 100 raw hit drains 50.
        let mut profile = no_defense_profile();
        profile.base_defense = DamageReduction::new(0.4);
        let mut shield = ShieldState { current: 60.0, max: 60.0 };
        let mut health = Health { current: Hp::new(100.0), max: 100.0 };
        let outcome = resolve_player_hit(100.0, &profile, &mut shield, &mut health, 0.99);
        assert!((outcome.shield_absorbed - 50.0).abs() < 1e-4);
        assert_eq!(outcome.hp_damage, 0.0);
    }

    #[test]
    fn ignore_roll_negates_everything() {
        let mut profile = no_defense_profile();
        profile.ignore_chance = 0.10;
        let mut shield = ShieldState::default();
        let mut health = Health { current: Hp::new(80.0), max: 80.0 };
        let outcome = resolve_player_hit(999.0, &profile, &mut shield, &mut health, 0.05);
        assert!(outcome.ignored);
        assert_eq!(health.current.0, 80.0);
    }

    #[test]
    fn debuff_reduces_composed_defense() {
        let mut profile = no_defense_profile();
        profile.base_defense = DamageReduction::new(0.20);
        profile.defense_debuff = 0.25; // floors at zero, never negative
        assert_eq!(profile.composed_dr().0, 0.0);
    }

    #[test]
    fn base_damage_kills_block_in_three_hits() {
        // 70 hp, 0% DR block vs 25 damage shots: ceil(70/25) = 3.
        let mitigation = Mitigation::default();
        let mut health = Health::full(70.0);
        let mut hits = 0;
        while health.current.is_alive() {
            health.current = health.current.sub_clamped(mitigated(25.0, &mitigation));
            hits += 1;
            assert!(hits <= 3);
        }
        assert_eq!(hits, 3);
    }
}
