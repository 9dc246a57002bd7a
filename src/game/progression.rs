use bevy::prelude::*;
use rand::Rng;

use super::components::*;
use super::events::*;
use super::map::WorldMap;
use super::rank::RankState;
use super::stats::recompute::recompute_stats;
use super::stats::types::Hp;
use crate::config::tuning::Tuning;

/// XP needed to go from `level` to the next one.
pub fn xp_to_next(level: u32) -> f32 {
    100.0 + 35.0 * (level.saturating_sub(1)) as f32
}

/// Whether a level-up at `level` grants a skill point. Before the rank
/// layer unlocks every level pays out; afterwards only every third.
pub fn grants_point(level: u32, rank_unlocked: bool) -> bool {
    !rank_unlocked || level % 3 == 0
}

/// ProgressionSet: fold earned XP into the player, looping level-ups.
pub fn apply_xp(
    tuning: Res<Tuning>,
    rank: Res<RankState>,
    achievements: Res<AchievementState>,
    mut xp_events: MessageReader<XpMessage>,
    mut player: Query<(&mut Progress, &RebornState), With<Player>>,
    mut ui: MessageWriter<UiMessage>,
) {
    let earned: f32 = xp_events.read().map(|e| e.0).sum();
    if earned <= 0.0 {
        return;
    }
    for (mut progress, reborn) in &mut player {
        let mult =
            1.0 + tuning.reborn_xp_bonus * reborn.count as f32 + achievements.xp_bonus();
        progress.xp += earned * mult;
        while progress.xp >= progress.xp_to_next {
            progress.xp -= progress.xp_to_next;
            progress.level += 1;
            progress.xp_to_next = xp_to_next(progress.level);
            if grants_point(progress.level, rank.unlocked) {
                progress.points += 1;
            }
            ui.write(UiMessage::new(UiNote::LevelUp { level: progress.level }));
            info!("Level up: {}", progress.level);
        }
    }
}

/// ProgressionSet: skill spends and reborn requests from the input layer.
/// Invalid requests are dropped without side effects.
pub fn handle_player_commands(
    tuning: Res<Tuning>,
    mut rank: ResMut<RankState>,
    mut commands_in: MessageReader<CommandMessage>,
    mut player: Query<
        (
            &mut Progress,
            &mut SkillTree,
            &mut RebornState,
            &mut Health,
            &mut ShieldState,
            &mut PlayerStatus,
        ),
        With<Player>,
    >,
    mut ui: MessageWriter<UiMessage>,
) {
    for command in commands_in.read() {
        let Ok((mut progress, mut skills, mut reborn, mut health, mut shield, mut status)) =
            player.single_mut()
        else {
            return;
        };
        match *command {
            CommandMessage::SpendSkill { skill, count } => {
                match skills.0.spend(skill, count, progress.points, reborn.class) {
                    Some(remaining) => {
                        progress.points = remaining;
                        rank.bank_skill_power(skill, count);
                    }
                    None => info!("Skill spend rejected: {skill:?} x{count}"),
                }
            }
            CommandMessage::Reborn { class } => {
                if progress.level < tuning.reborn_level_requirement {
                    info!(
                        "Reborn rejected: level {} below {}",
                        progress.level, tuning.reborn_level_requirement
                    );
                    continue;
                }
                if reborn.count >= tuning.reborn_max_count {
                    info!("Reborn rejected: max count reached");
                    continue;
                }
                // Class is chosen once; later reborns keep it.
                let class = match reborn.class.or(class) {
                    Some(class) => class,
                    None => {
                        info!("Reborn rejected: no class chosen");
                        continue;
                    }
                };
                reborn.class = Some(class);
                reborn.count += 1;

                progress.level = 1;
                progress.xp = 0.0;
                progress.xp_to_next = xp_to_next(1);
                progress.points = 0;
                skills.0 = Default::default();
                *status = PlayerStatus::default();

                let effective = recompute_stats(&skills.0, Some(class), rank.steps(), &tuning);
                health.max = effective.max_hp;
                health.current = Hp::new(effective.max_hp);
                shield.max = effective.shield_max;
                shield.current = effective.shield_max;

                ui.write(UiMessage::new(UiNote::RebornCompleted {
                    class,
                    count: reborn.count,
                }));
                info!("Reborn {} as {class:?}", reborn.count);
            }
            CommandMessage::StartRankTrial => {} // handled by the rank pass
        }
    }
}

/// RecomputeSet: derive effective stats from the skill tree, class, and
/// rank, then reconcile hp and shield pools against the new maxima.
pub fn recompute_player(
    tuning: Res<Tuning>,
    rank: Res<RankState>,
    mut player: Query<
        (
            &SkillTree,
            &RebornState,
            &mut PlayerEffective,
            &mut Health,
            &mut ShieldState,
        ),
        With<Player>,
    >,
) {
    for (skills, reborn, mut effective, mut health, mut shield) in &mut player {
        let next = recompute_stats(&skills.0, reborn.class, rank.steps(), &tuning);

        if next.max_hp > health.max {
            // Max-hp growth heals by the gained amount.
            let gained = next.max_hp - health.max;
            health.current = health.current.add_clamped(gained, next.max_hp);
        }
        health.max = next.max_hp;
        health.current = Hp::new(health.current.0.min(health.max));

        if next.shield_max > shield.max {
            shield.current += next.shield_max - shield.max;
        }
        shield.max = next.shield_max;
        shield.current = shield.current.min(shield.max);

        effective.0 = next;
    }
}

/// ProgressionSet: count down death and put the player back at a safe zone
/// with full pools and a clean status.
pub fn tick_player_respawn(
    mut commands: Commands,
    tuning: Res<Tuning>,
    map: Res<WorldMap>,
    mut rng: ResMut<GameRng>,
    mut player: Query<
        (
            Entity,
            &mut Respawning,
            &mut Transform,
            &mut Health,
            &mut ShieldState,
            &mut PlayerStatus,
            &mut Velocity,
        ),
        With<Player>,
    >,
) {
    let dt = tuning.dt;
    for (entity, mut respawning, mut transform, mut health, mut shield, mut status, mut velocity) in
        &mut player
    {
        respawning.0 = respawning.0.dec(dt);
        if !respawning.0.is_expired() {
            continue;
        }
        let zone = &map.safe_zones[rng.0.random_range(0..map.safe_zones.len())];
        transform.translation.x = zone.center.x;
        transform.translation.y = zone.center.y;
        health.current = Hp::new(health.max);
        shield.current = shield.max;
        *status = PlayerStatus::default();
        velocity.0 = Vec2::ZERO;
        commands.entity(entity).remove::<Respawning>();
        info!("Player respawned");
    }
}

// ── Achievements ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum AchievementCondition {
    EnemiesKilled(u32),
    BlocksDestroyed(u32),
    BossesDefeated(u32),
    LevelReached(u32),
}

struct AchievementDef {
    name: &'static str,
    condition: AchievementCondition,
    power: u32,
    /// Additive contribution to the global XP multiplier.
    xp_bonus: f32,
}

const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef { name: "First Blood", condition: AchievementCondition::EnemiesKilled(1), power: 10, xp_bonus: 0.0 },
    AchievementDef { name: "Exterminator", condition: AchievementCondition::EnemiesKilled(50), power: 50, xp_bonus: 0.05 },
    AchievementDef { name: "Centurion", condition: AchievementCondition::EnemiesKilled(200), power: 150, xp_bonus: 0.05 },
    AchievementDef { name: "Demolitionist", condition: AchievementCondition::BlocksDestroyed(100), power: 25, xp_bonus: 0.0 },
    AchievementDef { name: "Boss Slayer", condition: AchievementCondition::BossesDefeated(1), power: 25, xp_bonus: 0.0 },
    AchievementDef { name: "Boss Hunter", condition: AchievementCondition::BossesDefeated(10), power: 150, xp_bonus: 0.10 },
    AchievementDef { name: "Seasoned", condition: AchievementCondition::LevelReached(10), power: 10, xp_bonus: 0.0 },
    AchievementDef { name: "Veteran", condition: AchievementCondition::LevelReached(25), power: 25, xp_bonus: 0.05 },
    AchievementDef { name: "Ascendant", condition: AchievementCondition::LevelReached(50), power: 75, xp_bonus: 0.10 },
];

/// Lifetime tallies and which achievements have paid out. Kill counts and
/// highest level survive reborn resets.
#[derive(Resource, Default)]
pub struct AchievementState {
    pub enemies_killed: u32,
    pub blocks_destroyed: u32,
    pub bosses_defeated: u32,
    pub highest_level: u32,
    unlocked: Vec<&'static str>,
}

impl AchievementState {
    fn met(&self, condition: AchievementCondition) -> bool {
        match condition {
            AchievementCondition::EnemiesKilled(n) => self.enemies_killed >= n,
            AchievementCondition::BlocksDestroyed(n) => self.blocks_destroyed >= n,
            AchievementCondition::BossesDefeated(n) => self.bosses_defeated >= n,
            AchievementCondition::LevelReached(n) => self.highest_level >= n,
        }
    }

    pub fn is_unlocked(&self, name: &str) -> bool {
        self.unlocked.iter().any(|u| *u == name)
    }

    /// Sum of XP-multiplier bonuses from unlocked achievements.
    pub fn xp_bonus(&self) -> f32 {
        ACHIEVEMENTS
            .iter()
            .filter(|def| self.is_unlocked(def.name))
            .map(|def| def.xp_bonus)
            .sum()
    }
}

/// RewardsSet: tally player-credited kills and level milestones, pay out
/// achievement power once per achievement.
pub fn track_achievements(
    mut kill_events: MessageReader<KillMessage>,
    mut state: ResMut<AchievementState>,
    mut rank: ResMut<RankState>,
    player: Query<&Progress, With<Player>>,
    mut ui: MessageWriter<UiMessage>,
) {
    for kill in kill_events.read() {
        if kill.credit != Credit::Player {
            continue;
        }
        match kill.victim_kind {
            Victim::Block(_) => state.blocks_destroyed += 1,
            Victim::Enemy(EnemyKind::Boss) => {
                state.enemies_killed += 1;
                state.bosses_defeated += 1;
            }
            Victim::Enemy(_) => state.enemies_killed += 1,
            Victim::Player => {}
        }
    }
    if let Ok(progress) = player.single() {
        state.highest_level = state.highest_level.max(progress.level);
    }

    for def in ACHIEVEMENTS {
        if !state.is_unlocked(def.name) && state.met(def.condition) {
            state.unlocked.push(def.name);
            rank.grant_achievement_power(def.power);
            ui.write(UiMessage::new(UiNote::AchievementUnlocked {
                name: def.name.to_string(),
            }));
            info!("Achievement unlocked: {}", def.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xp_curve_matches_formula() {
        assert_eq!(xp_to_next(1), 100.0);
        assert_eq!(xp_to_next(2), 135.0);
        assert_eq!(xp_to_next(10), 415.0);
    }

    #[test]
    fn point_grants_tighten_after_rank_unlock() {
        assert!(grants_point(2, false));
        assert!(grants_point(3, false));
        assert!(!grants_point(2, true));
        assert!(grants_point(3, true));
        assert!(!grants_point(4, true));
        assert!(grants_point(6, true));
    }

    #[test]
    fn achievements_unlock_once_at_threshold() {
        let mut state = AchievementState::default();
        state.enemies_killed = 1;
        assert!(state.met(AchievementCondition::EnemiesKilled(1)));
        assert!(!state.met(AchievementCondition::EnemiesKilled(50)));
        assert!(!state.is_unlocked("First Blood"));
        state.unlocked.push("First Blood");
        assert!(state.is_unlocked("First Blood"));
    }
}
