use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;

use super::components::*;
use super::map::WorldMap;
use super::rank::RankTier;
use super::stats::types::{DamageReduction, Seconds};
use crate::config::tuning::Tuning;

// ── Type tables ─────────────────────────────────────────────────────

pub struct BlockSpec {
    pub size: f32,
    pub hp: f32,
    /// Contact damage per second dealt to an overlapping player.
    pub damage: f32,
    /// Movement multiplier applied to an overlapping player.
    pub slow: f32,
    pub xp: u32,
    pub level_min: u32,
    pub level_max: u32,
}

impl BlockKind {
    pub fn spec(self) -> BlockSpec {
        match self {
            Self::Yellow => BlockSpec { size: 40.0, hp: 70.0, damage: 6.0, slow: 0.30, xp: 10, level_min: 1, level_max: 10 },
            Self::Blue => BlockSpec { size: 50.0, hp: 110.0, damage: 9.0, slow: 0.40, xp: 20, level_min: 10, level_max: 30 },
            Self::Purple => BlockSpec { size: 60.0, hp: 160.0, damage: 12.0, slow: 0.50, xp: 30, level_min: 15, level_max: 60 },
        }
    }
}

pub struct EnemySpec {
    pub hp: f32,
    /// Contact damage per second.
    pub damage: f32,
    pub xp: u32,
    pub radius: f32,
    pub speed: f32,
    pub detect: f32,
    pub level_min: u32,
    pub level_max: u32,
}

impl EnemyKind {
    pub fn spec(self) -> EnemySpec {
        match self {
            Self::Basic => EnemySpec { hp: 160.0, damage: 10.0, xp: 20, radius: 26.0, speed: 156.0, detect: 650.0, level_min: 1, level_max: 10 },
            Self::Ranged => EnemySpec { hp: 210.0, damage: 14.0, xp: 40, radius: 26.0, speed: 132.0, detect: 800.0, level_min: 9, level_max: 30 },
            Self::Boss => EnemySpec { hp: 2800.0, damage: 55.0, xp: 250, radius: 60.0, speed: 108.0, detect: 1000.0, level_min: 10, level_max: 60 },
        }
    }
}

// ── Rolls ───────────────────────────────────────────────────────────

/// Find a point clear of every safe zone (distance > radius + padding).
/// Bounded rejection sampling; falls back to map center so spawning never
/// blocks game progress.
pub fn find_spawn_point(map: &WorldMap, padding: f32, attempts: u32, rng: &mut StdRng) -> Vec2 {
    for _ in 0..attempts {
        let p = Vec2::new(
            rng.random_range(0.0..map.width),
            rng.random_range(0.0..map.height),
        );
        let clear = map
            .safe_zones
            .iter()
            .all(|z| p.distance(z.center) > z.radius + padding);
        if clear {
            return p;
        }
    }
    map.center()
}

/// Level scaling for blocks: +15% XP per level; DR +10% per level with a
/// +30% surge at level 40, clamped to the global cap.
pub fn roll_block_level(kind: BlockKind, rng: &mut StdRng) -> (u32, u32, DamageReduction) {
    let spec = kind.spec();
    let level = rng.random_range(spec.level_min..=spec.level_max);
    let xp = (spec.xp as f32 * (1.0 + 0.15 * (level - 1) as f32)).round() as u32;
    let mut dr = 0.10 * (level - 1) as f32;
    if level >= 40 {
        dr += 0.30;
    }
    (level, xp, DamageReduction::new(dr))
}

pub struct ScaledEnemy {
    pub hp: f32,
    pub damage: f32,
    pub xp: u32,
    pub level_dr: DamageReduction,
}

/// Level scaling for enemies: hp +10%, damage +5%, xp +10% per level;
/// DR +15% per ten levels, capped at 0.9.
pub fn scale_enemy(kind: EnemyKind, level: u32) -> ScaledEnemy {
    let spec = kind.spec();
    let lvl = level.max(1);
    ScaledEnemy {
        hp: (spec.hp * (1.0 + 0.10 * (lvl - 1) as f32)).round(),
        damage: (spec.damage * (1.0 + 0.05 * (lvl - 1) as f32)).round(),
        xp: (spec.xp as f32 * (1.0 + 0.10 * (lvl - 1) as f32)).round() as u32,
        level_dr: DamageReduction::new((((lvl - 1) / 10) as f32 * 0.15).min(0.9)),
    }
}

fn roll_level(kind: EnemyKind, rng: &mut StdRng) -> u32 {
    let spec = kind.spec();
    rng.random_range(spec.level_min..=spec.level_max)
}

fn roll_intelligence(kind: EnemyKind, rng: &mut StdRng) -> f32 {
    match kind {
        EnemyKind::Basic => rng.random_range(0.3..0.7),
        EnemyKind::Ranged => rng.random_range(0.5..0.9),
        EnemyKind::Boss => rng.random_range(0.8..1.0),
    }
}

/// Roll an optional meta rank from the low end of the canonical tier list.
fn roll_meta_rank(tuning: &Tuning, rng: &mut StdRng) -> Option<RankTier> {
    if rng.random::<f32>() >= tuning.enemy_rank_chance {
        return None;
    }
    let idx = rng.random_range(0..5usize);
    RankTier::ORDER.get(idx).copied()
}

// ── Spawning ────────────────────────────────────────────────────────

pub fn spawn_block(
    commands: &mut Commands,
    tuning: &Tuning,
    map: &WorldMap,
    rng: &mut StdRng,
    kind: BlockKind,
) -> Entity {
    let spec = kind.spec();
    let (level, xp, dr) = roll_block_level(kind, rng);
    let pos = find_spawn_point(map, spec.size + tuning.spawn_padding, tuning.spawn_attempts, rng);
    commands
        .spawn((
            Block,
            kind,
            Transform::from_translation(pos.extend(0.0)),
            CollisionRadius(spec.size / 2.0),
            Health::full(spec.hp),
            Level(level),
            XpValue(xp),
            SlowFactor(spec.slow),
            ContactDamage(spec.damage),
            Mitigation { level_dr: dr, phase_dr: DamageReduction::zero() },
            HitFlash::default(),
        ))
        .id()
}

pub fn spawn_enemy(
    commands: &mut Commands,
    tuning: &Tuning,
    map: &WorldMap,
    rng: &mut StdRng,
    kind: EnemyKind,
    level: Option<u32>,
) -> Entity {
    let spec = kind.spec();
    let level = level.unwrap_or_else(|| roll_level(kind, rng));
    let mut scaled = scale_enemy(kind, level);

    let meta_rank = roll_meta_rank(tuning, rng);
    if let Some(rank) = meta_rank {
        let steps = rank.steps() as f32;
        scaled.hp = (scaled.hp * (1.0 + tuning.enemy_rank_hp_per_step * steps)).round();
        scaled.damage = (scaled.damage * (1.0 + tuning.enemy_rank_damage_per_step * steps)).round();
    }

    let pos = find_spawn_point(map, spec.radius + tuning.spawn_padding, tuning.spawn_attempts, rng);
    let mut entity = commands.spawn((
        Enemy,
        kind,
        Transform::from_translation(pos.extend(0.0)),
        Velocity(Vec2::ZERO),
        CollisionRadius(spec.radius),
        Health::full(scaled.hp),
        Level(level),
        XpValue(scaled.xp),
        ContactDamage(scaled.damage),
        MoveSpeed(spec.speed),
        DetectRadius(spec.detect),
        Intelligence(roll_intelligence(kind, rng)),
        Mitigation { level_dr: scaled.level_dr, phase_dr: DamageReduction::zero() },
        AiState::default(),
    ));
    if kind == EnemyKind::Boss {
        entity.insert(BossState::default());
    }
    if let Some(rank) = meta_rank {
        entity.insert(MetaRank(rank));
    }
    entity.id()
}

/// Spawn the single boss guarding a rank trial, at the tier's fixed level.
pub fn spawn_trial_boss(
    commands: &mut Commands,
    tuning: &Tuning,
    map: &WorldMap,
    rng: &mut StdRng,
    target: RankTier,
) -> Entity {
    let boss = spawn_enemy(
        commands,
        tuning,
        map,
        rng,
        EnemyKind::Boss,
        Some(target.trial_boss_level()),
    );
    commands.entity(boss).insert(TrialBoss(target));
    boss
}

// ── Repopulation ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Block(BlockKind),
    Enemy(EnemyKind),
}

/// Countdown-driven respawn entries, ticked inside the game loop. No
/// scheduled callbacks; determinism survives variable frame rates.
#[derive(Resource, Default)]
pub struct RespawnQueue {
    pub pending: Vec<(PendingKind, Seconds)>,
}

impl RespawnQueue {
    pub fn push(&mut self, kind: PendingKind, delay: f32) {
        self.pending.push((kind, Seconds::new(delay)));
    }
}

fn block_cap(tuning: &Tuning, kind: BlockKind) -> u32 {
    match kind {
        BlockKind::Yellow => tuning.yellow_block_cap,
        BlockKind::Blue => tuning.blue_block_cap,
        BlockKind::Purple => tuning.purple_block_cap,
    }
}

fn enemy_cap(tuning: &Tuning, kind: EnemyKind) -> u32 {
    match kind {
        EnemyKind::Basic => tuning.basic_enemy_cap,
        EnemyKind::Ranged => tuning.ranged_enemy_cap,
        EnemyKind::Boss => tuning.boss_cap,
    }
}

/// CleanupSet: tick respawn countdowns and spawn whatever is due, honoring
/// per-type population caps.
pub fn run_respawn_queue(
    mut commands: Commands,
    tuning: Res<Tuning>,
    map: Res<WorldMap>,
    mut rng: ResMut<GameRng>,
    mut queue: ResMut<RespawnQueue>,
    live_blocks: Query<&BlockKind, (With<Block>, Without<Dead>)>,
    live_enemies: Query<(&EnemyKind, Option<&TrialBoss>), (With<Enemy>, Without<Dead>)>,
) {
    let dt = tuning.dt;
    let mut due = Vec::new();
    queue.pending.retain_mut(|(kind, countdown)| {
        *countdown = countdown.dec(dt);
        if countdown.is_expired() {
            due.push(*kind);
            false
        } else {
            true
        }
    });

    for kind in due {
        match kind {
            PendingKind::Block(block_kind) => {
                let live = live_blocks.iter().filter(|k| **k == block_kind).count() as u32;
                if live < block_cap(&tuning, block_kind) {
                    spawn_block(&mut commands, &tuning, &map, &mut rng.0, block_kind);
                }
            }
            PendingKind::Enemy(enemy_kind) => {
                // Trial bosses do not count against the ambient boss cap.
                let live = live_enemies
                    .iter()
                    .filter(|(k, trial)| **k == enemy_kind && trial.is_none())
                    .count() as u32;
                if live < enemy_cap(&tuning, enemy_kind) {
                    spawn_enemy(&mut commands, &tuning, &map, &mut rng.0, enemy_kind, None);
                }
            }
        }
    }
}

/// Startup: fill the world to its population caps.
pub fn initial_populate(
    mut commands: Commands,
    tuning: Res<Tuning>,
    map: Res<WorldMap>,
    mut rng: ResMut<GameRng>,
) {
    for _ in 0..tuning.yellow_block_cap {
        spawn_block(&mut commands, &tuning, &map, &mut rng.0, BlockKind::Yellow);
    }
    for _ in 0..tuning.blue_block_cap {
        spawn_block(&mut commands, &tuning, &map, &mut rng.0, BlockKind::Blue);
    }
    for _ in 0..tuning.purple_block_cap {
        spawn_block(&mut commands, &tuning, &map, &mut rng.0, BlockKind::Purple);
    }
    for _ in 0..tuning.basic_enemy_cap {
        spawn_enemy(&mut commands, &tuning, &map, &mut rng.0, EnemyKind::Basic, None);
    }
    for _ in 0..tuning.ranged_enemy_cap {
        spawn_enemy(&mut commands, &tuning, &map, &mut rng.0, EnemyKind::Ranged, None);
    }
    for _ in 0..tuning.boss_cap {
        spawn_enemy(&mut commands, &tuning, &map, &mut rng.0, EnemyKind::Boss, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn spawn_points_respect_safe_zones() {
        let tuning = Tuning::default();
        let map = WorldMap::from_tuning(&tuning);
        let mut rng = StdRng::seed_from_u64(7);
        let padding = 80.0;
        for _ in 0..200 {
            let p = find_spawn_point(&map, padding, tuning.spawn_attempts, &mut rng);
            if p == map.center() {
                // Documented fallback; exempt from the exclusion property.
                continue;
            }
            for z in &map.safe_zones {
                assert!(p.distance(z.center) > z.radius + padding);
            }
        }
    }

    #[test]
    fn fallback_when_zones_cover_everything() {
        let tuning = Tuning::default();
        let mut map = WorldMap::from_tuning(&tuning);
        map.safe_zones = vec![super::super::map::SafeZone {
            center: map.center(),
            radius: map.width + map.height,
        }];
        let mut rng = StdRng::seed_from_u64(7);
        let p = find_spawn_point(&map, 0.0, 50, &mut rng);
        assert_eq!(p, map.center());
    }

    #[test]
    fn block_level_roll_stays_in_range_and_caps_dr() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let (level, xp, dr) = roll_block_level(BlockKind::Purple, &mut rng);
            assert!((15..=60).contains(&level));
            assert!(xp >= BlockKind::Purple.spec().xp);
            assert!(dr.0 <= 0.95);
        }
    }

    #[test]
    fn enemy_scaling_formulas() {
        let scaled = scale_enemy(EnemyKind::Basic, 1);
        assert_eq!(scaled.hp, 160.0);
        assert_eq!(scaled.level_dr.0, 0.0);

        let scaled = scale_enemy(EnemyKind::Basic, 11);
        assert_eq!(scaled.hp, 320.0); // 160 * 2.0
        assert_eq!(scaled.damage, 15.0); // round(10 * 1.5)
        assert!((scaled.level_dr.0 - 0.15).abs() < 1e-6);
    }

    #[test]
    fn level_dr_caps_at_ninety_percent() {
        let scaled = scale_enemy(EnemyKind::Boss, 1000);
        assert!((scaled.level_dr.0 - 0.9).abs() < 1e-6);
    }
}
