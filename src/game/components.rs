use bevy::prelude::*;
use rand::rngs::StdRng;

use super::rank::RankTier;
use super::stats::effective::EffectiveStats;
use super::stats::skills::SkillAllocation;
use super::stats::types::{DamageReduction, Hp, RebornClass, Seconds};

// ── Marker components ───────────────────────────────────────────────

#[derive(Component)]
pub struct Player;

#[derive(Component)]
pub struct Enemy;

#[derive(Component)]
pub struct Block;

#[derive(Component)]
pub struct Projectile;

/// Which side a projectile fights for; projectiles never hit their own side.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faction {
    PlayerSide,
    EnemySide,
}

/// Mark-dead flag: set when hp reaches zero mid-tick, despawned by the
/// cleanup sweep so collections are never mutated during iteration.
#[derive(Component)]
pub struct Dead;

// ── Shared runtime state ────────────────────────────────────────────

#[derive(Component)]
pub struct Velocity(pub Vec2);

#[derive(Component)]
pub struct CollisionRadius(pub f32);

#[derive(Component, Debug, Clone, Copy)]
pub struct Health {
    pub current: Hp,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        Self { current: Hp::new(max), max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 { self.current.0 / self.max } else { 0.0 }
    }
}

/// Entity level, rolled at spawn for enemies and blocks.
#[derive(Component, Debug, Clone, Copy)]
pub struct Level(pub u32);

/// XP awarded to the player when this entity dies with player credit.
#[derive(Component, Debug, Clone, Copy)]
pub struct XpValue(pub u32);

// ── Player state ────────────────────────────────────────────────────

#[derive(Component, Clone)]
pub struct PlayerEffective(pub EffectiveStats);

#[derive(Component, Default)]
pub struct SkillTree(pub SkillAllocation);

#[derive(Component, Debug, Clone)]
pub struct Progress {
    pub level: u32,
    pub xp: f32,
    pub xp_to_next: f32,
    pub points: u32,
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct RebornState {
    pub class: Option<RebornClass>,
    pub count: u32,
}

/// Tank shield pool; consumed before hp. Zero-sized for other classes.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ShieldState {
    pub current: f32,
    pub max: f32,
}

impl ShieldState {
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 { self.current / self.max } else { 0.0 }
    }
}

/// Temporary status ailments from boss skills.
#[derive(Component, Debug, Clone, Copy)]
pub struct PlayerStatus {
    pub freeze: Seconds,
    pub slow_mult: f32,
    pub defense_debuff: f32,
    pub debuff_remaining: Seconds,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            freeze: Seconds(0.0),
            slow_mult: 1.0,
            defense_debuff: 0.0,
            debuff_remaining: Seconds(0.0),
        }
    }
}

impl PlayerStatus {
    pub fn is_frozen(&self) -> bool {
        !self.freeze.is_expired()
    }

    pub fn tick(&mut self, dt: f32) {
        self.freeze = self.freeze.dec(dt);
        self.debuff_remaining = self.debuff_remaining.dec(dt);
        if self.debuff_remaining.is_expired() {
            self.slow_mult = 1.0;
            self.defense_debuff = 0.0;
        }
    }
}

/// Player shot cooldown.
#[derive(Component, Default)]
pub struct FireCooldown(pub Seconds);

/// Present on the player while dead; counts down to respawn.
#[derive(Component)]
pub struct Respawning(pub Seconds);

// ── Enemy state ─────────────────────────────────────────────────────

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Basic,
    Ranged,
    Boss,
}

/// Contact damage dealt per second while overlapping a target.
#[derive(Component, Debug, Clone, Copy)]
pub struct ContactDamage(pub f32);

#[derive(Component, Debug, Clone, Copy)]
pub struct MoveSpeed(pub f32);

#[derive(Component, Debug, Clone, Copy)]
pub struct DetectRadius(pub f32);

/// Aim quality in [0, 1]; lower adds more angular noise to ranged shots.
#[derive(Component, Debug, Clone, Copy)]
pub struct Intelligence(pub f32);

/// Damage reduction composed from independent sources.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Mitigation {
    pub level_dr: DamageReduction,
    pub phase_dr: DamageReduction,
}

impl Mitigation {
    pub fn total(&self) -> DamageReduction {
        self.level_dr.compose(self.phase_dr)
    }
}

/// Optional meta-rank rolled at spawn; scales hp and damage.
#[derive(Component, Debug, Clone, Copy)]
pub struct MetaRank(pub RankTier);

/// Per-enemy behavior timers and the currently chosen target.
#[derive(Component, Default)]
pub struct AiState {
    pub wander_dir: Vec2,
    pub wander_timer: Seconds,
    pub attack_cooldown: Seconds,
    /// Set each decision pass; contact damage only lands on this entity.
    pub target: Option<Entity>,
}

/// Boss-only phase counter and skill cooldowns. Phase only ever increases.
#[derive(Component)]
pub struct BossState {
    pub phase: u8,
    pub trap_cooldown: Seconds,
    pub circle_cooldown: Seconds,
    pub skill_lockout: Seconds,
}

impl Default for BossState {
    fn default() -> Self {
        Self {
            phase: 1,
            trap_cooldown: Seconds(4.0),
            circle_cooldown: Seconds(7.0),
            skill_lockout: Seconds(0.0),
        }
    }
}

/// Marks a boss spawned by a rank trial; defeating it commits the tier.
#[derive(Component, Debug, Clone, Copy)]
pub struct TrialBoss(pub RankTier);

// ── Block state ─────────────────────────────────────────────────────

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Yellow,
    Blue,
    Purple,
}

/// Movement slow applied to the player while overlapping this block.
#[derive(Component, Debug, Clone, Copy)]
pub struct SlowFactor(pub f32);

/// Recently-hit timer for render feedback.
#[derive(Component, Default)]
pub struct HitFlash(pub Seconds);

// ── Projectile state ────────────────────────────────────────────────

#[derive(Component)]
pub struct ProjectileDamage(pub f32);

/// Spawning entity, if it still exists; used for kill credit.
#[derive(Component)]
pub struct ProjectileOwner(pub Option<Entity>);

#[derive(Component)]
pub struct Lifetime(pub Seconds);

/// Status effect carried by boss skill projectiles.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectilePayload {
    /// Freezes player movement briefly.
    Trap,
    /// Slow + defense debuff field.
    Circle,
}

// ── Resources ───────────────────────────────────────────────────────

/// Seeded RNG for every gameplay roll, so simulations replay under test.
#[derive(Resource)]
pub struct GameRng(pub StdRng);
