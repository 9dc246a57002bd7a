use bevy::prelude::*;

use super::components::{BlockKind, EnemyKind, Faction, ProjectilePayload};
use super::rank::RankTier;
use super::stats::types::{RebornClass, SkillKind};

/// Who gets credit for damage (and any resulting kill).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credit {
    Player,
    Enemy(Entity),
    /// Uncredited (e.g. environmental); awards nothing on kill.
    None,
}

/// Damage resolved this tick, applied by the damage-apply pass.
/// Separate message type from the command/UI channels to avoid
/// reader conflicts between system sets.
#[derive(Message, Debug, Clone)]
pub struct DamageMessage {
    pub credit: Credit,
    pub target: Entity,
    pub amount: f32,
}

/// Request to spawn a projectile entity next apply pass.
#[derive(Message, Debug, Clone)]
pub struct SpawnShotMessage {
    pub faction: Faction,
    pub owner: Option<Entity>,
    pub position: Vec2,
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub lifetime: f32,
    pub payload: Option<ProjectilePayload>,
}

/// Status payload landing on the player (boss trap/circle hits).
#[derive(Message, Debug, Clone, Copy)]
pub struct StatusMessage {
    pub payload: ProjectilePayload,
}

/// What died, emitted by the damage-apply pass, consumed by rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Victim {
    Enemy(EnemyKind),
    Block(BlockKind),
    Player,
}

#[derive(Message, Debug, Clone)]
pub struct KillMessage {
    pub victim: Entity,
    pub victim_kind: Victim,
    pub credit: Credit,
    pub xp_value: u32,
    /// Rank trial target if the victim was a trial boss.
    pub trial_target: Option<RankTier>,
}

/// XP earned with player credit, pre-multiplier.
#[derive(Message, Debug, Clone, Copy)]
pub struct XpMessage(pub f32);

/// Rank power earned outside the skill recompute (trial bosses are handled
/// separately; this covers enemy-credited kills and achievements).
#[derive(Message, Debug, Clone, Copy)]
pub struct PowerMessage(pub u32);

/// Requests from the UI/input layer. Invalid requests are rejected as no-ops
/// (spend) or with a logged reason (trial), never a panic.
#[derive(Message, Debug, Clone, Copy)]
pub enum CommandMessage {
    SpendSkill { skill: SkillKind, count: u32 },
    Reborn { class: Option<RebornClass> },
    StartRankTrial,
}

/// Transient notifications for the HUD, with a display-duration hint.
#[derive(Message, Debug, Clone)]
pub struct UiMessage {
    pub note: UiNote,
    pub seconds: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiNote {
    LevelUp { level: u32 },
    AchievementUnlocked { name: String },
    BossSpawned,
    BossDefeated,
    RebornCompleted { class: RebornClass, count: u32 },
    RankAdvanced { tier: RankTier },
}

impl UiMessage {
    pub fn new(note: UiNote) -> Self {
        Self { note, seconds: 3.2 }
    }
}
