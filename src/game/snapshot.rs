use bevy::prelude::*;

use super::components::*;
use super::rank::{RankState, RankTier};
use super::stats::types::RebornClass;

/// Read-only view of player progress for the HUD; refreshed after the
/// simulation pass so the render layer never queries gameplay state.
#[derive(Resource, Default)]
pub struct HudSnapshot {
    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub shield_max: f32,
    pub level: u32,
    pub xp: f32,
    pub xp_to_next: f32,
    pub points: u32,
    pub reborn_count: u32,
    pub reborn_class: Option<RebornClass>,
    pub respawn_in: Option<f32>,
    pub rank_unlocked: bool,
    pub rank: Option<RankTier>,
    pub total_power: u32,
    pub next_rank_power: Option<u32>,
    pub trial_active: bool,
}

impl HudSnapshot {
    pub fn rank_label(&self) -> &'static str {
        self.rank.map(RankTier::label).unwrap_or("-")
    }
}

/// CleanupSet: copy player and rank state into the snapshot.
pub fn refresh_snapshot(
    rank: Res<RankState>,
    player: Query<
        (&Health, &ShieldState, &Progress, &RebornState, Option<&Respawning>),
        With<Player>,
    >,
    mut snapshot: ResMut<HudSnapshot>,
) {
    let Ok((health, shield, progress, reborn, respawning)) = player.single() else {
        return;
    };
    snapshot.hp = health.current.0;
    snapshot.max_hp = health.max;
    snapshot.shield = shield.current;
    snapshot.shield_max = shield.max;
    snapshot.level = progress.level;
    snapshot.xp = progress.xp;
    snapshot.xp_to_next = progress.xp_to_next;
    snapshot.points = progress.points;
    snapshot.reborn_count = reborn.count;
    snapshot.reborn_class = reborn.class;
    snapshot.respawn_in = respawning.map(|r| r.0 .0.max(0.0));
    snapshot.rank_unlocked = rank.unlocked;
    snapshot.rank = rank.current;
    snapshot.total_power = rank.total_power();
    snapshot.next_rank_power = rank.next_rank().map(RankTier::required_power);
    snapshot.trial_active = rank.active_trial.is_some();
}
